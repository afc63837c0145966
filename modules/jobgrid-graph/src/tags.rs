//! Tag-set reconciliation. Not an append-only log: after a sync the
//! entity's tag set equals exactly the desired set, whatever it was before.
//! Tag names are lowercased, and a tag's ID is derived from its name, so a
//! concurrent create of the same tag collides on the store's absence guard
//! instead of producing duplicates.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use jobgrid_common::{Job, JobGridError, Post, Result, Tag, User};
use jobgrid_store::{Collection, Txn};

use crate::maintainer::{add_id, encode, pull_id, store_err, GraphMaintainer, Loaded};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagTarget {
    Post(Uuid),
    Job(Uuid),
}

impl TagTarget {
    fn id(&self) -> Uuid {
        match self {
            TagTarget::Post(id) | TagTarget::Job(id) => *id,
        }
    }
}

/// Deterministic tag ID from its (lowercased) name.
pub(crate) fn tag_id_for(name: &str) -> Uuid {
    let digest = Sha256::digest(name.as_bytes());
    Uuid::from_slice(&digest[..16]).expect("sha256 digest is long enough")
}

enum TargetDoc {
    Post(Loaded<Post>),
    Job(Loaded<Job>),
}

impl TargetDoc {
    fn tag_ids(&self) -> &[Uuid] {
        match self {
            TargetDoc::Post(p) => &p.entity.tags,
            TargetDoc::Job(j) => &j.entity.tags,
        }
    }

    fn set_tag_ids(&mut self, tags: Vec<Uuid>) {
        match self {
            TargetDoc::Post(p) => p.entity.tags = tags,
            TargetDoc::Job(j) => j.entity.tags = tags,
        }
    }

    fn collection(&self) -> Collection {
        match self {
            TargetDoc::Post(_) => Collection::Posts,
            TargetDoc::Job(_) => Collection::Jobs,
        }
    }

    fn rev(&self) -> i64 {
        match self {
            TargetDoc::Post(p) => p.rev,
            TargetDoc::Job(j) => j.rev,
        }
    }

    fn body(&self) -> Result<Value> {
        match self {
            TargetDoc::Post(p) => encode(&p.entity),
            TargetDoc::Job(j) => encode(&j.entity),
        }
    }
}

/// The tag-side list the target participates in.
fn tag_side(target: TagTarget, tag: &mut Tag) -> &mut Vec<Uuid> {
    match target {
        TagTarget::Post(_) => &mut tag.posts,
        TagTarget::Job(_) => &mut tag.jobs,
    }
}

impl GraphMaintainer {
    /// Reconcile the target's tag set to exactly `desired_names`,
    /// upserting tags case-insensitively and updating both sides of every
    /// changed cross-reference in one transaction. Concurrent calls on the
    /// same entity race; the later commit aborts and may retry.
    pub async fn sync_tag_set(
        &self,
        target: TagTarget,
        desired_names: &[String],
    ) -> Result<Vec<Tag>> {
        let mut names: Vec<String> = Vec::new();
        for raw in desired_names {
            let name = raw.trim().to_lowercase();
            if name.is_empty() {
                return Err(JobGridError::invalid("tag names must not be blank"));
            }
            if !names.contains(&name) {
                names.push(name);
            }
        }

        let mut doc = match target {
            TagTarget::Post(id) => {
                TargetDoc::Post(self.load(Collection::Posts, id, "post").await?)
            }
            TagTarget::Job(id) => TargetDoc::Job(self.load(Collection::Jobs, id, "job").await?),
        };
        let entity_id = target.id();

        // Current tags, by name.
        let mut current: HashMap<String, Loaded<Tag>> = HashMap::new();
        for tag_id in doc.tag_ids() {
            let tag: Loaded<Tag> = self.load(Collection::Tags, *tag_id, "tag").await?;
            current.insert(tag.entity.name.clone(), tag);
        }

        let mut txn = Txn::new();
        let mut final_tags: Vec<Tag> = Vec::new();
        let mut final_ids: Vec<Uuid> = Vec::new();

        for name in &names {
            if let Some(kept) = current.remove(name) {
                // Already linked; membership untouched.
                final_ids.push(kept.entity.id);
                final_tags.push(kept.entity);
                continue;
            }
            let tag_id = tag_id_for(name);
            match self.store.get(Collection::Tags, tag_id).await.map_err(store_err)? {
                Some(existing) => {
                    let mut tag: Tag = existing.decode().map_err(store_err)?;
                    add_id(tag_side(target, &mut tag), entity_id);
                    txn.expect_rev(Collection::Tags, tag_id, existing.rev);
                    txn.update(Collection::Tags, tag_id, encode(&tag)?);
                    final_ids.push(tag_id);
                    final_tags.push(tag);
                }
                None => {
                    let mut tag = Tag {
                        id: tag_id,
                        name: name.clone(),
                        created_at: Utc::now(),
                        posts: Vec::new(),
                        jobs: Vec::new(),
                        followers: Vec::new(),
                    };
                    add_id(tag_side(target, &mut tag), entity_id);
                    txn.insert(Collection::Tags, tag_id, encode(&tag)?);
                    final_ids.push(tag_id);
                    final_tags.push(tag);
                }
            }
        }

        // Whatever is left in `current` is no longer desired: unlink both ways.
        for (_, mut removed) in current {
            pull_id(tag_side(target, &mut removed.entity), entity_id);
            txn.expect_rev(Collection::Tags, removed.entity.id, removed.rev);
            txn.update(Collection::Tags, removed.entity.id, encode(&removed.entity)?);
        }

        txn.expect_rev(doc.collection(), entity_id, doc.rev());
        doc.set_tag_ids(final_ids);
        txn.update(doc.collection(), entity_id, doc.body()?);

        self.store.apply(txn).await.map_err(store_err)?;
        Ok(final_tags)
    }

    /// Delete a tag, unlinking it from every post, job, and follower in one
    /// transaction.
    pub async fn delete_tag(&self, id: Uuid) -> Result<()> {
        let tag = self.load::<Tag>(Collection::Tags, id, "tag").await?;

        let mut posts: Vec<Loaded<Post>> = Vec::new();
        for post_id in &tag.entity.posts {
            posts.push(self.load(Collection::Posts, *post_id, "post").await?);
        }
        let mut jobs: Vec<Loaded<Job>> = Vec::new();
        for job_id in &tag.entity.jobs {
            jobs.push(self.load(Collection::Jobs, *job_id, "job").await?);
        }
        let mut followers: Vec<Loaded<User>> = Vec::new();
        for user_id in &tag.entity.followers {
            followers.push(self.load_user(*user_id).await?);
        }

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Tags, id, tag.rev);
        txn.delete(Collection::Tags, id);
        for post in &mut posts {
            pull_id(&mut post.entity.tags, id);
            txn.expect_rev(Collection::Posts, post.entity.id, post.rev);
            txn.update(Collection::Posts, post.entity.id, encode(&post.entity)?);
        }
        for job in &mut jobs {
            pull_id(&mut job.entity.tags, id);
            txn.expect_rev(Collection::Jobs, job.entity.id, job.rev);
            txn.update(Collection::Jobs, job.entity.id, encode(&job.entity)?);
        }
        for user in &mut followers {
            pull_id(&mut user.entity.followed_tags, id);
            txn.expect_rev(Collection::Users, user.entity.id, user.rev);
            txn.update(Collection::Users, user.entity.id, encode(&user.entity)?);
        }
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_ids_are_stable_and_case_insensitive_by_construction() {
        assert_eq!(tag_id_for("rust"), tag_id_for("rust"));
        assert_ne!(tag_id_for("rust"), tag_id_for("remote"));
    }
}

//! Generic atomic add/remove-from-set for likes, bookmarks, follows, and
//! company membership. Edges with a mandatory mirror update both documents
//! in the same transaction; unmirrored edges touch one side only.

use serde_json::Value;
use uuid::Uuid;

use jobgrid_common::{Company, Job, JobGridError, Post, Result, User};
use jobgrid_store::{Collection, Txn};

use crate::maintainer::{add_id, encode, pull_id, store_err, GraphMaintainer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetEdge {
    /// entity = follower, member = followee. Mirrored:
    /// follower.following ↔ followee.followers.
    Follow,
    /// entity = company, member = user. Mirrored:
    /// company.members ↔ user.company (at most one company per user).
    CompanyMember,
    /// entity = tag, member = user. Mirrored:
    /// tag.followers ↔ user.followed_tags.
    TagFollow,
    /// entity = post, member = liking user. One-sided.
    PostLike,
    /// entity = post, member = user. One-sided.
    PostUnicorn,
    /// entity = post, member = user. One-sided.
    PostBookmark,
    /// entity = job, member = user. One-sided.
    JobBookmark,
}

impl GraphMaintainer {
    /// Toggle set membership on an edge. Adding an already-present member
    /// or removing an absent one is an idempotent no-op. Returns the
    /// materialized primary entity.
    pub async fn toggle_membership(
        &self,
        edge: SetEdge,
        entity: Uuid,
        member: Uuid,
        add: bool,
    ) -> Result<Value> {
        match edge {
            SetEdge::Follow => self.toggle_follow(entity, member, add).await,
            SetEdge::CompanyMember => self.toggle_company_member(entity, member, add).await,
            SetEdge::TagFollow => self.toggle_tag_follow(entity, member, add).await,
            SetEdge::PostLike | SetEdge::PostUnicorn | SetEdge::PostBookmark => {
                self.toggle_post_reaction(edge, entity, member, add).await
            }
            SetEdge::JobBookmark => self.toggle_job_bookmark(entity, member, add).await,
        }
    }

    async fn toggle_follow(&self, follower_id: Uuid, followee_id: Uuid, add: bool) -> Result<Value> {
        if follower_id == followee_id {
            return Err(JobGridError::invalid("cannot follow yourself"));
        }
        let mut follower = self.load_user(follower_id).await?;
        let mut followee = self.load_user(followee_id).await?;

        let changed = if add {
            let a = add_id(&mut follower.entity.following, followee_id);
            let b = add_id(&mut followee.entity.followers, follower_id);
            a || b
        } else {
            let a = pull_id(&mut follower.entity.following, followee_id);
            let b = pull_id(&mut followee.entity.followers, follower_id);
            a || b
        };
        if !changed {
            return encode(&follower.entity);
        }

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Users, follower_id, follower.rev);
        txn.update(Collection::Users, follower_id, encode(&follower.entity)?);
        txn.expect_rev(Collection::Users, followee_id, followee.rev);
        txn.update(Collection::Users, followee_id, encode(&followee.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        encode(&follower.entity)
    }

    async fn toggle_company_member(
        &self,
        company_id: Uuid,
        member_id: Uuid,
        add: bool,
    ) -> Result<Value> {
        let mut company = self
            .load::<Company>(Collection::Companies, company_id, "company")
            .await?;
        let mut member = self.load_user(member_id).await?;

        let changed = if add {
            match member.entity.company {
                Some(existing) if existing == company_id => false,
                Some(_) => {
                    return Err(JobGridError::conflict("user already belongs to a company"))
                }
                None => {
                    member.entity.company = Some(company_id);
                    add_id(&mut company.entity.members, member_id);
                    true
                }
            }
        } else {
            let mut changed = pull_id(&mut company.entity.members, member_id);
            if member.entity.company == Some(company_id) {
                member.entity.company = None;
                changed = true;
            }
            changed
        };
        if !changed {
            return encode(&company.entity);
        }

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Companies, company_id, company.rev);
        txn.update(Collection::Companies, company_id, encode(&company.entity)?);
        txn.expect_rev(Collection::Users, member_id, member.rev);
        txn.update(Collection::Users, member_id, encode(&member.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        encode(&company.entity)
    }

    async fn toggle_tag_follow(&self, tag_id: Uuid, user_id: Uuid, add: bool) -> Result<Value> {
        let mut tag = self
            .load::<jobgrid_common::Tag>(Collection::Tags, tag_id, "tag")
            .await?;
        let mut user = self.load_user(user_id).await?;

        let changed = if add {
            let a = add_id(&mut tag.entity.followers, user_id);
            let b = add_id(&mut user.entity.followed_tags, tag_id);
            a || b
        } else {
            let a = pull_id(&mut tag.entity.followers, user_id);
            let b = pull_id(&mut user.entity.followed_tags, tag_id);
            a || b
        };
        if !changed {
            return encode(&tag.entity);
        }

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Tags, tag_id, tag.rev);
        txn.update(Collection::Tags, tag_id, encode(&tag.entity)?);
        txn.expect_rev(Collection::Users, user_id, user.rev);
        txn.update(Collection::Users, user_id, encode(&user.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        encode(&tag.entity)
    }

    async fn toggle_post_reaction(
        &self,
        edge: SetEdge,
        post_id: Uuid,
        user_id: Uuid,
        add: bool,
    ) -> Result<Value> {
        let mut post = self.load::<Post>(Collection::Posts, post_id, "post").await?;
        let set = match edge {
            SetEdge::PostLike => &mut post.entity.likes,
            SetEdge::PostUnicorn => &mut post.entity.unicorns,
            SetEdge::PostBookmark => &mut post.entity.bookmarks,
            _ => unreachable!("not a post reaction edge"),
        };
        let changed = if add {
            add_id(set, user_id)
        } else {
            pull_id(set, user_id)
        };
        if !changed {
            return encode(&post.entity);
        }

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Posts, post_id, post.rev);
        txn.update(Collection::Posts, post_id, encode(&post.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        encode(&post.entity)
    }

    async fn toggle_job_bookmark(&self, job_id: Uuid, user_id: Uuid, add: bool) -> Result<Value> {
        let mut job = self.load::<Job>(Collection::Jobs, job_id, "job").await?;
        let changed = if add {
            add_id(&mut job.entity.bookmarks, user_id)
        } else {
            pull_id(&mut job.entity.bookmarks, user_id)
        };
        if !changed {
            return encode(&job.entity);
        }

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Jobs, job_id, job.rev);
        txn.update(Collection::Jobs, job_id, encode(&job.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        encode(&job.entity)
    }

    /// Typed convenience for the follow edge: returns the follower.
    pub async fn follow_user(&self, follower: Uuid, followee: Uuid, add: bool) -> Result<User> {
        let value = self
            .toggle_membership(SetEdge::Follow, follower, followee, add)
            .await?;
        serde_json::from_value(value)
            .map_err(|_| JobGridError::aborted("could not decode follower"))
    }
}

//! Write-side of the relationship graph. The maintainer is the only
//! component that writes both sides of a mirrored reference, and every
//! structural mutation it performs rides a single store transaction —
//! partial application is never observable.
//!
//! The maintainer never retries an aborted transaction; retry policy
//! belongs to the caller, which may need to re-validate its input first.
//! Ownership is immutable once assigned: there is deliberately no
//! transfer-ownership operation here.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use jobgrid_common::{
    Application, ApplicationStatus, Comment, Company, Cv, Job, JobGridError, NewApplication,
    NewCompany, NewCv, NewJob, NewPost, NewUser, Post, Result, Role, User,
};
use jobgrid_store::{Collection, EntityStore, Filter, StoreError, Txn};

pub struct GraphMaintainer {
    pub(crate) store: Arc<dyn EntityStore>,
}

/// A decoded document plus the revision it was read at, so the eventual
/// transaction can guard against concurrent writers.
pub(crate) struct Loaded<T> {
    pub entity: T,
    pub rev: i64,
}

pub(crate) fn store_err(err: StoreError) -> JobGridError {
    match err {
        StoreError::Aborted(msg) => JobGridError::Aborted(msg),
        StoreError::Backend(e) => {
            warn!(error = %e, "store backend failure");
            JobGridError::aborted("store unavailable, please retry")
        }
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| {
        warn!(error = %e, "document encode failure");
        JobGridError::aborted("could not encode document")
    })
}

/// $addToSet semantics: append if absent, report whether anything changed.
pub(crate) fn add_id(set: &mut Vec<Uuid>, id: Uuid) -> bool {
    if set.contains(&id) {
        false
    } else {
        set.push(id);
        true
    }
}

/// $pull semantics: remove all occurrences, report whether anything changed.
pub(crate) fn pull_id(set: &mut Vec<Uuid>, id: Uuid) -> bool {
    let before = set.len();
    set.retain(|x| *x != id);
    set.len() != before
}

// --- Update patches ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub location: Option<String>,
    pub work: Option<String>,
    pub skills: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<chrono::DateTime<Utc>>,
    pub salary: Option<String>,
    pub openings: Option<u32>,
    pub working_format: Option<String>,
    pub experience: Option<String>,
    pub working_address: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub founded_year: Option<String>,
    pub scale: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub avatar: Option<String>,
}

impl GraphMaintainer {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub(crate) async fn load<T: serde::de::DeserializeOwned>(
        &self,
        collection: Collection,
        id: Uuid,
        what: &str,
    ) -> Result<Loaded<T>> {
        match self.store.get(collection, id).await.map_err(store_err)? {
            Some(doc) => Ok(Loaded {
                entity: doc.decode().map_err(store_err)?,
                rev: doc.rev,
            }),
            None => Err(JobGridError::not_found(format!("{what} {id}"))),
        }
    }

    pub(crate) async fn load_user(&self, id: Uuid) -> Result<Loaded<User>> {
        self.load(Collection::Users, id, "user").await
    }

    // --- Users ---

    /// Create a user. Email is the uniqueness key.
    pub async fn create_user(&self, input: NewUser) -> Result<User> {
        let email = input.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(JobGridError::invalid("a valid email is required"));
        }
        if input.name.trim().is_empty() {
            return Err(JobGridError::invalid("name is required"));
        }

        let existing = self
            .store
            .scan(Collection::Users, &Filter::new().eq("email", email.clone()))
            .await
            .map_err(store_err)?;
        if !existing.is_empty() {
            return Err(JobGridError::conflict("a user with this email already exists"));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            email,
            bio: input.bio,
            avatar: input.avatar,
            location: None,
            work: None,
            skills: None,
            role: Role::User,
            joined_at: Utc::now(),
            posts: Vec::new(),
            jobs: Vec::new(),
            cvs: Vec::new(),
            applications: Vec::new(),
            comments: Vec::new(),
            following: Vec::new(),
            followers: Vec::new(),
            followed_tags: Vec::new(),
            company: None,
        };

        let mut txn = Txn::new();
        txn.insert(Collection::Users, user.id, encode(&user)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(user)
    }

    /// Update profile fields. Users may only edit themselves.
    pub async fn update_profile(&self, id: Uuid, actor: Uuid, patch: ProfilePatch) -> Result<User> {
        if id != actor {
            return Err(JobGridError::forbidden("you may only edit your own profile"));
        }
        let mut user = self.load_user(id).await?;
        let u = &mut user.entity;
        if let Some(name) = patch.name {
            u.name = name;
        }
        if patch.bio.is_some() {
            u.bio = patch.bio;
        }
        if patch.avatar.is_some() {
            u.avatar = patch.avatar;
        }
        if patch.location.is_some() {
            u.location = patch.location;
        }
        if patch.work.is_some() {
            u.work = patch.work;
        }
        if patch.skills.is_some() {
            u.skills = patch.skills;
        }

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Users, id, user.rev);
        txn.update(Collection::Users, id, encode(&user.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(user.entity)
    }

    /// Promote a user to recruiter so they can publish job listings.
    pub async fn register_recruiter(&self, id: Uuid, actor: Uuid) -> Result<User> {
        if id != actor {
            return Err(JobGridError::forbidden("you may only change your own role"));
        }
        let mut user = self.load_user(id).await?;
        if user.entity.role == Role::Recruiter {
            return Ok(user.entity);
        }
        user.entity.role = Role::Recruiter;

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Users, id, user.rev);
        txn.update(Collection::Users, id, encode(&user.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(user.entity)
    }

    // --- Posts ---

    /// Create a post and link it into the author's collection, atomically.
    pub async fn create_post(&self, author: Uuid, input: NewPost) -> Result<Post> {
        if input.title.trim().is_empty() || input.body.trim().is_empty() {
            return Err(JobGridError::invalid("title and body are required"));
        }
        let mut owner = self.load_user(author).await?;

        let post = Post {
            id: Uuid::new_v4(),
            title: input.title,
            slug: input.slug,
            body: input.body,
            image: input.image,
            kind: input.kind,
            created_at: Utc::now(),
            author,
            tags: Vec::new(),
            likes: Vec::new(),
            unicorns: Vec::new(),
            bookmarks: Vec::new(),
            comments: Vec::new(),
        };
        owner.entity.posts.push(post.id);

        let mut txn = Txn::new();
        txn.insert(Collection::Posts, post.id, encode(&post)?);
        txn.expect_rev(Collection::Users, author, owner.rev);
        txn.update(Collection::Users, author, encode(&owner.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(post)
    }

    pub async fn update_post(&self, id: Uuid, actor: Uuid, patch: PostPatch) -> Result<Post> {
        let mut post = self.load::<Post>(Collection::Posts, id, "post").await?;
        if post.entity.author != actor {
            return Err(JobGridError::forbidden("you are not the author of this post"));
        }
        let p = &mut post.entity;
        if let Some(title) = patch.title {
            p.title = title;
        }
        if let Some(slug) = patch.slug {
            p.slug = slug;
        }
        if let Some(body) = patch.body {
            p.body = body;
        }
        if patch.image.is_some() {
            p.image = patch.image;
        }

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Posts, id, post.rev);
        txn.update(Collection::Posts, id, encode(&post.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(post.entity)
    }

    /// Delete a post: the document itself, the author's reference to it,
    /// every tag's back-reference, and every comment on it (pulling those
    /// from their authors' collections). One transaction.
    pub async fn delete_post(&self, id: Uuid, actor: Uuid) -> Result<()> {
        let post = self.load::<Post>(Collection::Posts, id, "post").await?;
        if post.entity.author != actor {
            return Err(JobGridError::forbidden("you are not the author of this post"));
        }

        // Users touched more than once (author who also commented) must be
        // mutated on a single in-memory copy.
        let mut users: HashMap<Uuid, Loaded<User>> = HashMap::new();
        users.insert(post.entity.author, self.load_user(post.entity.author).await?);

        let mut comments: Vec<Loaded<Comment>> = Vec::new();
        for comment_id in &post.entity.comments {
            let comment = self
                .load::<Comment>(Collection::Comments, *comment_id, "comment")
                .await?;
            if !users.contains_key(&comment.entity.author) {
                users.insert(
                    comment.entity.author,
                    self.load_user(comment.entity.author).await?,
                );
            }
            comments.push(comment);
        }

        let mut tags: Vec<Loaded<jobgrid_common::Tag>> = Vec::new();
        for tag_id in &post.entity.tags {
            tags.push(self.load(Collection::Tags, *tag_id, "tag").await?);
        }

        if let Some(owner) = users.get_mut(&post.entity.author) {
            pull_id(&mut owner.entity.posts, id);
        }
        for comment in &comments {
            if let Some(author) = users.get_mut(&comment.entity.author) {
                pull_id(&mut author.entity.comments, comment.entity.id);
            }
        }
        for tag in &mut tags {
            pull_id(&mut tag.entity.posts, id);
        }

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Posts, id, post.rev);
        txn.delete(Collection::Posts, id);
        for comment in &comments {
            txn.expect_rev(Collection::Comments, comment.entity.id, comment.rev);
            txn.delete(Collection::Comments, comment.entity.id);
        }
        for tag in &tags {
            txn.expect_rev(Collection::Tags, tag.entity.id, tag.rev);
            txn.update(Collection::Tags, tag.entity.id, encode(&tag.entity)?);
        }
        for (user_id, user) in &users {
            txn.expect_rev(Collection::Users, *user_id, user.rev);
            txn.update(Collection::Users, *user_id, encode(&user.entity)?);
        }
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(())
    }

    // --- Comments ---

    /// Create a comment, linked into both the author's and the post's
    /// collections in one transaction.
    pub async fn create_comment(&self, author: Uuid, post_id: Uuid, body: String) -> Result<Comment> {
        if body.trim().is_empty() {
            return Err(JobGridError::invalid("comment body is required"));
        }
        let mut owner = self.load_user(author).await?;
        let mut post = self.load::<Post>(Collection::Posts, post_id, "post").await?;

        let comment = Comment {
            id: Uuid::new_v4(),
            body,
            created_at: Utc::now(),
            author,
            post: post_id,
        };
        owner.entity.comments.push(comment.id);
        post.entity.comments.push(comment.id);

        let mut txn = Txn::new();
        txn.insert(Collection::Comments, comment.id, encode(&comment)?);
        txn.expect_rev(Collection::Users, author, owner.rev);
        txn.update(Collection::Users, author, encode(&owner.entity)?);
        txn.expect_rev(Collection::Posts, post_id, post.rev);
        txn.update(Collection::Posts, post_id, encode(&post.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(comment)
    }

    pub async fn delete_comment(&self, id: Uuid, actor: Uuid) -> Result<()> {
        let comment = self
            .load::<Comment>(Collection::Comments, id, "comment")
            .await?;
        if comment.entity.author != actor {
            return Err(JobGridError::forbidden("you are not the author of this comment"));
        }
        let mut owner = self.load_user(comment.entity.author).await?;
        let mut post = self
            .load::<Post>(Collection::Posts, comment.entity.post, "post")
            .await?;

        pull_id(&mut owner.entity.comments, id);
        pull_id(&mut post.entity.comments, id);

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Comments, id, comment.rev);
        txn.delete(Collection::Comments, id);
        txn.expect_rev(Collection::Users, owner.entity.id, owner.rev);
        txn.update(Collection::Users, owner.entity.id, encode(&owner.entity)?);
        txn.expect_rev(Collection::Posts, post.entity.id, post.rev);
        txn.update(Collection::Posts, post.entity.id, encode(&post.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(())
    }

    // --- Jobs ---

    pub async fn create_job(&self, author: Uuid, input: NewJob) -> Result<Job> {
        if input.title.trim().is_empty() || input.description.trim().is_empty() {
            return Err(JobGridError::invalid("title and description are required"));
        }
        let mut owner = self.load_user(author).await?;

        let job = Job {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            deadline: input.deadline,
            salary: input.salary,
            openings: input.openings,
            working_format: input.working_format,
            experience: input.experience,
            working_address: input.working_address,
            status: input.status,
            created_at: Utc::now(),
            author,
            company: owner.entity.company,
            tags: Vec::new(),
            bookmarks: Vec::new(),
        };
        owner.entity.jobs.push(job.id);

        let mut txn = Txn::new();
        txn.insert(Collection::Jobs, job.id, encode(&job)?);
        txn.expect_rev(Collection::Users, author, owner.rev);
        txn.update(Collection::Users, author, encode(&owner.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(job)
    }

    pub async fn update_job(&self, id: Uuid, actor: Uuid, patch: JobPatch) -> Result<Job> {
        let mut job = self.load::<Job>(Collection::Jobs, id, "job").await?;
        if job.entity.author != actor {
            return Err(JobGridError::forbidden("you are not the author of this job"));
        }
        let j = &mut job.entity;
        if let Some(title) = patch.title {
            j.title = title;
        }
        if let Some(description) = patch.description {
            j.description = description;
        }
        if let Some(deadline) = patch.deadline {
            j.deadline = deadline;
        }
        if patch.salary.is_some() {
            j.salary = patch.salary;
        }
        if patch.openings.is_some() {
            j.openings = patch.openings;
        }
        if patch.working_format.is_some() {
            j.working_format = patch.working_format;
        }
        if patch.experience.is_some() {
            j.experience = patch.experience;
        }
        if patch.working_address.is_some() {
            j.working_address = patch.working_address;
        }
        if let Some(status) = patch.status {
            j.status = status;
        }

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Jobs, id, job.rev);
        txn.update(Collection::Jobs, id, encode(&job.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(job.entity)
    }

    /// Delete a job. Closing a job withdraws its applications: every
    /// application citing it is removed and pulled from its applicant's
    /// collection, in the same transaction.
    pub async fn delete_job(&self, id: Uuid, actor: Uuid) -> Result<()> {
        let job = self.load::<Job>(Collection::Jobs, id, "job").await?;
        if job.entity.author != actor {
            return Err(JobGridError::forbidden("you are not the author of this job"));
        }

        let mut users: HashMap<Uuid, Loaded<User>> = HashMap::new();
        users.insert(job.entity.author, self.load_user(job.entity.author).await?);

        let applications = self
            .store
            .scan(
                Collection::Applications,
                &Filter::new().eq("job", serde_json::json!(id)),
            )
            .await
            .map_err(store_err)?;
        let mut cited: Vec<Loaded<Application>> = Vec::new();
        for doc in &applications {
            let application: Application = doc.decode().map_err(store_err)?;
            if !users.contains_key(&application.applicant) {
                users.insert(application.applicant, self.load_user(application.applicant).await?);
            }
            cited.push(Loaded {
                entity: application,
                rev: doc.rev,
            });
        }

        let mut tags: Vec<Loaded<jobgrid_common::Tag>> = Vec::new();
        for tag_id in &job.entity.tags {
            tags.push(self.load(Collection::Tags, *tag_id, "tag").await?);
        }

        if let Some(owner) = users.get_mut(&job.entity.author) {
            pull_id(&mut owner.entity.jobs, id);
        }
        for application in &cited {
            if let Some(applicant) = users.get_mut(&application.entity.applicant) {
                pull_id(&mut applicant.entity.applications, application.entity.id);
            }
        }
        for tag in &mut tags {
            pull_id(&mut tag.entity.jobs, id);
        }

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Jobs, id, job.rev);
        txn.delete(Collection::Jobs, id);
        for application in &cited {
            txn.expect_rev(Collection::Applications, application.entity.id, application.rev);
            txn.delete(Collection::Applications, application.entity.id);
        }
        for tag in &tags {
            txn.expect_rev(Collection::Tags, tag.entity.id, tag.rev);
            txn.update(Collection::Tags, tag.entity.id, encode(&tag.entity)?);
        }
        for (user_id, user) in &users {
            txn.expect_rev(Collection::Users, *user_id, user.rev);
            txn.update(Collection::Users, *user_id, encode(&user.entity)?);
        }
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(())
    }

    // --- CVs ---

    pub async fn create_cv(&self, author: Uuid, input: NewCv) -> Result<Cv> {
        if input.name.trim().is_empty() {
            return Err(JobGridError::invalid("cv name is required"));
        }
        let mut owner = self.load_user(author).await?;

        let cv = Cv {
            id: Uuid::new_v4(),
            name: input.name,
            image: input.image,
            created_at: Utc::now(),
            author,
        };
        owner.entity.cvs.push(cv.id);

        let mut txn = Txn::new();
        txn.insert(Collection::Cvs, cv.id, encode(&cv)?);
        txn.expect_rev(Collection::Users, author, owner.rev);
        txn.update(Collection::Users, author, encode(&owner.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(cv)
    }

    /// Delete a CV. Blocked while any application cites it: the applicant
    /// must withdraw those applications first.
    pub async fn delete_cv(&self, id: Uuid, actor: Uuid) -> Result<()> {
        let cv = self.load::<Cv>(Collection::Cvs, id, "cv").await?;
        if cv.entity.author != actor {
            return Err(JobGridError::forbidden("you are not the owner of this cv"));
        }

        let citing = self
            .store
            .scan(
                Collection::Applications,
                &Filter::new().eq("cv", serde_json::json!(id)),
            )
            .await
            .map_err(store_err)?;
        if !citing.is_empty() {
            return Err(JobGridError::conflict(
                "cv is cited by open applications; withdraw them first",
            ));
        }

        let mut owner = self.load_user(cv.entity.author).await?;
        pull_id(&mut owner.entity.cvs, id);

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Cvs, id, cv.rev);
        txn.delete(Collection::Cvs, id);
        txn.expect_rev(Collection::Users, owner.entity.id, owner.rev);
        txn.update(Collection::Users, owner.entity.id, encode(&owner.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(())
    }

    // --- Applications ---

    /// Create an application. The job, the CV, and the applicant must all
    /// exist, and the CV must belong to the applicant.
    pub async fn create_application(
        &self,
        applicant: Uuid,
        input: NewApplication,
    ) -> Result<Application> {
        let mut owner = self.load_user(applicant).await?;
        let _job = self.load::<Job>(Collection::Jobs, input.job, "job").await?;
        let cv = self.load::<Cv>(Collection::Cvs, input.cv, "cv").await?;
        if cv.entity.author != applicant {
            return Err(JobGridError::forbidden("cv does not belong to the applicant"));
        }

        let application = Application {
            id: Uuid::new_v4(),
            body: input.body,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
            job: input.job,
            applicant,
            cv: input.cv,
        };
        owner.entity.applications.push(application.id);

        let mut txn = Txn::new();
        txn.insert(Collection::Applications, application.id, encode(&application)?);
        txn.expect_rev(Collection::Users, applicant, owner.rev);
        txn.update(Collection::Users, applicant, encode(&owner.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(application)
    }

    /// Decide an application. Only the job's author may decide, Pending is
    /// the only state that can move, and re-asserting the current status is
    /// an idempotent no-op.
    pub async fn set_application_status(
        &self,
        id: Uuid,
        actor: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let mut application = self
            .load::<Application>(Collection::Applications, id, "application")
            .await?;
        let job = self
            .load::<Job>(Collection::Jobs, application.entity.job, "job")
            .await?;
        if job.entity.author != actor {
            return Err(JobGridError::forbidden(
                "only the job author may decide an application",
            ));
        }
        if application.entity.status == status {
            return Ok(application.entity);
        }
        if !application.entity.status.can_transition_to(status) {
            return Err(JobGridError::conflict(format!(
                "cannot move application from {} to {}",
                application.entity.status, status
            )));
        }
        application.entity.status = status;

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Applications, id, application.rev);
        txn.update(Collection::Applications, id, encode(&application.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(application.entity)
    }

    pub async fn delete_application(&self, id: Uuid, actor: Uuid) -> Result<()> {
        let application = self
            .load::<Application>(Collection::Applications, id, "application")
            .await?;
        if application.entity.applicant != actor {
            return Err(JobGridError::forbidden(
                "you are not the owner of this application",
            ));
        }
        let mut owner = self.load_user(application.entity.applicant).await?;
        pull_id(&mut owner.entity.applications, id);

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Applications, id, application.rev);
        txn.delete(Collection::Applications, id);
        txn.expect_rev(Collection::Users, owner.entity.id, owner.rev);
        txn.update(Collection::Users, owner.entity.id, encode(&owner.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(())
    }

    // --- Companies ---

    /// Create a company with the author as first member. A user already in
    /// a company cannot found another.
    pub async fn create_company(&self, author: Uuid, input: NewCompany) -> Result<Company> {
        if input.name.trim().is_empty() {
            return Err(JobGridError::invalid("company name is required"));
        }
        let mut owner = self.load_user(author).await?;
        if owner.entity.company.is_some() {
            return Err(JobGridError::conflict("user already belongs to a company"));
        }

        let company = Company {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            founded_year: input.founded_year,
            scale: input.scale,
            address: input.address,
            contact: input.contact,
            avatar: input.avatar,
            created_at: Utc::now(),
            members: vec![author],
        };
        owner.entity.company = Some(company.id);

        let mut txn = Txn::new();
        txn.insert(Collection::Companies, company.id, encode(&company)?);
        txn.expect_rev(Collection::Users, author, owner.rev);
        txn.update(Collection::Users, author, encode(&owner.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(company)
    }

    pub async fn update_company(
        &self,
        id: Uuid,
        actor: Uuid,
        patch: CompanyPatch,
    ) -> Result<Company> {
        let mut company = self
            .load::<Company>(Collection::Companies, id, "company")
            .await?;
        if !company.entity.members.contains(&actor) {
            return Err(JobGridError::forbidden("you are not a member of this company"));
        }
        let c = &mut company.entity;
        if let Some(name) = patch.name {
            c.name = name;
        }
        if patch.description.is_some() {
            c.description = patch.description;
        }
        if patch.founded_year.is_some() {
            c.founded_year = patch.founded_year;
        }
        if patch.scale.is_some() {
            c.scale = patch.scale;
        }
        if patch.address.is_some() {
            c.address = patch.address;
        }
        if patch.contact.is_some() {
            c.contact = patch.contact;
        }
        if patch.avatar.is_some() {
            c.avatar = patch.avatar;
        }

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Companies, id, company.rev);
        txn.update(Collection::Companies, id, encode(&company.entity)?);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(company.entity)
    }

    /// Delete a company and clear every member's back-reference, atomically.
    pub async fn delete_company(&self, id: Uuid, actor: Uuid) -> Result<()> {
        let company = self
            .load::<Company>(Collection::Companies, id, "company")
            .await?;
        if !company.entity.members.contains(&actor) {
            return Err(JobGridError::forbidden("you are not a member of this company"));
        }

        let mut members: Vec<Loaded<User>> = Vec::new();
        for member_id in &company.entity.members {
            members.push(self.load_user(*member_id).await?);
        }
        for member in &mut members {
            if member.entity.company == Some(id) {
                member.entity.company = None;
            }
        }

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Companies, id, company.rev);
        txn.delete(Collection::Companies, id);
        for member in &members {
            txn.expect_rev(Collection::Users, member.entity.id, member.rev);
            txn.update(Collection::Users, member.entity.id, encode(&member.entity)?);
        }
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(())
    }
}

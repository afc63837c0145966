//! Read-side of the graph: typed point lookups and the filtered queries
//! the REST surface needs. Mutation never happens here.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use jobgrid_common::{
    Application, Company, Cv, Job, JobGridError, Notification, Post, PostKind, Result, Tag, User,
};
use jobgrid_store::{Collection, EntityStore, Filter};

use crate::maintainer::store_err;
use crate::tags::tag_id_for;

pub struct GraphReader {
    store: Arc<dyn EntityStore>,
}

impl GraphReader {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: Uuid,
        what: &str,
    ) -> Result<T> {
        match self.store.get(collection, id).await.map_err(store_err)? {
            Some(doc) => doc.decode().map_err(store_err),
            None => Err(JobGridError::not_found(format!("{what} {id}"))),
        }
    }

    async fn fetch_all<T: DeserializeOwned>(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<T>> {
        let docs = self.store.scan(collection, filter).await.map_err(store_err)?;
        docs.iter()
            .map(|doc| doc.decode().map_err(store_err))
            .collect()
    }

    // --- Users ---

    pub async fn user(&self, id: Uuid) -> Result<User> {
        self.fetch(Collection::Users, id, "user").await
    }

    pub async fn users(&self) -> Result<Vec<User>> {
        self.fetch_all(Collection::Users, &Filter::all()).await
    }

    // --- Posts ---

    pub async fn post(&self, id: Uuid) -> Result<Post> {
        self.fetch(Collection::Posts, id, "post").await
    }

    /// Feed order: newest first.
    pub async fn posts(&self, kind: Option<PostKind>) -> Result<Vec<Post>> {
        let filter = match kind {
            Some(kind) => Filter::new().eq("kind", json!(kind)),
            None => Filter::all(),
        };
        let mut posts: Vec<Post> = self.fetch_all(Collection::Posts, &filter).await?;
        posts.reverse();
        Ok(posts)
    }

    pub async fn posts_by_author(&self, author: Uuid) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .fetch_all(Collection::Posts, &Filter::new().eq("author", json!(author)))
            .await?;
        posts.reverse();
        Ok(posts)
    }

    pub async fn posts_bookmarked_by(&self, user: Uuid) -> Result<Vec<Post>> {
        self.fetch_all(
            Collection::Posts,
            &Filter::new().contains("bookmarks", json!(user)),
        )
        .await
    }

    /// Case-insensitive title search. A linear scan is acceptable here;
    /// correctness over cleverness.
    pub async fn search_posts(&self, query: &str, kind: Option<PostKind>) -> Result<Vec<Post>> {
        let needle = query.to_lowercase();
        let posts = self.posts(kind).await?;
        Ok(posts
            .into_iter()
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .collect())
    }

    // --- Jobs ---

    pub async fn job(&self, id: Uuid) -> Result<Job> {
        self.fetch(Collection::Jobs, id, "job").await
    }

    pub async fn jobs(&self) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self.fetch_all(Collection::Jobs, &Filter::all()).await?;
        jobs.reverse();
        Ok(jobs)
    }

    pub async fn jobs_by_author(&self, author: Uuid) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .fetch_all(Collection::Jobs, &Filter::new().eq("author", json!(author)))
            .await?;
        jobs.reverse();
        Ok(jobs)
    }

    /// Jobs published by any member of the company.
    pub async fn jobs_by_company(&self, company: Uuid) -> Result<Vec<Job>> {
        let members: Vec<User> = self
            .fetch_all(Collection::Users, &Filter::new().eq("company", json!(company)))
            .await?;
        let member_ids: Vec<Uuid> = members.iter().map(|m| m.id).collect();
        let mut jobs: Vec<Job> = self.fetch_all(Collection::Jobs, &Filter::all()).await?;
        jobs.retain(|j| member_ids.contains(&j.author) || j.company == Some(company));
        jobs.reverse();
        Ok(jobs)
    }

    // --- CVs ---

    pub async fn cv(&self, id: Uuid) -> Result<Cv> {
        self.fetch(Collection::Cvs, id, "cv").await
    }

    pub async fn cvs(&self) -> Result<Vec<Cv>> {
        let mut cvs: Vec<Cv> = self.fetch_all(Collection::Cvs, &Filter::all()).await?;
        cvs.reverse();
        Ok(cvs)
    }

    pub async fn cvs_by_author(&self, author: Uuid) -> Result<Vec<Cv>> {
        self.fetch_all(Collection::Cvs, &Filter::new().eq("author", json!(author)))
            .await
    }

    // --- Applications ---

    pub async fn application(&self, id: Uuid) -> Result<Application> {
        self.fetch(Collection::Applications, id, "application").await
    }

    pub async fn applications(&self) -> Result<Vec<Application>> {
        let mut applications: Vec<Application> = self
            .fetch_all(Collection::Applications, &Filter::all())
            .await?;
        applications.reverse();
        Ok(applications)
    }

    pub async fn applications_by_applicant(&self, applicant: Uuid) -> Result<Vec<Application>> {
        self.fetch_all(
            Collection::Applications,
            &Filter::new().eq("applicant", json!(applicant)),
        )
        .await
    }

    pub async fn applications_by_job(&self, job: Uuid) -> Result<Vec<Application>> {
        self.fetch_all(
            Collection::Applications,
            &Filter::new().eq("job", json!(job)),
        )
        .await
    }

    // --- Companies ---

    pub async fn company(&self, id: Uuid) -> Result<Company> {
        self.fetch(Collection::Companies, id, "company").await
    }

    pub async fn companies(&self) -> Result<Vec<Company>> {
        self.fetch_all(Collection::Companies, &Filter::all()).await
    }

    pub async fn search_companies(&self, query: &str) -> Result<Vec<Company>> {
        let needle = query.to_lowercase();
        let companies = self.companies().await?;
        Ok(companies
            .into_iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .collect())
    }

    // --- Tags ---

    pub async fn tag(&self, id: Uuid) -> Result<Tag> {
        self.fetch(Collection::Tags, id, "tag").await
    }

    pub async fn tags(&self) -> Result<Vec<Tag>> {
        self.fetch_all(Collection::Tags, &Filter::all()).await
    }

    /// Case-insensitive name lookup via the deterministic tag ID.
    pub async fn tag_by_name(&self, name: &str) -> Result<Tag> {
        let canonical = name.trim().to_lowercase();
        self.fetch(Collection::Tags, tag_id_for(&canonical), "tag")
            .await
    }

    pub async fn tags_followed_by(&self, user: Uuid) -> Result<Vec<Tag>> {
        self.fetch_all(Collection::Tags, &Filter::new().contains("followers", json!(user)))
            .await
    }

    // --- Notifications ---

    /// Newest first.
    pub async fn notifications_for(&self, recipient: Uuid) -> Result<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .fetch_all(
                Collection::Notifications,
                &Filter::new().eq("recipient", json!(recipient)),
            )
            .await?;
        notifications.reverse();
        Ok(notifications)
    }

    pub async fn notification(&self, id: Uuid) -> Result<Notification> {
        self.fetch(Collection::Notifications, id, "notification").await
    }

    // --- Comments ---

    pub async fn comment(&self, id: Uuid) -> Result<jobgrid_common::Comment> {
        self.fetch(Collection::Comments, id, "comment").await
    }

    pub async fn comments_by_post(&self, post: Uuid) -> Result<Vec<jobgrid_common::Comment>> {
        self.fetch_all(Collection::Comments, &Filter::new().eq("post", json!(post)))
            .await
    }
}

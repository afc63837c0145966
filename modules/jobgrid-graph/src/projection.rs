//! DTO assembly for API responses: referenced IDs expanded one level
//! (author → summary, tag IDs → summaries, …). Kept strictly separate from
//! mutation logic. A reference whose document vanished under a concurrent
//! delete is skipped, never an error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use jobgrid_common::{
    Application, ApplicationStatus, Comment, Company, Cv, Job, Message, Post, PostKind, Result,
    Role, Room, Tag, User,
};
use jobgrid_store::{Collection, EntityStore};

use crate::maintainer::store_err;

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub avatar: Option<String>,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            avatar: user.avatar.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TagSummary {
    pub id: Uuid,
    pub name: String,
}

impl From<&Tag> for TagSummary {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanySummary {
    pub id: Uuid,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<&Company> for CompanySummary {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id,
            name: company.name.clone(),
            avatar: company.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CvSummary {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
}

impl From<&Cv> for CvSummary {
    fn from(cv: &Cv) -> Self {
        Self {
            id: cv.id,
            name: cv.name.clone(),
            image: cv.image.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub image: Option<String>,
    pub kind: PostKind,
    pub created_at: DateTime<Utc>,
    pub author: Option<UserSummary>,
    pub tags: Vec<TagSummary>,
    pub likes: Vec<Uuid>,
    pub unicorns: Vec<Uuid>,
    pub bookmarks: Vec<Uuid>,
    pub comments: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub salary: Option<String>,
    pub openings: Option<u32>,
    pub working_format: Option<String>,
    pub experience: Option<String>,
    pub working_address: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub author: Option<UserSummary>,
    pub company: Option<CompanySummary>,
    pub tags: Vec<TagSummary>,
    pub bookmarks: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub post: Uuid,
    pub author: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub id: Uuid,
    pub body: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub job: Uuid,
    pub applicant: Option<UserSummary>,
    pub cv: Option<CvSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub founded_year: Option<String>,
    pub scale: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub members: Vec<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagView {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub followers: Vec<Uuid>,
    pub posts: Vec<Post>,
    pub jobs: Vec<Job>,
}

/// Profile page: the user's own posts, followed tags, and company expanded
/// one level.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub location: Option<String>,
    pub work: Option<String>,
    pub skills: Option<String>,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub posts: Vec<Post>,
    pub jobs: Vec<Uuid>,
    pub cvs: Vec<Uuid>,
    pub applications: Vec<Uuid>,
    pub comments: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub followed_tags: Vec<TagSummary>,
    pub company: Option<CompanySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomView {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub members: Vec<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub room: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub sender: Option<UserSummary>,
}

pub struct Projector {
    store: Arc<dyn EntityStore>,
}

impl Projector {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Batch point lookups; silently skips IDs whose document is gone.
    async fn load_map<T: serde::de::DeserializeOwned>(
        &self,
        collection: Collection,
        ids: &HashSet<Uuid>,
    ) -> Result<HashMap<Uuid, T>> {
        let mut map = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(doc) = self.store.get(collection, *id).await.map_err(store_err)? {
                map.insert(*id, doc.decode().map_err(store_err)?);
            }
        }
        Ok(map)
    }

    async fn user_summaries(&self, ids: &HashSet<Uuid>) -> Result<HashMap<Uuid, UserSummary>> {
        let users: HashMap<Uuid, User> = self.load_map(Collection::Users, ids).await?;
        Ok(users.iter().map(|(id, u)| (*id, UserSummary::from(u))).collect())
    }

    pub async fn post(&self, post: Post) -> Result<PostView> {
        Ok(self.posts(vec![post]).await?.pop().expect("one view per post"))
    }

    pub async fn posts(&self, posts: Vec<Post>) -> Result<Vec<PostView>> {
        let author_ids: HashSet<Uuid> = posts.iter().map(|p| p.author).collect();
        let tag_ids: HashSet<Uuid> = posts.iter().flat_map(|p| p.tags.iter().copied()).collect();
        let authors = self.user_summaries(&author_ids).await?;
        let tags: HashMap<Uuid, Tag> = self.load_map(Collection::Tags, &tag_ids).await?;

        Ok(posts
            .into_iter()
            .map(|p| PostView {
                id: p.id,
                title: p.title,
                slug: p.slug,
                body: p.body,
                image: p.image,
                kind: p.kind,
                created_at: p.created_at,
                author: authors.get(&p.author).cloned(),
                tags: p
                    .tags
                    .iter()
                    .filter_map(|id| tags.get(id).map(TagSummary::from))
                    .collect(),
                likes: p.likes,
                unicorns: p.unicorns,
                bookmarks: p.bookmarks,
                comments: p.comments,
            })
            .collect())
    }

    pub async fn job(&self, job: Job) -> Result<JobView> {
        Ok(self.jobs(vec![job]).await?.pop().expect("one view per job"))
    }

    pub async fn jobs(&self, jobs: Vec<Job>) -> Result<Vec<JobView>> {
        let author_ids: HashSet<Uuid> = jobs.iter().map(|j| j.author).collect();
        let company_ids: HashSet<Uuid> = jobs.iter().filter_map(|j| j.company).collect();
        let tag_ids: HashSet<Uuid> = jobs.iter().flat_map(|j| j.tags.iter().copied()).collect();
        let authors = self.user_summaries(&author_ids).await?;
        let companies: HashMap<Uuid, Company> =
            self.load_map(Collection::Companies, &company_ids).await?;
        let tags: HashMap<Uuid, Tag> = self.load_map(Collection::Tags, &tag_ids).await?;

        Ok(jobs
            .into_iter()
            .map(|j| JobView {
                id: j.id,
                title: j.title,
                description: j.description,
                deadline: j.deadline,
                salary: j.salary,
                openings: j.openings,
                working_format: j.working_format,
                experience: j.experience,
                working_address: j.working_address,
                status: j.status,
                created_at: j.created_at,
                author: authors.get(&j.author).cloned(),
                company: j
                    .company
                    .and_then(|id| companies.get(&id).map(CompanySummary::from)),
                tags: j
                    .tags
                    .iter()
                    .filter_map(|id| tags.get(id).map(TagSummary::from))
                    .collect(),
                bookmarks: j.bookmarks,
            })
            .collect())
    }

    pub async fn comments(&self, comments: Vec<Comment>) -> Result<Vec<CommentView>> {
        let author_ids: HashSet<Uuid> = comments.iter().map(|c| c.author).collect();
        let authors = self.user_summaries(&author_ids).await?;
        Ok(comments
            .into_iter()
            .map(|c| CommentView {
                id: c.id,
                body: c.body,
                created_at: c.created_at,
                post: c.post,
                author: authors.get(&c.author).cloned(),
            })
            .collect())
    }

    pub async fn applications(
        &self,
        applications: Vec<Application>,
    ) -> Result<Vec<ApplicationView>> {
        let applicant_ids: HashSet<Uuid> = applications.iter().map(|a| a.applicant).collect();
        let cv_ids: HashSet<Uuid> = applications.iter().map(|a| a.cv).collect();
        let applicants = self.user_summaries(&applicant_ids).await?;
        let cvs: HashMap<Uuid, Cv> = self.load_map(Collection::Cvs, &cv_ids).await?;

        Ok(applications
            .into_iter()
            .map(|a| ApplicationView {
                id: a.id,
                body: a.body,
                status: a.status,
                created_at: a.created_at,
                job: a.job,
                applicant: applicants.get(&a.applicant).cloned(),
                cv: cvs.get(&a.cv).map(CvSummary::from),
            })
            .collect())
    }

    pub async fn application(&self, application: Application) -> Result<ApplicationView> {
        Ok(self
            .applications(vec![application])
            .await?
            .pop()
            .expect("one view per application"))
    }

    pub async fn company(&self, company: Company) -> Result<CompanyView> {
        let member_ids: HashSet<Uuid> = company.members.iter().copied().collect();
        let members = self.user_summaries(&member_ids).await?;
        Ok(CompanyView {
            id: company.id,
            name: company.name,
            description: company.description,
            founded_year: company.founded_year,
            scale: company.scale,
            address: company.address,
            contact: company.contact,
            avatar: company.avatar,
            created_at: company.created_at,
            members: company
                .members
                .iter()
                .filter_map(|id| members.get(id).cloned())
                .collect(),
        })
    }

    pub async fn tag(&self, tag: Tag) -> Result<TagView> {
        let post_ids: HashSet<Uuid> = tag.posts.iter().copied().collect();
        let job_ids: HashSet<Uuid> = tag.jobs.iter().copied().collect();
        let posts: HashMap<Uuid, Post> = self.load_map(Collection::Posts, &post_ids).await?;
        let jobs: HashMap<Uuid, Job> = self.load_map(Collection::Jobs, &job_ids).await?;
        Ok(TagView {
            id: tag.id,
            name: tag.name,
            created_at: tag.created_at,
            followers: tag.followers,
            posts: tag.posts.iter().filter_map(|id| posts.get(id).cloned()).collect(),
            jobs: tag.jobs.iter().filter_map(|id| jobs.get(id).cloned()).collect(),
        })
    }

    pub async fn user(&self, user: User) -> Result<UserView> {
        let post_ids: HashSet<Uuid> = user.posts.iter().copied().collect();
        let tag_ids: HashSet<Uuid> = user.followed_tags.iter().copied().collect();
        let posts: HashMap<Uuid, Post> = self.load_map(Collection::Posts, &post_ids).await?;
        let tags: HashMap<Uuid, Tag> = self.load_map(Collection::Tags, &tag_ids).await?;
        let company = match user.company {
            Some(id) => self
                .store
                .get(Collection::Companies, id)
                .await
                .map_err(store_err)?
                .map(|doc| doc.decode::<Company>().map_err(store_err))
                .transpose()?
                .map(|c| CompanySummary::from(&c)),
            None => None,
        };
        Ok(UserView {
            id: user.id,
            name: user.name,
            email: user.email,
            bio: user.bio,
            avatar: user.avatar,
            location: user.location,
            work: user.work,
            skills: user.skills,
            role: user.role,
            joined_at: user.joined_at,
            posts: user.posts.iter().filter_map(|id| posts.get(id).cloned()).collect(),
            jobs: user.jobs,
            cvs: user.cvs,
            applications: user.applications,
            comments: user.comments,
            following: user.following,
            followers: user.followers,
            followed_tags: user
                .followed_tags
                .iter()
                .filter_map(|id| tags.get(id).map(TagSummary::from))
                .collect(),
            company,
        })
    }

    pub async fn rooms(&self, rooms: Vec<Room>) -> Result<Vec<RoomView>> {
        let member_ids: HashSet<Uuid> = rooms
            .iter()
            .flat_map(|r| r.members.iter().copied())
            .collect();
        let members = self.user_summaries(&member_ids).await?;
        Ok(rooms
            .into_iter()
            .map(|r| RoomView {
                id: r.id,
                name: r.name,
                created_at: r.created_at,
                members: r
                    .members
                    .iter()
                    .filter_map(|id| members.get(id).cloned())
                    .collect(),
            })
            .collect())
    }

    pub async fn room(&self, room: Room) -> Result<RoomView> {
        Ok(self.rooms(vec![room]).await?.pop().expect("one view per room"))
    }

    pub async fn messages(&self, messages: Vec<Message>) -> Result<Vec<MessageView>> {
        let sender_ids: HashSet<Uuid> = messages.iter().map(|m| m.sender).collect();
        let senders = self.user_summaries(&sender_ids).await?;
        Ok(messages
            .into_iter()
            .map(|m| MessageView {
                id: m.id,
                room: m.room,
                body: m.body,
                created_at: m.created_at,
                sender: senders.get(&m.sender).cloned(),
            })
            .collect())
    }
}

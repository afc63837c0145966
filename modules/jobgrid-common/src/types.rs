use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Recruiter,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Recruiter => write!(f, "recruiter"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Feed posts come in two flavors: regular content and job announcements
/// surfaced in the same feed. Structured job listings are their own entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Post,
    Job,
}

impl std::fmt::Display for PostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostKind::Post => write!(f, "post"),
            PostKind::Job => write!(f, "job"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    /// Pending may be decided either way; a decided status is terminal.
    /// Re-asserting the current status is an idempotent no-op.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        self == next || self == ApplicationStatus::Pending
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationStatus::Pending => write!(f, "pending"),
            ApplicationStatus::Approved => write!(f, "approved"),
            ApplicationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Follow,
    Comment,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Like => write!(f, "like"),
            NotificationKind::Follow => write!(f, "follow"),
            NotificationKind::Comment => write!(f, "comment"),
        }
    }
}

// --- Entities ---
//
// Cross-references are stored as ID arrays/scalars on both participating
// documents. Mirrored pairs (User.following ↔ User.followers, Tag.posts ↔
// Post.tags, Company.members ↔ User.company, Tag.followers ↔
// User.followed_tags, User.posts ↔ Post.author, …) are written only by the
// graph maintainer, both sides in one transaction.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
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

    pub posts: Vec<Uuid>,
    pub jobs: Vec<Uuid>,
    pub cvs: Vec<Uuid>,
    pub applications: Vec<Uuid>,
    pub comments: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub followed_tags: Vec<Uuid>,
    pub company: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub image: Option<String>,
    pub kind: PostKind,
    pub created_at: DateTime<Utc>,
    pub author: Uuid,

    pub tags: Vec<Uuid>,
    pub likes: Vec<Uuid>,
    pub unicorns: Vec<Uuid>,
    pub bookmarks: Vec<Uuid>,
    pub comments: Vec<Uuid>,
}

/// Structured job listing. Deadline/compensation fields beyond what a feed
/// post carries; referenced by Applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
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
    pub author: Uuid,
    pub company: Option<Uuid>,

    pub tags: Vec<Uuid>,
    pub bookmarks: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub author: Uuid,
    pub post: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub body: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub job: Uuid,
    pub applicant: Uuid,
    pub cv: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cv {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub founded_year: Option<String>,
    pub scale: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,

    pub members: Vec<Uuid>,
}

/// Tag names are stored lowercase and matched case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,

    pub posts: Vec<Uuid>,
    pub jobs: Vec<Uuid>,
    pub followers: Vec<Uuid>,
}

/// Immutable once created, except for the one-way unread → read transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub actor: Uuid,
    pub recipient: Uuid,
    pub subject: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub members: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Immutable. Replay order is the store's insertion sequence, not this
/// wall-clock timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub room: Uuid,
    pub sender: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// --- Creation inputs ---
//
// Deserialized straight from request bodies; the graph maintainer owns ID
// assignment, timestamps, and all reference wiring.

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub body: String,
    #[serde(default)]
    pub image: Option<String>,
    pub kind: PostKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub openings: Option<u32>,
    #[serde(default)]
    pub working_format: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub working_address: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCv {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewApplication {
    pub job: Uuid,
    pub cv: Uuid,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub founded_year: Option<String>,
    #[serde(default)]
    pub scale: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_be_decided() {
        assert!(ApplicationStatus::Pending.can_transition_to(ApplicationStatus::Approved));
        assert!(ApplicationStatus::Pending.can_transition_to(ApplicationStatus::Rejected));
    }

    #[test]
    fn decided_status_is_terminal() {
        assert!(!ApplicationStatus::Approved.can_transition_to(ApplicationStatus::Rejected));
        assert!(!ApplicationStatus::Rejected.can_transition_to(ApplicationStatus::Approved));
        assert!(!ApplicationStatus::Approved.can_transition_to(ApplicationStatus::Pending));
    }

    #[test]
    fn reasserting_status_is_allowed() {
        assert!(ApplicationStatus::Approved.can_transition_to(ApplicationStatus::Approved));
        assert!(ApplicationStatus::Pending.can_transition_to(ApplicationStatus::Pending));
    }
}

//! Shared harness: a maintainer + reader over a fresh in-memory store.

use std::sync::Arc;

use jobgrid_common::{NewUser, User};
use jobgrid_graph::{GraphMaintainer, GraphReader};
use jobgrid_store::MemoryStore;

pub fn graph() -> (GraphMaintainer, GraphReader) {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    (
        GraphMaintainer::new(store.clone()),
        GraphReader::new(store),
    )
}

pub async fn user(maintainer: &GraphMaintainer, name: &str) -> User {
    maintainer
        .create_user(NewUser {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            bio: None,
            avatar: None,
        })
        .await
        .expect("test user")
}

pub fn new_post(title: &str) -> jobgrid_common::NewPost {
    jobgrid_common::NewPost {
        title: title.to_string(),
        slug: title.to_lowercase().replace(' ', "-"),
        body: "body".to_string(),
        image: None,
        kind: jobgrid_common::PostKind::Post,
    }
}

pub fn new_job(title: &str) -> jobgrid_common::NewJob {
    jobgrid_common::NewJob {
        title: title.to_string(),
        description: "description".to_string(),
        deadline: chrono::Utc::now() + chrono::Duration::days(30),
        salary: Some("negotiable".to_string()),
        openings: Some(2),
        working_format: None,
        experience: None,
        working_address: None,
        status: "open".to_string(),
    }
}

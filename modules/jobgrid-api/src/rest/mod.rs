pub mod applications;
pub mod companies;
pub mod cvs;
pub mod jobs;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod rooms;
pub mod tags;
pub mod users;

use serde::Deserialize;

// --- Shared query structs ---

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl PageQuery {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(10).clamp(1, 100)
    }

    /// Apply simple offset pagination to an already-ordered list.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip((self.page() - 1) * self.page_size())
            .take(self.page_size())
            .collect()
    }
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

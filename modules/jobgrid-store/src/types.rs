//! Store-level vocabulary: collections, documents, filters, transactions.
//!
//! The store knows nothing about the domain. It holds JSON documents keyed
//! by `(Collection, Uuid)`, attaches a revision (`rev`) for optimistic
//! concurrency and a global insertion sequence (`seq`) that is the
//! authoritative replay order. Referential integrity between documents is
//! the graph maintainer's job, not the store's.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// One physical collection per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Posts,
    Jobs,
    Cvs,
    Applications,
    Companies,
    Tags,
    Comments,
    Notifications,
    Rooms,
    Messages,
}

impl Collection {
    pub const ALL: [Collection; 11] = [
        Collection::Users,
        Collection::Posts,
        Collection::Jobs,
        Collection::Cvs,
        Collection::Applications,
        Collection::Companies,
        Collection::Tags,
        Collection::Comments,
        Collection::Notifications,
        Collection::Rooms,
        Collection::Messages,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Posts => "posts",
            Collection::Jobs => "jobs",
            Collection::Cvs => "cvs",
            Collection::Applications => "applications",
            Collection::Companies => "companies",
            Collection::Tags => "tags",
            Collection::Comments => "comments",
            Collection::Notifications => "notifications",
            Collection::Rooms => "rooms",
            Collection::Messages => "messages",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document plus its store metadata.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    /// Bumped on every update. Guards compare against the rev observed at
    /// read time; a mismatch aborts the whole transaction.
    pub rev: i64,
    /// Global insertion order, assigned once at insert.
    pub seq: i64,
    pub body: Value,
}

impl Document {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("document decode: {e}")))
    }
}

/// Filter conditions over top-level document fields, ANDed together.
#[derive(Debug, Clone)]
pub enum Cond {
    /// Field equals the given JSON value.
    Eq(&'static str, Value),
    /// Array field contains the given JSON value.
    Contains(&'static str, Value),
}

#[derive(Debug, Clone, Default)]
pub struct Filter {
    conds: Vec<Cond>,
}

impl Filter {
    pub fn all() -> Self {
        Filter::default()
    }

    pub fn new() -> Self {
        Filter::default()
    }

    pub fn eq(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.conds.push(Cond::Eq(field, value.into()));
        self
    }

    pub fn contains(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.conds.push(Cond::Contains(field, value.into()));
        self
    }

    pub fn conds(&self) -> &[Cond] {
        &self.conds
    }

    /// Evaluate against a document body. Shared by the memory engine; the
    /// Postgres engine compiles the same conditions to JSONB containment.
    pub fn matches(&self, body: &Value) -> bool {
        self.conds.iter().all(|cond| match cond {
            Cond::Eq(field, value) => body.get(field) == Some(value),
            Cond::Contains(field, value) => body
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
        })
    }
}

/// Precondition checked inside `apply` before any write lands.
#[derive(Debug, Clone)]
pub enum Guard {
    /// Document must exist at exactly this revision.
    Rev {
        collection: Collection,
        id: Uuid,
        rev: i64,
    },
    /// Document must not exist.
    Absent { collection: Collection, id: Uuid },
}

#[derive(Debug, Clone)]
pub enum WriteOp {
    Insert {
        collection: Collection,
        id: Uuid,
        body: Value,
    },
    Update {
        collection: Collection,
        id: Uuid,
        body: Value,
    },
    Delete {
        collection: Collection,
        id: Uuid,
    },
}

/// An atomic multi-document write: optimistic guards plus ops, applied
/// all-or-nothing. Any guard miss aborts the whole transaction.
#[derive(Debug, Clone, Default)]
pub struct Txn {
    guards: Vec<Guard>,
    ops: Vec<WriteOp>,
}

impl Txn {
    pub fn new() -> Self {
        Txn::default()
    }

    /// Guard that the document is still at the revision observed at read
    /// time. Callers add one guard per document they read before writing,
    /// including documents they are about to delete.
    pub fn expect_rev(&mut self, collection: Collection, id: Uuid, rev: i64) {
        self.guards.push(Guard::Rev {
            collection,
            id,
            rev,
        });
    }

    /// Insert a new document. Adds the implied absence guard.
    pub fn insert(&mut self, collection: Collection, id: Uuid, body: Value) {
        self.guards.push(Guard::Absent { collection, id });
        self.ops.push(WriteOp::Insert {
            collection,
            id,
            body,
        });
    }

    pub fn update(&mut self, collection: Collection, id: Uuid, body: Value) {
        self.ops.push(WriteOp::Update {
            collection,
            id,
            body,
        });
    }

    pub fn delete(&mut self, collection: Collection, id: Uuid) {
        self.ops.push(WriteOp::Delete { collection, id });
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// A guard failed or a concurrent writer won the race. The transaction
    /// left no trace; callers may re-read and retry.
    #[error("transaction aborted: {0}")]
    Aborted(String),

    #[error("store backend: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Generic persistent collection of documents: point lookups, filtered
/// scans (insertion order), and atomic multi-document transactions.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Matching documents in ascending `seq` order.
    async fn scan(&self, collection: Collection, filter: &Filter)
        -> Result<Vec<Document>, StoreError>;

    /// Apply all guards and writes atomically. On any guard miss the store
    /// is left untouched and `StoreError::Aborted` is returned.
    async fn apply(&self, txn: Txn) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_eq_matches_top_level_field() {
        let body = json!({"author": "abc", "title": "hello"});
        assert!(Filter::new().eq("author", json!("abc")).matches(&body));
        assert!(!Filter::new().eq("author", json!("xyz")).matches(&body));
    }

    #[test]
    fn filter_contains_matches_array_membership() {
        let body = json!({"members": ["a", "b"]});
        assert!(Filter::new().contains("members", json!("a")).matches(&body));
        assert!(!Filter::new().contains("members", json!("c")).matches(&body));
        // Non-array field never matches containment
        assert!(!Filter::new().contains("name", json!("a")).matches(&json!({"name": "a"})));
    }

    #[test]
    fn filter_conditions_are_anded() {
        let body = json!({"kind": "job", "author": "abc"});
        let filter = Filter::new().eq("kind", json!("job")).eq("author", json!("abc"));
        assert!(filter.matches(&body));
        let filter = Filter::new().eq("kind", json!("job")).eq("author", json!("nope"));
        assert!(!filter.matches(&body));
    }

    #[test]
    fn insert_implies_absence_guard() {
        let mut txn = Txn::new();
        txn.insert(Collection::Posts, Uuid::new_v4(), json!({}));
        assert_eq!(txn.guards().len(), 1);
        assert!(matches!(txn.guards()[0], Guard::Absent { .. }));
    }
}

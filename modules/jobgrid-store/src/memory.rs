//! In-memory store engine. Used by tests and by dev runs without a
//! DATABASE_URL. Single write lock per `apply`, so a transaction's guard
//! checks and writes are one atomic unit.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::{
    Collection, Document, EntityStore, Filter, Guard, StoreError, Txn, WriteOp,
};

#[derive(Debug, Clone)]
struct Versioned {
    rev: i64,
    seq: i64,
    body: Value,
}

#[derive(Debug, Default)]
struct Shelves {
    next_seq: i64,
    collections: HashMap<Collection, BTreeMap<Uuid, Versioned>>,
}

impl Shelves {
    fn get(&self, collection: Collection, id: &Uuid) -> Option<&Versioned> {
        self.collections.get(&collection).and_then(|docs| docs.get(id))
    }
}

pub struct MemoryStore {
    inner: RwLock<Shelves>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Shelves::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let shelves = self.inner.read().await;
        Ok(shelves.get(collection, &id).map(|v| Document {
            id,
            rev: v.rev,
            seq: v.seq,
            body: v.body.clone(),
        }))
    }

    async fn scan(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        let shelves = self.inner.read().await;
        let mut matched: Vec<Document> = shelves
            .collections
            .get(&collection)
            .into_iter()
            .flatten()
            .filter(|(_, v)| filter.matches(&v.body))
            .map(|(id, v)| Document {
                id: *id,
                rev: v.rev,
                seq: v.seq,
                body: v.body.clone(),
            })
            .collect();
        matched.sort_by_key(|d| d.seq);
        Ok(matched)
    }

    async fn apply(&self, txn: Txn) -> Result<(), StoreError> {
        let mut shelves = self.inner.write().await;

        // Validate every guard before touching anything.
        for guard in txn.guards() {
            match guard {
                Guard::Rev {
                    collection,
                    id,
                    rev,
                } => match shelves.get(*collection, id) {
                    Some(v) if v.rev == *rev => {}
                    Some(v) => {
                        return Err(StoreError::Aborted(format!(
                            "{collection}/{id}: expected rev {rev}, found {}",
                            v.rev
                        )))
                    }
                    None => {
                        return Err(StoreError::Aborted(format!(
                            "{collection}/{id}: expected rev {rev}, document gone"
                        )))
                    }
                },
                Guard::Absent { collection, id } => {
                    if shelves.get(*collection, id).is_some() {
                        return Err(StoreError::Aborted(format!(
                            "{collection}/{id}: expected absent, document exists"
                        )));
                    }
                }
            }
        }

        // Updates and deletes must target live documents. Checked up front
        // so a bad op leaves the store untouched.
        for op in txn.ops() {
            if let WriteOp::Update { collection, id, .. } | WriteOp::Delete { collection, id } = op
            {
                if shelves.get(*collection, id).is_none() {
                    return Err(StoreError::Aborted(format!(
                        "{collection}/{id}: write targets a missing document"
                    )));
                }
            }
        }

        for op in txn.ops() {
            match op {
                WriteOp::Insert {
                    collection,
                    id,
                    body,
                } => {
                    shelves.next_seq += 1;
                    let seq = shelves.next_seq;
                    shelves.collections.entry(*collection).or_default().insert(
                        *id,
                        Versioned {
                            rev: 1,
                            seq,
                            body: body.clone(),
                        },
                    );
                }
                WriteOp::Update {
                    collection,
                    id,
                    body,
                } => {
                    if let Some(doc) = shelves
                        .collections
                        .entry(*collection)
                        .or_default()
                        .get_mut(id)
                    {
                        doc.rev += 1;
                        doc.body = body.clone();
                    }
                }
                WriteOp::Delete { collection, id } => {
                    shelves
                        .collections
                        .entry(*collection)
                        .or_default()
                        .remove(id);
                }
            }
        }

        Ok(())
    }
}

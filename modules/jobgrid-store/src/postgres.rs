//! Postgres store engine — one `documents` table, JSONB bodies, BIGSERIAL
//! insertion sequence. Guards take row locks inside a SQL transaction, so
//! `apply` is all-or-nothing under read-committed isolation.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::types::{
    Collection, Cond, Document, EntityStore, Filter, Guard, StoreError, Txn, WriteOp,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .context("connecting to postgres")?;
        Ok(Self { pool })
    }

    /// Create the documents table and indexes if they don't exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id UUID NOT NULL,
                rev BIGINT NOT NULL,
                seq BIGSERIAL,
                body JSONB NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("creating documents table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS documents_collection_seq_idx
             ON documents (collection, seq)",
        )
        .execute(&self.pool)
        .await
        .context("creating seq index")?;

        Ok(())
    }
}

fn row_to_document(row: &sqlx::postgres::PgRow) -> Result<Document, StoreError> {
    Ok(Document {
        id: row.try_get("id").context("id column")?,
        rev: row.try_get("rev").context("rev column")?,
        seq: row.try_get("seq").context("seq column")?,
        body: row.try_get::<Value, _>("body").context("body column")?,
    })
}

#[async_trait]
impl EntityStore for PgStore {
    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            "SELECT id, rev, seq, body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("point lookup")?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn scan(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, rev, seq, body FROM documents WHERE collection = ");
        qb.push_bind(collection.as_str());

        for cond in filter.conds() {
            match cond {
                Cond::Eq(field, value) => {
                    // Top-level field equality via JSONB containment.
                    qb.push(" AND body @> ");
                    qb.push_bind(Value::Object(
                        [(field.to_string(), value.clone())].into_iter().collect(),
                    ));
                }
                Cond::Contains(field, value) => {
                    qb.push(" AND body -> ");
                    qb.push_bind(*field);
                    qb.push(" @> ");
                    qb.push_bind(Value::Array(vec![value.clone()]));
                }
            }
        }
        qb.push(" ORDER BY seq ASC");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("filtered scan")?;

        rows.iter().map(row_to_document).collect()
    }

    async fn apply(&self, txn: Txn) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.context("begin transaction")?;

        for guard in txn.guards() {
            match guard {
                Guard::Rev {
                    collection,
                    id,
                    rev,
                } => {
                    let row = sqlx::query(
                        "SELECT rev FROM documents
                         WHERE collection = $1 AND id = $2 FOR UPDATE",
                    )
                    .bind(collection.as_str())
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await
                    .context("rev guard lookup")?;

                    match row {
                        Some(row) => {
                            let found: i64 = row.try_get("rev").context("rev column")?;
                            if found != *rev {
                                return Err(StoreError::Aborted(format!(
                                    "{collection}/{id}: expected rev {rev}, found {found}"
                                )));
                            }
                        }
                        None => {
                            return Err(StoreError::Aborted(format!(
                                "{collection}/{id}: expected rev {rev}, document gone"
                            )));
                        }
                    }
                }
                Guard::Absent { collection, id } => {
                    let row = sqlx::query(
                        "SELECT 1 AS one FROM documents WHERE collection = $1 AND id = $2",
                    )
                    .bind(collection.as_str())
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await
                    .context("absence guard lookup")?;

                    if row.is_some() {
                        return Err(StoreError::Aborted(format!(
                            "{collection}/{id}: expected absent, document exists"
                        )));
                    }
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
                    let result = sqlx::query(
                        "INSERT INTO documents (collection, id, rev, body)
                         VALUES ($1, $2, 1, $3)
                         ON CONFLICT (collection, id) DO NOTHING",
                    )
                    .bind(collection.as_str())
                    .bind(id)
                    .bind(body)
                    .execute(&mut *tx)
                    .await
                    .context("insert")?;

                    if result.rows_affected() != 1 {
                        return Err(StoreError::Aborted(format!(
                            "{collection}/{id}: concurrent insert won"
                        )));
                    }
                }
                WriteOp::Update {
                    collection,
                    id,
                    body,
                } => {
                    let result = sqlx::query(
                        "UPDATE documents SET rev = rev + 1, body = $3
                         WHERE collection = $1 AND id = $2",
                    )
                    .bind(collection.as_str())
                    .bind(id)
                    .bind(body)
                    .execute(&mut *tx)
                    .await
                    .context("update")?;

                    if result.rows_affected() != 1 {
                        return Err(StoreError::Aborted(format!(
                            "{collection}/{id}: update targets a missing document"
                        )));
                    }
                }
                WriteOp::Delete { collection, id } => {
                    let result =
                        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                            .bind(collection.as_str())
                            .bind(id)
                            .execute(&mut *tx)
                            .await
                            .context("delete")?;

                    if result.rows_affected() != 1 {
                        return Err(StoreError::Aborted(format!(
                            "{collection}/{id}: delete targets a missing document"
                        )));
                    }
                }
            }
        }

        tx.commit().await.context("commit transaction")?;
        Ok(())
    }
}

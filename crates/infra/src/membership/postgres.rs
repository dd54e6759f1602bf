//! Postgres-backed membership store.
//!
//! ## Schema
//!
//! ```sql
//! CREATE TABLE collection_associations (
//!     item_id       BIGINT      NOT NULL,
//!     collection_id UUID        NOT NULL,
//!     created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (item_id, collection_id)
//! );
//! ```
//!
//! The primary key is the uniqueness constraint the idempotent writer relies on:
//! conflicting rows are skipped by `ON CONFLICT DO NOTHING`, and `RETURNING`
//! yields only the rows that were actually created.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | PoolClosed / PoolTimedOut / Io | `Unavailable` |
//! | anything else | `Database` (with the failing operation name) |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{instrument, Span};
use uuid::Uuid;

use relocate_core::{Association, CollectionId, ItemId};

use super::store::{MembershipStore, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS collection_associations (
    item_id       BIGINT      NOT NULL,
    collection_id UUID        NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (item_id, collection_id)
);
CREATE INDEX IF NOT EXISTS collection_associations_by_collection
    ON collection_associations (collection_id, created_at);
"#;

/// Postgres-backed membership store.
///
/// Uses the SQLx connection pool which is thread-safe (Arc + Send + Sync).
#[derive(Debug, Clone)]
pub struct PostgresMembershipStore {
    pool: Arc<PgPool>,
}

impl PostgresMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the association table and its lookup index if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for PostgresMembershipStore {
    #[instrument(skip_all, fields(collection_id = %collection_id, member_count = tracing::field::Empty), err)]
    async fn list_members(&self, collection_id: CollectionId) -> Result<Vec<ItemId>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT item_id
            FROM collection_associations
            WHERE collection_id = $1
            ORDER BY created_at ASC, item_id ASC
            "#,
        )
        .bind(collection_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_members", e))?;

        let members = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("item_id").map(ItemId::new))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_member", e))?;

        Span::current().record("member_count", members.len());
        Ok(members)
    }

    #[instrument(skip_all, fields(candidates = associations.len()), err)]
    async fn insert_if_absent(
        &self,
        associations: &[Association],
    ) -> Result<Vec<Association>, StoreError> {
        if associations.is_empty() {
            return Ok(vec![]);
        }

        let item_ids: Vec<i64> = associations.iter().map(|a| a.item_id.get()).collect();
        let collection_ids: Vec<Uuid> = associations
            .iter()
            .map(|a| *a.collection_id.as_uuid())
            .collect();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let rows = sqlx::query(
            r#"
            INSERT INTO collection_associations (item_id, collection_id)
            SELECT * FROM UNNEST($1::bigint[], $2::uuid[])
            ON CONFLICT (item_id, collection_id) DO NOTHING
            RETURNING item_id, collection_id
            "#,
        )
        .bind(&item_ids)
        .bind(&collection_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_associations", e))?;

        let mut inserted = Vec::with_capacity(rows.len());
        for row in &rows {
            let item_id: i64 = row
                .try_get("item_id")
                .map_err(|e| map_sqlx_error("decode_association", e))?;
            let collection_id: Uuid = row
                .try_get("collection_id")
                .map_err(|e| map_sqlx_error("decode_association", e))?;
            inserted.push(Association::new(
                ItemId::new(item_id),
                CollectionId::from_uuid(collection_id),
            ));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(inserted)
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("{operation}: {err}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("{operation}: {e}")),
        other => StoreError::database(operation, other.to_string()),
    }
}

//! Storage capability required by the relocation core.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use relocate_core::{Association, CollectionId, ItemId};

/// Storage operation error.
///
/// These are **infrastructure errors** as opposed to domain errors. Conflicting
/// inserts are not errors at all; they are reported as "not newly inserted".
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("database error during {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn database(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Database {
            operation,
            message: message.into(),
        }
    }
}

/// Membership persistence as seen by the relocation core.
///
/// Implementations must:
/// - keep at most one association per `(item, collection)` pair
/// - apply `insert_if_absent` as one transaction and report exactly the rows it created
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Every item currently associated with `collection_id`, in storage order.
    async fn list_members(&self, collection_id: CollectionId) -> Result<Vec<ItemId>, StoreError>;

    /// Create each association that does not exist yet; skip the rest silently.
    ///
    /// Returns the associations that were newly created.
    async fn insert_if_absent(
        &self,
        associations: &[Association],
    ) -> Result<Vec<Association>, StoreError>;
}

#[async_trait]
impl<S> MembershipStore for Arc<S>
where
    S: MembershipStore + ?Sized,
{
    async fn list_members(&self, collection_id: CollectionId) -> Result<Vec<ItemId>, StoreError> {
        (**self).list_members(collection_id).await
    }

    async fn insert_if_absent(
        &self,
        associations: &[Association],
    ) -> Result<Vec<Association>, StoreError> {
        (**self).insert_if_absent(associations).await
    }
}

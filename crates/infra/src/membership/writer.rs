//! Idempotent, chunked association writes.

use tracing::instrument;

use relocate_core::{Association, CollectionId, ItemId};

use super::store::{MembershipStore, StoreError};

/// Applies one chunk of items to a target collection.
///
/// Writes are commutative and conflict-safe: replaying a chunk, or running two
/// jobs against the same target, never creates a second row for a pair.
#[derive(Debug, Clone)]
pub struct AssociationWriter<S> {
    store: S,
}

impl<S: MembershipStore> AssociationWriter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Associate every item in `chunk` with `target`.
    ///
    /// Returns how many associations were newly created. The duplicates for this
    /// chunk are `chunk.len()` minus the returned count.
    #[instrument(skip_all, fields(target_collection = %target, chunk_len = chunk.len()), err)]
    pub async fn apply(&self, chunk: &[ItemId], target: CollectionId) -> Result<u64, StoreError> {
        if chunk.is_empty() {
            return Ok(0);
        }

        let candidates = Association::for_items(chunk, target);
        let inserted = self.store.insert_if_absent(&candidates).await?;
        Ok(inserted.len() as u64)
    }
}

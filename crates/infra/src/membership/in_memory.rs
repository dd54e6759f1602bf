use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use relocate_core::{Association, CollectionId, ItemId};

use super::store::{MembershipStore, StoreError};

#[derive(Debug, Default)]
struct Rows {
    /// Insertion order doubles as the natural return order of `list_members`.
    ordered: Vec<Association>,
    index: HashSet<Association>,
}

/// In-memory membership store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
    rows: RwLock<Rows>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `items` to `collection_id`, ignoring pairs that already exist.
    pub fn seed(
        &self,
        collection_id: CollectionId,
        items: impl IntoIterator<Item = ItemId>,
    ) -> Result<(), StoreError> {
        let mut rows = self.write_rows()?;
        for item_id in items {
            let association = Association::new(item_id, collection_id);
            if rows.index.insert(association) {
                rows.ordered.push(association);
            }
        }
        Ok(())
    }

    pub fn contains(&self, item_id: ItemId, collection_id: CollectionId) -> Result<bool, StoreError> {
        Ok(self
            .read_rows()?
            .index
            .contains(&Association::new(item_id, collection_id)))
    }

    /// Members of `collection_id` in insertion order.
    pub fn members(&self, collection_id: CollectionId) -> Result<Vec<ItemId>, StoreError> {
        Ok(self
            .read_rows()?
            .ordered
            .iter()
            .filter(|a| a.collection_id == collection_id)
            .map(|a| a.item_id)
            .collect())
    }

    /// Total number of association rows across all collections.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read_rows()?.ordered.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn read_rows(&self) -> Result<RwLockReadGuard<'_, Rows>, StoreError> {
        self.rows.read().map_err(|_| poisoned())
    }

    fn write_rows(&self) -> Result<RwLockWriteGuard<'_, Rows>, StoreError> {
        self.rows.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("membership lock poisoned".to_string())
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn list_members(&self, collection_id: CollectionId) -> Result<Vec<ItemId>, StoreError> {
        self.members(collection_id)
    }

    async fn insert_if_absent(
        &self,
        associations: &[Association],
    ) -> Result<Vec<Association>, StoreError> {
        // One write guard for the whole batch: the insert and its count are atomic.
        let mut rows = self.write_rows()?;

        let mut inserted = Vec::new();
        for &association in associations {
            if rows.index.insert(association) {
                rows.ordered.push(association);
                inserted.push(association);
            }
        }

        Ok(inserted)
    }
}

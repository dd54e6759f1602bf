//! Membership of one item in one collection.

use serde::{Deserialize, Serialize};

use crate::id::{CollectionId, ItemId};

/// A membership record linking one item to one collection.
///
/// Storage keeps at most one association per `(item, collection)` pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Association {
    pub item_id: ItemId,
    pub collection_id: CollectionId,
}

impl Association {
    pub fn new(item_id: ItemId, collection_id: CollectionId) -> Self {
        Self {
            item_id,
            collection_id,
        }
    }

    /// One candidate association per item, all targeting `collection_id`.
    pub fn for_items(items: &[ItemId], collection_id: CollectionId) -> Vec<Self> {
        items
            .iter()
            .map(|&item_id| Self::new(item_id, collection_id))
            .collect()
    }
}

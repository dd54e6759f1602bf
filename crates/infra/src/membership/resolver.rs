//! Resolution of a `Selection` into a concrete work set.

use tracing::debug;

use relocate_core::{CollectionId, ItemId, Selection};

use super::store::{MembershipStore, StoreError};

/// Turns a selection into the ordered, deduplicated list of items a job will move.
///
/// Resolution happens once, at submission time. The result is the job's entire
/// work set: later changes to the source collection do not affect it.
#[derive(Debug, Clone)]
pub struct MembershipResolver<S> {
    store: S,
}

impl<S: MembershipStore> MembershipResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve `selection` against `source`.
    ///
    /// - explicit ids: first-occurrence order, duplicates dropped, storage untouched
    /// - all-except: current members of `source` in storage order, minus exclusions
    pub async fn resolve(
        &self,
        selection: &Selection,
        source: CollectionId,
    ) -> Result<Vec<ItemId>, StoreError> {
        let resolved = match selection {
            Selection::Explicit { .. } => selection.apply(std::iter::empty()),
            Selection::AllExcept { .. } => {
                let members = self.store.list_members(source).await?;
                selection.apply(members)
            }
        };

        debug!(
            source_collection = %source,
            mode = ?selection.mode(),
            resolved = resolved.len(),
            "resolved move selection"
        );
        Ok(resolved)
    }
}

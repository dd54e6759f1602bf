//! Request-time description of which items a job should move.

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::ItemId;

/// Which items to move.
///
/// Exactly one mode applies. Explicit ids win when a caller sends both an id
/// list and the all-flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum Selection {
    /// A caller-supplied ordered list. Storage is never consulted.
    Explicit { ids: Vec<ItemId> },
    /// Every current member of the source collection, minus `exclude`.
    AllExcept { exclude: HashSet<ItemId> },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    Explicit,
    AllExcept,
}

impl Selection {
    pub fn explicit(ids: impl IntoIterator<Item = ItemId>) -> Self {
        Self::Explicit {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn all_except(exclude: impl IntoIterator<Item = ItemId>) -> Self {
        Self::AllExcept {
            exclude: exclude.into_iter().collect(),
        }
    }

    /// Build a selection from the loose wire shape (`ids?`, `all?`, `excludeIds`).
    pub fn from_parts(
        ids: Option<Vec<ItemId>>,
        all: Option<bool>,
        exclude_ids: Vec<ItemId>,
    ) -> DomainResult<Self> {
        match (ids, all) {
            (Some(ids), _) => Ok(Self::Explicit { ids }),
            (None, Some(true)) => Ok(Self::all_except(exclude_ids)),
            (None, _) => Err(DomainError::validation(
                "provide either selection.ids or selection.all=true",
            )),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        match self {
            Selection::Explicit { .. } => SelectionMode::Explicit,
            Selection::AllExcept { .. } => SelectionMode::AllExcept,
        }
    }

    /// Keep the members that are not excluded, preserving their order.
    ///
    /// Explicit selections ignore `members` and return their own deduplicated ids.
    pub fn apply(&self, members: impl IntoIterator<Item = ItemId>) -> Vec<ItemId> {
        match self {
            Selection::Explicit { ids } => dedup_preserving_order(ids.iter().copied()),
            Selection::AllExcept { exclude } => members
                .into_iter()
                .filter(|id| !exclude.contains(id))
                .collect(),
        }
    }
}

/// Remove exact duplicates, keeping the first occurrence of each value.
pub fn dedup_preserving_order<T>(values: impl IntoIterator<Item = T>) -> Vec<T>
where
    T: Eq + Hash + Copy,
{
    let mut seen = HashSet::new();
    values.into_iter().filter(|v| seen.insert(*v)).collect()
}

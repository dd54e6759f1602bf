//! `relocate-core` — domain foundation for batch relocation jobs.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod association;
pub mod error;
pub mod id;
pub mod selection;

pub use association::Association;
pub use error::{DomainError, DomainResult};
pub use id::{CollectionId, ItemId, JobId};
pub use selection::{dedup_preserving_order, Selection, SelectionMode};

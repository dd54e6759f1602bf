//! Collection membership: storage capability, resolution, and idempotent writes.
//!
//! ## Components
//!
//! - `MembershipStore`: "list members of X" + "insert-if-absent, returning what was new"
//! - `MembershipResolver`: turns a `Selection` into a fixed, ordered work set
//! - `AssociationWriter`: applies one chunk to storage and reports the inserted count

pub mod in_memory;
pub mod postgres;
pub mod resolver;
pub mod store;
pub mod writer;

pub use in_memory::InMemoryMembershipStore;
pub use postgres::PostgresMembershipStore;
pub use resolver::MembershipResolver;
pub use store::{MembershipStore, StoreError};
pub use writer::AssociationWriter;

//! Infrastructure layer: membership storage, move jobs, job ledger.

pub mod jobs;
pub mod membership;

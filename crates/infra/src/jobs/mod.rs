//! Background move jobs with a pollable, process-local status ledger.
//!
//! ## Design
//!
//! - The work set is resolved once, at submission, so `total` never changes
//! - One tokio task per job applies chunks strictly in order, pacing itself
//! - Writes are idempotent; re-running a job skips existing associations
//! - Failures end the job as `failed`; committed chunks are kept, nothing is retried
//!
//! ## Components
//!
//! - `MoveJob`: job record and state machine
//! - `JobLedger`: job registry (in-memory, volatile across restarts)
//! - `BatchRunner`: drives one job to a terminal state
//! - `MoveService`: submission + poll handlers

pub mod ledger;
pub mod runner;
pub mod service;
pub mod types;

pub use ledger::{InMemoryJobLedger, JobLedger, LedgerError};
pub use runner::{BatchConfig, BatchRunner, JobExecutionError};
pub use service::{MoveError, MoveRequest, MoveService};
pub use types::{MoveJob, MoveJobStatus};

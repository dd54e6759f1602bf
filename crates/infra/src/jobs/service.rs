//! Submission and poll handlers, independent of any transport.

use tracing::info;

use relocate_core::{CollectionId, DomainError, JobId, Selection};

use super::ledger::{JobLedger, LedgerError};
use super::runner::{BatchConfig, BatchRunner};
use super::types::MoveJob;
use crate::membership::{MembershipResolver, MembershipStore, StoreError};

/// A request to move a selection of items from one collection to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub source: CollectionId,
    pub target: CollectionId,
    pub selection: Selection,
}

impl MoveRequest {
    pub fn new(source: CollectionId, target: CollectionId, selection: Selection) -> Self {
        Self {
            source,
            target,
            selection,
        }
    }
}

/// Errors surfaced synchronously to submitters and pollers.
///
/// Failures during background execution are not here: they end up in the
/// job's `message` and are visible only by polling.
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<DomainError> for MoveError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::InvalidRequest(msg),
            other => Self::InvalidRequest(other.to_string()),
        }
    }
}

/// Entry point for starting move jobs and observing them.
pub struct MoveService<S, L> {
    resolver: MembershipResolver<S>,
    store: S,
    ledger: L,
    config: BatchConfig,
}

impl<S, L> MoveService<S, L>
where
    S: MembershipStore + Clone + 'static,
    L: JobLedger + Clone + 'static,
{
    pub fn new(store: S, ledger: L, config: BatchConfig) -> Self {
        Self {
            resolver: MembershipResolver::new(store.clone()),
            store,
            ledger,
            config,
        }
    }

    /// Validate, resolve the work set, register a queued job, and schedule it.
    ///
    /// Returns as soon as the job is registered; no chunk has been applied yet
    /// from the caller's point of view. `total` is final at this point.
    pub async fn start(&self, request: MoveRequest) -> Result<MoveJob, MoveError> {
        if request.source == request.target {
            return Err(MoveError::InvalidRequest(
                "source and target collections must differ".to_string(),
            ));
        }

        let items = self
            .resolver
            .resolve(&request.selection, request.source)
            .await?;

        let job = MoveJob::queued(JobId::new(), items.len() as u64);
        self.ledger.create(job.clone())?;

        info!(
            job_id = %job.job_id,
            source_collection = %request.source,
            target_collection = %request.target,
            total = job.total,
            "move job queued"
        );

        BatchRunner::new(self.store.clone(), self.ledger.clone(), self.config.clone()).spawn(
            job.clone(),
            items,
            request.target,
        );

        Ok(job)
    }

    /// Current snapshot of a job. Never waits on the job's runner.
    pub fn status(&self, job_id: JobId) -> Result<MoveJob, MoveError> {
        self.ledger
            .get(job_id)?
            .ok_or(MoveError::NotFound(job_id))
    }

    /// Most recently started jobs first.
    pub fn list(&self, limit: usize) -> Result<Vec<MoveJob>, MoveError> {
        Ok(self.ledger.list(limit)?)
    }
}

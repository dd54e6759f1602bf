//! Batch runner: drives one move job from `queued` to a terminal state.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use relocate_core::{CollectionId, DomainError, ItemId};

use super::ledger::{JobLedger, LedgerError};
use super::types::MoveJob;
use crate::membership::{AssociationWriter, MembershipStore, StoreError};

/// Default number of items written per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1;

/// Default pause between chunks, in milliseconds.
pub const DEFAULT_PACING_MS: u64 = 100;

/// Batch runner configuration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Items per write; progress is reported at this granularity
    pub chunk_size: usize,
    /// Pause after each chunk, throttling writes for downstream consumers
    pub pacing: Duration,
    /// Name for logging
    pub name: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            pacing: Duration::from_millis(DEFAULT_PACING_MS),
            name: "move-runner".to_string(),
        }
    }
}

impl BatchConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `MOVE_CHUNK_SIZE` | `1` | Items per chunk (min 1) |
    /// | `MOVE_PACING_MS` | `100` | Pause after each chunk |
    pub fn from_env() -> Self {
        let chunk_size = std::env::var("MOVE_CHUNK_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_CHUNK_SIZE);

        let pacing_ms = std::env::var("MOVE_PACING_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_PACING_MS);

        Self::default()
            .with_chunk_size(chunk_size)
            .with_pacing(Duration::from_millis(pacing_ms))
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Anything that aborts a running job. Recorded into the job's `message`.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    #[error("write failed: {0}")]
    Store(#[from] StoreError),
    #[error("ledger update failed: {0}")]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Applies a resolved work set to a target collection, one chunk at a time.
///
/// The runner is the only writer of its job's ledger entry. Chunks run strictly
/// in order, so `moved` is always a prefix count of the work set.
pub struct BatchRunner<S, L> {
    writer: AssociationWriter<S>,
    ledger: L,
    config: BatchConfig,
}

impl<S, L> BatchRunner<S, L>
where
    S: MembershipStore + 'static,
    L: JobLedger + 'static,
{
    pub fn new(store: S, ledger: L, config: BatchConfig) -> Self {
        Self {
            writer: AssociationWriter::new(store),
            ledger,
            config,
        }
    }

    /// Run the job on the tokio scheduler without waiting for it.
    ///
    /// The run happens in a child task. If it panics, the last published
    /// snapshot is marked `failed` so pollers still see a terminal state.
    pub fn spawn(self, job: MoveJob, items: Vec<ItemId>, target: CollectionId) -> JoinHandle<MoveJob> {
        let runner = Arc::new(self);
        tokio::spawn(async move {
            let fallback = job.clone();
            let worker = Arc::clone(&runner);
            match tokio::spawn(async move { worker.run(job, items, target).await }).await {
                Ok(job) => job,
                Err(e) => runner.fail_after_panic(fallback, e),
            }
        })
    }

    fn fail_after_panic(&self, fallback: MoveJob, err: JoinError) -> MoveJob {
        let reason = panic_message(err);
        error!(
            runner = %self.config.name,
            job_id = %fallback.job_id,
            error = %reason,
            "move job task panicked"
        );

        let mut job = match self.ledger.get(fallback.job_id) {
            Ok(Some(job)) => job,
            _ => fallback,
        };
        if job.is_terminal() {
            return job;
        }

        if let Err(e) = job.mark_failed(format!("runner panicked: {reason}")) {
            error!(job_id = %job.job_id, error = %e, "cannot mark job failed");
            return job;
        }
        if let Err(e) = self.ledger.update(&job) {
            error!(job_id = %job.job_id, error = %e, "failed to publish terminal job state");
        }
        job
    }

    /// Run the job to a terminal state and return its final snapshot.
    ///
    /// Errors never escape: they end the job as `failed` with a message.
    /// Chunks committed before the failure are not rolled back.
    pub async fn run(&self, mut job: MoveJob, items: Vec<ItemId>, target: CollectionId) -> MoveJob {
        let outcome = match self.execute(&mut job, &items, target).await {
            Ok(()) => job.mark_completed().map_err(JobExecutionError::from),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => info!(
                runner = %self.config.name,
                job_id = %job.job_id,
                moved = job.moved,
                duplicates = job.duplicates,
                "move job completed"
            ),
            Err(err) => {
                warn!(
                    runner = %self.config.name,
                    job_id = %job.job_id,
                    moved = job.moved,
                    total = job.total,
                    error = %err,
                    "move job failed"
                );
                if let Err(e) = job.mark_failed(err.to_string()) {
                    error!(job_id = %job.job_id, error = %e, "cannot mark job failed");
                    return job;
                }
            }
        }

        if let Err(e) = self.ledger.update(&job) {
            error!(job_id = %job.job_id, error = %e, "failed to publish terminal job state");
        }
        job
    }

    async fn execute(
        &self,
        job: &mut MoveJob,
        items: &[ItemId],
        target: CollectionId,
    ) -> Result<(), JobExecutionError> {
        job.mark_running()?;
        self.ledger.update(job)?;
        info!(
            runner = %self.config.name,
            job_id = %job.job_id,
            total = job.total,
            target_collection = %target,
            "move job started"
        );

        for chunk in items.chunks(self.config.chunk_size.max(1)) {
            let inserted = self.writer.apply(chunk, target).await?;
            job.record_chunk(chunk.len() as u64, inserted)?;
            self.ledger.update(job)?;

            debug!(
                job_id = %job.job_id,
                moved = job.moved,
                total = job.total,
                duplicates = job.duplicates,
                "chunk applied"
            );

            tokio::time::sleep(self.config.pacing).await;
        }

        Ok(())
    }
}

fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string()),
        Err(err) => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use relocate_core::{Association, JobId};

    use super::*;
    use crate::jobs::ledger::InMemoryJobLedger;
    use crate::jobs::types::MoveJobStatus;
    use crate::membership::InMemoryMembershipStore;

    fn ids(raw: &[i64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId::new).collect()
    }

    fn fast_config() -> BatchConfig {
        BatchConfig::default().with_pacing(Duration::ZERO)
    }

    /// Delegates to an in-memory store but refuses to write one poisoned item.
    struct FailingOn {
        inner: Arc<InMemoryMembershipStore>,
        poisoned: ItemId,
    }

    #[async_trait]
    impl MembershipStore for FailingOn {
        async fn list_members(&self, collection_id: CollectionId) -> Result<Vec<ItemId>, StoreError> {
            self.inner.list_members(collection_id).await
        }

        async fn insert_if_absent(
            &self,
            associations: &[Association],
        ) -> Result<Vec<Association>, StoreError> {
            if associations.iter().any(|a| a.item_id == self.poisoned) {
                return Err(StoreError::database("insert_associations", "trigger rejected row"));
            }
            self.inner.insert_if_absent(associations).await
        }
    }

    async fn run_job(
        store: impl MembershipStore + 'static,
        ledger: Arc<InMemoryJobLedger>,
        config: BatchConfig,
        items: Vec<ItemId>,
        target: CollectionId,
    ) -> MoveJob {
        let job = MoveJob::queued(JobId::new(), items.len() as u64);
        ledger.create(job.clone()).unwrap();
        BatchRunner::new(store, ledger, config).run(job, items, target).await
    }

    #[tokio::test]
    async fn completes_with_all_items_new() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let ledger = InMemoryJobLedger::arc();
        let target = CollectionId::new();

        let job = run_job(store.clone(), ledger.clone(), fast_config(), ids(&[1, 2]), target).await;

        assert_eq!(job.status, MoveJobStatus::Completed);
        assert_eq!((job.moved, job.total, job.duplicates), (2, 2, 0));
        assert!(job.finished_at.is_some());
        assert_eq!(ledger.get(job.job_id).unwrap(), Some(job));
        assert_eq!(store.list_members(target).await.unwrap(), ids(&[1, 2]));
    }

    #[tokio::test]
    async fn existing_associations_are_counted_as_duplicates() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let target = CollectionId::new();
        store.seed(target, ids(&[1])).unwrap();

        let job = run_job(store, InMemoryJobLedger::arc(), fast_config(), ids(&[1, 2]), target).await;

        assert_eq!(job.status, MoveJobStatus::Completed);
        assert_eq!((job.moved, job.duplicates), (2, 1));
    }

    #[tokio::test]
    async fn larger_chunks_keep_the_same_accounting() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let target = CollectionId::new();
        store.seed(target, ids(&[2, 4])).unwrap();

        let config = fast_config().with_chunk_size(3);
        let job = run_job(store.clone(), InMemoryJobLedger::arc(), config, ids(&[1, 2, 3, 4, 5]), target).await;

        assert_eq!(job.status, MoveJobStatus::Completed);
        assert_eq!((job.moved, job.duplicates), (5, 2));
        assert_eq!(store.len().unwrap(), 5);
    }

    #[tokio::test]
    async fn empty_work_set_completes_immediately() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let job = run_job(store, InMemoryJobLedger::arc(), fast_config(), Vec::new(), CollectionId::new()).await;

        assert_eq!(job.status, MoveJobStatus::Completed);
        assert_eq!((job.moved, job.total), (0, 0));
    }

    #[tokio::test]
    async fn failure_mid_stream_keeps_committed_prefix() {
        let inner = Arc::new(InMemoryMembershipStore::new());
        let store = FailingOn {
            inner: inner.clone(),
            poisoned: ItemId::new(30),
        };
        let ledger = InMemoryJobLedger::arc();
        let target = CollectionId::new();

        let job = run_job(store, ledger.clone(), fast_config(), ids(&[10, 20, 30, 40, 50]), target).await;

        assert_eq!(job.status, MoveJobStatus::Failed);
        assert_eq!(job.moved, 2);
        assert_eq!(job.total, 5);
        assert!(job.finished_at.is_some());
        assert!(job.message.as_deref().unwrap().contains("trigger rejected row"));

        assert!(inner.contains(ItemId::new(10), target).unwrap());
        assert!(inner.contains(ItemId::new(20), target).unwrap());
        assert!(!inner.contains(ItemId::new(40), target).unwrap());

        let stored = ledger.get(job.job_id).unwrap().unwrap();
        assert_eq!(stored, job);
    }

    #[tokio::test]
    async fn spawned_runner_publishes_progress_to_ledger() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let ledger = InMemoryJobLedger::arc();
        let job = MoveJob::queued(JobId::new(), 3);
        ledger.create(job.clone()).unwrap();

        let handle = BatchRunner::new(store, ledger.clone(), fast_config())
            .spawn(job.clone(), ids(&[1, 2, 3]), CollectionId::new());
        let finished = handle.await.unwrap();

        assert_eq!(finished.status, MoveJobStatus::Completed);
        assert_eq!(ledger.get(job.job_id).unwrap().unwrap().moved, 3);
    }

    /// Panics on every write, as a buggy driver would.
    struct PanickingStore;

    #[async_trait]
    impl MembershipStore for PanickingStore {
        async fn list_members(&self, _: CollectionId) -> Result<Vec<ItemId>, StoreError> {
            Ok(Vec::new())
        }

        async fn insert_if_absent(
            &self,
            associations: &[Association],
        ) -> Result<Vec<Association>, StoreError> {
            panic!("driver bug writing {} rows", associations.len());
        }
    }

    #[tokio::test]
    async fn panicking_store_still_ends_the_job_as_failed() {
        let ledger = InMemoryJobLedger::arc();
        let job = MoveJob::queued(JobId::new(), 2);
        ledger.create(job.clone()).unwrap();

        let finished = BatchRunner::new(PanickingStore, ledger.clone(), fast_config())
            .spawn(job.clone(), ids(&[1, 2]), CollectionId::new())
            .await
            .unwrap();

        assert_eq!(finished.status, MoveJobStatus::Failed);
        assert_eq!(finished.moved, 0);
        assert!(finished.finished_at.is_some());
        assert!(finished.message.as_deref().unwrap().contains("driver bug"));
        assert_eq!(ledger.get(job.job_id).unwrap(), Some(finished));
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_between_chunks() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let ledger = InMemoryJobLedger::arc();
        let pacing = Duration::from_millis(50);
        let job = MoveJob::queued(JobId::new(), 3);
        ledger.create(job.clone()).unwrap();

        let started = tokio::time::Instant::now();
        let handle = BatchRunner::new(store, ledger.clone(), BatchConfig::default().with_pacing(pacing))
            .spawn(job.clone(), ids(&[1, 2, 3]), CollectionId::new());

        // Between the second and third chunk.
        tokio::time::sleep(Duration::from_millis(75)).await;
        let midway = ledger.get(job.job_id).unwrap().unwrap();
        assert_eq!(midway.status, MoveJobStatus::Running);
        assert!(midway.moved > 0 && midway.moved < midway.total);
        assert!(midway.finished_at.is_none());

        let finished = handle.await.unwrap();
        assert_eq!(finished.status, MoveJobStatus::Completed);
        assert!(started.elapsed() >= pacing * 3);
    }

    #[test]
    fn chunk_size_is_at_least_one() {
        assert_eq!(BatchConfig::default().with_chunk_size(0).chunk_size, 1);
    }
}

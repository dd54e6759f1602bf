//! Job ledger: process-local registry of move jobs.
//!
//! The ledger is volatile by contract. Entries live for the life of the process
//! and vanish on restart, after which polling a job id yields "not found". A
//! durable backend can replace `InMemoryJobLedger` behind the same trait.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use relocate_core::JobId;

use super::types::MoveJob;

/// Job ledger abstraction.
///
/// Writers publish whole snapshots through `update`, so readers never observe a
/// record with some counters advanced and others not.
pub trait JobLedger: Send + Sync {
    /// Register a new job.
    fn create(&self, job: MoveJob) -> Result<JobId, LedgerError>;

    /// Get a snapshot of a job by ID.
    fn get(&self, job_id: JobId) -> Result<Option<MoveJob>, LedgerError>;

    /// Replace the stored snapshot. Terminal entries are immutable.
    fn update(&self, job: &MoveJob) -> Result<(), LedgerError>;

    /// Most recently started jobs first.
    fn list(&self, limit: usize) -> Result<Vec<MoveJob>, LedgerError>;
}

/// Job ledger error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),
    #[error("job {0} is terminal and can no longer change")]
    Terminal(JobId),
    #[error("ledger lock poisoned")]
    Poisoned,
}

impl<L> JobLedger for Arc<L>
where
    L: JobLedger + ?Sized,
{
    fn create(&self, job: MoveJob) -> Result<JobId, LedgerError> {
        (**self).create(job)
    }

    fn get(&self, job_id: JobId) -> Result<Option<MoveJob>, LedgerError> {
        (**self).get(job_id)
    }

    fn update(&self, job: &MoveJob) -> Result<(), LedgerError> {
        (**self).update(job)
    }

    fn list(&self, limit: usize) -> Result<Vec<MoveJob>, LedgerError> {
        (**self).list(limit)
    }
}

/// In-memory job ledger.
#[derive(Debug, Default)]
pub struct InMemoryJobLedger {
    jobs: RwLock<HashMap<JobId, MoveJob>>,
}

impl InMemoryJobLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl JobLedger for InMemoryJobLedger {
    fn create(&self, job: MoveJob) -> Result<JobId, LedgerError> {
        let mut jobs = self.jobs.write().map_err(|_| LedgerError::Poisoned)?;
        if jobs.contains_key(&job.job_id) {
            return Err(LedgerError::AlreadyExists(job.job_id));
        }
        let id = job.job_id;
        jobs.insert(id, job);
        Ok(id)
    }

    fn get(&self, job_id: JobId) -> Result<Option<MoveJob>, LedgerError> {
        let jobs = self.jobs.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(jobs.get(&job_id).cloned())
    }

    fn update(&self, job: &MoveJob) -> Result<(), LedgerError> {
        let mut jobs = self.jobs.write().map_err(|_| LedgerError::Poisoned)?;
        let current = jobs
            .get_mut(&job.job_id)
            .ok_or(LedgerError::NotFound(job.job_id))?;
        if current.is_terminal() {
            return Err(LedgerError::Terminal(job.job_id));
        }
        *current = job.clone();
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<MoveJob>, LedgerError> {
        let jobs = self.jobs.read().map_err(|_| LedgerError::Poisoned)?;
        let mut result: Vec<_> = jobs.values().cloned().collect();

        result.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        result.truncate(limit);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::MoveJobStatus;

    #[test]
    fn create_and_get() {
        let ledger = InMemoryJobLedger::new();
        let job = MoveJob::queued(JobId::new(), 3);

        let id = ledger.create(job.clone()).unwrap();

        assert_eq!(ledger.get(id).unwrap(), Some(job));
        assert_eq!(ledger.get(JobId::new()).unwrap(), None);
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let ledger = InMemoryJobLedger::new();
        let job = MoveJob::queued(JobId::new(), 1);
        ledger.create(job.clone()).unwrap();

        assert!(matches!(
            ledger.create(job),
            Err(LedgerError::AlreadyExists(_))
        ));
    }

    #[test]
    fn update_unknown_job_fails() {
        let ledger = InMemoryJobLedger::new();
        let job = MoveJob::queued(JobId::new(), 1);
        assert!(matches!(ledger.update(&job), Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn terminal_entries_are_immutable() {
        let ledger = InMemoryJobLedger::new();
        let mut job = MoveJob::queued(JobId::new(), 0);
        ledger.create(job.clone()).unwrap();

        job.mark_running().unwrap();
        job.mark_completed().unwrap();
        ledger.update(&job).unwrap();

        let mut rewrite = job.clone();
        rewrite.status = MoveJobStatus::Running;
        rewrite.finished_at = None;
        assert!(matches!(ledger.update(&rewrite), Err(LedgerError::Terminal(_))));

        let stored = ledger.get(job.job_id).unwrap().unwrap();
        assert_eq!(stored.status, MoveJobStatus::Completed);
    }

    #[test]
    fn list_is_newest_first_and_limited() {
        let ledger = InMemoryJobLedger::new();
        let mut ids = Vec::new();
        for i in 0..3 {
            let mut job = MoveJob::queued(JobId::new(), i);
            job.started_at += chrono::Duration::seconds(i as i64);
            ids.push(ledger.create(job).unwrap());
        }

        let listed: Vec<JobId> = ledger.list(2).unwrap().into_iter().map(|j| j.job_id).collect();
        assert_eq!(listed, vec![ids[2], ids[1]]);
    }
}

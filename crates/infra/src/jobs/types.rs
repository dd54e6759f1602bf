//! Move job record and its state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relocate_core::{DomainError, DomainResult, JobId};

/// Move job status.
///
/// `Queued -> Running -> {Completed | Failed}`. Terminal states never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveJobStatus {
    /// Created, waiting for its runner to start
    Queued,
    /// Runner is applying chunks
    Running,
    /// Every chunk was applied
    Completed,
    /// Aborted; chunks applied before the failure stay applied
    Failed,
}

impl MoveJobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MoveJobStatus::Completed | MoveJobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoveJobStatus::Queued => "queued",
            MoveJobStatus::Running => "running",
            MoveJobStatus::Completed => "completed",
            MoveJobStatus::Failed => "failed",
        }
    }
}

/// Progress and outcome of one relocation job.
///
/// Invariants, checked by every transition:
/// - `duplicates <= moved <= total`
/// - `finished_at` is set exactly when the status is terminal
/// - `message` is set only on failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveJob {
    pub job_id: JobId,
    pub status: MoveJobStatus,
    /// Items processed so far (a prefix of the resolved work set)
    pub moved: u64,
    /// Size of the resolved work set, fixed at creation
    pub total: u64,
    /// Processed items whose association already existed
    pub duplicates: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl MoveJob {
    /// Create a queued job over a work set of `total` items.
    pub fn queued(job_id: JobId, total: u64) -> Self {
        Self {
            job_id,
            status: MoveJobStatus::Queued,
            moved: 0,
            total,
            duplicates: 0,
            started_at: Utc::now(),
            finished_at: None,
            message: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Mark job as running.
    pub fn mark_running(&mut self) -> DomainResult<()> {
        self.expect_status(MoveJobStatus::Queued, "start")?;
        self.status = MoveJobStatus::Running;
        Ok(())
    }

    /// Account for one applied chunk of `attempted` items, `inserted` of them new.
    pub fn record_chunk(&mut self, attempted: u64, inserted: u64) -> DomainResult<()> {
        self.expect_status(MoveJobStatus::Running, "record progress on")?;

        if inserted > attempted {
            return Err(DomainError::invariant(format!(
                "chunk reported {inserted} inserts for {attempted} items"
            )));
        }
        if self.moved + attempted > self.total {
            return Err(DomainError::invariant(format!(
                "moved would exceed total ({} + {attempted} > {})",
                self.moved, self.total
            )));
        }

        self.moved += attempted;
        self.duplicates += attempted - inserted;
        Ok(())
    }

    /// Mark job as completed.
    pub fn mark_completed(&mut self) -> DomainResult<()> {
        self.expect_status(MoveJobStatus::Running, "complete")?;
        if self.moved != self.total {
            return Err(DomainError::invariant(format!(
                "cannot complete with {} of {} items moved",
                self.moved, self.total
            )));
        }
        self.status = MoveJobStatus::Completed;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Mark job as failed, keeping whatever progress was made.
    pub fn mark_failed(&mut self, message: impl Into<String>) -> DomainResult<()> {
        if self.is_terminal() {
            return Err(DomainError::invariant(format!(
                "cannot fail a job that is already {}",
                self.status.as_str()
            )));
        }
        self.status = MoveJobStatus::Failed;
        self.message = Some(message.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn expect_status(&self, expected: MoveJobStatus, action: &str) -> DomainResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(DomainError::invariant(format!(
                "cannot {action} a job that is {}",
                self.status.as_str()
            )))
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relocate_core::{CollectionId, DomainResult, ItemId, Selection};
use relocate_infra::jobs::{MoveJob, MoveRequest};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMoveRequest {
    #[serde(alias = "sourceListId")]
    pub source_collection_id: CollectionId,
    #[serde(alias = "targetListId")]
    pub target_collection_id: CollectionId,
    pub selection: SelectionDto,
}

/// Wire shape of a selection: `ids` OR `all: true` (+ optional `excludeIds`).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDto {
    pub ids: Option<Vec<ItemId>>,
    pub all: Option<bool>,
    #[serde(default)]
    pub exclude_ids: Vec<ItemId>,
}

impl StartMoveRequest {
    pub fn into_request(self) -> DomainResult<MoveRequest> {
        let selection = Selection::from_parts(
            self.selection.ids,
            self.selection.all,
            self.selection.exclude_ids,
        )?;
        Ok(MoveRequest::new(
            self.source_collection_id,
            self.target_collection_id,
            selection,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub limit: Option<usize>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: &'static str,
    pub moved: u64,
    pub total: u64,
    pub duplicates: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl From<MoveJob> for JobStatusResponse {
    fn from(job: MoveJob) -> Self {
        Self {
            job_id: job.job_id.to_string(),
            status: job.status.as_str(),
            moved: job.moved,
            total: job.total,
            duplicates: job.duplicates,
            started_at: job.started_at,
            finished_at: job.finished_at,
            message: job.message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobStatusResponse>,
}

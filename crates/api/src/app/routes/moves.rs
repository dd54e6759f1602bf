//! Batch move endpoints: submit a job, poll its status, list recent jobs.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use relocate_core::JobId;

use crate::app::{
    dto::{JobListResponse, JobStatusResponse, ListJobsQuery, StartMoveRequest},
    errors,
    services::AppServices,
};

const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 100;

pub fn router() -> Router {
    Router::new()
        .route("/batch", post(start_batch))
        .route("/jobs", get(list_jobs))
        .route("/jobs/:job_id", get(job_status))
}

/// POST /moves/batch
///
/// Resolves the work set, registers a queued job and returns immediately
/// with the queued snapshot. Progress is observed by polling the job.
async fn start_batch(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<StartMoveRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                rejection.body_text(),
            );
        }
    };

    let request = match body.into_request() {
        Ok(request) => request,
        Err(e) => return errors::move_error_to_response(e.into()),
    };

    match services.moves.start(request).await {
        Ok(job) => (StatusCode::OK, Json(JobStatusResponse::from(job))).into_response(),
        Err(e) => errors::move_error_to_response(e),
    }
}

/// GET /moves/jobs/:job_id
async fn job_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(job_id): Path<String>,
) -> axum::response::Response {
    let job_id: JobId = match job_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid job id");
        }
    };

    match services.moves.status(job_id) {
        Ok(job) => (StatusCode::OK, Json(JobStatusResponse::from(job))).into_response(),
        Err(e) => errors::move_error_to_response(e),
    }
}

/// GET /moves/jobs?limit=
async fn list_jobs(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListJobsQuery>,
) -> axum::response::Response {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    match services.moves.list(limit) {
        Ok(jobs) => {
            let jobs = jobs.into_iter().map(JobStatusResponse::from).collect();
            (StatusCode::OK, Json(JobListResponse { jobs })).into_response()
        }
        Err(e) => errors::move_error_to_response(e),
    }
}

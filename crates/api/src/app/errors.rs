use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use relocate_infra::jobs::MoveError;

pub fn move_error_to_response(err: MoveError) -> axum::response::Response {
    match err {
        MoveError::InvalidRequest(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_request", msg),
        MoveError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", "job not found"),
        MoveError::Store(e) => {
            tracing::error!(error = %e, "membership store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        MoveError::Ledger(e) => {
            tracing::error!(error = %e, "job ledger failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "ledger_error", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

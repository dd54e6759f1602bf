use axum::Router;

pub mod moves;
pub mod system;

/// Router for all move endpoints.
pub fn router() -> Router {
    Router::new().nest("/moves", moves::router())
}

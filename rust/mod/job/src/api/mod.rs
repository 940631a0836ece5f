mod jobs;

use std::sync::Arc;
use axum::Router;

use crate::engine::JobEngine;

/// Build the complete job module router.
///
/// Routes:
/// - `POST   /jobs`              submit a batch
/// - `GET    /jobs`              list jobs
/// - `GET    /jobs/{id}`         job status
/// - `GET    /jobs/{id}/@poll`   long-poll until terminal
/// - `GET    /jobs/{id}/result`  zip archive, or base64 JSON
pub fn router(engine: Arc<JobEngine>) -> Router {
    Router::new().merge(jobs::router(engine))
}

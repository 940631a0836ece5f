use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use erpgen_core::{ListResult, ServiceError};

use crate::archive::encode_base64;
use crate::engine::JobEngine;
use crate::model::{
    ArchiveResponse, JobRecord, JobStatusResponse, PollQuery, ResultQuery, SubmitJobRequest,
    SubmitJobResponse,
};

type EngineState = Arc<JobEngine>;

pub fn router(engine: Arc<JobEngine>) -> Router {
    Router::new()
        .route("/jobs", post(submit_job).get(list_jobs))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/@poll", get(poll_job))
        .route("/jobs/{id}/result", get(job_result))
        .with_state(engine)
}

// ---------------------------------------------------------------------------
// POST /jobs
// ---------------------------------------------------------------------------

async fn submit_job(
    State(engine): State<EngineState>,
    Json(req): Json<SubmitJobRequest>,
) -> Result<Json<SubmitJobResponse>, ServiceError> {
    let record = engine.submit(req)?;
    Ok(Json(SubmitJobResponse {
        status: record.status(),
        job_id: record.id,
    }))
}

// ---------------------------------------------------------------------------
// GET /jobs
// ---------------------------------------------------------------------------

async fn list_jobs(State(engine): State<EngineState>) -> Json<ListResult<JobRecord>> {
    Json(engine.list())
}

// ---------------------------------------------------------------------------
// GET /jobs/{id}
// ---------------------------------------------------------------------------

/// Unknown ids are not an error here: they report status `unknown`.
async fn get_job(State(engine): State<EngineState>, Path(id): Path<String>) -> Json<JobStatusResponse> {
    let record = engine.registry().record(&id);
    Json(JobStatusResponse::new(id, record))
}

// ---------------------------------------------------------------------------
// GET /jobs/{id}/@poll
// ---------------------------------------------------------------------------

async fn poll_job(
    State(engine): State<EngineState>,
    Path(id): Path<String>,
    Query(query): Query<PollQuery>,
) -> Result<Json<JobStatusResponse>, ServiceError> {
    let timeout = Duration::from_secs(query.timeout.min(120));
    let notify = engine.registry().notify().clone();
    let deadline = tokio::time::Instant::now() + timeout;

    // Register before reading: notify_waiters() stores no permit.
    let mut notified = Box::pin(notify.notified());

    let snapshot = engine.record(&id)?;
    if snapshot.state.is_terminal() {
        return Ok(Json(JobStatusResponse::new(id, Some(snapshot))));
    }

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            let current = engine.record(&id)?;
            return Ok(Json(JobStatusResponse::new(id, Some(current))));
        }

        tokio::select! {
            _ = &mut notified => {
                let current = engine.record(&id)?;
                if current.state.is_terminal() {
                    return Ok(Json(JobStatusResponse::new(id, Some(current))));
                }
                // Another job, or a non-terminal step of this one.
                notified = Box::pin(notify.notified());
            }
            _ = tokio::time::sleep(remaining) => {
                let current = engine.record(&id)?;
                return Ok(Json(JobStatusResponse::new(id, Some(current))));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// GET /jobs/{id}/result
// ---------------------------------------------------------------------------

async fn job_result(
    State(engine): State<EngineState>,
    Path(id): Path<String>,
    Query(query): Query<ResultQuery>,
) -> Result<Response, ServiceError> {
    let bytes = engine.archive(&id)?;
    match query.encoding.as_deref() {
        None | Some("zip") => Ok((
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{id}.zip\""),
                ),
            ],
            bytes.to_vec(),
        )
            .into_response()),
        Some("base64") => Ok(Json(ArchiveResponse {
            archive: encode_base64(&bytes),
            job_id: id,
        })
        .into_response()),
        Some(other) => Err(ServiceError::Validation(format!(
            "unsupported encoding '{other}', expected zip or base64"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use base64::Engine as _;
    use erpgen_codegen::{CodegenError, Family, GeneratedFile, GenerationContext, Generator, GeneratorRegistry};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const DOC: &str = r#"<root><model>team</model><fields>
        <field name="id" type="integer"/>
        <field name="title" type="varchar" not_null="1" max_length="40"/>
    </fields></root>"#;

    struct Sleepy;

    impl Generator for Sleepy {
        fn family(&self) -> Family {
            Family::Model
        }

        fn generate(&self, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(vec![GeneratedFile::new(ctx.path(Family::Model, "team.py"), "")])
        }
    }

    fn app_with(engine: JobEngine) -> Router {
        router(Arc::new(engine))
    }

    fn app() -> Router {
        app_with(JobEngine::new(EngineConfig::default()))
    }

    fn slow_app() -> Router {
        let mut generators = GeneratorRegistry::new();
        generators.register(Arc::new(Sleepy));
        app_with(JobEngine::new(EngineConfig::default()).with_generators(generators))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn call_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = call(app, method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn submit(app: &Router) -> String {
        let (status, body) = call_json(
            app,
            "POST",
            "/jobs",
            Some(json!({"target": "backend", "documents": [DOC]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "processing");
        body["job_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn submit_poll_and_download() {
        let app = app();
        let id = submit(&app).await;
        assert!(id.starts_with("BE-"));

        let (status, polled) = call_json(&app, "GET", &format!("/jobs/{id}/@poll?timeout=10"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(polled["status"], "done");
        assert_eq!(polled["record"]["state"], "COMPLETED");
        assert_eq!(polled["record"]["report"]["generated"], json!(["team"]));

        let (status, bytes) = call(&app, "GET", &format!("/jobs/{id}/result"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[..2], b"PK");

        let (status, wrapped) = call_json(&app, "GET", &format!("/jobs/{id}/result?encoding=base64"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(wrapped["job_id"], id.as_str());
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(wrapped["archive"].as_str().unwrap())
            .unwrap();
        assert_eq!(decoded, bytes);

        let (status, _) = call_json(&app, "GET", &format!("/jobs/{id}/result?encoding=rot13"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, listed) = call_json(&app, "GET", "/jobs", None).await;
        assert_eq!(listed["total"], 1);
        assert_eq!(listed["items"][0]["id"], id.as_str());
    }

    #[tokio::test]
    async fn unknown_job() {
        let app = app();
        let (status, body) = call_json(&app, "GET", "/jobs/BE-deadbeef", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "unknown");
        assert!(body.get("record").is_none());

        let (status, _) = call_json(&app, "GET", "/jobs/BE-deadbeef/result", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call_json(&app, "GET", "/jobs/BE-deadbeef/@poll?timeout=1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn result_conflicts_while_processing() {
        let app = slow_app();
        let id = submit(&app).await;

        let (status, body) = call_json(&app, "GET", &format!("/jobs/{id}/result"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["message"].as_str().unwrap().contains("still processing"));

        let (_, status_body) = call_json(&app, "GET", &format!("/jobs/{id}"), None).await;
        assert_eq!(status_body["status"], "processing");

        let (_, polled) = call_json(&app, "GET", &format!("/jobs/{id}/@poll?timeout=10"), None).await;
        assert_eq!(polled["status"], "done");
    }

    #[tokio::test]
    async fn poll_times_out_with_current_state() {
        let app = slow_app();
        let id = submit(&app).await;
        let (status, polled) = call_json(&app, "GET", &format!("/jobs/{id}/@poll?timeout=0"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(polled["status"], "processing");
    }

    #[tokio::test]
    async fn failed_job_has_no_result() {
        let app = app();
        let (_, body) = call_json(
            &app,
            "POST",
            "/jobs",
            Some(json!({"target": "full", "documents": ["{not json"]})),
        )
        .await;
        let id = body["job_id"].as_str().unwrap().to_string();

        let (_, polled) = call_json(&app, "GET", &format!("/jobs/{id}/@poll?timeout=10"), None).await;
        assert_eq!(polled["status"], "failed");
        assert!(polled["record"]["error"].as_str().unwrap().contains("document #1"));

        let (status, _) = call_json(&app, "GET", &format!("/jobs/{id}/result"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let app = app();
        let (status, body) = call_json(
            &app,
            "POST",
            "/jobs",
            Some(json!({"target": "backend", "documents": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("metadata document"));
    }
}

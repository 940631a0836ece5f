pub mod api;
pub mod archive;
pub mod engine;
pub mod error;
pub mod model;
pub mod reference;
pub mod registry;
pub mod store;
pub mod worker;

use std::sync::Arc;

use axum::Router;
use erpgen_core::Module;

use engine::JobEngine;
use worker::WorkerConfig;

pub use archive::{encode_base64, ArchiveBuilder};
pub use engine::{BatchOutput, EngineConfig};
pub use error::JobError;
pub use model::{BatchReport, JobRecord, JobState, JobStatus, ModelFailure, SubmitJobRequest};
pub use reference::{JsonFileReferences, ReferenceSource, StaticReferences};
pub use registry::JobRegistry;
pub use store::{FileSchemaStore, MemorySchemaStore, SchemaStore};

/// The Job module: batch submission, status, long-poll and archive download.
///
/// Owns the engine and the archive janitor; dropping the module leaves the
/// janitor running until its token is cancelled.
pub struct JobModule {
    engine: Arc<JobEngine>,
    worker_cancel: tokio_util::sync::CancellationToken,
}

impl JobModule {
    /// Wrap `engine` and start the janitor. Must be called inside a tokio runtime.
    pub fn new(engine: JobEngine, worker_config: WorkerConfig) -> Self {
        let engine = Arc::new(engine);
        let cancel = worker::start(Arc::clone(&engine), worker_config);
        Self {
            engine,
            worker_cancel: cancel,
        }
    }

    pub fn engine(&self) -> &Arc<JobEngine> {
        &self.engine
    }

    /// Stop the janitor.
    pub fn shutdown(&self) {
        self.worker_cancel.cancel();
    }
}

impl Module for JobModule {
    fn name(&self) -> &str {
        "job"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.engine))
    }
}

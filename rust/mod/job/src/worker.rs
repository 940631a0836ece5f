use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use erpgen_core::RetentionConfig;

use crate::engine::JobEngine;

/// Configuration for the archive janitor.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often to sweep stored archives.
    pub sweep_interval: Duration,
    /// Archives older than this are dropped.
    pub result_ttl: chrono::Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::from(&RetentionConfig::default())
    }
}

impl From<&RetentionConfig> for WorkerConfig {
    fn from(config: &RetentionConfig) -> Self {
        Self {
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
            result_ttl: chrono::Duration::seconds(config.result_ttl_secs),
        }
    }
}

/// Start the janitor loop that evicts expired archives.
///
/// Returns a CancellationToken that stops the loop when cancelled.
pub fn start(engine: Arc<JobEngine>, config: WorkerConfig) -> CancellationToken {
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        let interval = config.sweep_interval;
        let ttl = config.result_ttl;

        tokio::spawn(async move {
            info!("archive janitor started (interval={interval:?}, ttl={}s)", ttl.num_seconds());
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("archive janitor stopped");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        debug!("archive janitor sweep");
                        match engine.evict_expired(ttl) {
                            0 => {}
                            n => info!("archive janitor: evicted {n} archives"),
                        }
                    }
                }
            }
        });
    }

    cancel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::model::{JobState, SubmitJobRequest};
    use erpgen_codegen::JobTarget;
    use erpgen_core::ServiceError;

    const DOC: &str = r#"{"model":"team","fields":{"field":[{"name":"id","type":"integer"},{"name":"title","type":"varchar"}]}}"#;

    #[test]
    fn config_from_retention() {
        let config = WorkerConfig::default();
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.result_ttl, chrono::Duration::hours(1));
    }

    #[tokio::test]
    async fn janitor_evicts_and_stops() {
        let engine = Arc::new(JobEngine::new(EngineConfig::default()));
        let record = engine
            .submit(SubmitJobRequest {
                target: JobTarget::Backend,
                documents: vec![DOC.to_string()],
            })
            .unwrap();
        for _ in 0..500 {
            if engine.record(&record.id).unwrap().state.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(engine.record(&record.id).unwrap().state, JobState::Completed);
        assert!(engine.archive(&record.id).is_ok());

        let cancel = start(
            Arc::clone(&engine),
            WorkerConfig {
                sweep_interval: Duration::from_millis(10),
                result_ttl: chrono::Duration::zero(),
            },
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        assert!(matches!(engine.archive(&record.id), Err(ServiceError::NotFound(_))));
        // The record itself survives.
        assert_eq!(engine.record(&record.id).unwrap().state, JobState::Completed);
    }
}

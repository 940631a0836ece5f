//! Where fixture placeholders get their ids from.

use std::path::PathBuf;

use async_trait::async_trait;

use erpgen_fixture::ReferenceSnapshot;

use crate::error::JobError;

/// Captures the known ids of a batch's tables.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// Snapshot covering at least `models`. Tables the source knows nothing
    /// about are simply absent.
    async fn snapshot(&self, models: &[String]) -> Result<ReferenceSnapshot, JobError>;
}

/// A fixed snapshot held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticReferences {
    snapshot: ReferenceSnapshot,
}

impl StaticReferences {
    pub fn new(snapshot: ReferenceSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl ReferenceSource for StaticReferences {
    async fn snapshot(&self, _models: &[String]) -> Result<ReferenceSnapshot, JobError> {
        Ok(self.snapshot.clone())
    }
}

/// A snapshot re-read from a JSON file on every batch.
#[derive(Debug, Clone)]
pub struct JsonFileReferences {
    path: PathBuf,
}

impl JsonFileReferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReferenceSource for JsonFileReferences {
    async fn snapshot(&self, _models: &[String]) -> Result<ReferenceSnapshot, JobError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| JobError::Snapshot(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| JobError::Snapshot(format!("{}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.json");
        std::fs::write(&path, r#"[{"model":"person","ids":[1,2],"next_id":3}]"#).unwrap();

        let snapshot = JsonFileReferences::new(&path)
            .snapshot(&["person".to_string()])
            .await
            .unwrap();
        assert_eq!(snapshot.get("person").unwrap().ids, vec![1, 2]);

        let missing = JsonFileReferences::new(dir.path().join("nope.json"))
            .snapshot(&[])
            .await;
        assert!(matches!(missing, Err(JobError::Snapshot(_))));
    }

    #[tokio::test]
    async fn static_source_returns_its_snapshot() {
        let snapshot = ReferenceSnapshot::new().with_table("team", vec![5], 6);
        let source = StaticReferences::new(snapshot.clone());
        assert_eq!(source.snapshot(&[]).await.unwrap(), snapshot);
    }
}

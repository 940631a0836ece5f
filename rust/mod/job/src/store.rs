//! Persistence of accepted metadata documents.
//!
//! Calls are synchronous; the engine runs each one on the blocking pool
//! under its own deadline.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::JobError;

pub trait SchemaStore: Send + Sync {
    /// Store the source document of `model`, replacing any earlier version.
    fn persist(&self, model: &str, document: &str) -> Result<(), JobError>;
}

/// Keeps documents in memory.
#[derive(Debug, Default)]
pub struct MemorySchemaStore {
    documents: Mutex<BTreeMap<String, String>>,
}

impl MemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, model: &str) -> Option<String> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(model)
            .cloned()
    }

    pub fn models(&self) -> Vec<String> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}

impl SchemaStore for MemorySchemaStore {
    fn persist(&self, model: &str, document: &str) -> Result<(), JobError> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(model.to_string(), document.to_string());
        Ok(())
    }
}

/// Writes `<dir>/<model>.meta` files.
#[derive(Debug, Clone)]
pub struct FileSchemaStore {
    dir: PathBuf,
}

impl FileSchemaStore {
    /// Create the store, making `dir` if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, JobError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| JobError::Persist {
            model: String::new(),
            reason: format!("{}: {e}", dir.display()),
        })?;
        Ok(Self { dir })
    }

    pub fn path_of(&self, model: &str) -> PathBuf {
        self.dir.join(format!("{model}.meta"))
    }
}

impl SchemaStore for FileSchemaStore {
    fn persist(&self, model: &str, document: &str) -> Result<(), JobError> {
        std::fs::write(self.path_of(model), document).map_err(|e| JobError::Persist {
            model: model.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_replaces() {
        let store = MemorySchemaStore::new();
        store.persist("person", "<root>1</root>").unwrap();
        store.persist("person", "<root>2</root>").unwrap();
        assert_eq!(store.get("person").as_deref(), Some("<root>2</root>"));
        assert_eq!(store.models(), vec!["person"]);
    }

    #[test]
    fn file_store_writes_one_file_per_model() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSchemaStore::open(dir.path().join("schemas")).unwrap();
        store.persist("person", "{}").unwrap();
        let written = std::fs::read_to_string(store.path_of("person")).unwrap();
        assert_eq!(written, "{}");
    }
}

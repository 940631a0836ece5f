use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Service configuration shared by the daemon and the offline generator.
///
/// Loaded from a TOML file; every field has a default so an empty file
/// (or no file at all) yields a working configuration. Command-line flags
/// override individual values after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listen address for the HTTP server.
    pub listen: String,

    /// Working directory. Archives written by `generate` land here unless
    /// an explicit output path is given.
    pub data_dir: Option<PathBuf>,

    pub timeouts: TimeoutConfig,
    pub codegen: CodegenConfig,
    pub fixtures: FixtureConfig,
    pub retention: RetentionConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            data_dir: None,
            timeouts: TimeoutConfig::default(),
            codegen: CodegenConfig::default(),
            fixtures: FixtureConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

/// Per-step deadlines, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// One generator strategy invocation for one model.
    pub generation_step_secs: u64,
    /// Fixture synthesis for one model.
    pub fixture_step_secs: u64,
    /// One schema document persistence write.
    pub persist_step_secs: u64,
    /// Capturing the reference snapshot for a batch.
    pub snapshot_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            generation_step_secs: 30,
            fixture_step_secs: 60,
            persist_step_secs: 60,
            snapshot_secs: 60,
        }
    }
}

impl TimeoutConfig {
    pub fn generation_step(&self) -> Duration {
        Duration::from_secs(self.generation_step_secs)
    }

    pub fn fixture_step(&self) -> Duration {
        Duration::from_secs(self.fixture_step_secs)
    }

    pub fn persist_step(&self) -> Duration {
        Duration::from_secs(self.persist_step_secs)
    }

    pub fn snapshot(&self) -> Duration {
        Duration::from_secs(self.snapshot_secs)
    }
}

/// Knobs for the generated artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Menu group every navigation entry is filed under.
    pub menu_module: String,
    /// Models whose records start inactive until approved.
    pub inactive_models: Vec<String>,
    /// Table prefixes stripped when naming view objects.
    pub table_prefixes: Vec<String>,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            menu_module: "categories".to_string(),
            inactive_models: Vec::new(),
            table_prefixes: Vec::new(),
        }
    }
}

/// Test fixture synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Valid create/update cases per operation.
    pub valid_cases: usize,
    /// Invalid-payload create/update cases per operation.
    pub invalid_cases: usize,
    /// Invalid-id update cases.
    pub invalid_id_cases: usize,
    /// Fixed RNG seed. Unset means a fresh seed per batch.
    pub seed: Option<u64>,
    /// JSON file holding the reference snapshot (`[{model, ids, next_id}]`).
    pub snapshot_path: Option<PathBuf>,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            valid_cases: 3,
            invalid_cases: 8,
            invalid_id_cases: 6,
            seed: None,
            snapshot_path: None,
        }
    }
}

/// How long finished job archives are kept in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Archives of terminal jobs older than this are evicted.
    pub result_ttl_secs: i64,
    /// How often the janitor scans for expired archives.
    pub sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            result_ttl_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load configuration, or return defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Resolve where an archive for `job_id` is written, falling back to the
    /// current directory when no data dir is configured.
    pub fn resolve_archive_path(&self, job_id: &str) -> PathBuf {
        self.resolve_data_subpath(&format!("{job_id}.zip"))
    }

    /// Resolve the reference snapshot file relative to the data dir.
    pub fn resolve_snapshot_path(&self) -> Option<PathBuf> {
        let path = self.fixtures.snapshot_path.as_ref()?;
        if path.is_absolute() {
            return Some(path.clone());
        }
        Some(match &self.data_dir {
            Some(dir) => dir.join(path),
            None => path.clone(),
        })
    }

    fn resolve_data_subpath(&self, name: &str) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(|d| d.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

/// Configuration loading failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

use serde::{Deserialize, Serialize};

use erpgen_codegen::{Family, JobTarget};

// ---------------------------------------------------------------------------
// JobState
// ---------------------------------------------------------------------------

/// Lifecycle state of a generation job.
///
/// ```text
/// PENDING → RUNNING → COMPLETED
///                   → FAILED
/// ```
///
/// No retries and no cancellation: a failed step ends the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Whether the job has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// JobStatus: what status queries report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Done,
    Failed,
    /// Never registered, or already forgotten.
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

impl From<JobState> for JobStatus {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Pending | JobState::Running => Self::Processing,
            JobState::Completed => Self::Done,
            JobState::Failed => Self::Failed,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Batch report
// ---------------------------------------------------------------------------

/// A model left out of the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFailure {
    pub model: String,
    /// Family whose step rejected the model; `None` when the metadata itself
    /// could not be turned into a model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<Family>,
    pub reason: String,
}

/// Outcome of a batch, per model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Models whose artifacts were all written, in batch order.
    pub generated: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<ModelFailure>,
    /// Archive entries, index files included.
    pub artifacts: usize,
}

// ---------------------------------------------------------------------------
// JobRecord
// ---------------------------------------------------------------------------

/// A generation job tracked by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// `<TARGET>-<8 hex chars>`.
    pub id: String,
    pub target: JobTarget,
    pub state: JobState,
    /// Number of metadata documents submitted.
    pub documents: usize,
    /// Failure description (set on FAILED). Names the step and model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<BatchReport>,

    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
}

impl JobRecord {
    pub fn status(&self) -> JobStatus {
        self.state.into()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJobRequest {
    pub target: JobTarget,
    /// Metadata documents, XML or JSON, one model each.
    pub documents: Vec<String>,
}

/// Body of `GET /jobs/{id}` and `GET /jobs/{id}/@poll`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    /// Absent for unknown ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<JobRecord>,
}

impl JobStatusResponse {
    pub fn new(job_id: impl Into<String>, record: Option<JobRecord>) -> Self {
        Self {
            job_id: job_id.into(),
            status: record.as_ref().map(JobRecord::status).unwrap_or(JobStatus::Unknown),
            record,
        }
    }
}

/// Body returned by `POST /jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    pub job_id: String,
    pub status: JobStatus,
}

/// Query parameters for `GET /jobs/{id}/@poll`.
#[derive(Debug, Clone, Deserialize)]
pub struct PollQuery {
    /// Maximum wait in seconds (capped at 120).
    #[serde(default = "default_poll_timeout")]
    pub timeout: u64,
}

fn default_poll_timeout() -> u64 {
    30
}

/// Query parameters for `GET /jobs/{id}/result`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultQuery {
    /// `base64` wraps the archive in JSON instead of returning raw bytes.
    #[serde(default)]
    pub encoding: Option<String>,
}

/// Body of `GET /jobs/{id}/result?encoding=base64`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveResponse {
    pub job_id: String,
    pub archive: String,
}

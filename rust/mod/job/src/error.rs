use std::time::Duration;

use erpgen_codegen::CodegenError;
use erpgen_fixture::FixtureError;
use erpgen_ir::IrError;
use thiserror::Error;

/// A failure that ends a batch.
///
/// Per-model schema defects are not errors at this level; they are recorded
/// in the [`crate::model::BatchReport`] and the batch carries on.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("document #{index} is unreadable: {source}")]
    Parse {
        index: usize,
        #[source]
        source: IrError,
    },

    #[error("{step} timed out after {after:?}")]
    Timeout { step: String, after: Duration },

    #[error("{step} panicked: {detail}")]
    Panicked { step: String, detail: String },

    #[error("{step}: {source}")]
    Codegen {
        step: String,
        #[source]
        source: CodegenError,
    },

    #[error("{step}: {source}")]
    Fixture {
        step: String,
        #[source]
        source: FixtureError,
    },

    #[error("duplicate archive path `{0}`")]
    DuplicatePath(String),

    #[error("reference snapshot: {0}")]
    Snapshot(String),

    #[error("persist `{model}`: {reason}")]
    Persist { model: String, reason: String },

    #[error("archive: {0}")]
    Archive(String),
}

impl From<zip::result::ZipError> for JobError {
    fn from(e: zip::result::ZipError) -> Self {
        JobError::Archive(e.to_string())
    }
}

impl From<std::io::Error> for JobError {
    fn from(e: std::io::Error) -> Self {
        JobError::Archive(e.to_string())
    }
}

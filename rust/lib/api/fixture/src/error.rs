use erpgen_codegen::CodegenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error("model `{model}` has no addressable columns")]
    NoColumns { model: String },

    #[error("field `{field}` of `{model}` admits no valid value: {reason}")]
    Unsatisfiable {
        model: String,
        field: String,
        reason: String,
    },

    #[error("failed to encode fixtures of `{model}`: {source}")]
    Encode {
        model: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FixtureError {
    /// Whether the failure comes from the model's own metadata rather than
    /// from the synthesizer.
    pub fn is_schema_defect(&self) -> bool {
        match self {
            FixtureError::Codegen(e) => e.is_schema_defect(),
            FixtureError::NoColumns { .. } | FixtureError::Unsatisfiable { .. } => true,
            FixtureError::Encode { .. } => false,
        }
    }
}

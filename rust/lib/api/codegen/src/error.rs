use erpgen_ir::IrError;

/// Generation failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CodegenError {
    #[error(transparent)]
    Ir(#[from] IrError),

    #[error("no free alias for `{target}` after 100 attempts from `{base}`")]
    AliasExhausted { base: String, target: String },

    #[error("rule/message mismatch on `{field}`: {detail}")]
    RuleParity { field: String, detail: String },
}

impl CodegenError {
    /// Defects of one model's schema. These fail that model only; everything
    /// else is a generator defect and fails the batch.
    pub fn is_schema_defect(&self) -> bool {
        matches!(self, Self::Ir(_) | Self::AliasExhausted { .. })
    }
}

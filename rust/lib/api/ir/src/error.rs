use thiserror::Error;

/// Schema defect found while turning a metadata document into a [`crate::ModelSpec`].
///
/// Every variant is fatal to the one model being built and carries enough
/// context (field name or position) to point at the offending spreadsheet row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("document is missing mandatory attribute `model`")]
    MissingModel,

    #[error("field #{index} is missing mandatory attribute `{attribute}`")]
    MissingAttribute {
        index: usize,
        attribute: &'static str,
    },

    #[error("field `{field}`: unknown data type `{token}`")]
    UnknownDataType { field: String, token: String },

    #[error("field `{field}`: malformed foreign_key `{value}`, expected `model,key,label`")]
    MalformedForeignKey { field: String, value: String },

    #[error("field `{field}`: `{attribute}` is not a number: `{value}`")]
    InvalidNumber {
        field: String,
        attribute: &'static str,
        value: String,
    },

    #[error("field `{field}`: `{attribute}` is not a `[lo,hi]` range: `{value}`")]
    MalformedRange {
        field: String,
        attribute: &'static str,
        value: String,
    },

    #[error("field `{field}` is declared more than once")]
    DuplicateField { field: String },

    #[error("field `{field}` cannot be both computed and a reference")]
    ConflictingKind { field: String },

    #[error("metadata xml: {0}")]
    Xml(String),

    #[error("metadata json: {0}")]
    Json(String),
}

impl From<serde_json::Error> for IrError {
    fn from(e: serde_json::Error) -> Self {
        IrError::Json(e.to_string())
    }
}

impl From<quick_xml::Error> for IrError {
    fn from(e: quick_xml::Error) -> Self {
        IrError::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for IrError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        IrError::Xml(e.to_string())
    }
}

impl IrError {
    /// Whether the defect lies in the document's syntax rather than its content.
    pub fn is_syntax(&self) -> bool {
        matches!(self, IrError::Xml(_) | IrError::Json(_))
    }
}

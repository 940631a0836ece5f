//! Schema intermediate representation.
//!
//! Turns a raw metadata document into typed, validated data shared by:
//! - the artifact generators (`erpgen-codegen`)
//! - the request validator (`erpgen-validate`)
//! - the fixture synthesizer (`erpgen-fixture`)
//!
//! Layers, leaf first:
//! 1. Metadata: raw XML/JSON document, strings only
//! 2. Model: typed `FieldSpec` / `ModelSpec`
//! 3. Constraint: per-field `ConstraintSet`
//! 4. Rules: rule entries and message templates per constraint
//! 5. Routes: the REST operations every model exposes

pub mod constraint;
pub mod error;
pub mod metadata;
pub mod model;
pub mod routes;
pub mod rules;
pub mod types;

pub use constraint::{ConstraintMap, ConstraintSet};
pub use error::IrError;
pub use metadata::{FieldList, MetadataDocument, RawCompute, RawField};
pub use model::{
    ComputeSpec, FieldKind, FieldRules, FieldSpec, ModelSpec, ReferenceTarget, DEFAULT_SPAN,
    ID_FIELD,
};
pub use routes::{ApiOperation, HttpMethod, RouteSpec, STANDARD_ROUTES};
pub use rules::{RuleEntry, RuleKind, RuleValue};
pub use types::{camel_case, capitalize, parse_flag, pascal_case, DataType, DisplayMode, TRUTHY_TOKENS};

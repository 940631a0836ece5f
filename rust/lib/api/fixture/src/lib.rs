//! Test fixture synthesis.
//!
//! For every model a [`FixtureSuite`] exercises the generated REST surface
//! with valid and rule-breaking requests. Requests reference records through
//! placeholder tokens (`{valid_id}`, `{invalid_person_id}`, ...) that are
//! bound to a [`ReferenceSnapshot`] of known ids once per batch.

pub mod error;
pub mod resolve;
pub mod snapshot;
pub mod synth;
pub mod values;

pub use error::FixtureError;
pub use resolve::{resolve_str, resolve_text, resolve_value};
pub use snapshot::{ReferenceSnapshot, TableIds};
pub use synth::{FixturePlan, FixtureSuite, ResponseCode, RouteInfo, Synthesizer, TestCase};

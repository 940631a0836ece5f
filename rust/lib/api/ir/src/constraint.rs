//! Per-field constraint derivation.
//!
//! A [`ConstraintSet`] is the flattened, validator-ready form of a field.
//! Rule generation, the validator and the fixture synthesizer all read it,
//! so they agree on what a field accepts.

use serde::{Deserialize, Serialize};

use crate::model::{FieldSpec, ModelSpec, ReferenceTarget};
use crate::types::DataType;

/// Validation-relevant attributes of one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceTarget>,
    pub is_email: bool,
    /// Date or datetime.
    pub is_date: bool,
    pub is_datetime: bool,
    pub is_number: bool,
    pub is_boolean: bool,
    pub url: bool,
    pub digits: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equal_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regexp: Option<String>,
    /// Only kept for file/image fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Only kept for file/image fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl ConstraintSet {
    /// Derive the constraint set of one field.
    pub fn derive(field: &FieldSpec) -> Self {
        let reference = field.reference().cloned();

        // range_length wins over the individual bounds.
        let (mut min_length, mut max_length) = match field.range_length {
            Some((lo, hi)) => (Some(lo), Some(hi)),
            None => (field.min_length, field.max_length),
        };
        if reference.is_some() {
            min_length = None;
            max_length = None;
        }

        let upload = field.data_type.is_upload();

        ConstraintSet {
            required: field.required,
            min_length,
            max_length,
            unique: field.unique,
            reference,
            is_email: field.email,
            is_date: field.data_type.is_date(),
            is_datetime: field.data_type == DataType::DateTime,
            is_number: field.data_type.is_number(),
            is_boolean: field.data_type == DataType::Boolean,
            url: field.url,
            digits: field.digits,
            min: field.rules.min,
            max: field.rules.max,
            range: field.rules.range,
            step: field.rules.step,
            equal_to: field.rules.equal_to.clone(),
            regexp: field.rules.regexp.clone(),
            file_type: field.rules.file_type.clone().filter(|_| upload),
            file_size: field.rules.file_size.filter(|_| upload),
        }
    }

    /// Inclusive numeric bounds from `min`, `max` and `range`. `range` wins.
    pub fn numeric_bounds(&self) -> (Option<f64>, Option<f64>) {
        match self.range {
            Some((lo, hi)) => (Some(lo), Some(hi)),
            None => (self.min, self.max),
        }
    }

    /// Whether the set carries at least one rule a value can violate.
    pub fn is_violable(&self) -> bool {
        self.required
            || self.min_length.is_some_and(|n| n > 0)
            || self.max_length.is_some()
            || self.reference.is_some()
            || self.is_email
            || self.is_date
            || (self.is_number && self.reference.is_none())
            || self.is_boolean
            || (self.digits && self.reference.is_none())
            || self.min.is_some()
            || self.max.is_some()
            || self.range.is_some()
            || self.step.is_some()
            || self.equal_to.is_some()
    }
}

/// Constraint sets of a model, in field order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintMap {
    entries: Vec<(String, ConstraintSet)>,
}

impl ConstraintMap {
    /// Derive constraints for every field of `model`.
    pub fn derive(model: &ModelSpec) -> Self {
        ConstraintMap {
            entries: model
                .fields
                .iter()
                .map(|f| (f.name.clone(), ConstraintSet::derive(f)))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&ConstraintSet> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConstraintSet)> {
        self.entries.iter().map(|(name, c)| (name.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

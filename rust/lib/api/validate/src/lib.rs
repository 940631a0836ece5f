//! Request validator.
//!
//! Mirrors the checks the generated backend performs on create/update
//! payloads. Every violated rule of a field is reported, in rule order,
//! instead of stopping at the first failure: synthesized invalid requests
//! may break several rules of one field at once and the expected response
//! has to list all of them.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use erpgen_ir::{ConstraintMap, ConstraintSet, ModelSpec, RuleEntry, RuleKind, RuleValue};

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[\w\-\.]+@([\w\-]+\.)+[\w\-]{2,4}$").ok());

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Prefix of placeholder tokens standing for an existing referenced id.
pub const VALID_REFERENCE_PREFIX: &str = "{valid";

/// Known ids of referenced models, used to check resolved foreign keys.
pub trait ReferenceIds {
    fn contains(&self, model: &str, id: i64) -> bool;
}

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub rule: RuleKind,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.rule, self.message)
    }
}

/// Violations of a request, grouped per field in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    errors: Vec<(String, Vec<Violation>)>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Names of fields with at least one violation.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn get(&self, field: &str) -> Option<&[Violation]> {
        self.errors
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v.as_slice())
    }

    /// `{"field": ["message", ...]}`, the shape of a validation error response.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (name, violations) in &self.errors {
            let messages = violations
                .iter()
                .map(|v| Value::String(v.message.clone()))
                .collect();
            map.insert(name.clone(), Value::Array(messages));
        }
        Value::Object(map)
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (name, violations)) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{name}:")?;
            for v in violations {
                write!(f, " {}", v.message)?;
            }
        }
        Ok(())
    }
}

/// Validates requests against a model's constraints.
pub struct Validator<'a> {
    fields: Vec<(&'a str, &'a ConstraintSet)>,
    references: Option<&'a dyn ReferenceIds>,
}

impl<'a> Validator<'a> {
    /// Validate every field of the constraint map.
    pub fn new(constraints: &'a ConstraintMap) -> Self {
        Self {
            fields: constraints.iter().collect(),
            references: None,
        }
    }

    /// Validate only the fields sent in create/update payloads.
    pub fn for_model(model: &'a ModelSpec, constraints: &'a ConstraintMap) -> Self {
        let fields = model
            .payload_fields()
            .filter_map(|f| constraints.get(&f.name).map(|c| (f.name.as_str(), c)))
            .collect();
        Self {
            fields,
            references: None,
        }
    }

    /// Check resolved numeric foreign keys against known ids.
    pub fn with_references(mut self, references: &'a dyn ReferenceIds) -> Self {
        self.references = Some(references);
        self
    }

    /// Validate a request. A field absent from the request is checked as null.
    pub fn validate(&self, request: &Map<String, Value>) -> ValidationReport {
        let mut report = ValidationReport::default();
        for (name, constraints) in &self.fields {
            let value = request.get(*name).unwrap_or(&Value::Null);
            let violations = check_field(constraints, value, self.references);
            if !violations.is_empty() {
                report.errors.push((name.to_string(), violations));
            }
        }
        report
    }
}

/// Evaluate every checkable rule of one field against `value`.
pub fn check_field(
    constraints: &ConstraintSet,
    value: &Value,
    references: Option<&dyn ReferenceIds>,
) -> Vec<Violation> {
    let is_reference = constraints.reference.is_some();
    constraints
        .rule_entries()
        .into_iter()
        .filter(|entry| {
            // Numeric-looking foreign keys are not checked as numbers.
            !(is_reference && matches!(entry.kind, RuleKind::Number | RuleKind::Digits))
        })
        .filter(|entry| violates(entry, constraints, value, references))
        .map(|entry| Violation {
            rule: entry.kind,
            message: entry.message(),
        })
        .collect()
}

fn violates(
    entry: &RuleEntry,
    constraints: &ConstraintSet,
    value: &Value,
    references: Option<&dyn ReferenceIds>,
) -> bool {
    let text = as_text(value);
    match (entry.kind, &entry.value) {
        (RuleKind::Required, _) => text.is_empty(),
        (RuleKind::MinLength, RuleValue::Count(n)) => (text.chars().count() as u64) < *n,
        (RuleKind::MaxLength, RuleValue::Count(n)) => (text.chars().count() as u64) > *n,
        (RuleKind::Min, RuleValue::Number(n)) => as_number(value).is_some_and(|v| v < *n),
        (RuleKind::Max, RuleValue::Number(n)) => as_number(value).is_some_and(|v| v > *n),
        (RuleKind::Range, RuleValue::Pair(lo, hi)) => {
            as_number(value).is_some_and(|v| v < *lo || v > *hi)
        }
        (RuleKind::Step, RuleValue::Number(step)) => {
            *step != 0.0 && as_number(value).is_some_and(|v| !is_multiple(v, *step))
        }
        (RuleKind::Email, _) => !EMAIL_RE.as_ref().is_some_and(|re| re.is_match(&text)),
        (RuleKind::Date, _) => NaiveDate::parse_from_str(&text, DATE_FORMAT).is_err(),
        (RuleKind::DateTime, _) => {
            NaiveDateTime::parse_from_str(&text, DATETIME_FORMAT).is_err()
                && NaiveDate::parse_from_str(&text, DATE_FORMAT).is_err()
        }
        (RuleKind::Number, _) => as_number(value).is_none(),
        (RuleKind::Digits, _) => text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()),
        (RuleKind::EqualTo, RuleValue::Text(expected)) => text != *expected,
        (RuleKind::ForeignKey, _) => !reference_exists(constraints, value, references),
        (RuleKind::Boolean, _) => as_boolean(value).is_none(),
        // Enforced by the generated service only.
        (
            RuleKind::Url
            | RuleKind::Regexp
            | RuleKind::Unique
            | RuleKind::FileType
            | RuleKind::FileSize,
            _,
        ) => false,
        // Rule payload of a shape the kind does not use.
        (
            RuleKind::MinLength
            | RuleKind::MaxLength
            | RuleKind::Min
            | RuleKind::Max
            | RuleKind::Range
            | RuleKind::Step
            | RuleKind::EqualTo,
            _,
        ) => false,
    }
}

fn reference_exists(
    constraints: &ConstraintSet,
    value: &Value,
    references: Option<&dyn ReferenceIds>,
) -> bool {
    if let Value::String(s) = value {
        if s.starts_with('{') {
            return s.starts_with(VALID_REFERENCE_PREFIX);
        }
    }
    let Some(id) = as_number(value).filter(|n| n.fract() == 0.0) else {
        return false;
    };
    match (references, &constraints.reference) {
        (Some(refs), Some(target)) => refs.contains(&target.model, id as i64),
        _ => true,
    }
}

/// String form used by length and pattern checks. Null is empty.
pub fn as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric value of a JSON number or numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Boolean value of `true`/`false`, `0`/`1` or their string forms.
pub fn as_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "0" | "false" => Some(false),
            "1" | "true" => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn is_multiple(value: f64, step: f64) -> bool {
    let ratio = value / step;
    (ratio - ratio.round()).abs() < 1e-9
}

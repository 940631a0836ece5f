//! Typed model: [`ModelSpec`] and its [`FieldSpec`]s.
//!
//! Built from a [`MetadataDocument`] by an explicit, validating parse step.
//! Generators and the fixture synthesizer only ever see these types.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::IrError;
use crate::metadata::{MetadataDocument, RawField};
use crate::types::{capitalize, parse_flag, pascal_case, DataType, DisplayMode};

/// Name of the identifier column every model carries.
pub const ID_FIELD: &str = "id";

/// Default UI grid width of a field.
pub const DEFAULT_SPAN: u32 = 24;

/// Target of a foreign-key field, from `foreign_key = "model,key,label,..."`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTarget {
    /// Referenced model (table) name.
    pub model: String,
    /// Key field on the referenced model.
    pub key_field: String,
    /// Sub-fields of the referenced model exposed next to this field,
    /// starting with the key field.
    pub exposed: Vec<String>,
}

/// Derived-field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeSpec {
    pub function: String,
    pub store: bool,
}

/// Exactly one of plain, computed or reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Plain,
    Computed(ComputeSpec),
    Reference(ReferenceTarget),
}

/// Extra validation attributes beyond the core constraint set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRules {
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
    /// Accepted upload extensions, comma separated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Maximum upload size in kilobytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

/// One schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Lowercased identifier, unique within the model.
    pub name: String,
    pub data_type: DataType,
    pub label: String,
    pub required: bool,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    /// `[lo, hi]`, already clipped to non-negative.
    pub range_length: Option<(u32, u32)>,
    /// Declared default. The literal `null` marker is kept as-is.
    pub default_value: Option<String>,
    pub unique: bool,
    pub primary_key: bool,
    pub email: bool,
    pub url: bool,
    pub digits: bool,
    pub kind: FieldKind,
    /// Explicit short token for query/sort APIs.
    pub alias: Option<String>,
    /// Excluded from create/update payloads.
    pub auto_generated: bool,
    pub searchable: bool,
    pub display_mode: DisplayMode,
    /// UI widget, `textbox` unless overridden.
    pub show_type: String,
    pub span: u32,
    pub on_delete: Option<String>,
    pub rules: FieldRules,
}

impl FieldSpec {
    pub fn reference(&self) -> Option<&ReferenceTarget> {
        match &self.kind {
            FieldKind::Reference(target) => Some(target),
            _ => None,
        }
    }

    pub fn compute(&self) -> Option<&ComputeSpec> {
        match &self.kind {
            FieldKind::Computed(compute) => Some(compute),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FieldKind::Reference(_))
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.kind, FieldKind::Computed(_))
    }

    pub fn is_id(&self) -> bool {
        self.name == ID_FIELD
    }

    /// Whether the field is sent in create/update requests.
    pub fn is_payload(&self) -> bool {
        !self.is_id() && !self.auto_generated
    }

    /// Foreign-key field name without its `_id` suffix (`owner_id` -> `owner`).
    pub fn parent_name(&self) -> &str {
        self.name.strip_suffix("_id").unwrap_or(&self.name)
    }

    /// Whether the declared default is the literal `null` marker.
    pub fn has_null_default(&self) -> bool {
        self.default_value
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("null"))
    }

    /// Build a field from its raw attributes. `index` is the 1-based position,
    /// used in errors when the name itself is missing.
    pub fn from_raw(index: usize, raw: &RawField) -> Result<Self, IrError> {
        let name = raw.name.trim().to_lowercase();
        if name.is_empty() {
            return Err(IrError::MissingAttribute {
                index,
                attribute: "name",
            });
        }
        let token = raw.data_type.trim();
        if token.is_empty() {
            return Err(IrError::MissingAttribute {
                index,
                attribute: "type",
            });
        }
        let data_type = DataType::from_token(token).ok_or_else(|| IrError::UnknownDataType {
            field: name.clone(),
            token: token.to_string(),
        })?;

        let kind = match (raw.compute.is_empty(), raw.foreign_key.trim().is_empty()) {
            (true, true) => FieldKind::Plain,
            (false, true) => FieldKind::Computed(ComputeSpec {
                function: raw.compute.function.trim().to_string(),
                store: parse_flag(&raw.compute.store),
            }),
            (true, false) => FieldKind::Reference(parse_foreign_key(&name, &raw.foreign_key)?),
            (false, false) => return Err(IrError::ConflictingKind { field: name }),
        };

        let label = if raw.label.trim().is_empty() {
            capitalize(&name.replace('_', " "))
        } else {
            raw.label.split_whitespace().collect::<Vec<_>>().join(" ")
        };

        let span = parse_opt_number::<u32>(&name, "span", &raw.span)?.unwrap_or(DEFAULT_SPAN);

        Ok(FieldSpec {
            data_type,
            label,
            required: parse_flag(&raw.not_null),
            min_length: parse_length(&name, "min_length", &raw.min_length)?,
            max_length: parse_length(&name, "max_length", &raw.max_length)?,
            range_length: parse_length_range(&name, &raw.range_length)?,
            default_value: non_empty(&raw.default_value),
            unique: parse_flag(&raw.unique),
            primary_key: parse_flag(&raw.primary_key),
            email: parse_flag(&raw.email),
            url: parse_flag(&raw.url),
            digits: parse_flag(&raw.digits),
            kind,
            alias: non_empty(&raw.alias).map(|a| a.to_lowercase()),
            auto_generated: parse_flag(&raw.auto_generate),
            searchable: parse_flag(&raw.searchable),
            display_mode: DisplayMode::from_token(&raw.default_display),
            show_type: non_empty(&raw.show_type).unwrap_or_else(|| "textbox".to_string()),
            span,
            on_delete: non_empty(&raw.ondelete),
            rules: FieldRules {
                min: parse_opt_number(&name, "min", &raw.min)?,
                max: parse_opt_number(&name, "max", &raw.max)?,
                range: parse_number_range(&name, "range", &raw.range)?,
                step: parse_opt_number(&name, "step", &raw.step)?,
                equal_to: non_empty(&raw.equal_to),
                regexp: non_empty(&raw.regexp),
                file_type: non_empty(&raw.file_type),
                file_size: parse_opt_number(&name, "file_size", &raw.file_size)?,
            },
            name,
        })
    }
}

/// One generated unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub model_name: String,
    /// PascalCase of `model_name`.
    pub class_name: String,
    pub system_code: String,
    pub sub_system_code: String,
    pub module_code: String,
    pub searchable_fields: Vec<String>,
    pub default_order: String,
    /// Source order is significant.
    pub fields: Vec<FieldSpec>,
}

impl ModelSpec {
    /// Validate and type a raw document. Fails fast on the first defect.
    pub fn from_document(doc: &MetadataDocument) -> Result<Self, IrError> {
        let model_name = doc.model.trim().to_lowercase();
        if model_name.is_empty() {
            return Err(IrError::MissingModel);
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(doc.fields.field.len());
        for (i, raw) in doc.fields.field.iter().enumerate() {
            let field = FieldSpec::from_raw(i + 1, raw)?;
            if !seen.insert(field.name.clone()) {
                return Err(IrError::DuplicateField { field: field.name });
            }
            fields.push(field);
        }

        let searchable_fields = doc
            .searchable_list
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(ModelSpec {
            class_name: pascal_case(&model_name),
            model_name,
            system_code: doc.system_code.trim().to_string(),
            sub_system_code: doc.sub_system_code.trim().to_string(),
            module_code: doc.module_code.trim().to_string(),
            searchable_fields,
            default_order: doc.default_order.trim().to_string(),
            fields,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields sent in create/update requests, in source order.
    pub fn payload_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_payload())
    }

    pub fn reference_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_reference())
    }

    /// Reference fields with distinct names, in source order. Two fields
    /// pointing at the same parent model both appear.
    pub fn distinct_reference_fields(&self) -> Vec<&FieldSpec> {
        let mut seen = HashSet::new();
        self.reference_fields()
            .filter(|f| seen.insert(f.name.as_str()))
            .collect()
    }

    /// Column names in source order, without the identifier.
    pub fn column_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.is_id())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Model name with the first matching table prefix stripped.
    pub fn object_name(&self, prefixes: &[String]) -> &str {
        prefixes
            .iter()
            .find_map(|p| self.model_name.strip_prefix(p.as_str()))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(&self.model_name)
    }

    /// `<SYS>_<SUB>-<MODULE>` permission prefix.
    pub fn action_code(&self) -> String {
        format!(
            "{}_{}-{}",
            self.system_code, self.sub_system_code, self.module_code
        )
    }

    /// Label of the `name` (or else `code`) field with its generic prefix
    /// removed, used as the human-readable model name.
    pub fn display_name(&self) -> String {
        for (field, prefixes) in [("name", ["tên ", "name "]), ("code", ["mã ", "code "])] {
            if let Some(f) = self.field(field) {
                let lower = f.label.to_lowercase();
                for prefix in prefixes {
                    if let Some(rest) = lower.strip_prefix(prefix) {
                        return rest.trim().to_string();
                    }
                }
            }
        }
        self.model_name.replace('_', " ")
    }
}

// ---------------------------------------------------------------------------
// Attribute parsing
// ---------------------------------------------------------------------------

fn non_empty(value: &str) -> Option<String> {
    let v = value.trim();
    (!v.is_empty()).then(|| v.to_string())
}

fn parse_foreign_key(field: &str, value: &str) -> Result<ReferenceTarget, IrError> {
    let parts: Vec<String> = value
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 {
        return Err(IrError::MalformedForeignKey {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(ReferenceTarget {
        model: parts[0].to_lowercase(),
        key_field: parts[1].clone(),
        exposed: parts[1..].to_vec(),
    })
}

fn parse_opt_number<T: std::str::FromStr>(
    field: &str,
    attribute: &'static str,
    value: &str,
) -> Result<Option<T>, IrError> {
    let v = value.trim();
    if v.is_empty() {
        return Ok(None);
    }
    v.parse().map(Some).map_err(|_| IrError::InvalidNumber {
        field: field.to_string(),
        attribute,
        value: value.to_string(),
    })
}

/// Length attributes may be written as floats (`"10.0"`) by spreadsheets.
/// Negative values clip to zero.
fn parse_length(field: &str, attribute: &'static str, value: &str) -> Result<Option<u32>, IrError> {
    let parsed: Option<f64> = parse_opt_number(field, attribute, value)?;
    Ok(parsed.map(clip_length))
}

fn clip_length(v: f64) -> u32 {
    if v <= 0.0 {
        0
    } else {
        v.round().min(f64::from(u32::MAX)) as u32
    }
}

fn split_range<'a>(
    field: &str,
    attribute: &'static str,
    value: &'a str,
) -> Result<Option<(&'a str, &'a str)>, IrError> {
    let v = value.trim();
    if v.is_empty() {
        return Ok(None);
    }
    let inner = v.trim_start_matches('[').trim_end_matches(']');
    inner
        .split_once(',')
        .map(|(lo, hi)| Some((lo.trim(), hi.trim())))
        .ok_or_else(|| IrError::MalformedRange {
            field: field.to_string(),
            attribute,
            value: value.to_string(),
        })
}

fn parse_number_range(
    field: &str,
    attribute: &'static str,
    value: &str,
) -> Result<Option<(f64, f64)>, IrError> {
    let Some((lo, hi)) = split_range(field, attribute, value)? else {
        return Ok(None);
    };
    let malformed = || IrError::MalformedRange {
        field: field.to_string(),
        attribute,
        value: value.to_string(),
    };
    let lo: f64 = lo.parse().map_err(|_| malformed())?;
    let hi: f64 = hi.parse().map_err(|_| malformed())?;
    Ok(Some((lo, hi)))
}

fn parse_length_range(field: &str, value: &str) -> Result<Option<(u32, u32)>, IrError> {
    Ok(parse_number_range(field, "range_length", value)?
        .map(|(lo, hi)| (clip_length(lo), clip_length(hi))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawField {
        let mut field = RawField::default();
        for (k, v) in pairs {
            field.set(k, v.to_string());
        }
        field
    }

    fn doc(model: &str, fields: Vec<RawField>) -> MetadataDocument {
        let mut doc = MetadataDocument {
            model: model.into(),
            system_code: "ERP".into(),
            sub_system_code: "HRM".into(),
            module_code: "EMP".into(),
            ..Default::default()
        };
        doc.fields.field = fields;
        doc
    }

    #[test]
    fn builds_typed_model() {
        let spec = ModelSpec::from_document(&doc(
            "nagaco_color",
            vec![
                raw(&[("name", "ID"), ("type", "integer"), ("primary_key", "1")]),
                raw(&[("name", "Name"), ("type", "varchar"), ("not_null", "c"), ("label", " Tên   màu ")]),
                raw(&[("name", "owner_id"), ("type", "many2one"), ("foreign_key", "person, code, name")]),
            ],
        ))
        .unwrap();

        assert_eq!(spec.class_name, "NagacoColor");
        assert_eq!(spec.action_code(), "ERP_HRM-EMP");
        assert_eq!(spec.fields[0].name, "id");
        assert!(spec.fields[1].required);
        assert_eq!(spec.fields[1].label, "Tên màu");
        assert_eq!(spec.display_name(), "màu");

        let target = spec.fields[2].reference().unwrap();
        assert_eq!(target.model, "person");
        assert_eq!(target.key_field, "code");
        assert_eq!(target.exposed, vec!["code", "name"]);
        assert_eq!(spec.fields[2].parent_name(), "owner");
        assert_eq!(spec.column_names(), vec!["name", "owner_id"]);
    }

    #[test]
    fn missing_name_or_type_is_fatal() {
        let err = ModelSpec::from_document(&doc("m", vec![raw(&[("type", "varchar")])])).unwrap_err();
        assert_eq!(
            err,
            IrError::MissingAttribute {
                index: 1,
                attribute: "name"
            }
        );

        let err = ModelSpec::from_document(&doc(
            "m",
            vec![raw(&[("name", "a"), ("type", "text")]), raw(&[("name", "b")])],
        ))
        .unwrap_err();
        assert_eq!(
            err,
            IrError::MissingAttribute {
                index: 2,
                attribute: "type"
            }
        );
    }

    #[test]
    fn missing_model_is_fatal() {
        assert_eq!(
            ModelSpec::from_document(&doc("  ", vec![])).unwrap_err(),
            IrError::MissingModel
        );
    }

    #[test]
    fn malformed_foreign_key() {
        let err = ModelSpec::from_document(&doc(
            "m",
            vec![raw(&[("name", "owner_id"), ("type", "integer"), ("foreign_key", "person,code")])],
        ))
        .unwrap_err();
        assert!(matches!(err, IrError::MalformedForeignKey { .. }));
    }

    #[test]
    fn computed_reference_conflict() {
        let err = ModelSpec::from_document(&doc(
            "m",
            vec![raw(&[
                ("name", "owner_id"),
                ("type", "integer"),
                ("foreign_key", "person,code,name"),
                ("compute", "_compute_owner"),
            ])],
        ))
        .unwrap_err();
        assert!(matches!(err, IrError::ConflictingKind { .. }));
    }

    #[test]
    fn duplicate_fields_rejected() {
        let err = ModelSpec::from_document(&doc(
            "m",
            vec![
                raw(&[("name", "code"), ("type", "varchar")]),
                raw(&[("name", "CODE"), ("type", "varchar")]),
            ],
        ))
        .unwrap_err();
        assert_eq!(err, IrError::DuplicateField { field: "code".into() });
    }

    #[test]
    fn numeric_attributes() {
        let spec = ModelSpec::from_document(&doc(
            "m",
            vec![raw(&[
                ("name", "code"),
                ("type", "varchar"),
                ("max_length", "10.0"),
                ("range_length", "[-2, 5]"),
                ("range", "[1,9.5]"),
            ])],
        ))
        .unwrap();
        let f = &spec.fields[0];
        assert_eq!(f.max_length, Some(10));
        assert_eq!(f.range_length, Some((0, 5)));
        assert_eq!(f.rules.range, Some((1.0, 9.5)));

        let err = ModelSpec::from_document(&doc(
            "m",
            vec![raw(&[("name", "code"), ("type", "varchar"), ("max_length", "ten")])],
        ))
        .unwrap_err();
        assert!(matches!(err, IrError::InvalidNumber { attribute: "max_length", .. }));
    }

    #[test]
    fn distinct_reference_fields_keeps_both_owners() {
        let spec = ModelSpec::from_document(&doc(
            "project",
            vec![
                raw(&[("name", "owner_id"), ("type", "integer"), ("foreign_key", "person,code,name")]),
                raw(&[("name", "backup_owner_id"), ("type", "integer"), ("foreign_key", "person,code,name")]),
            ],
        ))
        .unwrap();
        let names: Vec<_> = spec.distinct_reference_fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["owner_id", "backup_owner_id"]);
    }

    #[test]
    fn object_name_strips_prefix() {
        let spec = ModelSpec::from_document(&doc("fin_invoice", vec![])).unwrap();
        assert_eq!(spec.object_name(&["hrm_".into(), "fin_".into()]), "invoice");
        assert_eq!(spec.object_name(&[]), "fin_invoice");
    }
}

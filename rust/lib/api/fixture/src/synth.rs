//! Test case synthesis for the generated REST surface.
//!
//! [`Synthesizer::draft`] builds cases with placeholder tokens in them;
//! [`FixtureSuite::resolve`] binds the tokens to a snapshot. Cases come out
//! grouped by [`ApiOperation::ALL`] order, so the structure of a suite only
//! depends on the model and the plan. Values depend on the seed.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use erpgen_codegen::{AliasTable, Family, GeneratedFile};
use erpgen_ir::{ApiOperation, ConstraintMap, FieldSpec, HttpMethod, ModelSpec};
use erpgen_validate::Validator;

use crate::error::FixtureError;
use crate::resolve::{resolve_text, resolve_value};
use crate::snapshot::ReferenceSnapshot;
use crate::values;

pub const VALID_EXPORT_TYPES: [&str; 3] = ["csv", "json", "xlsx"];
pub const INVALID_EXPORT_TYPES: [&str; 5] = ["exe", "html", "zip", "mp3", "unknown"];

/// An id list the API must reject as malformed.
pub const MALFORMED_IDLIST: &str = "abc,xyz";

const ORDER_SPECIALS: &[u8] = b"@#$%^&*";

// ---------------------------------------------------------------------------
// Expected responses
// ---------------------------------------------------------------------------

/// Response code the generated API answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    Ok,
    BadParameter,
    InvalidOrder,
    InvalidPage,
    InvalidPayload,
    InvalidColumns,
    UnsupportedExport,
    NotFound,
    UnknownColumns,
    UpdateInvalid,
    UpdateNotFound,
}

impl ResponseCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "200",
            Self::BadParameter => "400",
            Self::InvalidOrder => "B600",
            Self::InvalidPage => "B601",
            Self::InvalidPayload => "B603",
            Self::InvalidColumns => "B607",
            Self::UnsupportedExport => "D601",
            Self::NotFound => "D604",
            Self::UnknownColumns => "D607",
            Self::UpdateInvalid => "F603",
            Self::UpdateNotFound => "F604",
        }
    }

    /// Default `status` field.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::InvalidPayload | Self::UpdateInvalid => "warning",
            _ => "error",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Ok => "",
            Self::BadParameter => "Invalid parameter value.",
            Self::InvalidOrder => "Unknown sort order.",
            Self::InvalidPage => "Page number must be a positive integer.",
            Self::InvalidPayload | Self::UpdateInvalid => "Data validation failed.",
            Self::InvalidColumns | Self::UnknownColumns => "Column list contains unknown columns.",
            Self::UnsupportedExport => "Unsupported export format.",
            Self::NotFound | Self::UpdateNotFound => "Record does not exist.",
        }
    }

    /// HTTP-level codes are numbers, business codes are strings.
    fn to_value(self) -> Value {
        match self {
            Self::Ok => json!(200),
            Self::BadParameter => json!(400),
            other => json!(other.as_str()),
        }
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn response(code: ResponseCode) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("code".into(), code.to_value());
    map.insert("status".into(), json!(code.status()));
    if code != ResponseCode::Ok {
        map.insert("message".into(), json!(code.message()));
    }
    map
}

// ---------------------------------------------------------------------------
// Cases
// ---------------------------------------------------------------------------

/// How many payload cases to draw per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixturePlan {
    pub valid_cases: usize,
    pub invalid_cases: usize,
    pub invalid_id_cases: usize,
}

impl Default for FixturePlan {
    fn default() -> Self {
        Self {
            valid_cases: 3,
            invalid_cases: 8,
            invalid_id_cases: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub path: String,
    pub method: HttpMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub operation: ApiOperation,
    pub description: String,
    /// Whether the request is expected to succeed.
    pub valid: bool,
    pub route: RouteInfo,
    pub request: Value,
    pub expected_response: Value,
    /// Payload fields given a rule-breaking value, in field order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrupted_fields: Vec<String>,
}

impl TestCase {
    /// Bind every placeholder token of the case.
    pub fn resolve(&self, snapshot: &ReferenceSnapshot) -> TestCase {
        TestCase {
            operation: self.operation,
            description: self.description.clone(),
            valid: self.valid,
            route: RouteInfo {
                path: resolve_text(&self.route.path, snapshot),
                method: self.route.method,
            },
            request: resolve_value(&self.request, snapshot),
            expected_response: resolve_value(&self.expected_response, snapshot),
            corrupted_fields: self.corrupted_fields.clone(),
        }
    }
}

/// All cases of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureSuite {
    pub model: String,
    pub cases: Vec<TestCase>,
}

impl FixtureSuite {
    /// `unittest/<model>.json`
    pub fn path(&self) -> String {
        format!("{}/{}.json", Family::Fixtures.dir(), self.model)
    }

    pub fn resolve(&self, snapshot: &ReferenceSnapshot) -> FixtureSuite {
        FixtureSuite {
            model: self.model.clone(),
            cases: self.cases.iter().map(|c| c.resolve(snapshot)).collect(),
        }
    }

    pub fn cases_for(&self, operation: ApiOperation) -> impl Iterator<Item = &TestCase> {
        self.cases.iter().filter(move |c| c.operation == operation)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn to_file(&self) -> Result<GeneratedFile, FixtureError> {
        let content = serde_json::to_string_pretty(self).map_err(|source| FixtureError::Encode {
            model: self.model.clone(),
            source,
        })?;
        Ok(GeneratedFile::new(self.path(), content + "\n"))
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

pub struct Synthesizer {
    plan: FixturePlan,
    rng: StdRng,
}

impl Synthesizer {
    /// Synthesizer with a fixed seed, or a fresh one when `seed` is `None`.
    pub fn new(plan: FixturePlan, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { plan, rng }
    }

    pub fn seeded(plan: FixturePlan, seed: u64) -> Self {
        Self::new(plan, Some(seed))
    }

    /// Cases for `model` with placeholder tokens left in place.
    pub fn draft(
        &mut self,
        model: &ModelSpec,
        constraints: &ConstraintMap,
    ) -> Result<FixtureSuite, FixtureError> {
        let aliases = AliasTable::build(model)?;
        let columns: Vec<String> = aliases
            .entries()
            .iter()
            .filter(|e| !e.field.is_empty() && !e.is_sub_alias())
            .map(|e| e.alias.clone())
            .collect();
        if columns.is_empty() {
            return Err(FixtureError::NoColumns {
                model: model.model_name.clone(),
            });
        }
        for field in model.payload_fields() {
            if let Some(reason) = constraints.get(&field.name).and_then(values::unsatisfiable) {
                return Err(FixtureError::Unsatisfiable {
                    model: model.model_name.clone(),
                    field: field.name.clone(),
                    reason,
                });
            }
        }
        let mut order_tokens: Vec<String> = model
            .default_order
            .split(',')
            .filter_map(|part| part.split_whitespace().next())
            .filter_map(|name| aliases.alias_of(name))
            .map(str::to_string)
            .collect();
        if order_tokens.is_empty() {
            order_tokens = columns.clone();
        }
        let longest_token = aliases
            .entries()
            .iter()
            .map(|e| e.alias.chars().count())
            .max()
            .unwrap_or(0);

        let mut draft = Draft {
            model,
            constraints,
            plan: self.plan,
            rng: &mut self.rng,
            columns,
            longest_token,
            order_tokens,
            cases: Vec::new(),
        };
        for op in ApiOperation::ALL {
            draft.operation(op);
        }

        Ok(FixtureSuite {
            model: model.model_name.clone(),
            cases: draft.cases,
        })
    }

    /// Draft and resolve against `snapshot`, whose first table is `model`.
    pub fn synthesize(
        &mut self,
        model: &ModelSpec,
        constraints: &ConstraintMap,
        snapshot: &ReferenceSnapshot,
    ) -> Result<FixtureSuite, FixtureError> {
        Ok(self.draft(model, constraints)?.resolve(snapshot))
    }
}

struct Draft<'a> {
    model: &'a ModelSpec,
    constraints: &'a ConstraintMap,
    plan: FixturePlan,
    rng: &'a mut StdRng,
    columns: Vec<String>,
    /// Length of the longest alias, sub-aliases included.
    longest_token: usize,
    order_tokens: Vec<String>,
    cases: Vec<TestCase>,
}

impl<'a> Draft<'a> {
    fn operation(&mut self, op: ApiOperation) {
        match op {
            ApiOperation::List => self.list(),
            ApiOperation::FetchById => self.fetch_by_id(),
            ApiOperation::Paged => self.paged(),
            ApiOperation::Create => self.create(),
            ApiOperation::Update => self.update(),
            ApiOperation::BulkCopy | ApiOperation::BulkDelete => self.bulk(op),
            ApiOperation::Import => self.import(),
            ApiOperation::Export => self.export(),
            ApiOperation::BulkExport => self.bulk_export(),
        }
    }

    fn push(
        &mut self,
        op: ApiOperation,
        description: String,
        path: String,
        request: Value,
        expected: Map<String, Value>,
        corrupted_fields: Vec<String>,
    ) {
        let valid = expected.get("code") == Some(&json!(200));
        self.cases.push(TestCase {
            operation: op,
            description,
            valid,
            route: RouteInfo {
                path,
                method: op.method(),
            },
            request,
            expected_response: Value::Object(expected),
            corrupted_fields,
        });
    }

    fn path(&self, op: ApiOperation, id: &str, page: &str) -> String {
        op.path(&self.model.model_name, id, page)
    }

    // -- columns ------------------------------------------------------------

    /// Minimal, half and full subset sizes.
    fn subset_sizes(&self) -> [usize; 3] {
        let len = self.columns.len();
        [1, (len / 2).max(1), len]
    }

    fn sample_columns(&mut self, n: usize) -> String {
        self.columns
            .choose_multiple(&mut *self.rng, n)
            .cloned()
            .collect::<Vec<_>>()
            .join(",")
    }

    fn any_columns(&mut self) -> String {
        let n = self.rng.gen_range(1..=self.columns.len());
        self.sample_columns(n)
    }

    /// Names longer than every real column token.
    fn fake_columns(&mut self, n: usize) -> String {
        let longest = self.longest_token;
        (0..n.max(1))
            .map(|_| {
                let len = self.rng.gen_range(longest + 1..=longest + 5);
                values::lowercase(&mut *self.rng, len)
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    fn export_type(&mut self, valid: bool) -> &'static str {
        let pool: &[&'static str] = if valid {
            &VALID_EXPORT_TYPES
        } else {
            &INVALID_EXPORT_TYPES
        };
        pool.choose(&mut *self.rng).copied().unwrap_or("csv")
    }

    // -- payloads -----------------------------------------------------------

    fn payload_fields(&self) -> Vec<&'a FieldSpec> {
        let constraints = self.constraints;
        self.model
            .payload_fields()
            .filter(|f| constraints.get(&f.name).is_some())
            .collect()
    }

    fn valid_payload(&mut self) -> Map<String, Value> {
        let mut payload = Map::new();
        for field in self.payload_fields() {
            if let Some(c) = self.constraints.get(&field.name) {
                let value = values::valid_value(&mut *self.rng, field, c);
                payload.insert(field.name.clone(), value);
            }
        }
        payload
    }

    /// A valid payload with some violable fields broken. `None` when no
    /// field has a rule to break.
    fn invalid_payload(&mut self) -> Option<(Map<String, Value>, Vec<String>)> {
        let fields = self.payload_fields();
        let eligible: Vec<&FieldSpec> = fields
            .iter()
            .copied()
            .filter(|f| self.constraints.get(&f.name).is_some_and(|c| c.is_violable()))
            .collect();
        if eligible.is_empty() {
            return None;
        }
        let cap = (fields.len() / 2).max(1);

        let mut picked: Vec<&FieldSpec> = Vec::new();
        for field in &eligible {
            if picked.len() < cap && self.rng.gen_bool(0.5) {
                picked.push(*field);
            }
        }
        if picked.is_empty() {
            picked.extend(eligible.choose(&mut *self.rng).copied());
        }

        let mut payload = self.valid_payload();
        let mut corrupted = Vec::new();
        for field in picked {
            let Some(c) = self.constraints.get(&field.name) else {
                continue;
            };
            if let Some(value) = values::corrupt_value(&mut *self.rng, c) {
                payload.insert(field.name.clone(), value);
                corrupted.push(field.name.clone());
            }
        }
        Some((payload, corrupted))
    }

    fn errors(&self, payload: &Map<String, Value>) -> Value {
        Validator::for_model(self.model, self.constraints)
            .validate(payload)
            .to_json()
    }

    // -- operations ---------------------------------------------------------

    fn list(&mut self) {
        let op = ApiOperation::List;
        let path = self.path(op, "", "");
        for n in self.subset_sizes() {
            let columns = self.sample_columns(n);
            self.push(
                op,
                format!("{n} known columns"),
                path.clone(),
                json!({ "columnlist": columns }),
                response(ResponseCode::Ok),
                Vec::new(),
            );
        }
        for n in self.subset_sizes() {
            let columns = self.fake_columns(n);
            self.push(
                op,
                format!("{n} unknown columns"),
                path.clone(),
                json!({ "columnlist": columns }),
                response(ResponseCode::InvalidColumns),
                Vec::new(),
            );
        }
    }

    fn fetch_by_id(&mut self) {
        let op = ApiOperation::FetchById;
        for n in self.subset_sizes() {
            let columns = self.sample_columns(n);
            let path = self.path(op, "{valid_id}", "");
            self.push(
                op,
                format!("existing id, {n} columns"),
                path,
                json!({ "id": "{valid_id}", "columnlist": columns }),
                response(ResponseCode::Ok),
                Vec::new(),
            );
        }
        for n in self.subset_sizes() {
            let columns = self.sample_columns(n);
            let path = self.path(op, "{invalid_id}", "");
            self.push(
                op,
                format!("missing id, {n} columns"),
                path,
                json!({ "id": "{invalid_id}", "columnlist": columns }),
                response(ResponseCode::NotFound),
                Vec::new(),
            );
        }
        for n in self.subset_sizes() {
            let columns = self.fake_columns(n);
            let path = self.path(op, "{valid_id}", "");
            self.push(
                op,
                format!("existing id, {n} unknown columns"),
                path,
                json!({ "id": "{valid_id}", "columnlist": columns }),
                response(ResponseCode::UnknownColumns),
                Vec::new(),
            );
        }
    }

    fn paged(&mut self) {
        let op = ApiOperation::Paged;
        let order = self
            .order_tokens
            .choose(&mut *self.rng)
            .cloned()
            .unwrap_or_default();

        let columns = self.any_columns();
        self.push(
            op,
            "first page".to_string(),
            self.path(op, "", "1"),
            json!({ "page": 1, "size": 10, "order": order, "search": "", "columnlist": columns }),
            response(ResponseCode::Ok),
            Vec::new(),
        );

        let columns = self.any_columns();
        self.push(
            op,
            "negative page".to_string(),
            self.path(op, "", "-1"),
            json!({ "page": -1, "size": 10, "order": order, "search": "", "columnlist": columns }),
            response(ResponseCode::InvalidPage),
            Vec::new(),
        );

        let bad_order = {
            let mut token = values::alphanumeric(&mut *self.rng, 2);
            let special = ORDER_SPECIALS[self.rng.gen_range(0..ORDER_SPECIALS.len())];
            token.push(char::from(special));
            token
        };
        let columns = self.any_columns();
        let mut expected = response(ResponseCode::InvalidOrder);
        expected.insert(
            "message".into(),
            json!(format!("{} '{bad_order}'", ResponseCode::InvalidOrder.message())),
        );
        self.push(
            op,
            "unknown sort order".to_string(),
            self.path(op, "", "1"),
            json!({ "page": 1, "size": 10, "order": bad_order, "search": "", "columnlist": columns }),
            expected,
            Vec::new(),
        );

        let columns = self.fake_columns(3);
        self.push(
            op,
            "unknown columns".to_string(),
            self.path(op, "", "1"),
            json!({ "page": 1, "size": 10, "order": order, "search": "", "columnlist": columns }),
            response(ResponseCode::InvalidColumns),
            Vec::new(),
        );
    }

    fn create(&mut self) {
        let op = ApiOperation::Create;
        let path = self.path(op, "", "");
        for i in 1..=self.plan.valid_cases {
            let payload = self.valid_payload();
            self.push(
                op,
                format!("valid payload {i}"),
                path.clone(),
                Value::Object(payload),
                response(ResponseCode::Ok),
                Vec::new(),
            );
        }
        for i in 1..=self.plan.invalid_cases {
            let Some((payload, corrupted)) = self.invalid_payload() else {
                break;
            };
            let mut expected = response(ResponseCode::InvalidPayload);
            expected.insert("data".into(), self.errors(&payload));
            self.push(
                op,
                format!("invalid payload {i}"),
                path.clone(),
                Value::Object(payload),
                expected,
                corrupted,
            );
        }
    }

    fn update(&mut self) {
        let op = ApiOperation::Update;
        let path = self.path(op, "{valid_id}", "");
        for i in 1..=self.plan.valid_cases {
            let mut payload = self.valid_payload();
            payload.insert("id".into(), json!("{valid_id}"));
            self.push(
                op,
                format!("valid payload {i}"),
                path.clone(),
                Value::Object(payload),
                response(ResponseCode::Ok),
                Vec::new(),
            );
        }
        for i in 1..=self.plan.invalid_cases {
            let Some((mut payload, corrupted)) = self.invalid_payload() else {
                break;
            };
            payload.insert("id".into(), json!("{valid_id}"));
            let mut expected = response(ResponseCode::UpdateInvalid);
            expected.insert(
                "data".into(),
                json!({ "oldData": payload.clone(), "errors": self.errors(&payload) }),
            );
            self.push(
                op,
                format!("invalid payload {i}"),
                path.clone(),
                Value::Object(payload),
                expected,
                corrupted,
            );
        }
        let missing = self.path(op, "{invalid_id}", "");
        for i in 1..=self.plan.invalid_id_cases {
            let mut payload = self.valid_payload();
            payload.insert("id".into(), json!("{invalid_id}"));
            self.push(
                op,
                format!("missing id {i}"),
                missing.clone(),
                Value::Object(payload),
                response(ResponseCode::UpdateNotFound),
                Vec::new(),
            );
        }
    }

    fn bulk(&mut self, op: ApiOperation) {
        let path = self.path(op, "", "");
        self.push(
            op,
            "existing ids".to_string(),
            path.clone(),
            json!({ "idlist": "{valid_idlist}" }),
            response(ResponseCode::Ok),
            Vec::new(),
        );
        let mut expected = response(ResponseCode::NotFound);
        expected.insert("status".into(), json!("warning"));
        expected.insert(
            "data".into(),
            json!({ "idlist": [ResponseCode::NotFound.message()] }),
        );
        self.push(
            op,
            "missing ids".to_string(),
            path,
            json!({ "idlist": "{invalid_idlist}" }),
            expected,
            Vec::new(),
        );
    }

    fn import(&mut self) {
        let op = ApiOperation::Import;
        let path = self.path(op, "", "");
        let rows = self.plan.valid_cases.max(1);

        let valid: Vec<Value> = (0..rows).map(|_| Value::Object(self.valid_payload())).collect();
        self.push(
            op,
            format!("{rows} valid rows"),
            path.clone(),
            json!({ "rows": valid }),
            response(ResponseCode::Ok),
            Vec::new(),
        );

        let bad_row = self.rng.gen_range(0..rows);
        let mut table = Vec::with_capacity(rows);
        let mut errors = Map::new();
        let mut corrupted_fields = Vec::new();
        for row in 0..rows {
            if row == bad_row {
                let Some((payload, corrupted)) = self.invalid_payload() else {
                    return;
                };
                errors.insert(row.to_string(), self.errors(&payload));
                corrupted_fields = corrupted;
                table.push(Value::Object(payload));
            } else {
                table.push(Value::Object(self.valid_payload()));
            }
        }
        let mut expected = response(ResponseCode::InvalidPayload);
        expected.insert("data".into(), Value::Object(errors));
        self.push(
            op,
            format!("row {bad_row} invalid"),
            path,
            json!({ "rows": table }),
            expected,
            corrupted_fields,
        );
    }

    /// Every combination of {existing, missing} id, {supported, unsupported}
    /// format and {known, unknown} columns.
    fn export(&mut self) {
        let op = ApiOperation::Export;
        for id_ok in [true, false] {
            for type_ok in [true, false] {
                for columns_ok in [true, false] {
                    let id = if id_ok { "{valid_id}" } else { "{invalid_id}" };
                    let export_type = self.export_type(type_ok);
                    let columns = if columns_ok {
                        self.any_columns()
                    } else {
                        self.fake_columns(3)
                    };

                    let mut violated = Vec::new();
                    if !id_ok {
                        violated.push(ResponseCode::NotFound);
                    }
                    if !type_ok {
                        violated.push(ResponseCode::UnsupportedExport);
                    }
                    if !columns_ok {
                        violated.push(ResponseCode::UnknownColumns);
                    }
                    let mut expected = response(violated.first().copied().unwrap_or(ResponseCode::Ok));
                    if !violated.is_empty() {
                        let codes: Vec<&str> = violated.iter().map(|c| c.as_str()).collect();
                        expected.insert("violations".into(), json!(codes));
                    }

                    let description = format!(
                        "{} id, {} format, {} columns",
                        if id_ok { "existing" } else { "missing" },
                        if type_ok { "supported" } else { "unsupported" },
                        if columns_ok { "known" } else { "unknown" },
                    );
                    let path = self.path(op, id, "");
                    self.push(
                        op,
                        description,
                        path,
                        json!({ "id": id, "columnlist": columns, "type": export_type }),
                        expected,
                        Vec::new(),
                    );
                }
            }
        }
    }

    fn bulk_export(&mut self) {
        let op = ApiOperation::BulkExport;
        let path = self.path(op, "", "");
        let cases: [(&str, bool, bool, &str, ResponseCode); 5] = [
            ("existing ids", true, true, "{valid_idlist}", ResponseCode::Ok),
            ("unsupported format", false, true, "{valid_idlist}", ResponseCode::UnsupportedExport),
            ("unknown columns", true, false, "{valid_idlist}", ResponseCode::UnknownColumns),
            ("malformed id list", true, true, MALFORMED_IDLIST, ResponseCode::BadParameter),
            ("missing ids", true, true, "{invalid_idlist}", ResponseCode::NotFound),
        ];
        for (description, type_ok, columns_ok, idlist, code) in cases {
            let export_type = self.export_type(type_ok);
            let columns = if columns_ok {
                self.any_columns()
            } else {
                self.fake_columns(3)
            };
            self.push(
                op,
                description.to_string(),
                path.clone(),
                json!({ "columnlist": columns, "type": export_type, "idlist": idlist }),
                response(code),
                Vec::new(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erpgen_ir::MetadataDocument;
    use std::collections::HashSet;

    const PROJECT: &str = r#"
<root>
  <system_code>ERP</system_code>
  <sub_system_code>PMS</sub_system_code>
  <module_code>PRJ</module_code>
  <model>project</model>
  <default_order>code asc, name desc</default_order>
  <fields>
    <field name="id" type="integer"/>
    <field name="code" type="varchar" not_null="1" max_length="10"/>
    <field name="name" type="varchar" range_length="[2,5]"/>
    <field name="email" type="varchar" email="1"/>
    <field name="owner_id" type="integer" not_null="1" foreign_key="person,code,name"/>
    <field name="budget" type="float" min="0" max="1000" step="0.5"/>
    <field name="start_date" type="date"/>
    <field name="archived" type="bool"/>
    <field name="note" type="text"/>
    <field name="total" type="float" auto_generate="1"/>
  </fields>
</root>
"#;

    fn project() -> (ModelSpec, ConstraintMap) {
        let model = ModelSpec::from_document(&MetadataDocument::parse(PROJECT).unwrap()).unwrap();
        let constraints = ConstraintMap::derive(&model);
        (model, constraints)
    }

    fn snapshot() -> ReferenceSnapshot {
        ReferenceSnapshot::new()
            .with_table("project", vec![10, 11], 12)
            .with_table("person", vec![1, 2, 3], 4)
    }

    fn suite(seed: u64) -> FixtureSuite {
        let (model, constraints) = project();
        Synthesizer::seeded(FixturePlan::default(), seed)
            .draft(&model, &constraints)
            .unwrap()
    }

    #[test]
    fn operations_follow_fixed_order() {
        let suite = suite(1);
        let mut order: Vec<ApiOperation> = Vec::new();
        for case in &suite.cases {
            if order.last() != Some(&case.operation) {
                order.push(case.operation);
            }
        }
        assert_eq!(order, ApiOperation::ALL.to_vec());
    }

    #[test]
    fn case_counts() {
        let suite = suite(2);
        let plan = FixturePlan::default();
        assert_eq!(suite.cases_for(ApiOperation::List).count(), 6);
        assert_eq!(suite.cases_for(ApiOperation::FetchById).count(), 9);
        assert_eq!(suite.cases_for(ApiOperation::Paged).count(), 4);
        assert_eq!(
            suite.cases_for(ApiOperation::Create).count(),
            plan.valid_cases + plan.invalid_cases
        );
        assert_eq!(
            suite.cases_for(ApiOperation::Update).count(),
            plan.valid_cases + plan.invalid_cases + plan.invalid_id_cases
        );
        assert_eq!(suite.cases_for(ApiOperation::BulkCopy).count(), 2);
        assert_eq!(suite.cases_for(ApiOperation::Import).count(), 2);
        assert_eq!(suite.cases_for(ApiOperation::Export).count(), 8);
        assert_eq!(suite.cases_for(ApiOperation::BulkExport).count(), 5);
    }

    #[test]
    fn same_seed_same_suite() {
        assert_eq!(suite(42), suite(42));
    }

    #[test]
    fn unknown_columns_outgrow_real_ones() {
        let (model, _) = project();
        let table = AliasTable::build(&model).unwrap();
        let longest = table.entries().iter().map(|e| e.alias.len()).max().unwrap();
        let suite = suite(3);
        let invalid = suite
            .cases_for(ApiOperation::List)
            .filter(|c| !c.valid)
            .collect::<Vec<_>>();
        assert_eq!(invalid.len(), 3);
        for case in invalid {
            for name in case.request["columnlist"].as_str().unwrap().split(',') {
                assert!(name.len() > longest, "{name} is not longer than {longest}");
            }
        }
    }

    #[test]
    fn payloads_agree_with_validator() {
        let (model, constraints) = project();
        let validator = Validator::for_model(&model, &constraints);
        let payload_count = model.payload_fields().count();
        let suite = suite(4);

        for case in suite.cases_for(ApiOperation::Create) {
            let request = case.request.as_object().unwrap();
            let report = validator.validate(request);
            if case.valid {
                assert!(report.is_valid(), "{}: {report}", case.description);
                assert!(case.corrupted_fields.is_empty());
            } else {
                assert_eq!(report.fields(), case.corrupted_fields, "{}", case.description);
                assert!(case.corrupted_fields.len() <= (payload_count / 2).max(1));
                assert_eq!(case.expected_response["data"], report.to_json());
            }
        }
    }

    #[test]
    fn resolved_payloads_agree_with_snapshot_validator() {
        let (model, constraints) = project();
        let snapshot = snapshot();
        let validator = Validator::for_model(&model, &constraints).with_references(&snapshot);
        let resolved = suite(5).resolve(&snapshot);

        for case in resolved.cases_for(ApiOperation::Create) {
            let request = case.request.as_object().unwrap();
            assert!(request["owner_id"].is_number() || request["owner_id"].is_null());
            let report = validator.validate(request);
            assert_eq!(report.fields(), case.corrupted_fields, "{}", case.description);
        }
    }

    #[test]
    fn update_paths_resolve() {
        let resolved = suite(6).resolve(&snapshot());
        let paths: HashSet<_> = resolved
            .cases_for(ApiOperation::Update)
            .map(|c| c.route.path.as_str())
            .collect();
        assert_eq!(paths, HashSet::from(["/api/project/10", "/api/project/112"]));
        for case in resolved.cases_for(ApiOperation::Update).filter(|c| !c.valid) {
            assert_eq!(case.route.method, HttpMethod::Put);
        }
    }

    #[test]
    fn export_matrix_identities_are_distinct() {
        let suite = suite(7);
        let identities: HashSet<String> = suite
            .cases_for(ApiOperation::Export)
            .map(|c| c.expected_response.get("violations").map(|v| v.to_string()).unwrap_or_default())
            .collect();
        assert_eq!(identities.len(), 8);
        let ok = suite.cases_for(ApiOperation::Export).filter(|c| c.valid).count();
        assert_eq!(ok, 1);
        let missing_everything = suite
            .cases_for(ApiOperation::Export)
            .find(|c| c.description == "missing id, unsupported format, unknown columns")
            .unwrap();
        assert_eq!(missing_everything.expected_response["code"], json!("D604"));
    }

    #[test]
    fn import_keys_errors_by_row() {
        let suite = suite(8);
        let bad = suite
            .cases_for(ApiOperation::Import)
            .find(|c| !c.valid)
            .unwrap();
        let errors = bad.expected_response["data"].as_object().unwrap();
        assert_eq!(errors.len(), 1);
        let row: usize = errors.keys().next().unwrap().parse().unwrap();
        assert!(bad.request["rows"][row].is_object());
    }

    #[test]
    fn unbreakable_models_get_no_invalid_payloads() {
        let xml = r#"<root><model>memo</model><fields>
            <field name="id" type="integer"/>
            <field name="body" type="text"/>
        </fields></root>"#;
        let model = ModelSpec::from_document(&MetadataDocument::parse(xml).unwrap()).unwrap();
        let constraints = ConstraintMap::derive(&model);
        let suite = Synthesizer::seeded(FixturePlan::default(), 9)
            .draft(&model, &constraints)
            .unwrap();
        assert!(suite.cases_for(ApiOperation::Create).all(|c| c.valid));
        assert!(suite.cases_for(ApiOperation::Import).all(|c| c.valid));
    }

    #[test]
    fn fields_without_valid_values_are_schema_defects() {
        let xml = r#"<root><model>contact</model><fields>
            <field name="id" type="integer"/>
            <field name="mail" type="varchar" email="1" max_length="5"/>
        </fields></root>"#;
        let model = ModelSpec::from_document(&MetadataDocument::parse(xml).unwrap()).unwrap();
        let constraints = ConstraintMap::derive(&model);
        let err = Synthesizer::seeded(FixturePlan::default(), 9)
            .draft(&model, &constraints)
            .unwrap_err();
        assert!(err.is_schema_defect());
        assert!(matches!(err, FixtureError::Unsatisfiable { ref field, .. } if field == "mail"));
    }

    #[test]
    fn suite_file_lands_under_unittest() {
        let file = suite(10).to_file().unwrap();
        assert_eq!(file.path, "unittest/project.json");
        let back: FixtureSuite = serde_json::from_str(&file.content).unwrap();
        assert_eq!(back.model, "project");
    }
}

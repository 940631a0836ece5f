//! Backend persistence model (`backend/models/<model>.py`).

use erpgen_ir::{parse_flag, DataType, FieldSpec, ModelSpec};

use crate::alias::AliasTable;
use crate::builder::{quote, CodeWriter, Dialect, Literal, GENERATED_BANNER};
use crate::{CodegenError, Family, GeneratedFile, GenerationContext, Generator};

pub struct ModelGenerator;

impl Generator for ModelGenerator {
    fn family(&self) -> Family {
        Family::Model
    }

    fn generate(&self, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError> {
        let model = &ctx.model;
        let aliases = AliasTable::build(model)?;

        let mut w = CodeWriter::new(Dialect::Python);
        w.comment(GENERATED_BANNER);
        w.line("from enum import Enum");
        w.blank();
        w.line("from odoo import fields, models");
        w.blank();
        w.blank();

        w.block(format!("class {}Alias(Enum):", model.class_name), None, |w| {
            for entry in aliases.entries() {
                w.line(format!("{} = {}", entry.alias, quote(&entry.target, Dialect::Python)));
            }
        });
        w.blank();
        w.blank();

        w.block(format!("class {}Label(Enum):", model.class_name), None, |w| {
            for field in &model.fields {
                w.line(format!("{} = {}", field.name, quote(&field.label, Dialect::Python)));
            }
        });
        w.blank();
        w.blank();

        let starts_inactive = ctx.options.starts_inactive(&model.model_name);
        w.block(format!("class {}(models.Model):", model.class_name), None, |w| {
            w.line(format!("_name = {}", quote(&model.model_name, Dialect::Python)));
            if !model.default_order.is_empty() {
                w.line(format!("_order = {}", quote(&model.default_order, Dialect::Python)));
            }
            let constraints = sql_constraints(model);
            if !constraints.is_empty() {
                w.assign("_sql_constraints", &Literal::List(constraints));
            }
            w.blank();

            for field in model.fields.iter().filter(|f| !f.is_id()) {
                let max_length = ctx
                    .constraints
                    .get(&field.name)
                    .and_then(|c| c.max_length);
                w.line(field_declaration(field, max_length));
            }
            if model.field("active").is_none() {
                let flag = if starts_inactive { 0 } else { 1 };
                w.line(format!("active = fields.Boolean(string='Active', default={flag})"));
            }
            w.line("can_delete = fields.Boolean(string='Can delete', compute='_compute_can_delete')");
            w.blank();

            w.block("def _compute_can_delete(self):", None, |w| {
                w.block("for record in self:", None, |w| {
                    w.line("self.env.cr.execute(");
                    w.line(format!(
                        "    'SELECT can_delete FROM {}_view WHERE id = %s', (record.id,)",
                        model.model_name
                    ));
                    w.line(")");
                    w.line("row = self.env.cr.fetchone()");
                    w.line("record.can_delete = bool(row and row[0])");
                });
            });
        });

        Ok(vec![GeneratedFile::new(
            ctx.path(Family::Model, &format!("{}.py", model.model_name)),
            w.finish(),
        )])
    }
}

/// `(name, definition, message)` triples for unique columns.
fn sql_constraints(model: &ModelSpec) -> Vec<Literal> {
    model
        .fields
        .iter()
        .filter(|f| !f.is_id() && (f.unique || f.primary_key))
        .map(|f| {
            let name = format!("{}_{}_unique", model.model_name, f.name);
            Literal::raw(format!(
                "({}, {}, {})",
                quote(&name, Dialect::Python),
                quote(&format!("unique({})", f.name), Dialect::Python),
                quote(&format!("{} already exists.", f.label), Dialect::Python),
            ))
        })
        .collect()
}

fn field_class(data_type: DataType) -> &'static str {
    match data_type {
        DataType::ShortText => "Char",
        DataType::LongText => "Text",
        DataType::Binary | DataType::File | DataType::Image => "Binary",
        DataType::Boolean => "Boolean",
        DataType::Date => "Date",
        DataType::DateTime => "Datetime",
        DataType::Integer | DataType::SmallInteger | DataType::Reference => "Integer",
        DataType::Float => "Float",
    }
}

fn field_declaration(field: &FieldSpec, max_length: Option<u32>) -> String {
    let py = |s: &str| quote(s, Dialect::Python);
    let mut args = Vec::new();

    let class = match field.reference() {
        Some(target) => {
            args.push(py(&target.model));
            "Many2one"
        }
        None => field_class(field.data_type),
    };
    args.push(format!("string={}", py(&field.label)));

    if field.data_type == DataType::ShortText {
        if let Some(n) = max_length {
            args.push(format!("size={n}"));
        }
    }
    if field.required {
        args.push("required=True".to_string());
    }
    if let Some(default) = default_clause(field) {
        args.push(format!("default={default}"));
    }
    if let Some(compute) = field.compute() {
        args.push(format!("compute={}", py(&compute.function)));
        if compute.store {
            args.push("store=True".to_string());
        }
    } else if field.auto_generated {
        args.push("readonly=True".to_string());
    }
    if field.is_reference() {
        let on_delete = field.on_delete.as_deref().unwrap_or("no action");
        args.push(format!("ondelete={}", py(on_delete)));
        args.push("index=True".to_string());
    }

    format!("{} = fields.{}({})", field.name, class, args.join(", "))
}

/// Default value clause, or `None` when the field must not carry one.
/// Undeclared defaults are `''`, except on dates which default to `False`.
fn default_clause(field: &FieldSpec) -> Option<String> {
    if field.is_reference() || field.is_computed() || field.auto_generated || field.has_null_default() {
        return None;
    }
    let declared = field.default_value.as_deref().filter(|v| !v.is_empty());
    let clause = match (field.data_type, declared) {
        (DataType::Date | DataType::DateTime, None) => "False".to_string(),
        (DataType::Boolean, Some(v)) => (if parse_flag(v) { "True" } else { "False" }).to_string(),
        (DataType::Integer | DataType::SmallInteger | DataType::Float, Some(v)) => v.to_string(),
        (_, Some(v)) => quote(v, Dialect::Python),
        (_, None) => quote("", Dialect::Python),
    };
    Some(clause)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, project, project_context};
    use crate::CodegenOptions;
    use std::sync::Arc;

    fn render() -> String {
        let files = ModelGenerator.generate(&project_context()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "backend/models/project.py");
        files[0].content.clone()
    }

    #[test]
    fn declares_fields() {
        let text = render();
        assert!(text.contains("class Project(models.Model):\n    _name = 'project'\n    _order = 'code asc'\n"));
        assert!(text.contains(
            "    code = fields.Char(string='Mã dự án', size=20, required=True, default='')\n"
        ));
        assert!(text.contains("    name = fields.Char(string='Tên dự án', size=100, required=True, default='')\n"));
        assert!(text.contains(
            "    owner_id = fields.Many2one('person', string='Owner', required=True, ondelete='cascade', index=True)\n"
        ));
        assert!(text.contains(
            "    backup_owner_id = fields.Many2one('person', string='Backup owner id', ondelete='no action', index=True)\n"
        ));
        assert!(text.contains("    start_date = fields.Date(string='Start date', default=False)\n"));
        assert!(text.contains("    budget = fields.Float(string='Budget', default=0)\n"));
        assert!(text.contains("    note = fields.Text(string='Note')\n"));
        assert!(text.contains("    archived = fields.Boolean(string='Archived', default='')\n"));
        assert!(text.contains("    contract = fields.Binary(string='Contract', default='')\n"));
        assert!(text.contains("    total = fields.Float(string='Total', compute='_compute_total')\n"));
        assert!(text.contains("    active = fields.Boolean(string='Active', default=1)\n"));
        assert!(!text.contains("    id = fields."));
    }

    #[test]
    fn declared_numeric_defaults_are_kept_verbatim() {
        let mut model = project();
        for field in &mut model.fields {
            match field.name.as_str() {
                "budget" => field.default_value = Some("DEFAULT_BUDGET".into()),
                "archived" => field.default_value = Some("1".into()),
                _ => {}
            }
        }
        let text = ModelGenerator.generate(&context(model)).unwrap().remove(0).content;
        assert!(text.contains("    budget = fields.Float(string='Budget', default=DEFAULT_BUDGET)\n"));
        assert!(text.contains("    archived = fields.Boolean(string='Archived', default=True)\n"));
    }

    #[test]
    fn enums_and_constraints() {
        let text = render();
        assert!(text.contains("class ProjectAlias(Enum):\n    id = 'id'\n    cod = 'code'\n    nam = 'name'\n"));
        assert!(text.contains("    own = 'owner_id'\n    ownco = 'owner_id.code'\n    ownna = 'owner_id.name'\n"));
        assert!(text.contains("    acti = 'active'\n    wd = 'write_date'\n    cd = 'can_delete'\n"));
        assert!(text.contains("    code = 'Mã dự án'\n"));
        assert!(text.contains("('project_code_unique', 'unique(code)', 'Mã dự án already exists.')"));
        assert!(text.contains("FROM project_view WHERE id = %s"));
    }

    #[test]
    fn inactive_models_start_inactive() {
        let mut ctx = context(project());
        ctx.options = Arc::new(CodegenOptions {
            inactive_models: vec!["project".into()],
            ..Default::default()
        });
        let text = ModelGenerator.generate(&ctx).unwrap().remove(0).content;
        assert!(text.contains("active = fields.Boolean(string='Active', default=0)"));
    }

    #[test]
    fn deterministic() {
        assert_eq!(render(), render());
    }
}

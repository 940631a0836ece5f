//! Frontend column settings (`frontend/columnsettings/<Class>Fields.js`).

use erpgen_ir::{capitalize, DataType, DisplayMode, FieldSpec, DEFAULT_SPAN};

use crate::alias::{AliasTable, WRITE_DATE_ALIAS};
use crate::builder::{CodeWriter, Dialect, Entries, Literal, GENERATED_BANNER};
use crate::{CodegenError, Family, GeneratedFile, GenerationContext, Generator};

pub struct FieldsGenerator;

impl Generator for FieldsGenerator {
    fn family(&self) -> Family {
        Family::Fields
    }

    fn generate(&self, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError> {
        let model = &ctx.model;
        let aliases = AliasTable::build(model)?;

        let mut columns: Vec<Literal> = model
            .fields
            .iter()
            .map(|f| column(f, &aliases).into_literal())
            .collect();
        columns.push(write_date_column().into_literal());

        let mut w = CodeWriter::new(Dialect::JavaScript);
        w.comment(GENERATED_BANNER);
        w.assign("fields", &Literal::List(columns));
        w.blank();
        w.line("export { fields };");

        Ok(vec![GeneratedFile::new(
            ctx.path(Family::Fields, &format!("{}Fields.js", model.class_name)),
            w.finish(),
        )])
    }
}

fn display(mode: DisplayMode) -> &'static str {
    match mode {
        DisplayMode::Shown => "default",
        DisplayMode::Collapsed => "collapsed",
        DisplayMode::Hidden => "hidden",
    }
}

fn widget(field: &FieldSpec) -> String {
    if field.is_reference() {
        return "select".to_string();
    }
    match field.data_type {
        DataType::Boolean => "checkbox".to_string(),
        DataType::Date => "date".to_string(),
        DataType::DateTime => "datetime".to_string(),
        DataType::File | DataType::Image => "upload".to_string(),
        DataType::Integer | DataType::SmallInteger | DataType::Float => "number".to_string(),
        _ => field.show_type.clone(),
    }
}

fn column(field: &FieldSpec, aliases: &AliasTable) -> Entries {
    let alias = aliases.alias_of(&field.name).unwrap_or(&field.name);
    let mut entry = Entries::new()
        .with("code", Literal::str(field.name.clone()))
        .with("alias", Literal::str(alias))
        .with("label", Literal::str(field.label.clone()));
    if let Some(target) = field.reference() {
        entry.push("reference", Literal::str(target.model.clone()));
    }
    entry
        .push("dataIndex", Literal::str(field.name.clone()))
        .push("dataType", Literal::str(field.data_type.as_str()))
        .push("type", Literal::str(widget(field)))
        .push("display", Literal::str(display(field.display_mode)))
        .push("hidden", Literal::Bool(field.is_id() || field.display_mode == DisplayMode::Hidden))
        .push("required", Literal::Bool(field.required))
        .push("unique", Literal::Bool(field.unique))
        .push("autoGenerate", Literal::Bool(field.auto_generated))
        .push("span", Literal::Int(i64::from(field.span)));

    let subs: Vec<Literal> = aliases
        .sub_aliases(&field.name)
        .map(|sub| {
            let part = sub.target.rsplit('.').next().unwrap_or_default();
            Entries::new()
                .with("code", Literal::str(sub.target.clone()))
                .with("alias", Literal::str(sub.alias.clone()))
                .with("label", Literal::str(format!("{} {}", field.label, part.replace('_', " "))))
                .with("dataIndex", Literal::str_list([field.name.as_str(), part]))
                .into_literal()
        })
        .collect();
    if !subs.is_empty() {
        entry.push("columns", Literal::List(subs));
    }
    entry
}

fn write_date_column() -> Entries {
    Entries::new()
        .with("code", Literal::str("write_date"))
        .with("alias", Literal::str(WRITE_DATE_ALIAS))
        .with("label", Literal::str(capitalize("last modified")))
        .with("dataIndex", Literal::str("write_date"))
        .with("dataType", Literal::str(DataType::DateTime.as_str()))
        .with("type", Literal::str("datetime"))
        .with("display", Literal::str(display(DisplayMode::Collapsed)))
        .with("hidden", Literal::Bool(false))
        .with("required", Literal::Bool(false))
        .with("unique", Literal::Bool(false))
        .with("autoGenerate", Literal::Bool(true))
        .with("span", Literal::Int(i64::from(DEFAULT_SPAN)))
}

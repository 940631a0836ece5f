//! Shared sample models for generator tests.

use std::sync::Arc;

use erpgen_ir::{MetadataDocument, ModelSpec, RawField};

use crate::{CodegenOptions, GenerationContext, Referrer};

pub(crate) fn document(model: &str, fields: &[&[(&str, &str)]]) -> MetadataDocument {
    let mut doc = MetadataDocument {
        system_code: "ERP".into(),
        sub_system_code: "PMS".into(),
        module_code: "PRJ".into(),
        model: model.into(),
        default_order: "code asc".into(),
        searchable_list: "code,name".into(),
        ..Default::default()
    };
    for pairs in fields {
        let mut raw = RawField::default();
        for (k, v) in *pairs {
            raw.set(k, v.to_string());
        }
        doc.fields.field.push(raw);
    }
    doc
}

/// `project` with one field of each interesting shape.
pub(crate) fn project() -> ModelSpec {
    let doc = document(
        "project",
        &[
            &[("name", "id"), ("type", "integer"), ("primary_key", "1")],
            &[("name", "code"), ("type", "varchar"), ("label", "Mã dự án"), ("not_null", "1"), ("max_length", "20"), ("unique", "1"), ("searchable", "1"), ("default_display", "d")],
            &[("name", "name"), ("type", "varchar"), ("label", "Tên dự án"), ("not_null", "1"), ("range_length", "[2,100]")],
            &[("name", "email"), ("type", "varchar"), ("email", "1"), ("max_length", "50")],
            &[("name", "owner_id"), ("type", "integer"), ("label", "Owner"), ("foreign_key", "person,code,name"), ("not_null", "1"), ("ondelete", "cascade")],
            &[("name", "backup_owner_id"), ("type", "integer"), ("foreign_key", "person,code,name")],
            &[("name", "start_date"), ("type", "date")],
            &[("name", "budget"), ("type", "float"), ("min", "0"), ("default_value", "0")],
            &[("name", "archived"), ("type", "bool")],
            &[("name", "contract"), ("type", "file"), ("file_type", "pdf"), ("file_size", "2048")],
            &[("name", "note"), ("type", "text"), ("default_value", "null")],
            &[("name", "total"), ("type", "float"), ("compute", "_compute_total"), ("auto_generate", "1")],
        ],
    );
    ModelSpec::from_document(&doc).unwrap()
}

pub(crate) fn context(model: ModelSpec) -> GenerationContext {
    GenerationContext::new(model, Arc::new(CodegenOptions::default()))
}

pub(crate) fn project_context() -> GenerationContext {
    context(project()).with_referrers(vec![Referrer {
        model: "task".into(),
        object_name: "task".into(),
        column: "project_id".into(),
    }])
}

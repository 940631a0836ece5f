//! Request handler (`backend/controllers/<model>.py`).

use erpgen_ir::ModelSpec;

use crate::builder::{quote, CodeWriter, Dialect, Entries, Literal, GENERATED_BANNER};
use crate::rules::RuleSet;
use crate::{CodegenError, Family, GeneratedFile, GenerationContext, Generator};

pub struct ControllerGenerator;

impl Generator for ControllerGenerator {
    fn family(&self) -> Family {
        Family::Controller
    }

    fn generate(&self, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError> {
        let model = &ctx.model;
        let rules = RuleSet::build(model, &ctx.constraints);
        rules.check_parity()?;

        let mut w = CodeWriter::new(Dialect::Python);
        w.comment(GENERATED_BANNER);
        w.line("from ..core.controller import BaseController");
        w.line("from ..core.validator import Validator");
        w.blank();
        w.blank();

        w.block(format!("class {}Controller(BaseController):", model.class_name), None, |w| {
            w.line(format!("model_name = {}", quote(&model.model_name, Dialect::Python)));
            w.assign("search_fields", &Literal::str_list(search_fields(model)));
            let mut field_list = model.column_names();
            if !field_list.contains(&"active") {
                field_list.push("active");
            }
            w.assign("field_list", &Literal::str_list(field_list));
            w.assign(
                "number_fields",
                &Literal::str_list(
                    model
                        .fields
                        .iter()
                        .filter(|f| !f.is_id() && f.data_type.is_number())
                        .map(|f| f.name.as_str()),
                ),
            );
            w.assign(
                "file_list",
                &Literal::str_list(
                    model
                        .fields
                        .iter()
                        .filter(|f| f.data_type.is_upload())
                        .map(|f| f.name.as_str()),
                ),
            );

            let mut foreign = Entries::new();
            for field in model.reference_fields() {
                if let Some(target) = field.reference() {
                    foreign.push(field.name.clone(), Literal::str(target.model.clone()));
                }
            }
            w.assign("foreign_fields", &foreign.into_literal());
            w.blank();
            w.assign("rules", &rules.rules_literal());
            w.assign("messages", &rules.messages_literal());
            w.line("validator = Validator(rules, messages)");
            w.blank();

            w.block("def _generate_object(self, data):", None, |w| {
                let mut object = Entries::new();
                for field in model.payload_fields() {
                    let getter = format!("data.get({})", quote(&field.name, Dialect::Python));
                    object.push(field.name.clone(), Literal::raw(getter));
                }
                w.line(format!("return {}", object.into_literal().render(Dialect::Python)));
            });

            for field in model.distinct_reference_fields() {
                w.blank();
                w.block(
                    format!("def get_all_by_{}(self, {}):", field.parent_name(), field.name),
                    None,
                    |w| {
                        w.line(format!(
                            "return self.get_all_by_parent({}, {})",
                            quote(&field.name, Dialect::Python),
                            field.name
                        ));
                    },
                );
            }
        });

        Ok(vec![GeneratedFile::new(
            ctx.path(Family::Controller, &format!("{}.py", model.model_name)),
            w.finish(),
        )])
    }
}

/// Declared searchable list, or the fields flagged searchable.
fn search_fields(model: &ModelSpec) -> Vec<&str> {
    if !model.searchable_fields.is_empty() {
        return model.searchable_fields.iter().map(String::as_str).collect();
    }
    model
        .fields
        .iter()
        .filter(|f| f.searchable)
        .map(|f| f.name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::project_context;

    fn render() -> String {
        let files = ControllerGenerator.generate(&project_context()).unwrap();
        assert_eq!(files[0].path, "backend/controllers/project.py");
        files[0].content.clone()
    }

    #[test]
    fn declares_lists() {
        let text = render();
        assert!(text.contains("class ProjectController(BaseController):\n    model_name = 'project'\n"));
        assert!(text.contains("    search_fields = ['code', 'name']\n"));
        assert!(text.contains("    number_fields = ['owner_id', 'backup_owner_id', 'budget', 'total']\n"));
        assert!(text.contains("    file_list = ['contract']\n"));
        assert!(text.contains("    foreign_fields = {\n        'owner_id': 'person',\n        'backup_owner_id': 'person',\n    }\n"));
        assert!(text.contains("'archived', 'contract', 'note', 'total', 'active']\n"));
    }

    #[test]
    fn rules_and_messages_in_lockstep() {
        let text = render();
        assert!(text.contains("        'email': {\n            'max_length': 50,\n            'email': True,\n        },\n"));
        assert!(text.contains("        'email': {\n            'max_length': 'Please enter no more than 50 characters.',\n            'email': 'Please enter a valid email address.',\n        },\n"));
        assert!(text.contains("        'fcontract': {\n            'type': 'pdf',\n            'size': 2048,\n        },\n"));
        assert!(text.contains("    validator = Validator(rules, messages)\n"));
    }

    #[test]
    fn one_parent_method_per_reference_field() {
        let text = render();
        assert!(text.contains("    def get_all_by_owner(self, owner_id):\n        return self.get_all_by_parent('owner_id', owner_id)\n"));
        assert!(text.contains("    def get_all_by_backup_owner(self, backup_owner_id):\n"));
        assert!(text.contains("            'code': data.get('code'),\n"));
        assert!(!text.contains("'total': data.get"));
    }
}

//! Per-family aggregate files, written once per batch.

use erpgen_ir::camel_case;
use serde::{Deserialize, Serialize};

use crate::builder::{CodeWriter, Dialect, Entries, Literal, GENERATED_BANNER};
use crate::{Family, GeneratedFile};

/// One model of the batch, as seen by the index generators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub model_name: String,
    pub class_name: String,
    /// Schema defect that kept the model out of the batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl IndexEntry {
    pub fn generated(model_name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            class_name: class_name.into(),
            failure: None,
        }
    }

    pub fn failed(model_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            class_name: String::new(),
            failure: Some(reason.into()),
        }
    }
}

/// Writes the aggregate file of one family.
#[derive(Debug, Clone, Copy)]
pub struct IndexGenerator {
    family: Family,
}

impl IndexGenerator {
    pub fn new(family: Family) -> Self {
        Self { family }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn generate(&self, entries: &[IndexEntry]) -> GeneratedFile {
        let content = match self.family {
            Family::Fixtures => fixtures_index(entries),
            Family::I18n => translations_index(entries),
            family => line_index(family, entries),
        };
        GeneratedFile::new(self.family.index_path(), content)
    }
}

fn dialect(family: Family) -> Dialect {
    match family {
        Family::Model | Family::Controller | Family::Route => Dialect::Python,
        Family::View => Dialect::Sql,
        Family::Fixtures => Dialect::Json,
        _ => Dialect::JavaScript,
    }
}

fn failure_line(w: &mut CodeWriter, entry: &IndexEntry) -> bool {
    match &entry.failure {
        Some(reason) => {
            w.comment(format!("FAILED {}: {}", entry.model_name, reason.replace('\n', " ")));
            true
        }
        None => false,
    }
}

fn line_index(family: Family, entries: &[IndexEntry]) -> String {
    let mut w = CodeWriter::new(dialect(family));
    w.comment(GENERATED_BANNER);
    for entry in entries {
        if failure_line(&mut w, entry) {
            continue;
        }
        let (model, class) = (&entry.model_name, &entry.class_name);
        let line = match family {
            Family::Model => format!("from . import {model}"),
            Family::Controller => format!("from .{model} import {class}Controller"),
            Family::Route => format!("from .{model} import blueprint as {model}_blueprint"),
            Family::View => format!("\\i {model}_view.sql"),
            Family::Fields => format!("export {{ fields as {class}Fields }} from \"./{class}Fields\";"),
            Family::Service => format!("export {{ default as {class}Service }} from \"./{class}Service\";"),
            Family::Navigation => {
                format!("export {{ default as {}Navigation }} from \"./{model}\";", camel_case(model))
            }
            Family::Configuration => {
                format!("export {{ {}Config }} from \"./{model}\";", camel_case(model))
            }
            Family::I18n | Family::Fixtures => continue,
        };
        w.line(line);
    }
    w.finish()
}

fn translations_index(entries: &[IndexEntry]) -> String {
    let mut w = CodeWriter::new(Dialect::JavaScript);
    w.comment(GENERATED_BANNER);
    w.block("const translations = {", Some("};"), |w| {
        for entry in entries {
            if failure_line(w, entry) {
                continue;
            }
            let model = &entry.model_name;
            w.line(format!(
                "{model}: {{ vi: () => import(\"./{model}/vi.json\"), en: () => import(\"./{model}/en.json\") }},"
            ));
        }
    });
    w.blank();
    w.line("export default translations;");
    w.finish()
}

/// JSON has no comments; failures are listed under `failed`.
fn fixtures_index(entries: &[IndexEntry]) -> String {
    let models: Vec<&str> = entries
        .iter()
        .filter(|e| e.failure.is_none())
        .map(|e| e.model_name.as_str())
        .collect();
    let failed: Vec<Literal> = entries
        .iter()
        .filter_map(|e| {
            e.failure.as_ref().map(|reason| {
                Entries::new()
                    .with("model", Literal::str(e.model_name.clone()))
                    .with("reason", Literal::str(reason.clone()))
                    .into_literal()
            })
        })
        .collect();
    let index = Entries::new()
        .with(
            "fixtures",
            Literal::str_list(models.iter().map(|m| format!("{m}.json"))),
        )
        .with("failed", Literal::List(failed));

    let mut w = CodeWriter::new(Dialect::Json);
    w.line(index.into_literal().render(Dialect::Json));
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> Vec<IndexEntry> {
        vec![
            IndexEntry::generated("person", "Person"),
            IndexEntry::failed("broken", "field 2 is missing `type`"),
            IndexEntry::generated("project", "Project"),
        ]
    }

    #[test]
    fn python_index() {
        let file = IndexGenerator::new(Family::Controller).generate(&batch());
        assert_eq!(file.path, "backend/controllers/__init__.py");
        let lines: Vec<_> = file.content.lines().skip(1).collect();
        assert_eq!(
            lines,
            vec![
                "from .person import PersonController",
                "# FAILED broken: field 2 is missing `type`",
                "from .project import ProjectController",
            ]
        );
    }

    #[test]
    fn javascript_and_sql_indexes() {
        let file = IndexGenerator::new(Family::Fields).generate(&batch());
        assert!(file.content.contains("export { fields as PersonFields } from \"./PersonFields\";\n"));
        assert!(file.content.contains("// FAILED broken: "));

        let file = IndexGenerator::new(Family::View).generate(&batch());
        assert!(file.content.contains("\\i project_view.sql\n"));
        assert!(file.content.contains("-- FAILED broken: "));

        let file = IndexGenerator::new(Family::I18n).generate(&batch());
        assert!(file.content.contains("  person: { vi: () => import(\"./person/vi.json\")"));
        assert!(file.content.contains("  // FAILED broken: "));
    }

    #[test]
    fn fixtures_index_is_json() {
        let file = IndexGenerator::new(Family::Fixtures).generate(&batch());
        let value: serde_json::Value = serde_json::from_str(&file.content).unwrap();
        assert_eq!(value["fixtures"], serde_json::json!(["person.json", "project.json"]));
        assert_eq!(value["failed"][0]["model"], "broken");
    }

    #[test]
    fn every_family_has_an_index() {
        for family in Family::ALL {
            let file = IndexGenerator::new(family).generate(&batch());
            assert_eq!(file.path, family.index_path());
            assert!(!file.content.is_empty());
        }
    }
}

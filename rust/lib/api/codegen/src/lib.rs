//! Artifact generators.
//!
//! Each generator owns one [`Family`] and turns a [`GenerationContext`] into
//! files. Generators are pure: same context, same bytes. The job layer runs
//! them one step at a time and collects their output into an archive;
//! [`index`] adds the per-family aggregate files once the batch is done.

pub mod alias;
pub mod builder;
pub mod error;
pub mod index;
pub mod registry;
pub mod rules;

pub mod configuration;
pub mod controller;
pub mod fields;
pub mod i18n;
pub mod model;
pub mod navigation;
pub mod route;
pub mod service;
pub mod view;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use erpgen_ir::{ConstraintMap, ModelSpec};
use serde::{Deserialize, Serialize};

pub use alias::{AliasEntry, AliasTable};
pub use error::CodegenError;
pub use index::{IndexEntry, IndexGenerator};
pub use registry::{GeneratorRegistry, JobTarget};
pub use rules::{RuleBlock, RuleSet};

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Archive-relative path, `/`-separated.
    pub path: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Artifact family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Model,
    Controller,
    Route,
    View,
    Fields,
    Service,
    I18n,
    Navigation,
    Configuration,
    Fixtures,
}

impl Family {
    pub const ALL: [Family; 10] = [
        Family::Model,
        Family::Controller,
        Family::Route,
        Family::View,
        Family::Fields,
        Family::Service,
        Family::I18n,
        Family::Navigation,
        Family::Configuration,
        Family::Fixtures,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Model => "model",
            Family::Controller => "controller",
            Family::Route => "route",
            Family::View => "view",
            Family::Fields => "fields",
            Family::Service => "service",
            Family::I18n => "i18n",
            Family::Navigation => "navigation",
            Family::Configuration => "configuration",
            Family::Fixtures => "fixtures",
        }
    }

    /// Archive directory of the family.
    pub fn dir(&self) -> &'static str {
        match self {
            Family::Model => "backend/models",
            Family::Controller => "backend/controllers",
            Family::Route => "backend/routes",
            Family::View => "backend/views",
            Family::Fields => "frontend/columnsettings",
            Family::Service => "frontend/services",
            Family::I18n => "frontend/translations",
            Family::Navigation => "frontend/navigation",
            Family::Configuration => "frontend/configuration",
            Family::Fixtures => "unittest",
        }
    }

    /// Aggregate file written once per batch.
    pub fn index_path(&self) -> String {
        let file = match self {
            Family::Model | Family::Controller | Family::Route => "__init__.py",
            Family::View => "index.sql",
            Family::Fields | Family::Service | Family::I18n => "index.js",
            Family::Navigation => "navigation.js",
            Family::Configuration => "config.js",
            Family::Fixtures => "index.json",
        };
        format!("{}/{}", self.dir(), file)
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Batch-wide generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodegenOptions {
    /// Navigation module the menu entries are filed under.
    pub menu_module: String,
    /// Models whose records start inactive (approval workflow).
    pub inactive_models: Vec<String>,
    /// Prefixes stripped from table names when naming view objects.
    pub table_prefixes: Vec<String>,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            menu_module: "categories".to_string(),
            inactive_models: Vec::new(),
            table_prefixes: Vec::new(),
        }
    }
}

impl CodegenOptions {
    pub fn starts_inactive(&self, model: &str) -> bool {
        self.inactive_models.iter().any(|m| m == model)
    }
}

/// A column of another model pointing at the model being generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referrer {
    /// Referring table.
    pub model: String,
    /// Referring table without its prefix.
    pub object_name: String,
    /// Referring column.
    pub column: String,
}

/// Reference fields across `models` that target `target`, in batch then
/// field order.
pub fn collect_referrers(models: &[ModelSpec], target: &str, prefixes: &[String]) -> Vec<Referrer> {
    models
        .iter()
        .flat_map(|m| {
            m.reference_fields()
                .filter(|f| f.reference().is_some_and(|r| r.model == target))
                .map(move |f| Referrer {
                    model: m.model_name.clone(),
                    object_name: m.object_name(prefixes).to_string(),
                    column: f.name.clone(),
                })
        })
        .collect()
}

/// Everything a generator may read about one model.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub model: ModelSpec,
    pub constraints: ConstraintMap,
    pub referrers: Vec<Referrer>,
    pub options: Arc<CodegenOptions>,
}

impl GenerationContext {
    /// Context with freshly derived constraints and no referrers.
    pub fn new(model: ModelSpec, options: Arc<CodegenOptions>) -> Self {
        let constraints = ConstraintMap::derive(&model);
        Self {
            model,
            constraints,
            referrers: Vec::new(),
            options,
        }
    }

    pub fn with_referrers(mut self, referrers: Vec<Referrer>) -> Self {
        self.referrers = referrers;
        self
    }

    /// Per-model path `<family dir>/<file>`.
    pub fn path(&self, family: Family, file: &str) -> String {
        format!("{}/{}", family.dir(), file)
    }
}

/// A generator strategy.
pub trait Generator: Send + Sync {
    fn family(&self) -> Family;

    fn generate(&self, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use erpgen_ir::{MetadataDocument, RawField};

    fn model(name: &str, fks: &[(&str, &str)]) -> ModelSpec {
        let mut doc = MetadataDocument {
            model: name.into(),
            ..Default::default()
        };
        for (field, target) in fks {
            let mut raw = RawField::default();
            raw.set("name", field.to_string());
            raw.set("type", "integer".to_string());
            raw.set("foreign_key", format!("{target},code,name"));
            doc.fields.field.push(raw);
        }
        ModelSpec::from_document(&doc).unwrap()
    }

    #[test]
    fn referrers_across_batch() {
        let models = vec![
            model("hr_person", &[]),
            model("hr_project", &[("owner_id", "hr_person"), ("backup_owner_id", "hr_person")]),
            model("hr_task", &[("project_id", "hr_project"), ("assignee_id", "hr_person")]),
        ];
        let refs = collect_referrers(&models, "hr_person", &["hr_".to_string()]);
        let pairs: Vec<_> = refs
            .iter()
            .map(|r| (r.object_name.as_str(), r.column.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("project", "owner_id"), ("project", "backup_owner_id"), ("task", "assignee_id")]
        );
        assert!(collect_referrers(&models, "hr_task", &[]).is_empty());
    }

    #[test]
    fn index_paths() {
        assert_eq!(Family::Model.index_path(), "backend/models/__init__.py");
        assert_eq!(Family::View.index_path(), "backend/views/index.sql");
        assert_eq!(Family::Navigation.index_path(), "frontend/navigation/navigation.js");
        assert_eq!(Family::Configuration.index_path(), "frontend/configuration/config.js");
        assert_eq!(Family::Fixtures.index_path(), "unittest/index.json");
    }
}

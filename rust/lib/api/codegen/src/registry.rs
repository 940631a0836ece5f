//! Generator lookup by job target.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::configuration::ConfigurationGenerator;
use crate::controller::ControllerGenerator;
use crate::fields::FieldsGenerator;
use crate::i18n::I18nGenerator;
use crate::model::ModelGenerator;
use crate::navigation::NavigationGenerator;
use crate::route::RouteGenerator;
use crate::service::ServiceGenerator;
use crate::view::ViewGenerator;
use crate::{Family, Generator};

/// What a job builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobTarget {
    Backend,
    Frontend,
    UnitTest,
    Full,
}

impl JobTarget {
    /// Job id prefix.
    pub fn code(&self) -> &'static str {
        match self {
            JobTarget::Backend => "BE",
            JobTarget::Frontend => "FE",
            JobTarget::UnitTest => "UT",
            JobTarget::Full => "FULL",
        }
    }

    pub fn families(&self) -> &'static [Family] {
        const BACKEND: &[Family] = &[Family::Model, Family::Controller, Family::Route, Family::View];
        const FRONTEND: &[Family] = &[
            Family::Fields,
            Family::Service,
            Family::I18n,
            Family::Navigation,
            Family::Configuration,
        ];
        const FULL: &[Family] = &Family::ALL;
        match self {
            JobTarget::Backend => BACKEND,
            JobTarget::Frontend => FRONTEND,
            JobTarget::UnitTest => &[Family::Fixtures],
            JobTarget::Full => FULL,
        }
    }

    pub fn includes(&self, family: Family) -> bool {
        self.families().contains(&family)
    }
}

impl std::fmt::Display for JobTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for JobTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "be" | "backend" => Ok(JobTarget::Backend),
            "fe" | "frontend" => Ok(JobTarget::Frontend),
            "ut" | "unittest" | "unit_test" => Ok(JobTarget::UnitTest),
            "full" | "all" => Ok(JobTarget::Full),
            other => Err(format!("unknown target `{other}`")),
        }
    }
}

/// Generator strategies, in registration order.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    generators: Vec<Arc<dyn Generator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, generator: Arc<dyn Generator>) -> &mut Self {
        self.generators.push(generator);
        self
    }

    /// The nine standard families.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register(Arc::new(ModelGenerator))
            .register(Arc::new(ControllerGenerator))
            .register(Arc::new(RouteGenerator))
            .register(Arc::new(ViewGenerator))
            .register(Arc::new(FieldsGenerator))
            .register(Arc::new(ServiceGenerator))
            .register(Arc::new(I18nGenerator))
            .register(Arc::new(NavigationGenerator))
            .register(Arc::new(ConfigurationGenerator));
        registry
    }

    /// Generators whose family belongs to `target`.
    pub fn for_target(&self, target: JobTarget) -> Vec<Arc<dyn Generator>> {
        self.generators
            .iter()
            .filter(|g| target.includes(g.family()))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let families: Vec<_> = self.generators.iter().map(|g| g.family()).collect();
        f.debug_struct("GeneratorRegistry").field("families", &families).finish()
    }
}

//! The REST surface every generated model exposes.
//!
//! The routing-table generator renders this list and the fixture
//! synthesizer addresses it, so both agree on paths and methods.

use serde::{Deserialize, Serialize};

/// HTTP method of a generated route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API operation exercised by synthesized fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiOperation {
    List,
    FetchById,
    Paged,
    Create,
    Update,
    BulkCopy,
    BulkDelete,
    Import,
    Export,
    BulkExport,
}

impl ApiOperation {
    /// Every operation, in fixture order.
    pub const ALL: [ApiOperation; 10] = [
        Self::List,
        Self::FetchById,
        Self::Paged,
        Self::Create,
        Self::Update,
        Self::BulkCopy,
        Self::BulkDelete,
        Self::Import,
        Self::Export,
        Self::BulkExport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::FetchById => "fetch_by_id",
            Self::Paged => "paged",
            Self::Create => "create",
            Self::Update => "update",
            Self::BulkCopy => "bulk_copy",
            Self::BulkDelete => "bulk_delete",
            Self::Import => "import",
            Self::Export => "export",
            Self::BulkExport => "bulk_export",
        }
    }

    /// Method used when calling this operation.
    pub fn method(&self) -> HttpMethod {
        match self {
            Self::List | Self::FetchById | Self::Paged | Self::Export => HttpMethod::Get,
            Self::Create | Self::BulkCopy | Self::Import | Self::BulkExport => HttpMethod::Post,
            Self::Update => HttpMethod::Put,
            Self::BulkDelete => HttpMethod::Delete,
        }
    }

    /// The route serving this operation.
    pub fn route(&self) -> &'static RouteSpec {
        let handler = match self {
            Self::List => "get_all",
            Self::FetchById => "get_by_id",
            Self::Paged => "get_by_page",
            Self::Create => "store",
            Self::Update => "update",
            Self::BulkCopy => "mass_copy",
            Self::BulkDelete => "mass_delete",
            Self::Import => "import_data",
            Self::Export => "export_by_id",
            Self::BulkExport => "mass_export",
        };
        STANDARD_ROUTES
            .iter()
            .find(|r| r.handler == handler)
            .unwrap_or(&STANDARD_ROUTES[0])
    }

    /// Concrete request path for `model`, with `<id>` and `<page>` filled in.
    pub fn path(&self, model: &str, id: &str, page: &str) -> String {
        self.route()
            .path(model)
            .replace("<id>", id)
            .replace("<page>", page)
    }
}

impl std::fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    /// Controller method handling the route.
    pub handler: &'static str,
    /// Path below `/api/<model>`, with `<id>`/`<page>` parameters.
    pub suffix: &'static str,
    pub methods: &'static [HttpMethod],
    /// Permission letter appended to the action code (`R`, `C`, `U`, ...).
    pub permission: char,
}

impl RouteSpec {
    pub fn path(&self, model: &str) -> String {
        format!("/api/{model}{}", self.suffix)
    }
}

use HttpMethod::{Delete, Get, Post, Put};

/// Routes of every generated model, in registration order. Fixed paths
/// (`/copy`, `/export`) precede `/<id>` variants they would otherwise shadow.
pub static STANDARD_ROUTES: [RouteSpec; 17] = [
    RouteSpec { handler: "get_all", suffix: "", methods: &[Get], permission: 'R' },
    RouteSpec { handler: "get_by_page", suffix: "/page/<page>", methods: &[Get], permission: 'R' },
    RouteSpec { handler: "mass_copy", suffix: "/copy", methods: &[Post], permission: 'V' },
    RouteSpec { handler: "mass_delete", suffix: "/delete", methods: &[Delete], permission: 'D' },
    RouteSpec { handler: "import_data", suffix: "/import", methods: &[Post], permission: 'I' },
    RouteSpec { handler: "import_template", suffix: "/import", methods: &[Get], permission: 'R' },
    RouteSpec { handler: "export_by_id", suffix: "/export/<id>", methods: &[Post, Get], permission: 'E' },
    RouteSpec { handler: "mass_export", suffix: "/export", methods: &[Post, Get], permission: 'E' },
    RouteSpec { handler: "help", suffix: "/help", methods: &[Get], permission: 'R' },
    RouteSpec { handler: "validate", suffix: "/validate", methods: &[Post], permission: 'R' },
    RouteSpec { handler: "metadata", suffix: "/metadata", methods: &[Get], permission: 'R' },
    RouteSpec { handler: "change_state", suffix: "/state/<id>", methods: &[Post, Put], permission: 'A' },
    RouteSpec { handler: "mass_change_state", suffix: "/state", methods: &[Post, Put], permission: 'A' },
    RouteSpec { handler: "get_by_id", suffix: "/<id>", methods: &[Get], permission: 'R' },
    RouteSpec { handler: "store", suffix: "", methods: &[Post], permission: 'C' },
    RouteSpec { handler: "update", suffix: "/<id>", methods: &[Post, Put], permission: 'U' },
    RouteSpec { handler: "delete", suffix: "/<id>", methods: &[Delete], permission: 'D' },
];

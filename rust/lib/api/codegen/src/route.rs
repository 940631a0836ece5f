//! Routing table (`backend/routes/<model>.py`).

use erpgen_ir::{HttpMethod, STANDARD_ROUTES};

use crate::builder::{quote, CodeWriter, Dialect, GENERATED_BANNER};
use crate::{CodegenError, Family, GeneratedFile, GenerationContext, Generator};

pub struct RouteGenerator;

/// One line of the generated `ROUTES` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLine {
    pub path: String,
    pub methods: Vec<HttpMethod>,
    pub handler: String,
    pub permission: char,
}

/// Standard routes followed by one fetch-all-by-parent route per distinct
/// reference field.
pub fn route_table(ctx: &GenerationContext) -> Vec<RouteLine> {
    let model = &ctx.model;
    let mut lines: Vec<RouteLine> = STANDARD_ROUTES
        .iter()
        .map(|r| RouteLine {
            path: r.path(&model.model_name),
            methods: r.methods.to_vec(),
            handler: r.handler.to_string(),
            permission: r.permission,
        })
        .collect();

    for field in model.distinct_reference_fields() {
        lines.push(RouteLine {
            path: format!("/api/{}/{}/<{}>", model.model_name, field.parent_name(), field.name),
            methods: vec![HttpMethod::Get],
            handler: format!("get_all_by_{}", field.parent_name()),
            permission: 'R',
        });
    }
    lines
}

impl Generator for RouteGenerator {
    fn family(&self) -> Family {
        Family::Route
    }

    fn generate(&self, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError> {
        let model = &ctx.model;
        let py = |s: &str| quote(s, Dialect::Python);

        let mut w = CodeWriter::new(Dialect::Python);
        w.comment(GENERATED_BANNER);
        w.line("from flask import Blueprint");
        w.blank();
        w.line(format!(
            "from ..controllers.{} import {}Controller",
            model.model_name, model.class_name
        ));
        w.blank();
        w.line(format!("ACTION_CODE = {}", py(&model.action_code())));
        w.blank();
        w.line(format!("controller = {}Controller()", model.class_name));
        w.line(format!("blueprint = Blueprint({}, __name__)", py(&model.model_name)));
        w.blank();

        w.block("ROUTES = [", Some("]"), |w| {
            for route in route_table(ctx) {
                let methods: Vec<String> = route.methods.iter().map(|m| py(m.as_str())).collect();
                w.line(format!(
                    "({}, [{}], {}, ACTION_CODE + {}),",
                    py(&route.path),
                    methods.join(", "),
                    py(&route.handler),
                    py(&format!("-{}", route.permission)),
                ));
            }
        });
        w.blank();

        w.block("for path, methods, handler, permission in ROUTES:", None, |w| {
            w.block("blueprint.add_url_rule(", Some(")"), |w| {
                w.line("path,");
                w.line("endpoint=handler,");
                w.line("view_func=controller.guard(getattr(controller, handler), permission),");
                w.line("methods=methods,");
            });
        });

        Ok(vec![GeneratedFile::new(
            ctx.path(Family::Route, &format!("{}.py", model.model_name)),
            w.finish(),
        )])
    }
}

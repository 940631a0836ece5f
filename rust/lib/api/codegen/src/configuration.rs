//! Global configuration entry (`frontend/configuration/<model>.js`).

use erpgen_ir::camel_case;

use crate::builder::{CodeWriter, Dialect, Entries, Literal, GENERATED_BANNER};
use crate::{CodegenError, Family, GeneratedFile, GenerationContext, Generator};

pub struct ConfigurationGenerator;

impl Generator for ConfigurationGenerator {
    fn family(&self) -> Family {
        Family::Configuration
    }

    fn generate(&self, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError> {
        let model = &ctx.model;

        let config = Entries::new()
            .with("model", Literal::str(model.model_name.clone()))
            .with("actionCode", Literal::str(model.action_code()))
            .with("api", Literal::str(format!("/api/{}", model.model_name)))
            .with("defaultOrder", Literal::opt_str(Some(model.default_order.as_str()).filter(|s| !s.is_empty())))
            .with("searchFields", Literal::str_list(model.searchable_fields.iter().map(String::as_str)))
            .with("requiresApproval", Literal::Bool(ctx.options.starts_inactive(&model.model_name)))
            .with("hasReferrers", Literal::Bool(!ctx.referrers.is_empty()));

        let name = format!("{}Config", camel_case(&model.model_name));
        let mut w = CodeWriter::new(Dialect::JavaScript);
        w.comment(GENERATED_BANNER);
        w.line(format!("export {}", render_const(&name, config.into_literal())));

        Ok(vec![GeneratedFile::new(
            ctx.path(Family::Configuration, &format!("{}.js", model.model_name)),
            w.finish(),
        )])
    }
}

fn render_const(name: &str, value: Literal) -> String {
    format!("const {name} = {};", value.render(Dialect::JavaScript))
}

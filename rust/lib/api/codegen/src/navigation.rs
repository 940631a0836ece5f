//! Menu entry (`frontend/navigation/<model>.js`).

use erpgen_ir::{camel_case, capitalize};

use crate::builder::{CodeWriter, Dialect, Entries, Literal, GENERATED_BANNER};
use crate::{CodegenError, Family, GeneratedFile, GenerationContext, Generator};

pub struct NavigationGenerator;

impl Generator for NavigationGenerator {
    fn family(&self) -> Family {
        Family::Navigation
    }

    fn generate(&self, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError> {
        let model = &ctx.model;
        let menu = &ctx.options.menu_module;

        let entry = Entries::new()
            .with("key", Literal::str(format!("{menu}-{}", model.model_name)))
            .with(
                "code",
                Literal::raw(format!(
                    "`${{SYSTEM_CODE}}_{}-{}-R`",
                    model.sub_system_code, model.module_code
                )),
            )
            .with("path", Literal::str(format!("/{menu}/{}", model.model_name)))
            .with("title", Literal::str(capitalize(&model.display_name())))
            .with("translateKey", Literal::str(format!("{}.title", model.model_name)));

        let mut w = CodeWriter::new(Dialect::JavaScript);
        w.comment(GENERATED_BANNER);
        w.line("import { SYSTEM_CODE } from \"../config\";");
        w.blank();
        let name = format!("{}Navigation", camel_case(&model.model_name));
        w.assign(&name, &entry.into_literal());
        w.blank();
        w.line(format!("export default {name};"));

        Ok(vec![GeneratedFile::new(
            ctx.path(Family::Navigation, &format!("{}.js", model.model_name)),
            w.finish(),
        )])
    }
}

//! Frontend service binding (`frontend/services/<Class>Service.js`).

use erpgen_ir::{camel_case, pascal_case, DataType};

use crate::builder::{quote, CodeWriter, Dialect, GENERATED_BANNER};
use crate::{CodegenError, Family, GeneratedFile, GenerationContext, Generator};

pub struct ServiceGenerator;

impl Generator for ServiceGenerator {
    fn family(&self) -> Family {
        Family::Service
    }

    fn generate(&self, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError> {
        let model = &ctx.model;
        let js = |s: &str| quote(s, Dialect::JavaScript);
        let base = format!("/api/{}", model.model_name);

        let mut w = CodeWriter::new(Dialect::JavaScript);
        w.comment(GENERATED_BANNER);
        w.line("import BaseService from \"../BaseService\";");
        w.blank();

        w.block(format!("class {}Service extends BaseService {{", model.class_name), Some("}"), |w| {
            w.block("constructor() {", Some("}"), |w| {
                w.line(format!("super({});", js(&base)));
            });

            for field in model.distinct_reference_fields() {
                let parent = pascal_case(field.parent_name());
                let param = camel_case(&field.name);
                let url = format!("`{base}/{}/${{{param}}}`", field.parent_name());
                w.blank();
                w.block(format!("getBy{parent}({param}) {{"), Some("}"), |w| {
                    w.line(format!("return this.request({url});"));
                });
                w.blank();
                w.block(format!("getCountBy{parent}({param}) {{"), Some("}"), |w| {
                    w.line(format!("return this.request({url}, {{ params: {{ count: 1 }} }});"));
                });
            }

            w.blank();
            w.block("prepareFormData(data) {", Some("}"), |w| {
                w.line("const formData = new FormData();");
                for field in model.payload_fields() {
                    let key = js(&field.name);
                    let access = format!("data.{}", field.name);
                    match field.data_type {
                        DataType::Boolean => {
                            w.line(format!("formData.append({key}, {access} ? 1 : 0);"));
                        }
                        DataType::File | DataType::Image => {
                            w.block(format!("if ({access} instanceof File) {{"), Some("}"), |w| {
                                w.line(format!("formData.append({}, {access});", js(&format!("f{}", field.name))));
                            });
                            w.line(format!("formData.append({key}, {access}?.name ?? \"\");"));
                        }
                        _ => {
                            w.line(format!("formData.append({key}, {access} ?? \"\");"));
                        }
                    }
                }
                w.line("return formData;");
            });
        });
        w.blank();
        w.line(format!("export default new {}Service();", model.class_name));

        Ok(vec![GeneratedFile::new(
            ctx.path(Family::Service, &format!("{}Service.js", model.class_name)),
            w.finish(),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::project_context;

    #[test]
    fn parent_lookups_and_form_data() {
        let file = ServiceGenerator.generate(&project_context()).unwrap().remove(0);
        assert_eq!(file.path, "frontend/services/ProjectService.js");
        let text = file.content;
        assert!(text.contains("class ProjectService extends BaseService {\n  constructor() {\n    super(\"/api/project\");\n  }\n"));
        assert!(text.contains("  getByOwner(ownerId) {\n    return this.request(`/api/project/owner/${ownerId}`);\n  }\n"));
        assert!(text.contains("  getCountByBackupOwner(backupOwnerId) {\n"));
        assert!(text.contains("    formData.append(\"archived\", data.archived ? 1 : 0);\n"));
        assert!(text.contains("    if (data.contract instanceof File) {\n      formData.append(\"fcontract\", data.contract);\n    }\n"));
        assert!(text.contains("    formData.append(\"code\", data.code ?? \"\");\n"));
        assert!(!text.contains("data.total"));
        assert!(text.ends_with("}\n\nexport default new ProjectService();\n"));
    }
}

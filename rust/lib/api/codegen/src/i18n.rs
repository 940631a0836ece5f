//! Localization tables (`frontend/translations/<model>/{vi,en}.json`).

use erpgen_ir::{capitalize, ModelSpec};

use crate::builder::{CodeWriter, Dialect, Entries, Literal};
use crate::{CodegenError, Family, GeneratedFile, GenerationContext, Generator};

pub struct I18nGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Locale {
    Vi,
    En,
}

impl Locale {
    fn code(&self) -> &'static str {
        match self {
            Locale::Vi => "vi",
            Locale::En => "en",
        }
    }

    /// Standard screen keys and their `{name}` templates.
    fn screen_keys(&self) -> [(&'static str, &'static str); 9] {
        match self {
            Locale::Vi => [
                ("list_title", "Danh sách {name}"),
                ("create_title", "Thêm mới {name}"),
                ("edit_title", "Cập nhật {name}"),
                ("delete_confirm", "Bạn có chắc chắn muốn xóa {name} đã chọn?"),
                ("import_title", "Nhập {name} từ tệp"),
                ("export_title", "Xuất {name}"),
                ("save_success", "Lưu {name} thành công"),
                ("delete_success", "Xóa {name} thành công"),
                ("copy_success", "Sao chép {name} thành công"),
            ],
            Locale::En => [
                ("list_title", "{name} list"),
                ("create_title", "New {name}"),
                ("edit_title", "Edit {name}"),
                ("delete_confirm", "Delete the selected {name}?"),
                ("import_title", "Import {name}"),
                ("export_title", "Export {name}"),
                ("save_success", "{name} saved"),
                ("delete_success", "{name} deleted"),
                ("copy_success", "{name} copied"),
            ],
        }
    }
}

fn humanize(name: &str) -> String {
    capitalize(&name.replace('_', " "))
}

fn table(model: &ModelSpec, locale: Locale) -> Literal {
    let title = match locale {
        Locale::Vi => capitalize(&model.display_name()),
        Locale::En => humanize(&model.model_name),
    };

    let mut labels = Entries::new();
    for field in &model.fields {
        let label = match locale {
            Locale::Vi => field.label.clone(),
            Locale::En => humanize(&field.name),
        };
        labels.push(field.name.clone(), Literal::str(label));
    }

    let mut out = Entries::new().with("title", Literal::str(title.clone()));
    for (key, template) in locale.screen_keys() {
        out.push(key, Literal::str(template.replace("{name}", &title)));
    }
    out.push("fields", labels.into_literal());
    out.into_literal()
}

impl Generator for I18nGenerator {
    fn family(&self) -> Family {
        Family::I18n
    }

    fn generate(&self, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError> {
        let model = &ctx.model;
        Ok([Locale::Vi, Locale::En]
            .into_iter()
            .map(|locale| {
                let mut w = CodeWriter::new(Dialect::Json);
                w.line(table(model, locale).render(Dialect::Json));
                GeneratedFile::new(
                    ctx.path(Family::I18n, &format!("{}/{}.json", model.model_name, locale.code())),
                    w.finish(),
                )
            })
            .collect())
    }
}

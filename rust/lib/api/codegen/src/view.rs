//! Relational view (`backend/views/<model>_view.sql`).
//!
//! Adds one count column per referring (table, column) pair. A record can be
//! deleted when every count is zero.

use crate::builder::{CodeWriter, Dialect, GENERATED_BANNER};
use crate::{CodegenError, Family, GeneratedFile, GenerationContext, Generator};

pub struct ViewGenerator;

impl Generator for ViewGenerator {
    fn family(&self) -> Family {
        Family::View
    }

    fn generate(&self, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, CodegenError> {
        let model = &ctx.model;

        let mut counts: Vec<(String, String)> = Vec::new();
        for referrer in &ctx.referrers {
            let name = format!("{}_{}_count", referrer.object_name, referrer.column);
            if counts.iter().any(|(n, _)| *n == name) {
                continue;
            }
            let query = format!(
                "(SELECT COUNT(*) FROM {} r WHERE r.{} = t.id)",
                referrer.model, referrer.column
            );
            counts.push((name, query));
        }

        let mut w = CodeWriter::new(Dialect::Sql);
        w.comment(GENERATED_BANNER);
        w.line(format!("CREATE OR REPLACE VIEW {}_view AS", model.model_name));
        w.block("SELECT", None, |w| {
            w.line("t.*,");
            for (name, query) in &counts {
                w.line(format!("{query} AS {name},"));
            }
            if counts.is_empty() {
                w.line("TRUE AS can_delete");
            } else {
                let all_zero: Vec<String> = counts.iter().map(|(_, q)| format!("{q} = 0")).collect();
                w.line(format!("({}) AS can_delete", all_zero.join("\n    AND ")));
            }
        });
        w.line(format!("FROM {} t;", model.model_name));

        Ok(vec![GeneratedFile::new(
            ctx.path(Family::View, &format!("{}_view.sql", model.model_name)),
            w.finish(),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, project, project_context};
    use crate::Referrer;

    #[test]
    fn counts_each_referrer() {
        let mut ctx = project_context();
        ctx.referrers.push(Referrer {
            model: "hr_timesheet".into(),
            object_name: "timesheet".into(),
            column: "project_id".into(),
        });
        let file = ViewGenerator.generate(&ctx).unwrap().remove(0);
        assert_eq!(file.path, "backend/views/project_view.sql");
        assert!(file.content.contains("CREATE OR REPLACE VIEW project_view AS\nSELECT\n    t.*,\n"));
        assert!(file.content.contains(
            "    (SELECT COUNT(*) FROM task r WHERE r.project_id = t.id) AS task_project_id_count,\n"
        ));
        assert!(file.content.contains("AS timesheet_project_id_count,\n"));
        assert!(file.content.contains(
            "    ((SELECT COUNT(*) FROM task r WHERE r.project_id = t.id) = 0\n        AND (SELECT COUNT(*) FROM hr_timesheet r WHERE r.project_id = t.id) = 0) AS can_delete\n"
        ));
        assert!(file.content.ends_with("FROM project t;\n"));
    }

    #[test]
    fn unreferenced_model_is_pass_through() {
        let file = ViewGenerator.generate(&context(project())).unwrap().remove(0);
        assert!(file.content.contains("SELECT\n    t.*,\n    TRUE AS can_delete\nFROM project t;\n"));
        assert!(!file.content.contains("COUNT"));
    }
}

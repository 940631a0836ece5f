//! Short query/sort tokens ("aliases") for model columns.
//!
//! Aliases become enum member names in the generated persistence model, so
//! they must be unique and must not be Python keywords.

use std::collections::HashSet;

use erpgen_ir::ModelSpec;

use crate::error::CodegenError;

/// Python keywords; none of them can be an enum member name.
pub const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Alias of the computed `can_delete` column.
pub const CAN_DELETE_ALIAS: &str = "cd";
/// Alias of the implicit `active` column.
pub const ACTIVE_ALIAS: &str = "acti";
/// Alias of the implicit `write_date` column.
pub const WRITE_DATE_ALIAS: &str = "wd";

/// Implicit columns appended after the model's own fields.
pub const IMPLICIT_COLUMNS: [(&str, &str); 3] = [
    (ACTIVE_ALIAS, "active"),
    (WRITE_DATE_ALIAS, "write_date"),
    (CAN_DELETE_ALIAS, "can_delete"),
];

/// Suffix attempts before alias assignment gives up (`tok`, `tok1` … `tok99`).
const MAX_ATTEMPTS: usize = 100;

/// One assigned alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub alias: String,
    /// Column path: `name`, or `owner_id.code` for a reference sub-field.
    pub target: String,
    /// Field the alias belongs to; empty for implicit columns.
    pub field: String,
}

impl AliasEntry {
    pub fn is_sub_alias(&self) -> bool {
        self.target.contains('.')
    }
}

/// Aliases of one model, in assignment order.
#[derive(Debug, Clone)]
pub struct AliasTable {
    reserved: HashSet<String>,
    entries: Vec<AliasEntry>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let mut reserved: HashSet<String> = PYTHON_KEYWORDS.iter().map(|k| k.to_string()).collect();
        for (alias, _) in IMPLICIT_COLUMNS {
            reserved.insert(alias.to_string());
        }
        Self {
            reserved,
            entries: Vec::new(),
        }
    }
}

impl AliasTable {
    /// Assign aliases to every field of `model` in source order, then the
    /// implicit columns.
    pub fn build(model: &ModelSpec) -> Result<Self, CodegenError> {
        let mut table = AliasTable::default();

        for field in &model.fields {
            let base = match &field.alias {
                Some(alias) => alias.clone(),
                None => prefix(&field.name, 3).to_lowercase(),
            };
            let alias = table.assign(&base, &field.name, &field.name)?;

            if let Some(target) = field.reference() {
                for part in &target.exposed {
                    let sub_base = format!("{alias}{}", prefix(part, 2).to_lowercase());
                    let path = format!("{}.{}", field.name, part);
                    table.assign(&sub_base, &path, &field.name)?;
                }
            }
        }

        for (alias, column) in IMPLICIT_COLUMNS {
            table.entries.push(AliasEntry {
                alias: alias.to_string(),
                target: column.to_string(),
                field: String::new(),
            });
        }

        Ok(table)
    }

    /// Reserve the first free candidate among `base`, `base1` … `base99`.
    fn assign(&mut self, base: &str, target: &str, field: &str) -> Result<String, CodegenError> {
        for attempt in 0..MAX_ATTEMPTS {
            let candidate = if attempt == 0 {
                base.to_string()
            } else {
                format!("{base}{attempt}")
            };
            if !is_member_name(&candidate) || self.reserved.contains(&candidate) {
                continue;
            }
            self.reserved.insert(candidate.clone());
            self.entries.push(AliasEntry {
                alias: candidate.clone(),
                target: target.to_string(),
                field: field.to_string(),
            });
            return Ok(candidate);
        }
        Err(CodegenError::AliasExhausted {
            base: base.to_string(),
            target: target.to_string(),
        })
    }

    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    /// Alias of a field's own column.
    pub fn alias_of(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.target == field)
            .map(|e| e.alias.as_str())
    }

    /// Sub-aliases of a reference field, in exposed-field order.
    pub fn sub_aliases<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a AliasEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.field == field && e.is_sub_alias())
    }
}

/// First `n` characters.
fn prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Usable as a Python identifier.
fn is_member_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

//! Validator rule and message blocks of the request handler.
//!
//! Built from the constraint map in one pass, so every rule entry has a
//! message entry under the same key. [`RuleSet::check_parity`] still
//! verifies this before anything is rendered.

use erpgen_ir::{ConstraintMap, ModelSpec, RuleEntry, RuleKind, RuleValue};

use crate::builder::{Entries, Literal};
use crate::error::CodegenError;

/// Rules and messages of one block, keyed by rule key.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBlock {
    /// Field name, or `f<name>` for the file sub-rules.
    pub key: String,
    pub rules: Entries,
    pub messages: Entries,
}

/// All rule blocks of a model, in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    blocks: Vec<RuleBlock>,
}

impl RuleSet {
    pub fn build(model: &ModelSpec, constraints: &ConstraintMap) -> Self {
        let mut blocks = Vec::new();

        for field in model.payload_fields() {
            let Some(set) = constraints.get(&field.name) else {
                continue;
            };
            let mut main = RuleBlock::new(field.name.clone());
            let mut files = RuleBlock::new(format!("f{}", field.name));

            for entry in set.rule_entries() {
                let value = rule_literal(model, &field.name, &entry);
                let block = if entry.kind.is_file_rule() {
                    &mut files
                } else {
                    &mut main
                };
                block.rules.push(entry.kind.key(), value);
                block.messages.push(entry.kind.key(), Literal::str(entry.message()));
            }

            if !main.rules.is_empty() {
                blocks.push(main);
            }
            if !files.rules.is_empty() && field.data_type.is_upload() {
                blocks.push(files);
            }
        }

        Self { blocks }
    }

    pub fn blocks(&self) -> &[RuleBlock] {
        &self.blocks
    }

    pub fn get(&self, key: &str) -> Option<&RuleBlock> {
        self.blocks.iter().find(|b| b.key == key)
    }

    /// Every block has the same rule keys as message keys, in the same order.
    pub fn check_parity(&self) -> Result<(), CodegenError> {
        for block in &self.blocks {
            let rules: Vec<_> = block.rules.keys().collect();
            let messages: Vec<_> = block.messages.keys().collect();
            if rules != messages {
                return Err(CodegenError::RuleParity {
                    field: block.key.clone(),
                    detail: format!("rules {rules:?} vs messages {messages:?}"),
                });
            }
        }
        Ok(())
    }

    /// `{field: {rule: value}}`.
    pub fn rules_literal(&self) -> Literal {
        let mut out = Entries::new();
        for block in &self.blocks {
            out.push(block.key.clone(), block.rules.clone().into_literal());
        }
        out.into_literal()
    }

    /// `{field: {rule: message}}`.
    pub fn messages_literal(&self) -> Literal {
        let mut out = Entries::new();
        for block in &self.blocks {
            out.push(block.key.clone(), block.messages.clone().into_literal());
        }
        out.into_literal()
    }
}

impl RuleBlock {
    fn new(key: String) -> Self {
        Self {
            key,
            rules: Entries::new(),
            messages: Entries::new(),
        }
    }
}

fn rule_literal(model: &ModelSpec, field: &str, entry: &RuleEntry) -> Literal {
    match entry.kind {
        RuleKind::Unique => Literal::str(format!("{}.{}", model.model_name, field)),
        RuleKind::ForeignKey => {
            let dotted = model
                .field(field)
                .and_then(|f| f.reference())
                .map(|target| {
                    std::iter::once(target.model.as_str())
                        .chain(target.exposed.iter().map(String::as_str))
                        .collect::<Vec<_>>()
                        .join(".")
                })
                .unwrap_or_default();
            Literal::str(dotted)
        }
        _ => match &entry.value {
            RuleValue::Flag => Literal::Bool(true),
            RuleValue::Count(n) => Literal::Int(i64::try_from(*n).unwrap_or(i64::MAX)),
            RuleValue::Number(n) => Literal::Float(*n),
            RuleValue::Pair(lo, hi) => Literal::List(vec![Literal::Float(*lo), Literal::Float(*hi)]),
            RuleValue::Text(s) => Literal::str(s.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Dialect;
    use erpgen_ir::{MetadataDocument, RawField};

    fn model(fields: &[&[(&str, &str)]]) -> ModelSpec {
        let mut doc = MetadataDocument {
            model: "person".into(),
            ..Default::default()
        };
        for pairs in fields {
            let mut raw = RawField::default();
            for (k, v) in *pairs {
                raw.set(k, v.to_string());
            }
            doc.fields.field.push(raw);
        }
        ModelSpec::from_document(&doc).unwrap()
    }

    #[test]
    fn one_message_per_rule() {
        let spec = model(&[
            &[("name", "id"), ("type", "integer")],
            &[("name", "email"), ("type", "varchar"), ("not_null", "1"), ("max_length", "20"), ("email", "1"), ("unique", "1")],
            &[("name", "owner_id"), ("type", "integer"), ("foreign_key", "person,code,name")],
        ]);
        let set = RuleSet::build(&spec, &ConstraintMap::derive(&spec));
        set.check_parity().unwrap();

        assert!(set.get("id").is_none());
        let email = set.get("email").unwrap();
        let keys: Vec<_> = email.rules.keys().collect();
        assert_eq!(keys, vec!["required", "max_length", "email", "unique"]);
        assert_eq!(email.rules.get("unique"), Some(&Literal::str("person.email")));
        assert_eq!(
            email.messages.get("email"),
            Some(&Literal::str("Please enter a valid email address."))
        );

        let owner = set.get("owner_id").unwrap();
        assert_eq!(owner.rules.get("foreign_key"), Some(&Literal::str("person.code.name")));
        // The storage type is still numeric.
        assert_eq!(owner.rules.get("number"), Some(&Literal::Bool(true)));
    }

    #[test]
    fn file_rules_go_to_secondary_block() {
        let spec = model(&[
            &[("name", "avatar"), ("type", "image"), ("not_null", "1"), ("file_type", "png,jpg"), ("file_size", "512")],
            &[("name", "note"), ("type", "text"), ("file_type", "pdf")],
        ]);
        let set = RuleSet::build(&spec, &ConstraintMap::derive(&spec));
        let keys: Vec<_> = set.blocks().iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["avatar", "favatar"]);

        let files = set.get("favatar").unwrap();
        assert_eq!(files.rules.get("type"), Some(&Literal::str("png,jpg")));
        assert_eq!(files.rules.get("size"), Some(&Literal::Int(512)));
        assert!(set.get("avatar").unwrap().rules.get("type").is_none());
    }

    #[test]
    fn parity_violation_is_reported() {
        let spec = model(&[&[("name", "code"), ("type", "varchar"), ("not_null", "1")]]);
        let mut set = RuleSet::build(&spec, &ConstraintMap::derive(&spec));
        set.blocks[0].messages.push("extra", Literal::str("?"));
        let err = set.check_parity().unwrap_err();
        assert!(matches!(err, CodegenError::RuleParity { ref field, .. } if field == "code"));
    }

    #[test]
    fn renders_nested_python_dicts() {
        let spec = model(&[&[("name", "qty"), ("type", "integer"), ("range", "[1,10]")]]);
        let set = RuleSet::build(&spec, &ConstraintMap::derive(&spec));
        let text = set.rules_literal().render(Dialect::Python);
        assert_eq!(
            text,
            "{\n    'qty': {\n        'range': [1, 10],\n        'number': True,\n    },\n}"
        );
    }
}

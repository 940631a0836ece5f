//! Known identifiers of the tables fixtures refer to.

use serde::{Deserialize, Serialize};

use erpgen_validate::ReferenceIds;

/// Existing ids of one table and the id the next insert will get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableIds {
    pub model: String,
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub next_id: i64,
}

/// Ordered id sets. The first entry is the model under test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceSnapshot {
    tables: Vec<TableIds>,
}

impl ReferenceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`ReferenceSnapshot::insert`].
    pub fn with_table(mut self, model: impl Into<String>, ids: Vec<i64>, next_id: i64) -> Self {
        self.insert(model, ids, next_id);
        self
    }

    /// Add or replace a table, keeping its position if already present.
    pub fn insert(&mut self, model: impl Into<String>, ids: Vec<i64>, next_id: i64) {
        let model = model.into();
        match self.tables.iter_mut().find(|t| t.model == model) {
            Some(table) => {
                table.ids = ids;
                table.next_id = next_id;
            }
            None => self.tables.push(TableIds { model, ids, next_id }),
        }
    }

    pub fn get(&self, model: &str) -> Option<&TableIds> {
        self.tables.iter().find(|t| t.model == model)
    }

    /// The model under test.
    pub fn primary(&self) -> Option<&TableIds> {
        self.tables.first()
    }

    pub fn tables(&self) -> &[TableIds] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Copy with `model` moved to the front. A model absent from the
    /// snapshot is added with no ids, so `{valid_id}` does not silently
    /// resolve against another table.
    pub fn focus(&self, model: &str) -> Self {
        let mut tables = Vec::with_capacity(self.tables.len() + 1);
        tables.push(self.get(model).cloned().unwrap_or_else(|| TableIds {
            model: model.to_string(),
            ids: Vec::new(),
            next_id: 1,
        }));
        tables.extend(self.tables.iter().filter(|t| t.model != model).cloned());
        Self { tables }
    }
}

impl ReferenceIds for ReferenceSnapshot {
    fn contains(&self, model: &str, id: i64) -> bool {
        self.get(model).is_some_and(|t| t.ids.contains(&id))
    }
}

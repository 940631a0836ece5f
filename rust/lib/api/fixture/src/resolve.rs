//! Placeholder resolution against a [`ReferenceSnapshot`].
//!
//! Tokens look like `{valid_id}`, `{invalid_person_id}`, `{valid_idlist}`.
//! A string that is exactly one token takes the token's type (an id becomes
//! a number); tokens inside longer strings are substituted as text. Unknown
//! tokens and tokens with nothing to resolve to degrade to their bare name.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::snapshot::ReferenceSnapshot;

static TOKEN_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{([a-zA-Z0-9_]+)\}").ok());

/// Offset added to `next_id` to get ids that cannot exist yet.
pub const INVALID_ID_OFFSET: i64 = 100;

/// Number of ids in `{invalid_idlist}`.
pub const INVALID_IDLIST_LEN: i64 = 3;

#[derive(Debug, Clone, PartialEq)]
enum Resolved {
    Id(i64),
    List(String),
}

impl Resolved {
    fn into_value(self) -> Value {
        match self {
            Resolved::Id(id) => Value::from(id),
            Resolved::List(list) => Value::String(list),
        }
    }

    fn into_text(self) -> String {
        match self {
            Resolved::Id(id) => id.to_string(),
            Resolved::List(list) => list,
        }
    }
}

fn lookup(token: &str, snapshot: &ReferenceSnapshot) -> Option<Resolved> {
    let primary = snapshot.primary();
    match token {
        "valid_id" => primary?.ids.first().copied().map(Resolved::Id),
        "invalid_id" => primary.map(|t| Resolved::Id(t.next_id + INVALID_ID_OFFSET)),
        "valid_idlist" => {
            let ids = &primary?.ids;
            (!ids.is_empty()).then(|| Resolved::List(join_ids(ids.iter().copied())))
        }
        "invalid_idlist" => primary.map(|t| {
            let start = t.next_id + INVALID_ID_OFFSET;
            Resolved::List(join_ids(start..start + INVALID_IDLIST_LEN))
        }),
        _ => {
            let inner = token.strip_suffix("_id")?;
            if let Some(model) = inner.strip_prefix("invalid_") {
                snapshot
                    .get(model)
                    .map(|t| Resolved::Id(t.next_id + INVALID_ID_OFFSET))
            } else {
                let model = inner.strip_prefix("valid_")?;
                snapshot.get(model)?.ids.first().copied().map(Resolved::Id)
            }
        }
    }
}

fn join_ids(ids: impl Iterator<Item = i64>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

/// Substitute every token in `text`.
pub fn resolve_text(text: &str, snapshot: &ReferenceSnapshot) -> String {
    let Some(re) = TOKEN_RE.as_ref() else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures<'_>| {
        let token = &caps[1];
        lookup(token, snapshot)
            .map(Resolved::into_text)
            .unwrap_or_else(|| token.to_string())
    })
    .into_owned()
}

/// Resolve a string value; a lone token keeps the type of what it stands for.
pub fn resolve_str(text: &str, snapshot: &ReferenceSnapshot) -> Value {
    let whole = TOKEN_RE
        .as_ref()
        .and_then(|re| re.captures(text))
        .filter(|caps| caps.get(0).is_some_and(|m| m.as_str().len() == text.len()));
    match whole {
        Some(caps) => {
            let token = &caps[1];
            lookup(token, snapshot)
                .map(Resolved::into_value)
                .unwrap_or_else(|| Value::String(token.to_string()))
        }
        None => Value::String(resolve_text(text, snapshot)),
    }
}

/// Resolve every string inside `value`, recursively.
pub fn resolve_value(value: &Value, snapshot: &ReferenceSnapshot) -> Value {
    match value {
        Value::String(s) => resolve_str(s, snapshot),
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve_value(v, snapshot)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_value(v, snapshot)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> ReferenceSnapshot {
        ReferenceSnapshot::new()
            .with_table("project", vec![7, 8], 9)
            .with_table("person", vec![1, 2, 3], 4)
    }

    #[test]
    fn lone_tokens_are_typed() {
        let s = snapshot();
        assert_eq!(resolve_str("{valid_id}", &s), json!(7));
        assert_eq!(resolve_str("{invalid_id}", &s), json!(109));
        assert_eq!(resolve_str("{valid_person_id}", &s), json!(1));
        assert_eq!(resolve_str("{invalid_person_id}", &s), json!(104));
        assert_eq!(resolve_str("{valid_idlist}", &s), json!("7,8"));
        assert_eq!(resolve_str("{invalid_idlist}", &s), json!("109,110,111"));
    }

    #[test]
    fn embedded_tokens_are_text() {
        let s = snapshot();
        assert_eq!(resolve_text("/api/project/{valid_id}", &s), "/api/project/7");
        assert_eq!(
            resolve_str("owner {valid_person_id} of {valid_id}", &s),
            json!("owner 1 of 7")
        );
    }

    #[test]
    fn misses_degrade_to_token_text() {
        let s = snapshot();
        assert_eq!(resolve_str("{valid_team_id}", &s), json!("valid_team_id"));
        assert_eq!(resolve_str("{whatever}", &s), json!("whatever"));
        let empty = ReferenceSnapshot::new().with_table("project", vec![], 1);
        assert_eq!(resolve_str("{valid_id}", &empty), json!("valid_id"));
        assert_eq!(resolve_str("{valid_idlist}", &empty), json!("valid_idlist"));
        assert_eq!(resolve_str("{invalid_id}", &ReferenceSnapshot::new()), json!("invalid_id"));
    }

    #[test]
    fn resolution_is_idempotent() {
        let s = snapshot();
        let request = json!({
            "id": "{valid_id}",
            "owner_id": "{invalid_person_id}",
            "rows": [{"team_id": "{valid_team_id}"}],
            "idlist": "{valid_idlist}",
            "note": "keep {this} and {valid_id}",
            "count": 3,
        });
        let once = resolve_value(&request, &s);
        assert_eq!(once["id"], json!(7));
        assert_eq!(once["rows"][0]["team_id"], json!("valid_team_id"));
        assert_eq!(once["note"], json!("keep this and 7"));
        assert_eq!(resolve_value(&once, &s), once);
    }

    #[test]
    fn snapshot_ids_drive_idlist() {
        let a = ReferenceSnapshot::new().with_table("project", vec![1, 2], 3);
        let b = ReferenceSnapshot::new().with_table("project", vec![5], 6);
        assert_ne!(resolve_str("{valid_idlist}", &a), resolve_str("{valid_idlist}", &b));
    }
}

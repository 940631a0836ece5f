//! Validation rule vocabulary.
//!
//! [`ConstraintSet::rule_entries`] expands a constraint set into the ordered
//! rules it implies. The controller generator renders these entries as rule
//! and message blocks; the validator evaluates the same entries. One list,
//! two consumers.

use serde::{Deserialize, Serialize};

use crate::constraint::ConstraintSet;

/// Identity of one validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Required,
    MinLength,
    MaxLength,
    Min,
    Max,
    Range,
    Step,
    Email,
    Url,
    Date,
    DateTime,
    Number,
    Digits,
    EqualTo,
    ForeignKey,
    Boolean,
    Unique,
    Regexp,
    FileType,
    FileSize,
}

impl RuleKind {
    /// Key used in generated rule and message blocks.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::Min => "min",
            Self::Max => "max",
            Self::Range => "range",
            Self::Step => "step",
            Self::Email => "email",
            Self::Url => "url",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Number => "number",
            Self::Digits => "digits",
            Self::EqualTo => "equal_to",
            Self::ForeignKey => "foreign_key",
            Self::Boolean => "boolean",
            Self::Unique => "unique",
            Self::Regexp => "regexp",
            Self::FileType => "type",
            Self::FileSize => "size",
        }
    }

    /// Message template; `{0}` and `{1}` are replaced by the rule's parameters.
    pub fn message_template(&self) -> &'static str {
        match self {
            Self::Required => "This field is required.",
            Self::MinLength => "Please enter at least {0} characters.",
            Self::MaxLength => "Please enter no more than {0} characters.",
            Self::Min => "Please enter a value greater than or equal to {0}.",
            Self::Max => "Please enter a value less than or equal to {0}.",
            Self::Range => "Please enter a value between {0} and {1}.",
            Self::Step => "Please enter a multiple of {0}.",
            Self::Email => "Please enter a valid email address.",
            Self::Url => "Please enter a valid URL.",
            Self::Date => "Please enter a valid date (YYYY-MM-DD).",
            Self::DateTime => "Please enter a valid date and time (YYYY-MM-DD HH:MM:SS).",
            Self::Number => "Please enter a valid number.",
            Self::Digits => "Please enter only digits.",
            Self::EqualTo => "Please enter the value {0}.",
            Self::ForeignKey => "The referenced {0} does not exist.",
            Self::Boolean => "Please enter a boolean value.",
            Self::Unique => "This value already exists.",
            Self::Regexp => "Please match the requested format.",
            Self::FileType => "Please upload a file of type {0}.",
            Self::FileSize => "Please upload a file no larger than {0} KB.",
        }
    }

    /// File sub-rules live in the secondary `f<name>` block.
    pub fn is_file_rule(&self) -> bool {
        matches!(self, Self::FileType | Self::FileSize)
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Parameter of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Flag,
    Count(u64),
    Number(f64),
    Pair(f64, f64),
    Text(String),
}

impl RuleValue {
    fn params(&self) -> Vec<String> {
        match self {
            RuleValue::Flag => Vec::new(),
            RuleValue::Count(n) => vec![n.to_string()],
            RuleValue::Number(n) => vec![n.to_string()],
            RuleValue::Pair(lo, hi) => vec![lo.to_string(), hi.to_string()],
            RuleValue::Text(s) => vec![s.clone()],
        }
    }
}

/// One rule of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub kind: RuleKind,
    pub value: RuleValue,
}

impl RuleEntry {
    fn new(kind: RuleKind, value: RuleValue) -> Self {
        Self { kind, value }
    }

    /// Rendered message text.
    pub fn message(&self) -> String {
        let mut text = self.kind.message_template().to_string();
        for (i, param) in self.value.params().iter().enumerate() {
            text = text.replace(&format!("{{{i}}}"), param);
        }
        text
    }
}

impl ConstraintSet {
    /// Expand into ordered rule entries, one per constraint present.
    pub fn rule_entries(&self) -> Vec<RuleEntry> {
        use RuleKind::*;

        let mut entries = Vec::new();
        let mut push = |kind, value| entries.push(RuleEntry::new(kind, value));

        if self.required {
            push(Required, RuleValue::Flag);
        }
        if let Some(n) = self.min_length.filter(|n| *n > 0) {
            push(MinLength, RuleValue::Count(u64::from(n)));
        }
        if let Some(n) = self.max_length {
            push(MaxLength, RuleValue::Count(u64::from(n)));
        }
        if let Some(n) = self.min {
            push(Min, RuleValue::Number(n));
        }
        if let Some(n) = self.max {
            push(Max, RuleValue::Number(n));
        }
        if let Some((lo, hi)) = self.range {
            push(Range, RuleValue::Pair(lo, hi));
        }
        if let Some(n) = self.step {
            push(Step, RuleValue::Number(n));
        }
        if self.is_email {
            push(Email, RuleValue::Flag);
        }
        if self.url {
            push(Url, RuleValue::Flag);
        }
        if self.is_datetime {
            push(DateTime, RuleValue::Flag);
        } else if self.is_date {
            push(Date, RuleValue::Flag);
        }
        if self.is_number {
            push(Number, RuleValue::Flag);
        }
        if self.digits {
            push(Digits, RuleValue::Flag);
        }
        if let Some(v) = &self.equal_to {
            push(EqualTo, RuleValue::Text(v.clone()));
        }
        if let Some(target) = &self.reference {
            push(ForeignKey, RuleValue::Text(target.model.clone()));
        }
        if self.is_boolean {
            push(Boolean, RuleValue::Flag);
        }
        if self.unique {
            push(Unique, RuleValue::Flag);
        }
        if let Some(v) = &self.regexp {
            push(Regexp, RuleValue::Text(v.clone()));
        }
        if let Some(v) = &self.file_type {
            push(FileType, RuleValue::Text(v.clone()));
        }
        if let Some(n) = self.file_size {
            push(FileSize, RuleValue::Count(n));
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_follow_rule_order() {
        let set = ConstraintSet {
            required: true,
            max_length: Some(20),
            is_email: true,
            unique: true,
            ..Default::default()
        };
        let kinds: Vec<_> = set.rule_entries().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![RuleKind::Required, RuleKind::MaxLength, RuleKind::Email, RuleKind::Unique]
        );
    }

    #[test]
    fn zero_min_length_is_not_a_rule() {
        let set = ConstraintSet {
            min_length: Some(0),
            ..Default::default()
        };
        assert!(set.rule_entries().is_empty());
    }

    #[test]
    fn datetime_replaces_date() {
        let set = ConstraintSet {
            is_date: true,
            is_datetime: true,
            ..Default::default()
        };
        let kinds: Vec<_> = set.rule_entries().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![RuleKind::DateTime]);
    }

    #[test]
    fn messages_render_parameters() {
        let entry = RuleEntry::new(RuleKind::Range, RuleValue::Pair(1.0, 9.5));
        assert_eq!(entry.message(), "Please enter a value between 1 and 9.5.");
        let entry = RuleEntry::new(RuleKind::MaxLength, RuleValue::Count(5));
        assert_eq!(entry.message(), "Please enter no more than 5 characters.");
    }

    #[test]
    fn keys_are_distinct() {
        use std::collections::HashSet;
        let all = [
            RuleKind::Required, RuleKind::MinLength, RuleKind::MaxLength, RuleKind::Min,
            RuleKind::Max, RuleKind::Range, RuleKind::Step, RuleKind::Email, RuleKind::Url,
            RuleKind::Date, RuleKind::DateTime, RuleKind::Number, RuleKind::Digits,
            RuleKind::EqualTo, RuleKind::ForeignKey, RuleKind::Boolean, RuleKind::Unique,
            RuleKind::Regexp, RuleKind::FileType, RuleKind::FileSize,
        ];
        let keys: HashSet<_> = all.iter().map(|k| k.key()).collect();
        let messages: HashSet<_> = all.iter().map(|k| k.message_template()).collect();
        assert_eq!(keys.len(), all.len());
        assert_eq!(messages.len(), all.len());
    }
}

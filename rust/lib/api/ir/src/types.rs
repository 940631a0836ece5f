//! Shared scalar types and token parsing.

use serde::{Deserialize, Serialize};

/// Storage type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    ShortText,
    LongText,
    Binary,
    Boolean,
    Date,
    DateTime,
    Integer,
    SmallInteger,
    Float,
    File,
    Image,
    Reference,
}

impl DataType {
    /// Parse a metadata `type` token. Returns `None` for unknown tokens.
    pub fn from_token(token: &str) -> Option<Self> {
        let ty = match token.trim().to_ascii_lowercase().as_str() {
            "varchar" | "char" => Self::ShortText,
            "text" => Self::LongText,
            "binary" => Self::Binary,
            "bool" | "boolean" => Self::Boolean,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "int" | "integer" => Self::Integer,
            "smallint" => Self::SmallInteger,
            "float" | "double" => Self::Float,
            "file" => Self::File,
            "image" => Self::Image,
            "many2one" => Self::Reference,
            _ => return None,
        };
        Some(ty)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortText => "short_text",
            Self::LongText => "long_text",
            Self::Binary => "binary",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Integer => "integer",
            Self::SmallInteger => "small_integer",
            Self::Float => "float",
            Self::File => "file",
            Self::Image => "image",
            Self::Reference => "reference",
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Integer | Self::SmallInteger | Self::Float)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Integer | Self::SmallInteger)
    }

    /// Date or datetime.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::ShortText | Self::LongText)
    }

    /// File or image upload.
    pub fn is_upload(&self) -> bool {
        matches!(self, Self::File | Self::Image)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a field is presented in generated list screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Shown by default.
    Shown,
    /// Available but collapsed until the user enables it.
    #[default]
    Collapsed,
    /// Never shown.
    Hidden,
}

impl DisplayMode {
    /// Parse a `default_display` token (`d`, `c`, `h`). Anything else is collapsed.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "d" => Self::Shown,
            "h" => Self::Hidden,
            _ => Self::Collapsed,
        }
    }
}

/// Affirmative tokens accepted for boolean-like metadata flags.
///
/// `c` and `đ` are the affirmative markers used in the source spreadsheets.
pub const TRUTHY_TOKENS: &[&str] = &["1", "true", "t", "c", "đ"];

/// Parse a boolean-like metadata flag. Any token outside [`TRUTHY_TOKENS`] is false.
pub fn parse_flag(value: &str) -> bool {
    let token = value.trim().to_lowercase();
    TRUTHY_TOKENS.contains(&token.as_str())
}

/// `person_group` -> `PersonGroup`.
pub fn pascal_case(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// `person_group` -> `personGroup`.
pub fn camel_case(name: &str) -> String {
    let pascal = pascal_case(name);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Upper-case the first character, lower-case the rest.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

//! Structured assembly of generated text.
//!
//! Generators describe ordered key/value blocks and lists as [`Literal`]s and
//! write lines through a [`CodeWriter`]. Quoting, escaping and indentation
//! happen only at render time, once per target dialect.

/// Target syntax of a generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Python,
    JavaScript,
    Json,
    Sql,
}

impl Dialect {
    /// One indentation level.
    pub fn indent_unit(&self) -> &'static str {
        match self {
            Dialect::Python | Dialect::Sql => "    ",
            Dialect::JavaScript | Dialect::Json => "  ",
        }
    }

    /// Line comment marker.
    pub fn comment(&self) -> &'static str {
        match self {
            Dialect::Python => "#",
            Dialect::JavaScript | Dialect::Json => "//",
            Dialect::Sql => "--",
        }
    }

    fn null(&self) -> &'static str {
        match self {
            Dialect::Python => "None",
            _ => "null",
        }
    }

    fn boolean(&self, b: bool) -> &'static str {
        match (self, b) {
            (Dialect::Python, true) => "True",
            (Dialect::Python, false) => "False",
            (_, true) => "true",
            (_, false) => "false",
        }
    }

    /// Trailing comma after the last entry of a multi-line block.
    fn trailing_comma(&self) -> bool {
        !matches!(self, Dialect::Json | Dialect::Sql)
    }
}

/// A value in generated code.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    /// Emitted verbatim (identifiers, template strings, expressions).
    Raw(String),
    List(Vec<Literal>),
    Map(Entries),
}

impl Literal {
    pub fn str(s: impl Into<String>) -> Self {
        Literal::Str(s.into())
    }

    pub fn raw(s: impl Into<String>) -> Self {
        Literal::Raw(s.into())
    }

    /// `Str` for `Some`, `Null` for `None`.
    pub fn opt_str(s: Option<&str>) -> Self {
        s.map(Literal::str).unwrap_or(Literal::Null)
    }

    pub fn str_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Literal::List(items.into_iter().map(|s| Literal::Str(s.into())).collect())
    }

    /// Render at nesting depth 0. Nested lines are indented relative to the
    /// first line; the caller's [`CodeWriter`] adds its own indentation.
    pub fn render(&self, dialect: Dialect) -> String {
        let mut out = String::new();
        self.render_into(&mut out, dialect, 0);
        out
    }

    fn render_into(&self, out: &mut String, dialect: Dialect, depth: usize) {
        match self {
            Literal::Str(s) => out.push_str(&quote(s, dialect)),
            Literal::Int(n) => out.push_str(&n.to_string()),
            Literal::Float(n) => out.push_str(&n.to_string()),
            Literal::Bool(b) => out.push_str(dialect.boolean(*b)),
            Literal::Null => out.push_str(dialect.null()),
            Literal::Raw(s) => out.push_str(s),
            Literal::List(items) => {
                if items.iter().all(Literal::is_scalar) {
                    out.push('[');
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        item.render_into(out, dialect, depth);
                    }
                    out.push(']');
                } else {
                    render_block(out, dialect, depth, '[', ']', items.len(), |out, i| {
                        items[i].render_into(out, dialect, depth + 1);
                    });
                }
            }
            Literal::Map(entries) => entries.render_into(out, dialect, depth),
        }
    }

    fn is_scalar(&self) -> bool {
        !matches!(self, Literal::List(_) | Literal::Map(_))
    }
}

/// Ordered key/value block. Insertion order is render order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entries {
    items: Vec<(String, Literal)>,
}

impl Entries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. A repeated key replaces the earlier value in place.
    pub fn push(&mut self, key: impl Into<String>, value: Literal) -> &mut Self {
        let key = key.into();
        match self.items.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.items.push((key, value)),
        }
        self
    }

    /// Builder-style [`Entries::push`].
    pub fn with(mut self, key: impl Into<String>, value: Literal) -> Self {
        self.push(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Literal> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Literal)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_literal(self) -> Literal {
        Literal::Map(self)
    }

    fn render_into(&self, out: &mut String, dialect: Dialect, depth: usize) {
        render_block(out, dialect, depth, '{', '}', self.items.len(), |out, i| {
            let (key, value) = &self.items[i];
            out.push_str(&render_key(key, dialect));
            out.push_str(": ");
            value.render_into(out, dialect, depth + 1);
        });
    }
}

fn render_block(
    out: &mut String,
    dialect: Dialect,
    depth: usize,
    open: char,
    close: char,
    len: usize,
    mut item: impl FnMut(&mut String, usize),
) {
    if len == 0 {
        out.push(open);
        out.push(close);
        return;
    }
    let unit = dialect.indent_unit();
    out.push(open);
    out.push('\n');
    for i in 0..len {
        out.push_str(&unit.repeat(depth + 1));
        item(out, i);
        if i + 1 < len || dialect.trailing_comma() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&unit.repeat(depth));
    out.push(close);
}

fn render_key(key: &str, dialect: Dialect) -> String {
    match dialect {
        Dialect::JavaScript if is_identifier(key) => key.to_string(),
        _ => quote(key, dialect),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Quote a string literal for `dialect`.
pub fn quote(s: &str, dialect: Dialect) -> String {
    match dialect {
        Dialect::JavaScript | Dialect::Json => {
            serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
        }
        Dialect::Python | Dialect::Sql => {
            let mut out = String::with_capacity(s.len() + 2);
            out.push('\'');
            for c in s.chars() {
                match c {
                    '\\' if dialect == Dialect::Python => out.push_str("\\\\"),
                    '\'' if dialect == Dialect::Python => out.push_str("\\'"),
                    '\'' => out.push_str("''"),
                    '\n' if dialect == Dialect::Python => out.push_str("\\n"),
                    c => out.push(c),
                }
            }
            out.push('\'');
            out
        }
    }
}

/// Line-oriented writer with indentation.
#[derive(Debug)]
pub struct CodeWriter {
    out: String,
    level: usize,
    dialect: Dialect,
}

impl CodeWriter {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            out: String::new(),
            level: 0,
            dialect,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Write one line at the current indentation. Embedded newlines are
    /// indented too, so multi-line literals nest correctly.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let indent = self.dialect.indent_unit().repeat(self.level);
        for line in text.as_ref().split('\n') {
            if line.is_empty() {
                self.out.push('\n');
            } else {
                self.out.push_str(&indent);
                self.out.push_str(line);
                self.out.push('\n');
            }
        }
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    pub fn comment(&mut self, text: impl AsRef<str>) -> &mut Self {
        let marker = self.dialect.comment();
        self.line(format!("{marker} {}", text.as_ref()))
    }

    /// `name = <literal>` (Python) or `const name = <literal>;` (JavaScript).
    pub fn assign(&mut self, name: &str, value: &Literal) -> &mut Self {
        let rendered = value.render(self.dialect);
        match self.dialect {
            Dialect::JavaScript => self.line(format!("const {name} = {rendered};")),
            _ => self.line(format!("{name} = {rendered}")),
        }
    }

    pub fn indent(&mut self) -> &mut Self {
        self.level += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self
    }

    /// Write `header`, then the body one level deeper, then `footer` if any.
    pub fn block(
        &mut self,
        header: impl AsRef<str>,
        footer: Option<&str>,
        body: impl FnOnce(&mut Self),
    ) -> &mut Self {
        self.line(header);
        self.indent();
        body(self);
        self.dedent();
        if let Some(footer) = footer {
            self.line(footer);
        }
        self
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Header comment carried by every generated file.
pub const GENERATED_BANNER: &str = "Generated by erpgen. Do not edit by hand.";

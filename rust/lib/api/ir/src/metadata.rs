//! Raw metadata document, as produced by the upstream spreadsheet parser.
//!
//! Every attribute is a plain string and absent attributes are empty
//! strings. Nothing here is validated; [`crate::ModelSpec::from_document`]
//! is the single place where a document becomes typed.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::IrError;

/// One metadata document describing one generated model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataDocument {
    pub system_code: String,
    pub sub_system_code: String,
    pub module_code: String,
    pub model: String,
    pub default_order: String,
    /// Comma separated field names.
    pub searchable_list: String,
    pub fields: FieldList,
}

/// The `fields.field` collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldList {
    #[serde(deserialize_with = "one_or_many")]
    pub field: Vec<RawField>,
}

/// Flat attribute map of one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawField {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub label: String,
    pub not_null: String,
    pub max_length: String,
    pub min_length: String,
    pub range_length: String,
    pub foreign_key: String,
    pub unique: String,
    pub primary_key: String,
    pub email: String,
    pub url: String,
    pub digits: String,
    pub alias: String,
    pub default_value: String,
    pub auto_generate: String,
    #[serde(deserialize_with = "compute_or_empty")]
    pub compute: RawCompute,
    pub ondelete: String,
    pub searchable: String,
    pub default_display: String,
    pub show_type: String,
    pub span: String,
    pub min: String,
    pub max: String,
    pub range: String,
    pub step: String,
    pub equal_to: String,
    pub regexp: String,
    pub file_type: String,
    pub file_size: String,
}

/// Nested `compute` attribute: derived-field function plus persistence flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCompute {
    pub function: String,
    pub store: String,
}

impl RawCompute {
    pub fn is_empty(&self) -> bool {
        self.function.trim().is_empty()
    }
}

impl RawField {
    /// Set one attribute by its metadata key. Unknown keys are ignored.
    pub fn set(&mut self, key: &str, value: String) {
        let slot = match key {
            "name" => &mut self.name,
            "type" => &mut self.data_type,
            "label" => &mut self.label,
            "not_null" => &mut self.not_null,
            "max_length" => &mut self.max_length,
            "min_length" => &mut self.min_length,
            "range_length" => &mut self.range_length,
            "foreign_key" => &mut self.foreign_key,
            "unique" => &mut self.unique,
            "primary_key" => &mut self.primary_key,
            "email" => &mut self.email,
            "url" => &mut self.url,
            "digits" => &mut self.digits,
            "alias" => &mut self.alias,
            "default_value" => &mut self.default_value,
            "auto_generate" => &mut self.auto_generate,
            "compute" => &mut self.compute.function,
            "ondelete" => &mut self.ondelete,
            "searchable" => &mut self.searchable,
            "default_display" => &mut self.default_display,
            "show_type" => &mut self.show_type,
            "span" => &mut self.span,
            "min" => &mut self.min,
            "max" => &mut self.max,
            "range" => &mut self.range,
            "step" => &mut self.step,
            "equal_to" | "equalTo" => &mut self.equal_to,
            "regexp" => &mut self.regexp,
            "file_type" => &mut self.file_type,
            "file_size" => &mut self.file_size,
            _ => return,
        };
        *slot = value;
    }
}

impl MetadataDocument {
    /// Parse either an XML or a JSON document, sniffing the first character.
    pub fn parse(input: &str) -> Result<Self, IrError> {
        if input.trim_start().starts_with('<') {
            Self::from_xml(input)
        } else {
            Self::from_json(input)
        }
    }

    pub fn from_json(input: &str) -> Result<Self, IrError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parse the XML form:
    ///
    /// ```xml
    /// <model_spec>
    ///   <model>person</model>
    ///   <fields>
    ///     <field><name>email</name><type>varchar</type></field>
    ///   </fields>
    /// </model_spec>
    /// ```
    ///
    /// Field attributes may be child elements or XML attributes on `<field>`.
    pub fn from_xml(input: &str) -> Result<Self, IrError> {
        let root = parse_tree(input)?;
        let mut doc = MetadataDocument::default();

        for child in &root.children {
            match child.name.as_str() {
                "system_code" => doc.system_code = child.text.clone(),
                "sub_system_code" => doc.sub_system_code = child.text.clone(),
                "module_code" => doc.module_code = child.text.clone(),
                "model" => doc.model = child.text.clone(),
                "default_order" => doc.default_order = child.text.clone(),
                "searchable_list" => doc.searchable_list = child.text.clone(),
                "fields" => {
                    doc.fields.field = child
                        .children
                        .iter()
                        .filter(|n| n.name == "field")
                        .map(raw_field_from_node)
                        .collect();
                }
                _ => {}
            }
        }

        Ok(doc)
    }

    /// Serialize back to the JSON form.
    pub fn to_json(&self) -> Result<String, IrError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ---------------------------------------------------------------------------
// XML tree
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

fn node_from_start(e: &BytesStart<'_>) -> Result<Node, IrError> {
    let mut node = Node {
        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        ..Default::default()
    };
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        node.attrs.push((key, value));
    }
    Ok(node)
}

fn parse_tree(input: &str) -> Result<Node, IrError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(node_from_start(&e)?),
            Event::Empty(e) => {
                let node = node_from_start(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| IrError::Xml("unbalanced closing tag".into()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(IrError::Xml("unexpected end of document".into()));
    }
    root.ok_or_else(|| IrError::Xml("empty document".into()))
}

fn raw_field_from_node(node: &Node) -> RawField {
    let mut field = RawField::default();
    for (key, value) in &node.attrs {
        field.set(key, value.clone());
    }
    for child in &node.children {
        if child.name == "compute" && !child.children.is_empty() {
            for part in &child.children {
                match part.name.as_str() {
                    "function" => field.compute.function = part.text.clone(),
                    "store" => field.compute.store = part.text.clone(),
                    _ => {}
                }
            }
        } else {
            field.set(&child.name, child.text.clone());
        }
    }
    field
}

// ---------------------------------------------------------------------------
// Lenient JSON shapes
// ---------------------------------------------------------------------------

/// Converters emit a bare object instead of a one-element list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<RawField>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Box<RawField>),
        Many(Vec<RawField>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(field) => vec![*field],
        OneOrMany::Many(fields) => fields,
        OneOrMany::Null(()) => Vec::new(),
    })
}

/// `compute` is an empty string when absent and an object when present.
fn compute_or_empty<'de, D>(deserializer: D) -> Result<RawCompute, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ComputeShape {
        Nested(RawCompute),
        Flat(String),
        Null(()),
    }

    Ok(match ComputeShape::deserialize(deserializer)? {
        ComputeShape::Nested(compute) => compute,
        ComputeShape::Flat(function) => RawCompute {
            function,
            store: String::new(),
        },
        ComputeShape::Null(()) => RawCompute::default(),
    })
}

//! Structured filter for the xapi database dump.
//!
//! The dump is an XML tree of `<table name="...">` elements holding `<row>`
//! elements whose columns are attributes (or, in older dumps, child
//! elements). The filter parses the tree, rewrites the sensitive columns and
//! serializes it again. Tag names, attribute order and child order survive;
//! only redacted values change.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use quick_xml::escape::partial_escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};

use crate::constants::REDACTION_MARKER;
use crate::filters::{literal, sexp};
use crate::utils::db_conf::read_db_conf;

/// Deepest element nesting accepted by [`parse_document`]
pub const MAX_DEPTH: usize = 256;

/// A `table.column` locator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: &str, column: &str) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

/// Which columns of the database are sensitive and how to rewrite them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbRedactionRules {
    /// Tables whose rows only exist to store secrets
    pub secret_tables: Vec<String>,
    /// Column holding the secret in those tables
    pub secret_column: String,
    /// Columns replaced whole in every table
    pub token_columns: Vec<String>,
    /// Columns holding list literals with private leaves
    pub embedded_columns: Vec<ColumnRef>,
    /// Keys whose paired value is private inside those literals
    pub embedded_keys: Vec<String>,
    /// Columns holding s-expression association lists
    pub assoc_columns: Vec<ColumnRef>,
    pub assoc_keys: Vec<String>,
}

impl Default for DbRedactionRules {
    fn default() -> Self {
        Self {
            secret_tables: vec!["secret".to_string()],
            secret_column: "value".to_string(),
            token_columns: vec!["cluster_token".to_string()],
            embedded_columns: vec![
                ColumnRef::new("VM", "NVRAM"),
                ColumnRef::new("VM", "snapshot_metadata"),
            ],
            embedded_keys: vec!["EFI-variables".to_string()],
            assoc_columns: vec![ColumnRef::new("PBD", "device_config")],
            assoc_keys: vec!["password".to_string(), "cifspassword".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
    /// Declarations, comments, CDATA and processing instructions, kept verbatim
    Other(Event<'static>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl Element {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, key: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((key.to_string(), value.to_string())),
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    fn has_child(&self, name: &str) -> bool {
        self.child_elements().any(|el| el.name == name)
    }

    fn clear_children_named(&mut self, name: &str) {
        for child in self.child_elements_mut().filter(|el| el.name == name) {
            child.children.clear();
        }
    }
}

/// A parsed document: the root element plus whatever surrounds it
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub prolog: Vec<XmlNode>,
    pub root: Element,
    pub epilog: Vec<XmlNode>,
}

fn element_from(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8(start.name().as_ref().to_vec())
        .context("Element name is not valid UTF-8")?;
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.with_context(|| format!("Malformed attribute on <{}>", name))?;
        let key = String::from_utf8(attr.key.as_ref().to_vec())
            .context("Attribute name is not valid UTF-8")?;
        let value = attr
            .unescape_value()
            .with_context(|| format!("Malformed value for attribute {}", key))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

/// Parse an XML document into the tree model
pub fn parse_document(raw: &str) -> Result<Document> {
    let mut reader = Reader::from_str(raw);
    let mut stack: Vec<Element> = Vec::new();
    let mut prolog = Vec::new();
    let mut root: Option<Element> = None;
    let mut epilog = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            anyhow!(
                "XML syntax error at position {}: {}",
                reader.buffer_position(),
                e
            )
        })?;

        let node = match event {
            Event::Start(start) => {
                if stack.len() >= MAX_DEPTH {
                    bail!("XML document nested deeper than {} elements", MAX_DEPTH);
                }
                stack.push(element_from(&start)?);
                continue;
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| anyhow!("XML syntax error: unexpected closing tag"))?;
                XmlNode::Element(el)
            }
            Event::Empty(start) => XmlNode::Element(element_from(&start)?),
            Event::Text(text) => XmlNode::Text(
                text.unescape()
                    .context("XML syntax error: malformed text content")?
                    .into_owned(),
            ),
            Event::Eof => break,
            other => XmlNode::Other(other.into_owned()),
        };

        if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
            continue;
        }

        match node {
            XmlNode::Element(el) => {
                if root.is_some() {
                    bail!("XML syntax error: more than one root element");
                }
                root = Some(el);
            }
            XmlNode::Text(text) if !text.trim().is_empty() => {
                bail!("XML syntax error: text outside the root element");
            }
            other if root.is_none() => prolog.push(other),
            other => epilog.push(other),
        }
    }

    if let Some(open) = stack.last() {
        bail!("XML syntax error: unclosed element <{}>", open.name);
    }
    let root = root.ok_or_else(|| anyhow!("XML syntax error: no root element"))?;
    Ok(Document {
        prolog,
        root,
        epilog,
    })
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<()> {
    match node {
        XmlNode::Element(el) => write_element(writer, el)?,
        XmlNode::Text(text) => {
            writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?
        }
        XmlNode::Other(event) => writer.write_event(event.clone())?,
    }
    Ok(())
}

/// Escape an attribute value for a double-quoted attribute, leaving `'` as is
fn escape_attribute(value: &str) -> Cow<'_, str> {
    let escaped = partial_escape(value);
    if escaped.contains('"') {
        Cow::Owned(escaped.replace('"', "&quot;"))
    } else {
        escaped
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        let value = escape_attribute(value);
        start.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Borrowed(value.as_bytes()),
        });
    }

    if el.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &el.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
    Ok(())
}

/// Serialize the tree model back to XML text
pub fn write_document(doc: &Document) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    for node in &doc.prolog {
        write_node(&mut writer, node)?;
    }
    write_element(&mut writer, &doc.root)?;
    for node in &doc.epilog {
        write_node(&mut writer, node)?;
    }
    String::from_utf8(writer.into_inner()).context("Serialized XML is not valid UTF-8")
}

/// Filter for xapi database dumps
#[derive(Debug, Clone)]
pub struct DbFilter {
    rules: DbRedactionRules,
    marker: String,
}

impl Default for DbFilter {
    fn default() -> Self {
        Self::new(DbRedactionRules::default())
    }
}

impl DbFilter {
    pub fn new(rules: DbRedactionRules) -> Self {
        Self {
            rules,
            marker: REDACTION_MARKER.to_string(),
        }
    }

    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = marker.to_string();
        self
    }

    /// Redact a database dump.
    ///
    /// Malformed input is an error naming XML; nothing is partially emitted.
    pub fn output(&self, raw: &str) -> Result<String> {
        let mut doc = parse_document(raw).context("Failed to parse database dump as XML")?;
        self.redact_tree(&mut doc.root);
        write_document(&doc)
    }

    /// Apply the redaction rules to every table below `el`
    pub fn redact_tree(&self, el: &mut Element) {
        if el.name == "table" {
            let table = el.attribute("name").unwrap_or_default().to_string();
            for row in el.child_elements_mut().filter(|row| row.name == "row") {
                self.redact_row(&table, row);
            }
        }
        for child in el.child_elements_mut() {
            self.redact_tree(child);
        }
    }

    fn redact_row(&self, table: &str, row: &mut Element) {
        let rules = &self.rules;

        if rules.secret_tables.iter().any(|t| t == table) {
            row.set_attribute(&rules.secret_column, &self.marker);
            row.clear_children_named(&rules.secret_column);
        }

        for column in &rules.token_columns {
            if row.attribute(column).is_some() || row.has_child(column) {
                row.set_attribute(column, &self.marker);
                row.clear_children_named(column);
            }
        }

        for column in rules.embedded_columns.iter().filter(|c| c.table == table) {
            self.rewrite_column(row, &column.column, |value| {
                literal::redact_pairs(value, &rules.embedded_keys, &self.marker)
            });
        }

        for column in rules.assoc_columns.iter().filter(|c| c.table == table) {
            self.rewrite_column(row, &column.column, |value| self.redact_assoc(value));
        }
    }

    /// Rewrite a column stored either as attribute or as child text
    fn rewrite_column<F>(&self, row: &mut Element, column: &str, rewrite: F)
    where
        F: Fn(&str) -> String,
    {
        if let Some(value) = row.attribute(column) {
            let redacted = rewrite(value);
            row.set_attribute(column, &redacted);
        }
        for child in row.child_elements_mut().filter(|el| el.name == column) {
            for node in child.children.iter_mut() {
                if let XmlNode::Text(text) = node {
                    *text = rewrite(text);
                }
            }
        }
    }

    fn redact_assoc(&self, value: &str) -> String {
        let mut parsed = match sexp::parse(value) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Leaving unparsable association list untouched: {}", e);
                return value.to_string();
            }
        };
        let mut changed = false;
        for key in &self.rules.assoc_keys {
            changed |= parsed.set_assoc(key, sexp::Sexp::Atom(self.marker.clone()));
        }
        if changed {
            parsed.to_string()
        } else {
            value.to_string()
        }
    }
}

/// Filter a database dump with the default rules
pub fn filter_xapi_db(raw: &str) -> Result<String> {
    DbFilter::default().output(raw)
}

/// Read the first database listed in `db_conf` and filter it.
///
/// Returns an empty string when the configuration lists no readable
/// database.
pub fn dump_xapi_db(db_conf: &Path, filter: &DbFilter) -> Result<String> {
    let databases = read_db_conf(db_conf)?;
    let Some(path) = databases.iter().find(|p| p.exists()) else {
        debug!("No xapi database found via {}", db_conf.display());
        return Ok(String::new());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read xapi database {}", path.display()))?;
    filter.output(&raw)
}

//! Small owned element tree on top of `quick_xml`.
//!
//! UPD payloads are a few hundred kilobytes at most, so building a tree and
//! navigating it by local element name is simpler than a streaming state
//! machine. Namespace prefixes are dropped from element and attribute names.

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlTreeError {
    #[error("XML syntax error: {0}")]
    Syntax(String),
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),
    #[error("document has no root element")]
    Empty,
    #[error("more than one root element")]
    MultipleRoots,
}

#[derive(Debug, Clone, Default)]
pub struct XmlNode {
    pub name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
    text: String,
}

impl XmlNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute value, `None` when absent or blank.
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.trim().is_empty())
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First descendant (depth-first, document order) with the given name.
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

pub fn parse_tree(text: &str) -> Result<XmlNode, XmlTreeError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(node_from_start(e)?),
            Ok(Event::Empty(ref e)) => {
                let node = node_from_start(e)?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::End(_)) => {
                // quick-xml already rejects mismatched end tags
                let node = stack
                    .pop()
                    .ok_or_else(|| XmlTreeError::Syntax("unmatched end tag".to_string()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Text(e)) => {
                if let Some(top) = stack.last_mut() {
                    let content = std::str::from_utf8(e.as_ref())
                        .map_err(|e| XmlTreeError::Syntax(format!("invalid UTF-8 in text: {e}")))?;
                    top.text.push_str(content);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&resolve_reference(&e)?);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(top) = stack.last_mut() {
                    let content = std::str::from_utf8(e.as_ref())
                        .map_err(|e| XmlTreeError::Syntax(format!("invalid UTF-8 in CDATA: {e}")))?;
                    top.text.push_str(content);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XmlTreeError::Syntax(format!(
                    "{e} (at byte {})",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlTreeError::UnexpectedEof(open.name.clone()));
    }
    root.ok_or(XmlTreeError::Empty)
}

fn node_from_start(start: &BytesStart) -> Result<XmlNode, XmlTreeError> {
    let name = utf8_name(start.local_name().as_ref())?;

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlTreeError::Syntax(format!("bad attribute in <{name}>: {e}")))?;
        let key = utf8_name(attr.key.local_name().as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|e| XmlTreeError::Syntax(format!("bad value of {name}@{key}: {e}")))?
            .to_string();
        attributes.push((key, value));
    }

    Ok(XmlNode {
        name,
        attributes,
        ..Default::default()
    })
}

/// `&#46;`, `&#x2E;` or one of the five predefined entities.
fn resolve_reference(reference: &BytesRef) -> Result<String, XmlTreeError> {
    let char_ref = reference
        .resolve_char_ref()
        .map_err(|e| XmlTreeError::Syntax(format!("bad character reference: {e}")))?;
    if let Some(ch) = char_ref {
        return Ok(ch.to_string());
    }

    let name = reference
        .decode()
        .map_err(|e| XmlTreeError::Syntax(format!("invalid entity name: {e}")))?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| XmlTreeError::Syntax(format!("unknown entity &{name};")))
}

fn utf8_name(raw: &[u8]) -> Result<String, XmlTreeError> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| XmlTreeError::Syntax(format!("invalid UTF-8 in name: {e}")))
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), XmlTreeError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlTreeError::MultipleRoots);
    }
    *root = Some(node);
    Ok(())
}

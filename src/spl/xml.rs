//! Lightweight element tree for SPL documents
//!
//! Only what the extractor needs is kept: local element names, attributes,
//! the concatenated direct character data of each element and its child
//! elements in document order.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ExtractionError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Element name without namespace prefix
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Direct character data, concatenated across text chunks
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> Result<XmlNode, ExtractionError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    stack.push(open_element(e)?);
                }
                Ok(Event::End(_)) => {
                    let completed = stack
                        .pop()
                        .ok_or_else(|| ExtractionError::Xml("unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut root, completed);
                }
                Ok(Event::Empty(ref e)) => {
                    let element = open_element(e)?;
                    attach(&mut stack, &mut root, element);
                }
                Ok(Event::Text(ref e)) => {
                    let text = e
                        .unescape()
                        .map_err(|err| ExtractionError::Xml(format!("text error: {err}")))?;
                    if let Some(parent) = stack.last_mut() {
                        parent.text.push_str(&text);
                    }
                }
                Ok(Event::CData(ref e)) => {
                    let text = std::str::from_utf8(e.as_ref())
                        .map_err(|err| ExtractionError::Xml(format!("CDATA error: {err}")))?;
                    if let Some(parent) = stack.last_mut() {
                        parent.text.push_str(text);
                    }
                }
                Ok(Event::Eof) => {
                    if !stack.is_empty() {
                        let unclosed: Vec<&str> = stack.iter().map(|el| el.name.as_str()).collect();
                        return Err(ExtractionError::Xml(format!(
                            "unclosed element(s): <{}>",
                            unclosed.join(">, <")
                        )));
                    }
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    return Err(ExtractionError::Xml(format!(
                        "error at position {}: {e}",
                        reader.error_position()
                    )));
                }
            }
        }

        root.ok_or_else(|| ExtractionError::Xml("no root element found".to_string()))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct text, or `None` when it is empty or whitespace only
    pub fn direct_text(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Children grouped by element name, groups ordered by first appearance
    pub fn child_groups(&self) -> Vec<(&str, Vec<&XmlNode>)> {
        let mut groups: Vec<(&str, Vec<&XmlNode>)> = Vec::new();
        for child in &self.children {
            match groups.iter_mut().find(|(name, _)| *name == child.name) {
                Some((_, members)) => members.push(child),
                None => groups.push((child.name.as_str(), vec![child])),
            }
        }
        groups
    }

    /// Follow a path of first-matching children
    pub fn descend(&self, path: &[&str]) -> Option<&XmlNode> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text.push_str(&text.into());
        self
    }

    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, element: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn open_element(e: &BytesStart) -> Result<XmlNode, ExtractionError> {
    let name = std::str::from_utf8(e.local_name().as_ref())
        .map_err(|err| ExtractionError::Xml(format!("invalid element name: {err}")))?
        .to_string();
    Ok(XmlNode {
        name,
        attributes: read_attributes(e)?,
        text: String::new(),
        children: Vec::new(),
    })
}

fn read_attributes(e: &BytesStart) -> Result<Vec<(String, String)>, ExtractionError> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ExtractionError::Xml(format!("attribute error: {err}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| ExtractionError::Xml(format!("attribute key error: {err}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| ExtractionError::Xml(format!("attribute value error: {err}")))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespaced_document() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<document xmlns="urn:hl7-org:v3" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <title>Aspirin <sup>®</sup> Tablets</title>
  <effectiveTime value="20240101"/>
</document>"#;

        let root = XmlNode::parse(xml).unwrap();
        assert_eq!(root.name, "document");
        assert_eq!(root.attribute("xmlns:xsi"), Some("http://www.w3.org/2001/XMLSchema-instance"));

        let title = root.child("title").unwrap();
        assert_eq!(title.direct_text(), Some("Aspirin  Tablets"));
        assert_eq!(title.child("sup").unwrap().direct_text(), Some("®"));
        assert_eq!(root.child("effectiveTime").unwrap().attribute("value"), Some("20240101"));
    }

    #[test]
    fn strips_element_prefixes() {
        let root = XmlNode::parse(r#"<v3:document xmlns:v3="urn:hl7-org:v3"><v3:title>X</v3:title></v3:document>"#)
            .unwrap();
        assert_eq!(root.name, "document");
        assert!(root.has_child("title"));
    }

    #[test]
    fn whitespace_only_text_is_not_text() {
        let root = XmlNode::parse("<a>\n   <b>hi</b>\n</a>").unwrap();
        assert_eq!(root.direct_text(), None);
        assert_eq!(root.child("b").and_then(XmlNode::direct_text), Some("hi"));
    }

    #[test]
    fn unescapes_entities_and_keeps_cdata() {
        let root = XmlNode::parse("<a>5 &lt; 10 &amp; <![CDATA[x > y]]></a>").unwrap();
        assert_eq!(root.direct_text(), Some("5 < 10 & x > y"));
    }

    #[test]
    fn groups_children_by_first_appearance() {
        let root = XmlNode::parse("<a><p>1</p><list/><p>2</p><table/></a>").unwrap();
        let groups: Vec<(&str, usize)> = root
            .child_groups()
            .into_iter()
            .map(|(name, members)| (name, members.len()))
            .collect();
        assert_eq!(groups, vec![("p", 2), ("list", 1), ("table", 1)]);
    }

    #[test]
    fn descend_follows_first_children() {
        let root = XmlNode::parse("<document><component><structuredBody><component/></structuredBody></component></document>")
            .unwrap();
        assert!(root.descend(&["component", "structuredBody"]).is_some());
        assert!(root.descend(&["component", "missing"]).is_none());
    }

    #[test]
    fn rejects_malformed_xml() {
        assert!(matches!(XmlNode::parse("<a><b></a>"), Err(ExtractionError::Xml(_))));
        assert!(matches!(XmlNode::parse("<a><b>"), Err(ExtractionError::Xml(_))));
        assert!(matches!(XmlNode::parse(""), Err(ExtractionError::Xml(_))));
    }
}

//! Minimal XML DOM for project documents.
//!
//! Project files are read once into an element tree which is then handed to
//! listeners of the project's "read" notification. The tree keeps element
//! names, attributes and concatenated text; comments and processing
//! instructions are dropped.

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::DocumentError;

/// A parsed XML element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Value of attribute `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child called `name`.
    pub fn first_child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Direct children called `name`.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first direct child called `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.first_child(name).map(|c| c.text.trim())
    }

    /// All descendants called `name` (excluding `self`), in document order.
    pub fn elements_by_tag_name<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        for child in &self.children {
            child.collect_named(name, &mut found);
        }
        found
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        if self.name == name {
            out.push(self);
        }
        for child in &self.children {
            child.collect_named(name, out);
        }
    }

    fn from_start(start: &BytesStart<'_>) -> Self {
        let mut element = Self::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        for attr in start.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let value = unescape(&raw).map(|v| v.into_owned()).unwrap_or(raw);
            element.attributes.push((key, value));
        }
        element
    }
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Parse a document from a string.
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        // Whitespace is kept: entity references split text into several
        // events and trimming each piece would eat the spaces around them.
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Err(e) => {
                    return Err(DocumentError::Xml {
                        position: reader.error_position() as u64,
                        reason: e.to_string(),
                    })
                }
                Ok(Event::Start(ref e)) => stack.push(XmlElement::from_start(e)),
                Ok(Event::Empty(ref e)) => {
                    let element = XmlElement::from_start(e);
                    Self::attach(&mut stack, &mut root, element);
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| DocumentError::Xml {
                        position: reader.buffer_position() as u64,
                        reason: "unexpected closing tag".to_string(),
                    })?;
                    Self::attach(&mut stack, &mut root, element);
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(current) = stack.last_mut() {
                        let raw = String::from_utf8_lossy(e.as_ref()).into_owned();
                        let text = unescape(&raw).map(|t| t.into_owned()).unwrap_or(raw);
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::CData(ref e)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Ok(Event::GeneralRef(ref e)) => {
                    if let Some(current) = stack.last_mut() {
                        if let Ok(Some(ch)) = e.resolve_char_ref() {
                            current.text.push(ch);
                        } else {
                            let name = String::from_utf8_lossy(e.as_ref()).into_owned();
                            match resolve_predefined_entity(&name) {
                                Some(resolved) => current.text.push_str(resolved),
                                None => {
                                    current.text.push('&');
                                    current.text.push_str(&name);
                                    current.text.push(';');
                                }
                            }
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(DocumentError::Xml {
                position: reader.buffer_position() as u64,
                reason: format!("unclosed element <{}>", stack[stack.len() - 1].name),
            });
        }
        root.map(|root| Self { root }).ok_or(DocumentError::Empty)
    }

    fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => {
                if root.is_none() {
                    *root = Some(element);
                }
            }
        }
    }

    /// Wrap an already built element tree.
    pub fn from_root(root: XmlElement) -> Self {
        Self { root }
    }

    /// The document element.
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// All elements called `name`, including the root, in document order.
    pub fn elements_by_tag_name<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.root.collect_named(name, &mut found);
        found
    }
}

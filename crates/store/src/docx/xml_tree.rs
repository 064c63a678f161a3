//! Lossless XML tree for package parts
//!
//! Template filling edits a handful of `w:t` elements and must leave every
//! other byte of meaning alone, so parts are read into a plain owned tree
//! (no whitespace trimming, comments and processing instructions kept) and
//! written back with the same element order, names and attributes.

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::reader::XmlParser;
use quick_xml::events::Event;
use quick_xml::Reader;

/// A node inside an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// An element with its attributes in document order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `w:p`
    pub name: String,
    /// Unescaped attribute values
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Local name without its namespace prefix
    pub fn local_name(&self) -> &str {
        XmlParser::local_name(&self.name)
    }

    pub fn is(&self, local: &str) -> bool {
        XmlParser::matches_element(&self.name, local)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// A `w:` attribute, falling back to the unprefixed name
    pub fn w_attribute(&self, local: &str) -> Option<&str> {
        self.attribute(&format!("w:{}", local))
            .or_else(|| self.attribute(local))
    }

    /// Set or replace an attribute, keeping its position when it exists
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Direct child elements
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// First direct child element with the given local name
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.is(local))
    }

    /// Concatenated direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) | XmlNode::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children with a single text node
    pub fn set_text(&mut self, text: &str) {
        self.children.clear();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }

    /// Follow child indices down from this element
    pub fn descendant(&self, path: &[usize]) -> Option<&XmlElement> {
        let mut current = self;
        for &index in path {
            current = match current.children.get(index)? {
                XmlNode::Element(element) => element,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let mut current = self;
        for &index in path {
            current = match current.children.get_mut(index)? {
                XmlNode::Element(element) => element,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// A parsed part: prolog (declaration, comments, doctype) plus root element
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Raw declaration content, e.g. `xml version="1.0" standalone="yes"`
    pub declaration: Option<String>,
    /// Comments and processing instructions before the root element
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
}

impl XmlDocument {
    /// Parse a complete part
    pub fn parse(content: &str) -> DocxResult<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(false);

        let mut declaration = None;
        let mut prolog = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event()?;
            let node = match event {
                Event::Decl(decl) => {
                    declaration = Some(String::from_utf8_lossy(&decl).into_owned());
                    continue;
                }
                Event::Start(start) => {
                    stack.push(element_from_start(&start)?);
                    continue;
                }
                Event::End(_) => {
                    let finished = stack.pop().ok_or_else(|| {
                        DocxError::XmlParse("Unexpected closing tag".to_string())
                    })?;
                    XmlNode::Element(finished)
                }
                Event::Empty(start) => XmlNode::Element(element_from_start(&start)?),
                Event::Text(text) => XmlNode::Text(
                    text.unescape()
                        .map_err(|e| DocxError::XmlParse(e.to_string()))?
                        .into_owned(),
                ),
                Event::CData(data) => {
                    XmlNode::CData(String::from_utf8_lossy(&data.into_inner()).into_owned())
                }
                Event::Comment(comment) => {
                    XmlNode::Comment(String::from_utf8_lossy(&comment).into_owned())
                }
                Event::PI(pi) => {
                    XmlNode::ProcessingInstruction(String::from_utf8_lossy(&pi).into_owned())
                }
                // DOCX parts never carry a doctype
                Event::DocType(_) => continue,
                Event::Eof => break,
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => match node {
                    XmlNode::Element(element) if root.is_none() => root = Some(element),
                    XmlNode::Element(_) => {
                        return Err(DocxError::XmlParse("Multiple root elements".to_string()));
                    }
                    // whitespace between prolog items is not significant
                    XmlNode::Text(text) if text.trim().is_empty() => {}
                    XmlNode::Text(_) | XmlNode::CData(_) => {
                        return Err(DocxError::XmlParse("Text outside the root element".to_string()));
                    }
                    other if root.is_none() => prolog.push(other),
                    _ => {}
                },
            }
        }

        if !stack.is_empty() {
            return Err(DocxError::XmlParse("Unclosed element at end of part".to_string()));
        }
        let root = root.ok_or_else(|| DocxError::XmlParse("Part has no root element".to_string()))?;

        Ok(Self {
            declaration,
            prolog,
            root,
        })
    }

    /// Serialize back to markup
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        if let Some(declaration) = &self.declaration {
            out.push_str("<?");
            out.push_str(declaration);
            out.push_str("?>\r\n");
        }
        for node in &self.prolog {
            write_node(node, &mut out);
        }
        write_element(&self.root, &mut out);
        out
    }
}

fn element_from_start(start: &quick_xml::events::BytesStart<'_>) -> DocxResult<XmlElement> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| DocxError::XmlParse(e.to_string()))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn write_node(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Element(element) => write_element(element, out),
        XmlNode::Text(text) => escape_into(text, false, out),
        XmlNode::CData(data) => {
            out.push_str("<![CDATA[");
            out.push_str(data);
            out.push_str("]]>");
        }
        XmlNode::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        XmlNode::ProcessingInstruction(pi) => {
            out.push_str("<?");
            out.push_str(pi);
            out.push_str("?>");
        }
    }
}

fn write_element(element: &XmlElement, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_into(value, true, out);
        out.push('"');
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\n' if attribute => out.push_str("&#10;"),
            '\t' if attribute => out.push_str("&#9;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PART: &str = concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n",
        "<w:document xmlns:w=\"urn:w\"><!-- kept --><w:body>",
        "<w:p><w:r><w:t xml:space=\"preserve\">  A &amp; B &lt;x&gt; </w:t></w:r></w:p>",
        "<w:p><w:pPr/></w:p>",
        "</w:body></w:document>"
    );

    #[test]
    fn test_parse_keeps_whitespace_and_entities() {
        let doc = XmlDocument::parse(PART).unwrap();
        assert_eq!(doc.root.name, "w:document");
        let t = doc.root.descendant(&[1, 0, 0, 0]).unwrap();
        assert!(t.is("t"));
        assert_eq!(t.text(), "  A & B <x> ");
        assert_eq!(t.attribute("xml:space"), Some("preserve"));
    }

    #[test]
    fn test_serialize_is_stable() {
        let doc = XmlDocument::parse(PART).unwrap();
        let once = doc.to_xml();
        assert_eq!(once, PART);
        assert_eq!(XmlDocument::parse(&once).unwrap(), doc);
    }

    #[test]
    fn test_attribute_escaping() {
        let mut element = XmlElement::new("w:x");
        element.set_attribute("w:val", "a\"b<c");
        let doc = XmlDocument {
            declaration: None,
            prolog: Vec::new(),
            root: element,
        };
        assert_eq!(doc.to_xml(), "<w:x w:val=\"a&quot;b&lt;c\"/>");
    }

    #[test]
    fn test_malformed_part_is_an_error() {
        assert!(matches!(
            XmlDocument::parse("<w:document><w:body></w:document>"),
            Err(DocxError::XmlParse(_))
        ));
        assert!(XmlDocument::parse("").is_err());
    }

    #[test]
    fn test_set_attribute_keeps_position() {
        let mut element = XmlElement::new("w:t");
        element.set_attribute("a", "1");
        element.set_attribute("b", "2");
        element.set_attribute("a", "3");
        assert_eq!(
            element.attributes,
            vec![("a".to_string(), "3".to_string()), ("b".to_string(), "2".to_string())]
        );
    }
}

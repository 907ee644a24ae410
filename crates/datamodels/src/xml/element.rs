//! Element tree backing XML models, with its quick-xml parser and printer

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fmt;
use std::io::{Cursor, Write};

use crate::config::SerializerConfig;
use crate::error::{ModelError, ModelResult};

/// An XML element: tag name, node attributes, ordered children and text
///
/// A node carries a single text value. Text runs separated by child
/// elements (mixed content) are concatenated on parse and printed before
/// the children, so `<a>x<b/>y</a>` prints back as `<a>xy<b/></a>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// First child with tag `name`
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|child| child.name == name)
    }

    /// Detach the first child with tag `name`
    pub fn take_child(&mut self, name: &str) -> Option<Element> {
        let position = self.children.iter().position(|child| child.name == name)?;
        Some(self.children.remove(position))
    }

    /// First child with tag `name`, created at the end when missing
    pub fn child_or_insert(&mut self, name: &str) -> &mut Element {
        let position = match self.children.iter().position(|child| child.name == name) {
            Some(position) => position,
            None => {
                self.children.push(Element::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[position]
    }

    /// Append a node-by-node deep copy of `source` as the last child
    pub fn append_copy(&mut self, source: &Element) -> &mut Element {
        self.children
            .push(Element::new(source.name.clone()).with_text(source.text.clone()));
        let last = self.children.len() - 1;
        let node = &mut self.children[last];
        node.merge_from(source);
        node
    }

    /// Union `source`'s attributes onto this node and append copies of its children
    pub fn merge_from(&mut self, source: &Element) {
        for (name, value) in &source.attributes {
            self.attributes.insert(name.clone(), value.clone());
        }
        for child in &source.children {
            self.append_copy(child);
        }
    }

    /// Parse a document and return its root element
    pub fn parse(input: &str) -> ModelResult<Element> {
        let mut reader = Reader::from_str(input);

        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(element_from_start(&start)?),
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ModelError::Xml("unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    // whitespace-only runs are indentation between elements
                    if text.trim().is_empty() {
                        continue;
                    }
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(ModelError::Xml("unclosed element at end of document".to_string()));
        }
        root.ok_or_else(|| ModelError::Xml("document has no root element".to_string()))
    }

    /// Compact XML without declaration
    pub fn to_xml_string(&self) -> ModelResult<String> {
        self.to_xml_string_with(&SerializerConfig::default())
    }

    /// XML using the printer options in `config`
    pub fn to_xml_string_with(&self, config: &SerializerConfig) -> ModelResult<String> {
        let mut writer = match config.xml_indent {
            Some(indent) => Writer::new_with_indent(Cursor::new(Vec::new()), b' ', indent),
            None => Writer::new(Cursor::new(Vec::new())),
        };

        if config.xml_declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(xml_error)?;
            if config.xml_indent.is_none() {
                writer.get_mut().write_all(b"\n").map_err(xml_error)?;
            }
        }

        write_element(&mut writer, self)?;
        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|err| ModelError::Xml(err.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = self.to_xml_string().map_err(|_| fmt::Error)?;
        f.write_str(&xml)
    }
}

fn xml_error(err: impl fmt::Display) -> ModelError {
    ModelError::Xml(err.to_string())
}

fn element_from_start(start: &BytesStart<'_>) -> ModelResult<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attribute in start.attributes() {
        let attribute = attribute?;
        let name = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        element.attributes.insert(name, value);
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> ModelResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ModelError::Xml("multiple root elements".to_string())),
    }
    Ok(())
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> ModelResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(xml_error)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(xml_error)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_document() {
        let root = Element::parse(
            r#"<team name="Real"><players><player id="7"><name>Raul</name></player></players></team>"#,
        )
        .unwrap();

        assert_eq!(root.name, "team");
        assert_eq!(root.attribute("name"), Some("Real"));
        let player = &root.child("players").unwrap().children[0];
        assert_eq!(player.attribute("id"), Some("7"));
        assert_eq!(player.child("name").unwrap().text, "Raul");
    }

    #[test]
    fn test_print_is_compact_and_round_trips() {
        let source = r#"<post title="Foo &amp; Bar"><created_by>Foo Bar</created_by><empty/></post>"#;
        let root = Element::parse(source).unwrap();
        assert_eq!(root.to_xml_string().unwrap(), source);
        assert_eq!(Element::parse("<post/>").unwrap().to_string(), "<post/>");
    }

    #[test]
    fn test_parse_ignores_declaration_and_whitespace() {
        let root = Element::parse("<?xml version=\"1.0\"?>\n<a>\n  <b>x</b>\n</a>\n").unwrap();
        assert_eq!(root.to_xml_string().unwrap(), "<a><b>x</b></a>");
    }

    #[test]
    fn test_parse_keeps_text_verbatim() {
        let root = Element::parse("<a>\n  <b>  padded  </b>\n  <c> x &amp; y</c>\n</a>").unwrap();
        assert_eq!(root.child("b").unwrap().text, "  padded  ");
        assert_eq!(root.child("c").unwrap().text, " x & y");
        assert_eq!(root.text, "");
    }

    #[test]
    fn test_mixed_content_text_is_concatenated() {
        let root = Element::parse("<note>a<b/>c</note>").unwrap();
        assert_eq!(root.text, "ac");
        assert_eq!(root.to_xml_string().unwrap(), "<note>ac<b/></note>");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Element::parse(""), Err(ModelError::Xml(_))));
        assert!(matches!(Element::parse("<a><b></a>"), Err(ModelError::Xml(_))));
    }

    #[test]
    fn test_declaration_option() {
        let config = SerializerConfig::default().with_xml_declaration(true);
        let xml = Element::new("a").to_xml_string_with(&config).unwrap();
        assert_eq!(xml, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a/>");
    }

    #[test]
    fn test_append_copy_is_deep() {
        let source = Element::new("settings")
            .with_attribute("blog_url", "http://foo.bar")
            .with_child(
                Element::new("detailed_settings")
                    .with_attribute("level", "2")
                    .with_child(Element::new("baz").with_text("bazzer")),
            );

        let mut user = Element::new("user");
        user.append_copy(&source);
        assert_eq!(user.children[0], source);
        assert_eq!(
            user.to_xml_string().unwrap(),
            r#"<user><settings blog_url="http://foo.bar"><detailed_settings level="2"><baz>bazzer</baz></detailed_settings></settings></user>"#
        );
    }

    #[test]
    fn test_take_child_detaches_first_match() {
        let mut root = Element::new("a")
            .with_child(Element::new("b").with_text("1"))
            .with_child(Element::new("b").with_text("2"));
        assert_eq!(root.take_child("b").unwrap().text, "1");
        assert_eq!(root.children.len(), 1);
        assert!(root.take_child("c").is_none());
    }
}

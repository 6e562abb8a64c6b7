//! XML bodies exchanged with the gateway
//!
//! Replies to outbound calls are small `<response>` documents; nested lists
//! (payment systems) are the only structure deeper than one level. The
//! acknowledgment of a callback is written back in the same shape.

use crate::error::{PlatronError, PlatronResult};
use crate::payments::types::ParameterSet;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

pub const RESPONSE_ROOT: &str = "response";

/// Parsed element with its text content and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn named(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first child called `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }
}

/// Parses a document into its root element.
pub fn parse_document(xml: &str) -> PlatronResult<XmlElement> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                stack.push(XmlElement::named(name));
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                attach(&mut stack, &mut root, XmlElement::named(name))?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| PlatronError::xml("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(t) => {
                if let Some(current) = stack.last_mut() {
                    let text = t.unescape().map_err(|e| PlatronError::xml(e.to_string()))?;
                    current.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(PlatronError::xml("unexpected end of document"));
    }

    root.ok_or_else(|| PlatronError::xml("document has no root element"))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> PlatronResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(PlatronError::xml("multiple root elements")),
    }
    Ok(())
}

/// Renders non-null parameters as `<response><key>value</key>...</response>`.
pub fn render_response(params: &ParameterSet) -> PlatronResult<String> {
    let mut writer = Writer::new(Vec::new());

    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    write(&mut writer, Event::Start(BytesStart::new(RESPONSE_ROOT)))?;
    for (key, value) in params.pairs() {
        write(&mut writer, Event::Start(BytesStart::new(key)))?;
        write(&mut writer, Event::Text(BytesText::new(value)))?;
        write(&mut writer, Event::End(BytesEnd::new(key)))?;
    }
    write(&mut writer, Event::End(BytesEnd::new(RESPONSE_ROOT)))?;

    String::from_utf8(writer.into_inner()).map_err(|e| PlatronError::xml(e.to_string()))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> PlatronResult<()> {
    writer
        .write_event(event)
        .map_err(|e| PlatronError::xml(format!("Failed to write XML: {}", e)))
}

//! Tree-structured element API over `quick-xml`.
//!
//! Documents are small enough to hold in memory, so they are parsed into
//! an owned [`XmlElement`] tree and queried by child name. Missing or
//! unparsable leaves fall back to caller-supplied defaults, matching how
//! older documents omit fields.

use std::fmt::Display;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::str::FromStr;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use voxsim_types::{VoxsimError, VoxsimResult};

/// One element: name, attributes, text content and children.
#[derive(Debug, Clone, PartialEq, Default)]
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

    /// A leaf element holding `value` as text.
    pub fn leaf(name: impl Into<String>, value: impl Display) -> Self {
        Self {
            name: name.into(),
            text: value.to_string(),
            ..Default::default()
        }
    }

    // ─── Building ───────────────────────────────────────────

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Display) -> &mut Self {
        let key = key.into();
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
        self
    }

    pub fn push(&mut self, child: XmlElement) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Appends a leaf child.
    pub fn push_value(&mut self, name: &str, value: impl Display) -> &mut Self {
        self.push(XmlElement::leaf(name, value))
    }

    /// Appends a leaf child holding `0` or `1`.
    pub fn push_bool(&mut self, name: &str, value: bool) -> &mut Self {
        self.push_value(name, u8::from(value))
    }

    // ─── Querying ───────────────────────────────────────────

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First child called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first child called `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    /// Parsed text of the child `name`, or `None` if missing or malformed.
    pub fn value<T: FromStr>(&self, name: &str) -> Option<T> {
        self.child_text(name).and_then(|t| t.trim().parse().ok())
    }

    pub fn value_or<T: FromStr>(&self, name: &str, default: T) -> T {
        self.value(name).unwrap_or(default)
    }

    /// Boolean child written as `0`/`1` or `true`/`false`.
    pub fn bool_value(&self, name: &str) -> Option<bool> {
        match self.child_text(name)?.trim() {
            "1" | "true" | "True" => Some(true),
            "0" | "false" | "False" => Some(false),
            other => other.parse::<f64>().ok().map(|v| v != 0.0),
        }
    }

    // ─── Reading ─────────────────────────────────────────────

    /// Parses a document and returns its root element.
    pub fn parse_str(input: &str) -> VoxsimResult<XmlElement> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => stack.push(element_from_start(e)),
                Ok(Event::Empty(ref e)) => {
                    attach(&mut stack, &mut root, element_from_start(e))?;
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|err| VoxsimError::Parse(format!("bad text content: {err}")))?;
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Ok(Event::End(_)) => {
                    let done = stack
                        .pop()
                        .ok_or_else(|| VoxsimError::Parse("unbalanced closing tag".into()))?;
                    attach(&mut stack, &mut root, done)?;
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(VoxsimError::Parse(format!(
                        "XML error at position {}: {e}",
                        reader.buffer_position()
                    )))
                }
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(VoxsimError::Parse(format!(
                "document ended inside <{}>",
                open.name
            )));
        }
        root.ok_or_else(|| VoxsimError::Parse("document has no root element".into()))
    }

    pub fn read_file(path: &Path) -> VoxsimResult<XmlElement> {
        let input = fs::read_to_string(path)?;
        Self::parse_str(&input)
    }

    // ─── Writing ─────────────────────────────────────────────

    /// Serializes the tree with an XML declaration and two-space indent.
    pub fn to_xml_string(&self) -> VoxsimResult<String> {
        let mut buffer = Vec::new();
        {
            let mut writer = Writer::new_with_indent(Cursor::new(&mut buffer), b' ', 2);
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(write_error)?;
            write_element(&mut writer, self)?;
        }
        String::from_utf8(buffer).map_err(|e| VoxsimError::Serialization(e.to_string()))
    }

    pub fn write_file(&self, path: &Path) -> VoxsimResult<()> {
        fs::write(path, self.to_xml_string()?)?;
        Ok(())
    }
}

fn element_from_start(e: &BytesStart<'_>) -> XmlElement {
    let mut el = XmlElement::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        el.attributes.push((key, value));
    }
    el
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    el: XmlElement,
) -> VoxsimResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(el);
        return Ok(());
    }
    if root.is_some() {
        return Err(VoxsimError::Parse(format!(
            "second root element <{}>",
            el.name
        )));
    }
    *root = Some(el);
    Ok(())
}

fn write_element<W: Write>(writer: &mut Writer<W>, el: &XmlElement) -> VoxsimResult<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (k, v) in &el.attributes {
        start.push_attribute((k.as_str(), v.as_str()));
    }
    if el.children.is_empty() && el.text.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(write_error)?;
        return Ok(());
    }
    writer.write_event(Event::Start(start)).map_err(write_error)?;
    if !el.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&el.text)))
            .map_err(write_error)?;
    }
    for child in &el.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(el.name.as_str())))
        .map_err(write_error)?;
    Ok(())
}

fn write_error(e: impl Display) -> VoxsimError {
    VoxsimError::Serialization(format!("XML write failed: {e}"))
}

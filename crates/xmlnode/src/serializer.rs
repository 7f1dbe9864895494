//! Writes node trees back out as XML.
//!
//! [`serialize`] walks a node in pre-order and reports each element to an
//! [`XmlSink`]. [`QuickXmlSink`] is the sink used for text output; it leaves
//! escaping to quick-xml's writer.

use std::fmt;
use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::node::Node;
use crate::tree::XmlTree;
use crate::{Error, Result};

/// Options controlling text output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Indent nested elements by this many spaces. `None` writes the
    /// document on a single line.
    pub indent: Option<usize>,
}

/// Receiver of serialization calls.
pub trait XmlSink {
    fn start_tag(&mut self, name: &str) -> Result<()>;
    /// Add an attribute to the most recent start tag.
    fn attribute(&mut self, name: &str, value: &str) -> Result<()>;
    fn text(&mut self, text: &str) -> Result<()>;
    fn end_tag(&mut self, name: &str) -> Result<()>;
    /// Called once after the root element has been closed.
    fn end_document(&mut self) -> Result<()>;
}

/// Serialize `node` and its subtree into `sink`.
///
/// Leaf nodes write their value as text; nodes with children write only
/// their children. The sink is told the document has ended when `node` has
/// no parent.
///
/// # Errors
///
/// Fails if the sink rejects a call or if an element in the subtree has an
/// empty name.
pub fn serialize<S: XmlSink + ?Sized>(node: Node<'_>, sink: &mut S) -> Result<()> {
    let name = node.name();
    if name.is_empty() {
        return Err(Error::invalid_operation(
            "cannot serialize an element without a name",
        ));
    }

    sink.start_tag(name)?;
    for (key, value) in node.attributes() {
        sink.attribute(key, value)?;
    }
    for child in node.children() {
        serialize(child, sink)?;
    }
    if !node.has_children() {
        sink.text(node.value())?;
    }
    sink.end_tag(name)?;

    if node.parent().is_none() {
        sink.end_document()?;
    }
    Ok(())
}

/// [`XmlSink`] writing XML text through quick-xml.
///
/// A start tag is held back until its first child, text or end tag so that
/// attributes can still be added to it.
pub struct QuickXmlSink<W: Write> {
    writer: Writer<W>,
    pending: Option<BytesStart<'static>>,
}

impl<W: Write> QuickXmlSink<W> {
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, &SerializeOptions::default())
    }

    pub fn with_options(inner: W, options: &SerializeOptions) -> Self {
        let writer = match options.indent {
            Some(width) => Writer::new_with_indent(inner, b' ', width),
            None => Writer::new(inner),
        };
        Self {
            writer,
            pending: None,
        }
    }

    /// Return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(|err| Error::Write {
            message: err.to_string(),
        })
    }

    fn flush_pending(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(start) => self.write(Event::Start(start)),
            None => Ok(()),
        }
    }
}

impl<W: Write> XmlSink for QuickXmlSink<W> {
    fn start_tag(&mut self, name: &str) -> Result<()> {
        self.flush_pending()?;
        self.pending = Some(BytesStart::new(name.to_owned()));
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        match self.pending.as_mut() {
            Some(start) => {
                start.push_attribute((name, value));
                Ok(())
            }
            None => Err(Error::invalid_operation(format!(
                "attribute `{}` written outside of a start tag",
                name
            ))),
        }
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.flush_pending()?;
        self.write(Event::Text(BytesText::new(text)))
    }

    fn end_tag(&mut self, name: &str) -> Result<()> {
        self.flush_pending()?;
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn end_document(&mut self) -> Result<()> {
        self.flush_pending()?;
        self.writer.get_mut().flush()?;
        Ok(())
    }
}

impl Node<'_> {
    /// Serialize this node to an XML string.
    ///
    /// # Errors
    ///
    /// Fails for nodes that cannot be written, such as the sentinel or any
    /// element with an empty name.
    pub fn to_xml(&self, options: &SerializeOptions) -> Result<String> {
        let mut sink = QuickXmlSink::with_options(Vec::new(), options);
        serialize(*self, &mut sink)?;
        String::from_utf8(sink.into_inner()).map_err(|err| Error::Write {
            message: err.to_string(),
        })
    }

    /// Serialize this node, returning an empty string on failure.
    pub fn to_xml_string_with(&self, options: &SerializeOptions) -> String {
        match self.to_xml(options) {
            Ok(xml) => xml,
            Err(err) => {
                tracing::warn!(error = %err, node = ?self, "XML serialization failed");
                String::new()
            }
        }
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string_with(&SerializeOptions::default()))
    }
}

impl fmt::Display for XmlTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root(), f)
    }
}

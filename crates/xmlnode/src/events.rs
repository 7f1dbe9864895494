//! Structural events consumed by the tree builder.
//!
//! The builder only needs four kinds of events. [`QuickXmlEvents`] produces
//! them from any buffered byte source using quick-xml; other producers can
//! implement [`EventSource`] directly.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::{Error, Result};

/// One structural event of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// An opening tag with its attributes in document order.
    StartTag {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// Character data (entities already resolved).
    Text(String),
    /// A closing tag.
    EndTag { name: String },
    /// No more events follow.
    EndDocument,
}

/// A producer of [`XmlEvent`]s.
pub trait EventSource {
    /// Read the next event. After [`XmlEvent::EndDocument`] the source must
    /// keep returning `EndDocument`.
    fn next_event(&mut self) -> Result<XmlEvent>;
}

impl<I> EventSource for I
where
    I: Iterator<Item = XmlEvent>,
{
    fn next_event(&mut self) -> Result<XmlEvent> {
        Ok(self.next().unwrap_or(XmlEvent::EndDocument))
    }
}

/// Event source backed by a quick-xml [`Reader`].
///
/// Empty elements (`<a/>`) are reported as a start tag followed by an end
/// tag. Comments, processing instructions, the XML declaration and DOCTYPE
/// are skipped. Runs of text, entity references and CDATA sections are
/// reported as one text event, even when comments or processing
/// instructions split them.
pub struct QuickXmlEvents<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    namespace_aware: bool,
    /// Event read past the end of a text run.
    pending: Option<XmlEvent>,
}

impl<R: BufRead> QuickXmlEvents<R> {
    /// Wrap `source`.
    ///
    /// With `namespace_aware`, tag and attribute names lose their prefix and
    /// `xmlns` declarations are not reported as attributes.
    pub fn new(source: R, namespace_aware: bool) -> Self {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.trim_text_start = false;
        config.trim_text_end = false;
        config.expand_empty_elements = true;
        config.check_end_names = true;

        Self {
            reader,
            buf: Vec::new(),
            namespace_aware,
            pending: None,
        }
    }

    fn start_tag(&self, e: &BytesStart<'_>) -> Result<XmlEvent> {
        let name = if self.namespace_aware {
            String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
        } else {
            String::from_utf8_lossy(e.name().as_ref()).into_owned()
        };

        let mut attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result?;
            if self.namespace_aware && attr.key.as_namespace_binding().is_some() {
                continue;
            }

            let key = if self.namespace_aware {
                String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned()
            } else {
                String::from_utf8_lossy(attr.key.as_ref()).into_owned()
            };
            let value = attr
                .unescape_value()
                .map_err(|err| self.syntax_error(format!("Invalid attribute value: {}", err)))?;

            attributes.push((key, value.into_owned()));
        }

        Ok(XmlEvent::StartTag { name, attributes })
    }

    fn end_tag(&self, e: &BytesEnd<'_>) -> XmlEvent {
        let name = if self.namespace_aware {
            String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
        } else {
            String::from_utf8_lossy(e.name().as_ref()).into_owned()
        };
        XmlEvent::EndTag { name }
    }

    fn syntax_error(&self, message: String) -> Error {
        Error::XmlSyntax {
            message,
            position: Some(self.reader.buffer_position()),
        }
    }
}

impl<R: BufRead> EventSource for QuickXmlEvents<R> {
    fn next_event(&mut self) -> Result<XmlEvent> {
        if let Some(event) = self.pending.take() {
            return Ok(event);
        }

        let mut text: Option<String> = None;
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event.into_owned(),
                Err(quick_xml::Error::Io(err)) => {
                    return Err(Error::Io(std::io::Error::new(err.kind(), err.to_string())));
                }
                Err(e) => {
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        position: Some(self.reader.error_position()),
                    });
                }
            };

            let structural = match event {
                Event::Start(e) | Event::Empty(e) => self.start_tag(&e)?,
                Event::End(e) => self.end_tag(&e),
                Event::Eof => XmlEvent::EndDocument,
                Event::Text(e) => {
                    let fragment = e.unescape().map_err(|err| {
                        self.syntax_error(format!("Invalid text content: {}", err))
                    })?;
                    text.get_or_insert_with(String::new).push_str(&fragment);
                    continue;
                }
                Event::CData(e) => {
                    let fragment = String::from_utf8_lossy(e.as_ref());
                    text.get_or_insert_with(String::new).push_str(&fragment);
                    continue;
                }
                Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => continue,
            };

            return Ok(match text {
                Some(text) => {
                    self.pending = Some(structural);
                    XmlEvent::Text(text)
                }
                None => structural,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(xml: &str, namespace_aware: bool) -> Vec<XmlEvent> {
        let mut source = QuickXmlEvents::new(xml.as_bytes(), namespace_aware);
        let mut events = Vec::new();
        loop {
            let event = source.next_event().unwrap();
            let done = event == XmlEvent::EndDocument;
            events.push(event);
            if done {
                return events;
            }
        }
    }

    fn start(name: &str, attributes: &[(&str, &str)]) -> XmlEvent {
        XmlEvent::StartTag {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn end(name: &str) -> XmlEvent {
        XmlEvent::EndTag {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_simple_document_events() {
        let events = collect(r#"<a id="1"><b>hello</b></a>"#, true);
        assert_eq!(
            events,
            vec![
                start("a", &[("id", "1")]),
                start("b", &[]),
                XmlEvent::Text("hello".to_string()),
                end("b"),
                end("a"),
                XmlEvent::EndDocument,
            ]
        );
    }

    #[test]
    fn test_empty_element_is_expanded() {
        let events = collect(r#"<a><b x="y"/></a>"#, true);
        assert_eq!(
            events,
            vec![
                start("a", &[]),
                start("b", &[("x", "y")]),
                end("b"),
                end("a"),
                XmlEvent::EndDocument,
            ]
        );
    }

    #[test]
    fn test_skips_prolog_comments_and_instructions() {
        let events = collect(
            "<?xml version=\"1.0\"?><!DOCTYPE a><!-- c --><a><?pi x?></a>",
            true,
        );
        assert_eq!(
            events,
            vec![start("a", &[]), end("a"), XmlEvent::EndDocument]
        );
    }

    #[test]
    fn test_entities_and_cdata_become_text() {
        let events = collect(
            r#"<a t="&lt;&amp;"><b>1 &lt; 2</b><c><![CDATA[<raw>]]></c></a>"#,
            true,
        );
        assert_eq!(events[0], start("a", &[("t", "<&")]));
        assert_eq!(events[2], XmlEvent::Text("1 < 2".to_string()));
        assert_eq!(events[5], XmlEvent::Text("<raw>".to_string()));
    }

    #[test]
    fn test_adjacent_text_fragments_are_merged() {
        let events = collect("<a>x &amp; y<![CDATA[z]]></a>", true);
        assert_eq!(
            events,
            vec![
                start("a", &[]),
                XmlEvent::Text("x & yz".to_string()),
                end("a"),
                XmlEvent::EndDocument,
            ]
        );

        let events = collect("<a>x<!--c-->y<b/>z</a>", true);
        assert_eq!(events[1], XmlEvent::Text("xy".to_string()));
        assert_eq!(events[2], start("b", &[]));
        assert_eq!(events[4], XmlEvent::Text("z".to_string()));
        assert_eq!(events[5], end("a"));
    }

    #[test]
    fn test_namespace_aware_names() {
        let xml = r#"<cfg:root xmlns:cfg="urn:cfg" cfg:mode="fast"><cfg:item/></cfg:root>"#;

        let aware = collect(xml, true);
        assert_eq!(aware[0], start("root", &[("mode", "fast")]));
        assert_eq!(aware[1], start("item", &[]));
        assert_eq!(aware[3], end("root"));

        let raw = collect(xml, false);
        assert_eq!(
            raw[0],
            start(
                "cfg:root",
                &[("xmlns:cfg", "urn:cfg"), ("cfg:mode", "fast")]
            )
        );
        assert_eq!(raw[3], end("cfg:root"));
    }

    #[test]
    fn test_mismatched_end_tag_is_syntax_error() {
        let mut source = QuickXmlEvents::new("<a><b></a>".as_bytes(), true);
        let mut result = Ok(XmlEvent::EndDocument);
        for _ in 0..4 {
            result = source.next_event();
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(Error::XmlSyntax { .. })));
    }

    #[test]
    fn test_iterator_source_ends_with_end_document() {
        let mut source = vec![XmlEvent::Text("x".to_string())].into_iter();
        assert_eq!(
            source.next_event().unwrap(),
            XmlEvent::Text("x".to_string())
        );
        assert_eq!(source.next_event().unwrap(), XmlEvent::EndDocument);
        assert_eq!(source.next_event().unwrap(), XmlEvent::EndDocument);
    }
}

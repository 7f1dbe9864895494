//! Builds an [`XmlTree`] from structural events.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::events::{EventSource, QuickXmlEvents, XmlEvent};
use crate::tree::{NodeId, XmlTree};
use crate::{Error, Result};

/// Options controlling how a document is turned into a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Report tag and attribute names without their namespace prefix and
    /// drop `xmlns` declarations. Defaults to `true`.
    pub namespace_aware: bool,

    /// Ignore whitespace-only text between elements, such as indentation.
    /// Whitespace that is the whole content of a leaf element is still kept
    /// as its value. Defaults to `true`.
    pub skip_whitespace_text: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            namespace_aware: true,
            skip_whitespace_text: true,
        }
    }
}

/// Parse XML from a string with default options.
///
/// # Example
///
/// ```rust
/// use xmlnode::parse;
///
/// let tree = parse(r#"<a id="1"><b>hello</b></a>"#).unwrap();
/// let root = tree.root();
/// assert_eq!(root.name(), "a");
/// assert_eq!(root.get_attribute_as_int("id"), 1);
/// assert_eq!(root.get_child_value("b"), "hello");
/// ```
///
/// # Errors
///
/// Returns an error if the XML is malformed.
pub fn parse(content: &str) -> Result<XmlTree> {
    parse_with_options(content, &ParseOptions::default())
}

/// Parse XML from a string.
pub fn parse_with_options(content: &str, options: &ParseOptions) -> Result<XmlTree> {
    parse_reader(content.as_bytes(), options)
}

/// Parse XML from any buffered byte source.
pub fn parse_reader<R: BufRead>(source: R, options: &ParseOptions) -> Result<XmlTree> {
    let mut tree = XmlTree::new();
    tree.parse_from(source, options)?;
    Ok(tree)
}

/// Parse the XML file at `path`.
///
/// The file is closed before this function returns, whatever the outcome.
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<XmlTree> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "parsing XML file");
    let file = File::open(path)?;
    parse_reader(BufReader::new(file), options)
}

impl XmlTree {
    /// Parse a document into this tree.
    ///
    /// The document's outermost element becomes the existing root node:
    /// its name is replaced, its attributes are merged in and its children
    /// are appended. On error the tree keeps whatever was built up to that
    /// point.
    pub fn parse_from<R: BufRead>(
        &mut self,
        source: R,
        options: &ParseOptions,
    ) -> Result<()> {
        let mut events = QuickXmlEvents::new(source, options.namespace_aware);
        self.build_from(&mut events, options)
    }

    /// Parse the XML file at `path` into this tree.
    pub fn parse_file_into(
        &mut self,
        path: impl AsRef<Path>,
        options: &ParseOptions,
    ) -> Result<()> {
        let file = File::open(path.as_ref())?;
        self.parse_from(BufReader::new(file), options)
    }

    /// Drive `events` until the end of the document, building into this tree.
    pub fn build_from<S: EventSource>(
        &mut self,
        events: &mut S,
        options: &ParseOptions,
    ) -> Result<()> {
        tracing::debug!(existing_nodes = self.node_count(), "building XML tree");

        let mut builder = TreeBuilder::new(self, options);
        let result = builder.run(events);

        match &result {
            Ok(()) => tracing::debug!(nodes = self.node_count(), "built XML tree"),
            Err(err) => tracing::debug!(error = %err, "XML parse failed"),
        }
        result
    }
}

/// Where the builder is in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// No element seen yet; the tree root is waiting to be named.
    BeforeRoot,
    /// Inside this element.
    In(NodeId),
    /// The root element has been closed.
    AfterRoot,
}

/// Cursor-driven state machine that turns events into tree nodes.
struct TreeBuilder<'t> {
    tree: &'t mut XmlTree,
    options: &'t ParseOptions,
    cursor: Cursor,
    /// Whitespace-only text held back until we know whether its element is
    /// a leaf.
    blank_text: Option<(NodeId, String)>,
}

impl<'t> TreeBuilder<'t> {
    fn new(tree: &'t mut XmlTree, options: &'t ParseOptions) -> Self {
        Self {
            tree,
            options,
            cursor: Cursor::BeforeRoot,
            blank_text: None,
        }
    }

    fn run<S: EventSource>(&mut self, events: &mut S) -> Result<()> {
        loop {
            let event = events.next_event()?;
            tracing::trace!(?event, cursor = ?self.cursor, "tree builder event");

            match event {
                XmlEvent::StartTag { name, attributes } => self.handle_start(name, attributes)?,
                XmlEvent::Text(text) => self.handle_text(text)?,
                XmlEvent::EndTag { name } => self.handle_end(&name)?,
                XmlEvent::EndDocument => return self.finish(),
            }
        }
    }

    fn handle_start(&mut self, name: String, attributes: Vec<(String, String)>) -> Result<()> {
        self.blank_text = None;
        let node = match self.cursor {
            Cursor::BeforeRoot => {
                let root = self.tree.root_id();
                self.tree.set_name(root, name);
                self.tree.mark_present(root);
                root
            }
            Cursor::In(parent) => {
                let node = self.tree.create_node();
                self.tree.set_name(node, name);
                self.tree.add_child(parent, node)?;
                node
            }
            Cursor::AfterRoot => return Err(Error::MultipleRoots),
        };

        for (key, value) in attributes {
            self.tree.set_attribute(node, key, value);
        }
        self.cursor = Cursor::In(node);
        Ok(())
    }

    fn handle_text(&mut self, text: String) -> Result<()> {
        let blank = text.trim().is_empty();
        match self.cursor {
            Cursor::In(node) => {
                if blank && self.options.skip_whitespace_text {
                    self.blank_text = Some((node, text));
                } else {
                    self.blank_text = None;
                    self.tree.set_value(node, text);
                }
                Ok(())
            }
            _ if blank => Ok(()),
            Cursor::BeforeRoot => Err(Error::invalid_structure(
                "text content before the root element",
            )),
            Cursor::AfterRoot => Err(Error::invalid_structure(
                "text content after the root element",
            )),
        }
    }

    fn handle_end(&mut self, name: &str) -> Result<()> {
        let Cursor::In(node) = self.cursor else {
            return Err(Error::invalid_structure(format!(
                "unexpected closing tag </{}>",
                name
            )));
        };

        let current = self.tree.node(node);
        if current.name() != name {
            return Err(Error::invalid_structure(format!(
                "closing tag </{}> does not match <{}>",
                name,
                current.name()
            )));
        }

        let is_empty_leaf = !current.has_children() && current.value().is_empty();
        let next = if node == self.tree.root_id() {
            Cursor::AfterRoot
        } else {
            current
                .parent()
                .and_then(|p| p.id())
                .map_or(Cursor::AfterRoot, Cursor::In)
        };

        let blank = self.blank_text.take();
        if let Some((_, text)) = blank.filter(|(owner, _)| *owner == node && is_empty_leaf) {
            self.tree.set_value(node, text);
        }
        self.cursor = next;
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        match self.cursor {
            Cursor::AfterRoot => Ok(()),
            Cursor::BeforeRoot => Err(Error::EmptyDocument),
            Cursor::In(node) => Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", self.tree.node(node).name()),
            }),
        }
    }
}

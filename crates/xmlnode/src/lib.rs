//! In-memory XML node trees.
//!
//! This crate parses a small or medium XML document into an [`XmlTree`] and
//! writes trees back out as XML text. It is aimed at configuration and data
//! files where callers want to read optional values without checking every
//! step for absence.
//!
//! # Overview
//!
//! The main types are:
//! - [`XmlTree`]: the document; owns every node and is mutated by [`NodeId`]
//! - [`Node`]: a read-only view of one node, or the not-present *sentinel*
//!   returned by lookups that find nothing
//! - [`EventSource`] / [`XmlSink`]: the seams over quick-xml's reader and
//!   writer used by the parser and serializer
//!
//! # Example
//!
//! ```rust
//! use xmlnode::parse;
//!
//! let tree = parse(r#"<config debug="true">
//!   <server>
//!     <port>8080</port>
//!   </server>
//! </config>"#).unwrap();
//!
//! let root = tree.root();
//! assert!(root.get_attribute_as_bool("debug"));
//! assert_eq!(root.get_child("server").get_child_value_as_int("port"), 8080);
//! assert_eq!(root.find_node("port").value(), "8080");
//!
//! // Missing nodes read as defaults instead of failing.
//! assert_eq!(root.get_child("client").get_child_value_as_int("timeout"), 0);
//! ```
//!
//! # Lookup by name
//!
//! Each node indexes its children by name, keeping only the *first* child
//! for each name. [`Node::get_child`] and [`Node::find_node`] therefore
//! resolve to the earliest match; later siblings with the same name are
//! reached through [`Node::children`].
//!
//! ```rust
//! let tree = xmlnode::parse("<list><x>1</x><x>2</x></list>").unwrap();
//! assert_eq!(tree.root().get_child_value("x"), "1");
//! assert_eq!(tree.root().children().count(), 2);
//! ```

pub mod error;
pub mod events;
pub mod node;
pub mod parser;
pub mod serializer;
pub mod tree;

// Re-export main types
pub use error::{Error, Result};
pub use events::{EventSource, QuickXmlEvents, XmlEvent};
pub use node::Node;
pub use parser::{ParseOptions, parse, parse_file, parse_reader, parse_with_options};
pub use serializer::{QuickXmlSink, SerializeOptions, XmlSink, serialize};
pub use tree::{NodeId, XmlTree};

//! Read-only views of tree nodes.
//!
//! A [`Node`] is a tree reference plus an optional [`NodeId`]. Lookups that
//! find nothing return the *sentinel*, a view without an id. The sentinel
//! answers every read with a default (empty strings, zero, `false`, no
//! children), so lookups can be chained without checking each step:
//!
//! ```rust
//! use xmlnode::parse;
//!
//! let tree = parse(r#"<server port="8080"><tls><cert>a.pem</cert></tls></server>"#)?;
//! let root = tree.root();
//!
//! assert_eq!(root.get_child("tls").get_child_value("cert"), "a.pem");
//! assert_eq!(root.get_child("proxy").get_child_value("host"), "");
//! assert_eq!(root.get_child("proxy").get_attribute_as_int("port"), 0);
//! assert!(!root.find_node("missing").is_present());
//! # Ok::<(), xmlnode::Error>(())
//! ```

use std::fmt;

use crate::tree::{NodeData, NodeId, XmlTree};
use crate::{Error, Result};

/// A borrowed view of one node in an [`XmlTree`], or the sentinel.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    tree: &'a XmlTree,
    id: Option<NodeId>,
}

impl<'a> Node<'a> {
    pub(crate) fn new(tree: &'a XmlTree, id: Option<NodeId>) -> Self {
        Self { tree, id }
    }

    fn sentinel(&self) -> Node<'a> {
        Node::new(self.tree, None)
    }

    fn data(&self) -> Option<&'a NodeData> {
        self.id.and_then(|id| self.tree.data(id))
    }

    /// Id of the node, or `None` for the sentinel.
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    /// The tree this view reads from.
    pub fn tree(&self) -> &'a XmlTree {
        self.tree
    }

    pub fn name(&self) -> &'a str {
        self.data().map_or("", |d| d.name.as_str())
    }

    /// Text content. Only meaningful for nodes without children.
    pub fn value(&self) -> &'a str {
        self.data().map_or("", |d| d.value.as_str())
    }

    /// Whether this node is attached in a tree (or is the parsed root).
    ///
    /// Always `false` for the sentinel and for freshly created nodes.
    pub fn is_present(&self) -> bool {
        self.data().is_some_and(|d| d.present)
    }

    pub fn has_children(&self) -> bool {
        self.data().is_some_and(|d| !d.children.is_empty())
    }

    pub fn children_count(&self) -> usize {
        self.data().map_or(0, |d| d.children.len())
    }

    /// Children in document order, including later siblings that share a
    /// name with an earlier one.
    pub fn children(self) -> impl ExactSizeIterator<Item = Node<'a>> + 'a {
        let tree = self.tree;
        self.data()
            .map(|d| d.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&id| Node::new(tree, Some(id)))
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.data()
            .and_then(|d| d.parent)
            .map(|id| Node::new(self.tree, Some(id)))
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn get_attribute(&self, key: &str) -> Option<&'a str> {
        self.data()
            .and_then(|d| d.attributes.get(key))
            .map(String::as_str)
    }

    /// Attribute parsed as `i32`; 0 when missing or malformed.
    pub fn get_attribute_as_int(&self, key: &str) -> i32 {
        parse_or_zero(self.get_attribute(key))
    }

    /// Attribute parsed as `i64`; 0 when missing or malformed.
    pub fn get_attribute_as_long(&self, key: &str) -> i64 {
        parse_or_zero(self.get_attribute(key))
    }

    /// `true` only when the attribute equals `"true"`, ignoring ASCII case.
    pub fn get_attribute_as_bool(&self, key: &str) -> bool {
        parse_bool(self.get_attribute(key))
    }

    /// Attributes as `(name, value)` pairs in insertion order.
    pub fn attributes(self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.data()
            .into_iter()
            .flat_map(|d| d.attributes.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // ------------------------------------------------------------------
    // Children by name
    // ------------------------------------------------------------------

    /// Whether a direct child named `name` exists.
    pub fn child_exists(&self, name: &str) -> bool {
        self.data().is_some_and(|d| d.child_index.contains_key(name))
    }

    /// The first direct child named `name`, or the sentinel.
    pub fn get_child(&self, name: &str) -> Node<'a> {
        self.data()
            .and_then(|d| d.child_index.get(name).and_then(|&pos| d.children.get(pos)))
            .map_or_else(|| self.sentinel(), |&id| Node::new(self.tree, Some(id)))
    }

    /// The child at `index` in document order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index >= children_count()`.
    pub fn get_child_at(&self, index: usize) -> Result<Node<'a>> {
        let children = self
            .data()
            .map(|d| d.children.as_slice())
            .unwrap_or_default();
        children
            .get(index)
            .map(|&id| Node::new(self.tree, Some(id)))
            .ok_or(Error::IndexOutOfRange {
                index,
                len: children.len(),
            })
    }

    pub fn get_child_value(&self, name: &str) -> &'a str {
        self.get_child(name).value()
    }

    pub fn get_child_value_as_int(&self, name: &str) -> i32 {
        parse_or_zero(Some(self.get_child_value(name)))
    }

    pub fn get_child_value_as_long(&self, name: &str) -> i64 {
        parse_or_zero(Some(self.get_child_value(name)))
    }

    pub fn get_child_value_as_bool(&self, name: &str) -> bool {
        parse_bool(Some(self.get_child_value(name)))
    }

    /// Search the subtree for a node named `name`.
    ///
    /// A direct child always wins. Otherwise each child that has children of
    /// its own is searched in document order, and the first match is
    /// returned. Returns the sentinel when nothing matches.
    pub fn find_node(&self, name: &str) -> Node<'a> {
        if self.child_exists(name) {
            return self.get_child(name);
        }

        for child in self.children() {
            if !child.has_children() {
                continue;
            }
            let found = child.find_node(name);
            if found.is_present() {
                return found;
            }
        }

        self.sentinel()
    }
}

fn parse_or_zero<T: std::str::FromStr + Default>(value: Option<&str>) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or_default()
}

fn parse_bool(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

impl PartialEq for Node<'_> {
    /// Structural equality: name, value, attribute set and children in
    /// order. Node ids and presence are not compared.
    fn eq(&self, other: &Self) -> bool {
        if self.name() != other.name() || self.value() != other.value() {
            return false;
        }

        let attributes_match = match (self.data(), other.data()) {
            (Some(a), Some(b)) => a.attributes == b.attributes,
            (None, None) => true,
            (Some(d), None) | (None, Some(d)) => d.attributes.is_empty(),
        };
        if !attributes_match || self.children_count() != other.children_count() {
            return false;
        }

        self.children().zip(other.children()).all(|(a, b)| a == b)
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => f
                .debug_struct("Node")
                .field("id", &id)
                .field("name", &self.name())
                .field("present", &self.is_present())
                .field("children", &self.children_count())
                .finish(),
            None => f.write_str("Node(sentinel)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root
    /// ├── x
    /// │   └── y = "deep"
    /// └── z = "leaf"
    fn sample_tree() -> XmlTree {
        let mut tree = XmlTree::new();
        let root = tree.root_id();
        tree.set_name(root, "root");
        let x = tree.add_child_with_value(root, "x", "").unwrap();
        tree.add_child_with_value(x, "y", "deep").unwrap();
        tree.add_child_with_value(root, "z", "leaf").unwrap();
        tree
    }

    #[test]
    fn test_sentinel_reads_are_defaults() {
        let tree = sample_tree();
        let missing = tree.root().get_child("nope");

        assert!(!missing.is_present());
        assert_eq!(missing.id(), None);
        assert_eq!(missing.name(), "");
        assert_eq!(missing.value(), "");
        assert_eq!(missing.get_attribute("a"), None);
        assert_eq!(missing.get_attribute_as_int("a"), 0);
        assert_eq!(missing.get_attribute_as_long("a"), 0);
        assert!(!missing.get_attribute_as_bool("a"));
        assert!(!missing.child_exists("y"));
        assert!(!missing.get_child("y").is_present());
        assert!(!missing.find_node("y").is_present());
        assert_eq!(missing.children_count(), 0);
        assert!(missing.parent().is_none());
        assert_eq!(missing.attributes().count(), 0);
        assert!(matches!(
            missing.get_child_at(0),
            Err(Error::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_numeric_defaults() {
        let mut tree = XmlTree::new();
        let root = tree.root_id();
        tree.set_attribute(root, "bad", "abc");
        tree.set_attribute(root, "good", "-17");
        tree.set_attribute(root, "big", "9000000000");
        tree.set_attribute(root, "padded", " 5");
        let node = tree.root();

        assert_eq!(node.get_attribute_as_int("bad"), 0);
        assert_eq!(node.get_attribute_as_int("missing"), 0);
        assert_eq!(node.get_attribute_as_int("good"), -17);
        assert_eq!(node.get_attribute_as_int("big"), 0);
        assert_eq!(node.get_attribute_as_long("big"), 9_000_000_000);
        assert_eq!(node.get_attribute_as_int("padded"), 0);
    }

    #[test]
    fn test_bool_parsing() {
        let mut tree = XmlTree::new();
        let root = tree.root_id();
        tree.set_attribute(root, "upper", "TRUE");
        tree.set_attribute(root, "mixed", "True");
        tree.set_attribute(root, "yes", "yes");
        tree.set_attribute(root, "one", "1");
        tree.add_child_with_value(root, "flag", "tRuE").unwrap();
        let node = tree.root();

        assert!(node.get_attribute_as_bool("upper"));
        assert!(node.get_attribute_as_bool("mixed"));
        assert!(!node.get_attribute_as_bool("yes"));
        assert!(!node.get_attribute_as_bool("one"));
        assert!(!node.get_attribute_as_bool("missing"));
        assert!(node.get_child_value_as_bool("flag"));
        assert!(!node.get_child_value_as_bool("missing"));
    }

    #[test]
    fn test_child_value_conversions() {
        let mut tree = XmlTree::new();
        let root = tree.root_id();
        tree.add_child_with_value(root, "count", "12").unwrap();
        tree.add_child_with_value(root, "size", "123456789012").unwrap();
        tree.add_child_with_value(root, "junk", "12x").unwrap();
        let node = tree.root();

        assert_eq!(node.get_child_value_as_int("count"), 12);
        assert_eq!(node.get_child_value_as_long("size"), 123_456_789_012);
        assert_eq!(node.get_child_value_as_int("junk"), 0);
        assert_eq!(node.get_child_value_as_int("missing"), 0);
        assert_eq!(node.get_child_value_as_long("missing"), 0);
    }

    #[test]
    fn test_get_child_at() {
        let tree = sample_tree();
        let root = tree.root();
        assert_eq!(root.get_child_at(0).unwrap().name(), "x");
        assert_eq!(root.get_child_at(1).unwrap().name(), "z");
        assert!(matches!(
            root.get_child_at(2),
            Err(Error::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_find_node_descends_through_children() {
        let tree = sample_tree();
        let found = tree.root().find_node("y");
        assert!(found.is_present());
        assert_eq!(found.value(), "deep");
        assert_eq!(found.parent().map(|p| p.name()), Some("x"));
    }

    #[test]
    fn test_find_node_prefers_direct_child() {
        let mut tree = XmlTree::new();
        let root = tree.root_id();
        let a = tree.add_child_with_value(root, "a", "").unwrap();
        tree.add_child_with_value(a, "target", "nested").unwrap();
        tree.add_child_with_value(root, "target", "direct").unwrap();

        assert_eq!(tree.root().find_node("target").value(), "direct");
    }

    #[test]
    fn test_find_node_prefers_earlier_subtree() {
        let mut tree = XmlTree::new();
        let root = tree.root_id();
        let first = tree.add_child_with_value(root, "first", "").unwrap();
        let inner = tree.add_child_with_value(first, "inner", "").unwrap();
        tree.add_child_with_value(inner, "target", "from-first").unwrap();
        let second = tree.add_child_with_value(root, "second", "").unwrap();
        tree.add_child_with_value(second, "target", "from-second").unwrap();

        assert_eq!(tree.root().find_node("target").value(), "from-first");
    }

    #[test]
    fn test_find_node_missing_is_sentinel() {
        let tree = sample_tree();
        let found = tree.root().find_node("nothing");
        assert!(!found.is_present());
        assert_eq!(found.value(), "");
    }

    #[test]
    fn test_structural_equality_ignores_attribute_order() {
        let mut a = XmlTree::new();
        let ra = a.root_id();
        a.set_name(ra, "r");
        a.set_attribute(ra, "one", "1");
        a.set_attribute(ra, "two", "2");

        let mut b = XmlTree::new();
        let rb = b.root_id();
        b.set_name(rb, "r");
        b.set_attribute(rb, "two", "2");
        b.set_attribute(rb, "one", "1");

        assert_eq!(a, b);

        b.set_attribute(rb, "two", "3");
        assert_ne!(a, b);
    }

    #[test]
    fn test_debug_output() {
        let tree = sample_tree();
        assert_eq!(
            format!("{:?}", tree.root().get_child("missing")),
            "Node(sentinel)"
        );
        assert!(format!("{:?}", tree.root()).contains("name: \"root\""));
    }
}

//! Arena-backed node tree.
//!
//! Every node of a document lives in a single [`XmlTree`] and is addressed by
//! a [`NodeId`]. Children are owned by the arena and listed in order on their
//! parent; the parent link is a plain id, so the tree never forms an ownership
//! cycle.

use std::collections::HashMap;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::node::Node;
use crate::{Error, Result};

/// Handle to a node stored in an [`XmlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its tree's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Storage for a single element.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeData {
    pub(crate) name: String,
    pub(crate) value: String,
    pub(crate) attributes: IndexMap<String, String>,
    pub(crate) children: Vec<NodeId>,
    /// Name of a child to the position of the first child with that name.
    pub(crate) child_index: HashMap<String, usize>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) present: bool,
}

/// An XML document held in memory.
///
/// The tree always has a root node. A freshly created tree has an empty,
/// not-present root; parsing or attaching children makes it present.
///
/// # Example
///
/// ```rust
/// use xmlnode::XmlTree;
///
/// let mut tree = XmlTree::new();
/// let root = tree.root_id();
/// tree.set_name(root, "config");
/// tree.set_attribute(root, "version", "2");
/// tree.add_child_with_value(root, "title", "Example")?;
///
/// let node = tree.root();
/// assert!(node.is_present());
/// assert_eq!(node.get_attribute_as_int("version"), 2);
/// assert_eq!(node.get_child_value("title"), "Example");
/// assert_eq!(node.get_child("missing").get_child_value("deeper"), "");
/// # Ok::<(), xmlnode::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for XmlTree {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlTree {
    /// Create a tree holding only an empty, not-present root.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::default()],
            root: NodeId(0),
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Read view of the root node.
    pub fn root(&self) -> Node<'_> {
        Node::new(self, Some(self.root))
    }

    /// Read view of `id`.
    ///
    /// An id that does not belong to this tree yields the not-present
    /// sentinel.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        if id.0 < self.nodes.len() {
            Node::new(self, Some(id))
        } else {
            Node::new(self, None)
        }
    }

    /// Number of nodes in the arena, including detached ones.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0)
    }

    fn data_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        let len = self.nodes.len();
        self.nodes.get_mut(id.0).ok_or_else(|| {
            Error::invalid_operation(format!(
                "node {} does not belong to this tree ({} nodes)",
                id.0, len
            ))
        })
    }

    /// Create a detached, not-present node with an empty name and value.
    pub fn create_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::default());
        id
    }

    /// Create a detached, not-present node carrying `name` and `value`.
    pub fn create_node_with_value(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        let id = self.create_node();
        let data = &mut self.nodes[id.0];
        data.name = name.into();
        data.value = value.into();
        id
    }

    /// Set the element name. Presence and the parent's child index are left
    /// untouched.
    ///
    /// Ids from another tree are ignored.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) {
        if let Ok(data) = self.data_mut(id) {
            data.name = name.into();
        }
    }

    /// Set the text value.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        if let Ok(data) = self.data_mut(id) {
            data.value = value.into();
        }
    }

    /// Insert or replace an attribute.
    pub fn set_attribute(&mut self, id: NodeId, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(data) = self.data_mut(id) {
            data.attributes.insert(key.into(), value.into());
        }
    }

    /// Remove an attribute if it exists.
    pub fn remove_attribute(&mut self, id: NodeId, key: &str) {
        if let Ok(data) = self.data_mut(id) {
            data.attributes.shift_remove(key);
        }
    }

    /// Append `child` to the children of `parent`.
    ///
    /// Both nodes become present. The child is recorded in the parent's
    /// name index only if no earlier child has the same name, so lookups by
    /// name always resolve to the first such child.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] if the attachment would not leave a
    /// tree: attaching a node to itself or to one of its descendants,
    /// attaching a node that already has a parent, or attaching the root.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.data_mut(parent)?;
        let child_parent = self.data_mut(child)?.parent;

        if parent == child {
            return Err(Error::invalid_operation("a node cannot be its own child"));
        }
        if child == self.root {
            return Err(Error::invalid_operation(
                "the tree root cannot be attached as a child",
            ));
        }
        if child_parent.is_some() {
            return Err(Error::invalid_operation(
                "node is already attached to a parent",
            ));
        }
        if self.is_ancestor(child, parent) {
            return Err(Error::invalid_operation(
                "attaching an ancestor as a descendant would create a cycle",
            ));
        }

        let child_name = {
            let data = &mut self.nodes[child.0];
            data.parent = Some(parent);
            data.present = true;
            data.name.clone()
        };

        let data = &mut self.nodes[parent.0];
        data.children.push(child);
        data.present = true;
        let position = data.children.len() - 1;
        data.child_index.entry(child_name).or_insert(position);

        Ok(())
    }

    /// Create a node with `name` and `value` and append it to `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] if `parent` does not belong to
    /// this tree.
    pub fn add_child_with_value(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<NodeId> {
        self.data_mut(parent)?;
        let child = self.create_node_with_value(name, value);
        self.add_child(parent, child)?;
        Ok(child)
    }

    /// Attach `child` under `parent`; the child-side spelling of
    /// [`XmlTree::add_child`].
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) -> Result<()> {
        self.add_child(parent, child)
    }

    /// Mark a node as present without attaching it. Used for the parsed root.
    pub(crate) fn mark_present(&mut self, id: NodeId) {
        if let Ok(data) = self.data_mut(id) {
            data.present = true;
        }
    }

    /// True if `candidate` is `node` or lies on the parent chain above it.
    fn is_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes.get(id.0).and_then(|d| d.parent);
        }
        false
    }
}

impl PartialEq for XmlTree {
    fn eq(&self, other: &Self) -> bool {
        self.root() == other.root()
    }
}

impl FromStr for XmlTree {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::parser::parse(s)
    }
}

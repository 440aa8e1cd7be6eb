//! In-memory document
//!
//! A small element tree with attributes, live values and event listeners.
//! Element handles share the tree, so writes through one handle are visible
//! through every other handle and through the document.

use super::{EventKind, FillEvent, FormControl, FormDocument};
use crate::error::{AutofillError, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::trace;

const DOCUMENT_TAG: &str = "#document";

/// Tags whose live value is exported to snapshots
const VALUE_TAGS: &[&str] = &["input", "textarea", "select"];

/// Identifies a node inside one [`MemoryDocument`]
///
/// Ids are only meaningful to the document that issued them. Passing an id
/// from another document to a method that takes a `NodeId` either addresses
/// an unrelated node or panics with an out-of-bounds index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An event as seen by a registered listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedEvent {
    /// Node the listener is attached to
    pub listener: NodeId,
    /// Node the event was dispatched on
    pub target: NodeId,
    pub kind: EventKind,
    pub bubbles: bool,
}

/// Builder for a new element
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    tag: String,
    attributes: BTreeMap<String, String>,
    value: Option<String>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Initial live value; defaults to the `value` attribute
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Debug)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    value: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<EventKind>,
}

#[derive(Debug)]
struct Tree {
    nodes: Vec<Node>,
    observed: Vec<ObservedEvent>,
}

impl Tree {
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Node ids in document (pre-)order, root excluded
    fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.node(NodeId(0)).children.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }

        order
    }
}

/// Element tree usable as a [`FormDocument`]
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    tree: Rc<RefCell<Tree>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        let root = Node {
            tag: DOCUMENT_TAG.to_string(),
            attributes: BTreeMap::new(),
            value: String::new(),
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        };

        Self {
            tree: Rc::new(RefCell::new(Tree {
                nodes: vec![root],
                observed: Vec::new(),
            })),
        }
    }

    /// The document node every element descends from
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a new element as the last child of `parent`
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not issued by this document and is out of range.
    /// The tree is left unchanged in that case.
    pub fn append(&self, parent: NodeId, spec: ElementSpec) -> NodeId {
        let mut tree = self.tree.borrow_mut();
        let id = NodeId(tree.nodes.len());
        tree.node_mut(parent).children.push(id);

        let value = spec
            .value
            .or_else(|| spec.attributes.get("value").cloned())
            .unwrap_or_default();

        tree.nodes.push(Node {
            tag: spec.tag.to_lowercase(),
            attributes: spec.attributes,
            value,
            parent: Some(parent),
            children: Vec::new(),
            listeners: Vec::new(),
        });

        id
    }

    /// Register a listener for `kind` on `node`
    ///
    /// # Panics
    ///
    /// Panics if `node` was not issued by this document and is out of range.
    pub fn add_listener(&self, node: NodeId, kind: EventKind) {
        let mut tree = self.tree.borrow_mut();
        let listeners = &mut tree.node_mut(node).listeners;
        if !listeners.contains(&kind) {
            listeners.push(kind);
        }
    }

    /// Every event observed by a listener so far, in dispatch order
    pub fn observed_events(&self) -> Vec<ObservedEvent> {
        self.tree.borrow().observed.clone()
    }

    /// Handle for `node`; accessors on the handle panic if `node` was not
    /// issued by this document and is out of range
    pub fn element(&self, node: NodeId) -> MemoryElement {
        MemoryElement {
            tree: Rc::clone(&self.tree),
            node,
        }
    }

    /// First element whose `id` attribute equals `id` exactly
    pub fn get_element_by_id(&self, id: &str) -> Option<MemoryElement> {
        let tree = self.tree.borrow();
        tree.document_order()
            .into_iter()
            .find(|node| tree.node(*node).attributes.get("id").map(String::as_str) == Some(id))
            .map(|node| self.element(node))
    }

    /// Build a document from a serialized snapshot
    pub fn from_snapshot(snapshot: &FormSnapshot) -> Self {
        let doc = Self::new();
        for node in &snapshot.nodes {
            doc.append_snapshot(doc.root(), node);
        }
        doc
    }

    fn append_snapshot(&self, parent: NodeId, node: &SnapshotNode) {
        let mut spec = ElementSpec::new(&node.tag);
        for (name, value) in &node.attributes {
            spec = spec.attr(name, value);
        }
        if let Some(value) = &node.value {
            spec = spec.value(value);
        }

        let id = self.append(parent, spec);
        for child in &node.children {
            self.append_snapshot(id, child);
        }
    }

    /// Serialize the current tree, live values included
    pub fn to_snapshot(&self) -> FormSnapshot {
        let tree = self.tree.borrow();
        FormSnapshot {
            nodes: tree
                .node(self.root())
                .children
                .iter()
                .map(|child| snapshot_node(&tree, *child))
                .collect(),
        }
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot_node(tree: &Tree, id: NodeId) -> SnapshotNode {
    let node = tree.node(id);
    SnapshotNode {
        tag: node.tag.clone(),
        attributes: node.attributes.clone(),
        value: VALUE_TAGS
            .contains(&node.tag.as_str())
            .then(|| node.value.clone()),
        children: node
            .children
            .iter()
            .map(|child| snapshot_node(tree, *child))
            .collect(),
    }
}

/// Parse a comma-separated tag list such as `input, textarea, select`
fn parse_tag_list(selector: &str) -> Result<Vec<String>> {
    let tags: Vec<String> = selector
        .split(',')
        .map(|part| part.trim().to_lowercase())
        .collect();

    let valid = tags.iter().all(|tag| {
        !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    if !valid {
        return Err(AutofillError::Document(format!(
            "unsupported selector '{}'",
            selector
        )));
    }

    Ok(tags)
}

impl FormDocument for MemoryDocument {
    type Control = MemoryElement;

    fn query_all(&self, selector: &str) -> Result<Vec<MemoryElement>> {
        let tags = parse_tag_list(selector)?;
        let tree = self.tree.borrow();

        Ok(tree
            .document_order()
            .into_iter()
            .filter(|id| tags.iter().any(|tag| *tag == tree.node(*id).tag))
            .map(|id| self.element(id))
            .collect())
    }
}

/// Handle to an element of a [`MemoryDocument`]
#[derive(Debug, Clone)]
pub struct MemoryElement {
    tree: Rc<RefCell<Tree>>,
    node: NodeId,
}

impl MemoryElement {
    pub fn node_id(&self) -> NodeId {
        self.node
    }
}

impl FormControl for MemoryElement {
    fn tag_name(&self) -> Result<String> {
        Ok(self.tree.borrow().node(self.node).tag.clone())
    }

    fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .tree
            .borrow()
            .node(self.node)
            .attributes
            .get(&name.to_lowercase())
            .cloned())
    }

    fn value(&self) -> Result<String> {
        Ok(self.tree.borrow().node(self.node).value.clone())
    }

    fn set_value(&self, value: &str) -> Result<()> {
        self.tree.borrow_mut().node_mut(self.node).value = value.to_string();
        Ok(())
    }

    fn dispatch(&self, event: &FillEvent) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        let mut current = Some(self.node);

        while let Some(id) = current {
            if tree.node(id).listeners.contains(&event.kind) {
                trace!("{} event on {:?} observed at {:?}", event.kind, self.node, id);
                tree.observed.push(ObservedEvent {
                    listener: id,
                    target: self.node,
                    kind: event.kind,
                    bubbles: event.bubbles,
                });
            }

            if !event.bubbles {
                break;
            }
            current = tree.node(id).parent;
        }

        Ok(())
    }
}

/// Serialized form of a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSnapshot {
    #[serde(default)]
    pub nodes: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

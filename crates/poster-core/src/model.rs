//! Document tree model.
//!
//! The edited poster is a tree of element and text nodes stored in a petgraph
//! `StableDiGraph` (edges point parent → child). Child order is tracked
//! explicitly per parent because stable graphs recycle vacant indices, so
//! index order says nothing about document order once nodes are removed.
//!
//! Nodes can exist detached (no parent edge) between `clone`/`create` and
//! `append`, mirroring the DOM. Detached nodes are invisible to traversal,
//! layout, and serialization.

use crate::id::NodeId;
use crate::style::InlineStyle;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Axis-aligned box, in whatever coordinate space the caller states.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// An element: tag, ordered attributes (excluding `style`), inline style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lower-case tag name.
    pub tag: String,
    pub attrs: SmallVec<[(String, String); 4]>,
    pub style: InlineStyle,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: SmallVec::new(),
            style: InlineStyle::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute. `style` is routed into the parsed inline style.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if name == "style" {
            self.style = InlineStyle::parse(value);
            return;
        }
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name, value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

/// A single node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomNode {
    pub id: NodeId,
    pub kind: NodeKind,
}

impl DomNode {
    pub fn element(id: NodeId, element: Element) -> Self {
        Self {
            id,
            kind: NodeKind::Element(element),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            id: NodeId::generated(),
            kind: NodeKind::Text(content.into()),
        }
    }

    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|e| e.tag.as_str())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match &mut self.kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }
}

/// The document tree: petgraph storage plus id lookup and child order.
#[derive(Debug, Clone)]
pub struct DomTree {
    pub graph: StableDiGraph<DomNode, ()>,
    pub root: NodeIndex,
    /// NodeId → NodeIndex for every live node, attached or not.
    pub id_index: HashMap<NodeId, NodeIndex>,
    /// Raw doctype text (`DOCTYPE html`) when the source had one.
    pub doctype: Option<String>,
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_id = NodeId::document();
        let root = graph.add_node(DomNode {
            id: root_id,
            kind: NodeKind::Document,
        });
        let mut id_index = HashMap::new();
        id_index.insert(root_id, root);
        Self {
            graph,
            root,
            id_index,
            doctype: None,
            child_order: HashMap::new(),
        }
    }

    /// Add a node without a parent.
    pub fn add_detached(&mut self, node: DomNode) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        idx
    }

    /// Add a node as the last child of `parent`.
    pub fn add_node(&mut self, parent: NodeIndex, node: DomNode) -> NodeIndex {
        let idx = self.add_detached(node);
        self.attach(parent, idx, None);
        idx
    }

    /// Attach a detached node under `parent` at `position` (end when `None`).
    /// Returns false if the node already has a parent or would become its own ancestor.
    pub fn attach(&mut self, parent: NodeIndex, child: NodeIndex, position: Option<usize>) -> bool {
        if self.parent(child).is_some() || parent == child || self.is_ancestor(child, parent) {
            return false;
        }
        self.graph.add_edge(parent, child, ());
        let order = self.child_order.entry(parent).or_default();
        let at = position.unwrap_or(order.len()).min(order.len());
        order.insert(at, child);
        true
    }

    /// Detach a node from its parent, keeping its subtree intact.
    pub fn detach(&mut self, child: NodeIndex) {
        if let Some(parent) = self.parent(child) {
            if let Some(edge) = self.graph.find_edge(parent, child) {
                self.graph.remove_edge(edge);
            }
            if let Some(order) = self.child_order.get_mut(&parent) {
                order.retain(|&c| c != child);
            }
        }
    }

    /// Remove a node and all of its descendants.
    pub fn remove_subtree(&mut self, idx: NodeIndex) -> Option<DomNode> {
        if idx == self.root || !self.graph.contains_node(idx) {
            return None;
        }
        self.detach(idx);
        let mut doomed = vec![idx];
        let mut i = 0;
        while i < doomed.len() {
            doomed.extend(self.children(doomed[i]));
            i += 1;
        }
        let mut removed = None;
        for node in doomed {
            self.child_order.remove(&node);
            if let Some(dom) = self.graph.remove_node(node) {
                self.id_index.remove(&dom.id);
                if node == idx {
                    removed = Some(dom);
                }
            }
        }
        removed
    }

    pub fn get_by_id(&self, id: NodeId) -> Option<&DomNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<&mut DomNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph.neighbors_directed(idx, Direction::Incoming).next()
    }

    /// Children in document order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.child_order.get(&idx).cloned().unwrap_or_default()
    }

    /// Element children in document order (text nodes skipped).
    pub fn element_children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.children(idx)
            .into_iter()
            .filter(|&c| self.graph[c].as_element().is_some())
            .collect()
    }

    /// Whether `ancestor` is a proper ancestor of `idx`.
    pub fn is_ancestor(&self, ancestor: NodeIndex, idx: NodeIndex) -> bool {
        let mut current = self.parent(idx);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Whether the node is reachable from the root.
    pub fn is_attached(&self, idx: NodeIndex) -> bool {
        idx == self.root || self.is_ancestor(self.root, idx)
    }

    /// Pre-order traversal of `idx` and its descendants.
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut kids = self.children(node);
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, idx: NodeIndex) -> String {
        self.descendants(idx)
            .into_iter()
            .filter_map(|n| match &self.graph[n].kind {
                NodeKind::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace every child of `idx` with a single text node.
    pub fn set_text_content(&mut self, idx: NodeIndex, content: &str) {
        for child in self.children(idx) {
            self.remove_subtree(child);
        }
        if !content.is_empty() {
            self.add_node(idx, DomNode::text(content));
        }
    }

    /// Deep-copy a subtree as a detached node. Attributes are copied as-is,
    /// authored `id` included; every copy gets a fresh node id.
    pub fn clone_subtree(&mut self, idx: NodeIndex) -> Option<NodeIndex> {
        if !self.graph.contains_node(idx) || idx == self.root {
            return None;
        }
        let mut copy = self.graph[idx].clone();
        copy.id = NodeId::generated();
        let new_idx = self.add_detached(copy);
        for child in self.children(idx) {
            if let Some(child_copy) = self.clone_subtree(child) {
                self.attach(new_idx, child_copy, None);
            }
        }
        Some(new_idx)
    }

    /// First attached element, in document order, satisfying `pred`.
    pub fn find_element(&self, pred: impl Fn(&Element) -> bool) -> Option<NodeIndex> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.graph[n].as_element().is_some_and(&pred))
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<NodeIndex> {
        self.find_element(|e| e.tag == tag)
    }

    pub fn find_by_class(&self, class: &str) -> Option<NodeIndex> {
        self.find_element(|e| e.has_class(class))
    }
}

//! In-memory document host.
//!
//! `PosterDocument` stands in for the rendering engine: it parses markup,
//! runs the cascade, and lays out boxes. Styles and layout are recomputed
//! eagerly after every mutation so reads never observe a stale box.

use crate::emitter::emit_document;
use crate::hit::{hit_test, is_background_tag};
use crate::host::DocumentHost;
use crate::id::NodeId;
use crate::layout::{Viewport, resolve_layout};
use crate::model::*;
use crate::parser::parse_document;
use crate::resolve::{resolve_style, resolve_styles};
use crate::style::{ComputedStyle, Stylesheet};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

pub struct PosterDocument {
    /// The current document tree.
    pub tree: DomTree,

    /// Canvas dimensions used as the initial containing block.
    pub viewport: Viewport,

    sheet: Stylesheet,
    styles: HashMap<NodeIndex, ComputedStyle>,
    bounds: HashMap<NodeIndex, Bounds>,
}

impl PosterDocument {
    /// Create an empty document.
    pub fn new(viewport: Viewport) -> Self {
        let mut doc = Self {
            tree: DomTree::new(),
            viewport,
            sheet: Stylesheet::default(),
            styles: HashMap::new(),
            bounds: HashMap::new(),
        };
        doc.relayout();
        doc
    }

    pub fn from_markup(markup: &str, viewport: Viewport) -> Result<Self, String> {
        let mut doc = Self::new(viewport);
        doc.load(markup)?;
        Ok(doc)
    }

    /// Recompute stylesheet, computed styles, and boxes.
    pub fn relayout(&mut self) {
        self.sheet = Stylesheet::from_tree(&self.tree);
        self.styles = resolve_styles(&self.tree, &self.sheet);
        self.bounds = resolve_layout(&self.tree, &self.styles, self.viewport);
    }

    pub fn current_bounds(&self) -> &HashMap<NodeIndex, Bounds> {
        &self.bounds
    }

    fn element_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.tree
            .index_of(id)
            .filter(|&idx| self.tree.graph[idx].as_element().is_some())
    }

    fn with_element_mut(&mut self, id: NodeId, f: impl FnOnce(&mut Element)) -> bool {
        let Some(idx) = self.element_index(id) else {
            return false;
        };
        if let Some(element) = self.tree.graph[idx].as_element_mut() {
            f(element);
        }
        self.relayout();
        true
    }
}

impl Default for PosterDocument {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl DocumentHost for PosterDocument {
    fn load(&mut self, markup: &str) -> Result<(), String> {
        self.tree = parse_document(markup)?;
        self.relayout();
        log::debug!(
            "loaded document: {} nodes, {} rules",
            self.tree.graph.node_count(),
            self.sheet.rules.len()
        );
        Ok(())
    }

    fn serialize(&self) -> String {
        emit_document(&self.tree)
    }

    fn contains(&self, id: NodeId) -> bool {
        self.tree.index_of(id).is_some()
    }

    fn tag_name(&self, id: NodeId) -> Option<String> {
        self.tree.get_by_id(id)?.tag().map(str::to_string)
    }

    fn computed_style(&self, id: NodeId) -> Option<ComputedStyle> {
        let idx = self.element_index(id)?;
        Some(
            self.styles
                .get(&idx)
                .cloned()
                .unwrap_or_else(|| resolve_style(&self.tree, &self.sheet, idx)),
        )
    }

    fn bounds(&self, id: NodeId) -> Option<Bounds> {
        let idx = self.element_index(id)?;
        self.bounds.get(&idx).copied()
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        let idx = self.tree.index_of(id)?;
        self.tree.parent(idx).map(|p| self.tree.graph[p].id)
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        let Some(idx) = self.tree.index_of(id) else {
            return Vec::new();
        };
        self.tree
            .element_children(idx)
            .into_iter()
            .map(|c| self.tree.graph[c].id)
            .collect()
    }

    fn inline_style(&self, id: NodeId, property: &str) -> Option<String> {
        let element = self.tree.get_by_id(id)?.as_element()?;
        element.style.get(property).map(str::to_string)
    }

    fn set_inline_style(&mut self, id: NodeId, property: &str, value: &str) -> bool {
        self.with_element_mut(id, |element| element.style.set(property, value))
    }

    fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        let element = self.tree.get_by_id(id)?.as_element()?;
        if name.eq_ignore_ascii_case("style") {
            return Some(element.style.to_css_text());
        }
        element.attr(&name.to_ascii_lowercase()).map(str::to_string)
    }

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        self.with_element_mut(id, |element| element.set_attr(name, value))
    }

    fn text_content(&self, id: NodeId) -> Option<String> {
        let idx = self.tree.index_of(id)?;
        Some(self.tree.text_content(idx))
    }

    fn set_text(&mut self, id: NodeId, text: &str) -> bool {
        let Some(idx) = self.element_index(id) else {
            return false;
        };
        self.tree.set_text_content(idx, text);
        self.relayout();
        true
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId::generated();
        self.tree
            .add_detached(DomNode::element(id, Element::new(tag)));
        id
    }

    fn deep_clone(&mut self, id: NodeId) -> Option<NodeId> {
        let idx = self.element_index(id)?;
        let copy = self.tree.clone_subtree(idx)?;
        Some(self.tree.graph[copy].id)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let (Some(parent_idx), Some(child_idx)) = (self.tree.index_of(parent), self.tree.index_of(child))
        else {
            return false;
        };
        if !self.tree.attach(parent_idx, child_idx, None) {
            return false;
        }
        self.relayout();
        true
    }

    fn remove(&mut self, id: NodeId) -> bool {
        let Some(idx) = self.tree.index_of(id) else {
            return false;
        };
        if self.tree.remove_subtree(idx).is_none() {
            return false;
        }
        self.relayout();
        true
    }

    fn hit_test(&self, x: f32, y: f32) -> Option<NodeId> {
        hit_test(&self.tree, &self.bounds, &self.styles, x, y)
    }

    fn body(&self) -> Option<NodeId> {
        self.tree
            .find_by_tag("body")
            .map(|idx| self.tree.graph[idx].id)
    }

    fn find_by_class(&self, class: &str) -> Option<NodeId> {
        self.tree
            .find_by_class(class)
            .map(|idx| self.tree.graph[idx].id)
    }

    fn is_selectable(&self, id: NodeId) -> bool {
        let Some(idx) = self.element_index(id) else {
            return false;
        };
        let tag = self.tree.graph[idx].tag().unwrap_or_default();
        self.tree.is_attached(idx) && !is_background_tag(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = r#"<html><body><div class="poster-container">
      <div id="box" style="position: absolute; left: 10px; top: 20px; width: 100px; height: 50px">x</div>
    </div></body></html>"#;

    #[test]
    fn set_inline_style_relayouts() {
        let mut doc = PosterDocument::from_markup(SRC, Viewport::default()).unwrap();
        let id = NodeId::intern("box");
        assert_eq!(doc.bounds(id), Some(Bounds::new(10.0, 20.0, 100.0, 50.0)));
        assert!(doc.set_inline_style(id, "left", "40px"));
        assert_eq!(doc.bounds(id).unwrap().x, 40.0);
        assert_eq!(doc.inline_style(id, "left").as_deref(), Some("40px"));
    }

    #[test]
    fn clone_then_append() {
        let mut doc = PosterDocument::from_markup(SRC, Viewport::default()).unwrap();
        let id = NodeId::intern("box");
        let copy = doc.deep_clone(id).unwrap();
        assert!(!doc.is_selectable(copy));
        assert_eq!(doc.bounds(copy), None);
        let parent = doc.parent(id).unwrap();
        assert!(doc.append_child(parent, copy));
        assert!(doc.is_selectable(copy));
        assert_eq!(doc.children(parent), vec![id, copy]);
        assert_eq!(doc.text_content(copy).as_deref(), Some("x"));
    }

    #[test]
    fn removed_ids_stop_resolving() {
        let mut doc = PosterDocument::from_markup(SRC, Viewport::default()).unwrap();
        let id = NodeId::intern("box");
        assert!(doc.remove(id));
        assert!(!doc.contains(id));
        assert!(!doc.set_inline_style(id, "left", "1px"));
        assert!(!doc.remove(id));
    }

    #[test]
    fn body_is_not_selectable() {
        let doc = PosterDocument::from_markup(SRC, Viewport::default()).unwrap();
        let body = doc.body().unwrap();
        assert!(!doc.is_selectable(body));
        assert!(doc.is_selectable(NodeId::intern("box")));
    }

    #[test]
    fn reload_invalidates_generated_ids() {
        let mut doc = PosterDocument::from_markup(SRC, Viewport::default()).unwrap();
        let container = doc.find_by_class("poster-container").unwrap();
        let snapshot = doc.serialize();
        doc.load(&snapshot).unwrap();
        assert!(!doc.contains(container));
        assert_eq!(doc.serialize(), snapshot);
    }
}

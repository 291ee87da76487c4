//! The document host contract.
//!
//! The editor never owns the rendered document. Everything it reads
//! (resolved style, boxes, tree shape) and every change it makes goes through
//! this trait, addressed by [`NodeId`]. An id that no longer resolves (the
//! document was reloaded, the node was removed) makes reads return `None` and
//! writes return `false`; callers treat that as a no-op.

use crate::id::NodeId;
use crate::model::Bounds;
use crate::style::ComputedStyle;

pub trait DocumentHost {
    /// Replace the whole document with parsed markup.
    fn load(&mut self, markup: &str) -> Result<(), String>;

    /// Serialize the attached document (editor-only nodes excluded).
    fn serialize(&self) -> String;

    fn contains(&self, id: NodeId) -> bool;

    /// Lower-case tag name of an element.
    fn tag_name(&self, id: NodeId) -> Option<String>;

    /// Effective style after the cascade.
    fn computed_style(&self, id: NodeId) -> Option<ComputedStyle>;

    /// Box in logical document coordinates.
    fn bounds(&self, id: NodeId) -> Option<Bounds>;

    fn parent(&self, id: NodeId) -> Option<NodeId>;

    /// Element children in document order.
    fn children(&self, id: NodeId) -> Vec<NodeId>;

    fn inline_style(&self, id: NodeId, property: &str) -> Option<String>;

    /// Write an inline declaration; an empty value removes it.
    fn set_inline_style(&mut self, id: NodeId, property: &str, value: &str) -> bool;

    fn attribute(&self, id: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool;

    fn text_content(&self, id: NodeId) -> Option<String>;

    /// Replace all children of an element with one text node.
    fn set_text(&mut self, id: NodeId, text: &str) -> bool;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Deep-copy an element (descendants and attributes) as a detached node.
    fn deep_clone(&mut self, id: NodeId) -> Option<NodeId>;

    /// Attach a detached node as the last child of `parent`.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool;

    /// Remove a node and its descendants.
    fn remove(&mut self, id: NodeId) -> bool;

    /// Topmost selectable element under a logical point.
    fn hit_test(&self, x: f32, y: f32) -> Option<NodeId>;

    fn body(&self) -> Option<NodeId>;

    /// First element carrying `class`, in document order.
    fn find_by_class(&self, class: &str) -> Option<NodeId>;

    /// Whether the node is an attached element other than the root,
    /// `html`, or `body`.
    fn is_selectable(&self, id: NodeId) -> bool;
}

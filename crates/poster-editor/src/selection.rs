//! The selected element, as the properties panel sees it.
//!
//! A selection never holds the node itself, only its id. The cached box and
//! style are rebuilt wholesale after every mutation; if the id stops
//! resolving (reload, undo, delete) the selection is gone.

use crate::viewport::CanvasTransform;
use poster_core::host::DocumentHost;
use poster_core::id::NodeId;
use poster_core::model::Bounds;
use poster_core::style::ComputedStyle;

/// Tags whose content is edited as text.
const TEXT_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "span", "div", "a", "li", "td", "th", "label",
    "button",
];

pub fn is_text_tag(tag: &str) -> bool {
    TEXT_TAGS.contains(&tag)
}

/// An `<img>`, or a `<div>` painted with a background image.
pub fn is_image_element(tag: &str, style: &ComputedStyle) -> bool {
    tag == "img" || (tag == "div" && style.has_background_image())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedElement {
    pub id: NodeId,
    /// Box in visual (screen) coordinates.
    pub bounds: Bounds,
    pub style: ComputedStyle,
    pub tag: String,
    pub is_text_element: bool,
    pub is_image_element: bool,
}

impl SelectedElement {
    /// Snapshot `id` from the host. `None` if it is gone or not selectable.
    pub fn resolve<H: DocumentHost>(
        host: &H,
        id: NodeId,
        transform: &CanvasTransform,
    ) -> Option<Self> {
        if !host.is_selectable(id) {
            return None;
        }
        let tag = host.tag_name(id)?;
        let style = host.computed_style(id)?;
        let bounds = transform.to_visual(host.bounds(id).unwrap_or_default());
        Some(Self {
            id,
            bounds,
            is_text_element: is_text_tag(&tag),
            is_image_element: is_image_element(&tag, &style),
            style,
            tag,
        })
    }
}

//! Box layout.
//!
//! A deliberately small block-flow model, enough to give every element a
//! box the editor can select, drag, and resize:
//!
//! - in-flow elements (static, relative, sticky) stack vertically inside
//!   their parent; relative/sticky ones are then shifted by `left`/`top`;
//! - absolute/fixed elements sit at parent origin + `left`/`top` and leave
//!   the flow (the parent is always the containing block);
//! - `html` and `body` stretch to at least the viewport height.
//!
//! Margins, padding, borders, and inline formatting are not modelled.

use crate::model::*;
use crate::style::{ComputedStyle, PositionMode, parse_px};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// The canvas (viewport) dimensions in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    /// The poster canvas: 1080 × 1080.
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 1080.0,
        }
    }
}

/// Tags that never produce a box.
const NON_RENDERED: &[&str] = &[
    "head", "style", "script", "meta", "link", "title", "noscript", "template",
];

/// Fallback size for images without explicit dimensions.
const DEFAULT_IMAGE_SIZE: f32 = 150.0;

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f32 = 0.6;

pub fn is_rendered_tag(tag: &str) -> bool {
    !NON_RENDERED.contains(&tag)
}

/// Resolve the box of every rendered, attached element.
///
/// Returns a map from `NodeIndex` → `Bounds` in logical document coordinates.
pub fn resolve_layout(
    tree: &DomTree,
    styles: &HashMap<NodeIndex, ComputedStyle>,
    viewport: Viewport,
) -> HashMap<NodeIndex, Bounds> {
    let mut bounds = HashMap::new();
    let root_box = Bounds::new(0.0, 0.0, viewport.width, viewport.height);
    bounds.insert(tree.root, root_box);
    layout_children(tree, styles, tree.root, root_box, &mut bounds);
    bounds
}

/// Lay out the element children of `parent` inside `content`.
/// Returns the height consumed by in-flow children.
fn layout_children(
    tree: &DomTree,
    styles: &HashMap<NodeIndex, ComputedStyle>,
    parent: NodeIndex,
    content: Bounds,
    bounds: &mut HashMap<NodeIndex, Bounds>,
) -> f32 {
    let mut cursor = content.y;

    for child in tree.element_children(parent) {
        let Some(element) = tree.graph[child].as_element() else {
            continue;
        };
        if !is_rendered_tag(&element.tag) {
            continue;
        }
        let Some(style) = styles.get(&child) else {
            continue;
        };
        if style.is_display_none() {
            bounds.insert(child, Bounds::new(content.x, cursor, 0.0, 0.0));
            continue;
        }

        let position = style.position();
        let out_of_flow = position.is_out_of_flow();
        let fills_viewport = matches!(element.tag.as_str(), "html" | "body");
        let (intrinsic_w, intrinsic_h) = intrinsic_size(element);

        let width = style.length("width").or(intrinsic_w).unwrap_or_else(|| {
            if out_of_flow {
                estimate_text_width(tree, child, style)
            } else {
                content.width
            }
        });
        let explicit_height = style.length("height").or(intrinsic_h);

        let (mut x, mut y) = if out_of_flow {
            (content.x + style.px("left"), content.y + style.px("top"))
        } else {
            (content.x, cursor)
        };
        if matches!(position, PositionMode::Relative | PositionMode::Sticky) {
            x += style.px("left");
            y += style.px("top");
        }

        let inner_height = explicit_height.unwrap_or(if fills_viewport {
            content.height
        } else {
            0.0
        });
        let inner = Bounds::new(x, y, width, inner_height);
        let flow_height = layout_children(tree, styles, child, inner, bounds);
        let text_height = if has_direct_text(tree, child) {
            line_height(style)
        } else {
            0.0
        };

        let auto_height = flow_height + text_height;
        let height = explicit_height.unwrap_or(if fills_viewport {
            auto_height.max(content.height)
        } else {
            auto_height
        });

        bounds.insert(child, Bounds::new(x, y, width, height));
        if !out_of_flow {
            cursor += height;
        }
    }

    cursor - content.y
}

/// Image dimensions from `width`/`height` attributes; a missing one mirrors
/// the other, and both missing fall back to a default square.
fn intrinsic_size(element: &Element) -> (Option<f32>, Option<f32>) {
    if element.tag != "img" {
        return (None, None);
    }
    let w = element.attr("width").and_then(parse_px);
    let h = element.attr("height").and_then(parse_px);
    match (w, h) {
        (None, None) => (Some(DEFAULT_IMAGE_SIZE), Some(DEFAULT_IMAGE_SIZE)),
        (Some(w), None) => (Some(w), Some(w)),
        (None, Some(h)) => (Some(h), Some(h)),
        (w, h) => (w, h),
    }
}

fn has_direct_text(tree: &DomTree, idx: NodeIndex) -> bool {
    tree.children(idx).into_iter().any(|c| match &tree.graph[c].kind {
        NodeKind::Text(t) => !t.trim().is_empty(),
        _ => false,
    })
}

fn font_size(style: &ComputedStyle) -> f32 {
    style.length("font-size").unwrap_or(16.0)
}

/// One line box: `line-height` in px, a unitless multiplier, or 1.2 × font size.
pub fn line_height(style: &ComputedStyle) -> f32 {
    let value = style.get("line-height").trim();
    let size = font_size(style);
    if value.ends_with("px") {
        parse_px(value).unwrap_or(size * 1.2)
    } else {
        parse_px(value).map(|factor| factor * size).unwrap_or(size * 1.2)
    }
}

fn estimate_text_width(tree: &DomTree, idx: NodeIndex, style: &ComputedStyle) -> f32 {
    let text = tree.text_content(idx);
    text.trim().chars().count() as f32 * font_size(style) * GLYPH_ADVANCE
}

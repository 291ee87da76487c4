//! Hit testing: point → element lookup.
//!
//! Walks siblings in reverse paint order (topmost first) to find which
//! element is under a logical (x, y) position.

use crate::id::NodeId;
use crate::model::*;
use crate::style::ComputedStyle;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// Elements treated as canvas background: clicks on them deselect.
pub fn is_background_tag(tag: &str) -> bool {
    matches!(tag, "html" | "body")
}

/// Stacking value used for paint order; static elements do not stack.
fn paint_z(styles: &HashMap<NodeIndex, ComputedStyle>, idx: NodeIndex) -> i32 {
    styles
        .get(&idx)
        .filter(|s| s.position().is_positioned())
        .map(ComputedStyle::z_index)
        .unwrap_or(0)
}

/// Element children of `parent` in paint order: ascending stacking value,
/// document order within equal values.
pub fn paint_order(
    tree: &DomTree,
    styles: &HashMap<NodeIndex, ComputedStyle>,
    parent: NodeIndex,
) -> Vec<NodeIndex> {
    let mut children = tree.element_children(parent);
    children.sort_by_key(|&c| paint_z(styles, c));
    children
}

/// Find the topmost element at position (px, py).
/// Returns `None` for the background (`html`, `body`, or nothing).
pub fn hit_test(
    tree: &DomTree,
    bounds: &HashMap<NodeIndex, Bounds>,
    styles: &HashMap<NodeIndex, ComputedStyle>,
    px: f32,
    py: f32,
) -> Option<NodeId> {
    hit_test_node(tree, tree.root, bounds, styles, px, py)
}

fn hit_test_node(
    tree: &DomTree,
    idx: NodeIndex,
    bounds: &HashMap<NodeIndex, Bounds>,
    styles: &HashMap<NodeIndex, ComputedStyle>,
    px: f32,
    py: f32,
) -> Option<NodeId> {
    if idx != tree.root && styles.get(&idx).is_some_and(ComputedStyle::is_display_none) {
        return None;
    }

    // Check children topmost first
    for child in paint_order(tree, styles, idx).into_iter().rev() {
        if let Some(hit) = hit_test_node(tree, child, bounds, styles, px, py) {
            return Some(hit);
        }
    }

    let node = &tree.graph[idx];
    let element = node.as_element()?;
    if is_background_tag(&element.tag) {
        return None;
    }
    if styles.get(&idx).is_some_and(ComputedStyle::is_hidden) {
        return None;
    }

    if let Some(b) = bounds.get(&idx)
        && b.contains(px, py)
    {
        return Some(node.id);
    }

    None
}

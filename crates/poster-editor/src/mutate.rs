//! Element mutation engine.
//!
//! Turns gestures and discrete commands into inline style writes on one
//! element. Every function takes the document handle explicitly and reads
//! current values from the resolved style, never from the authored markup.
//! A node id that no longer resolves makes every operation a no-op.

use poster_core::host::DocumentHost;
use poster_core::id::NodeId;
use poster_core::model::Bounds;
use poster_core::style::{PositionMode, format_px};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest width or height a resize may produce, in logical pixels.
pub const MIN_SIZE: f32 = 20.0;

/// Offset applied to a duplicated element so it does not cover the original.
pub const DUPLICATE_OFFSET: (f32, f32) = (20.0, 20.0);

// ─── Resize handles ──────────────────────────────────────────────────────

/// One of the eight grab points around a selection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Whether dragging this handle moves the left edge.
    pub fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft | Self::Left)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::BottomRight | Self::Right)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight | Self::Top)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomRight | Self::Bottom)
    }

    pub fn affects_width(self) -> bool {
        self.moves_left() || self.moves_right()
    }

    pub fn affects_height(self) -> bool {
        self.moves_top() || self.moves_bottom()
    }

    pub fn is_corner(self) -> bool {
        self.affects_width() && self.affects_height()
    }

    /// New box after dragging this handle by (dx, dy) from `start`.
    ///
    /// Axes the handle does not touch are copied from `start`. Each touched
    /// size is clamped to `min_size`; when a leading edge moves, the
    /// opposite edge stays anchored.
    pub fn apply(self, start: Bounds, dx: f32, dy: f32, min_size: f32) -> Bounds {
        let (x, width) = resize_axis(
            start.x,
            start.width,
            dx,
            self.moves_left(),
            self.moves_right(),
            min_size,
        );
        let (y, height) = resize_axis(
            start.y,
            start.height,
            dy,
            self.moves_top(),
            self.moves_bottom(),
            min_size,
        );
        Bounds::new(x, y, width, height)
    }
}

fn resize_axis(
    origin: f32,
    size: f32,
    delta: f32,
    leading: bool,
    trailing: bool,
    min_size: f32,
) -> (f32, f32) {
    if leading {
        let resized = (size - delta).max(min_size);
        (origin + size - resized, resized)
    } else if trailing {
        (origin, (size + delta).max(min_size))
    } else {
        (origin, size)
    }
}

impl fmt::Display for ResizeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResizeHandle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| format!("unknown resize handle: {s}"))
    }
}

// ─── Z-order ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZOrderAction {
    /// Above every sibling.
    Front,
    /// Below every sibling.
    Back,
    /// One step up.
    Forward,
    /// One step down.
    Backward,
}

impl ZOrderAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

impl fmt::Display for ZOrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZOrderAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front" => Ok(Self::Front),
            "back" => Ok(Self::Back),
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            other => Err(format!("unknown z-order action: {other}")),
        }
    }
}

// ─── Gesture origin ──────────────────────────────────────────────────────

/// Where an element was when a gesture started. Every move event is
/// computed from this, never from the previous event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementOrigin {
    /// Box in logical coordinates.
    pub bounds: Bounds,
    /// Resolved `left` in px.
    pub left: f32,
    /// Resolved `top` in px.
    pub top: f32,
}

impl ElementOrigin {
    pub fn capture<H: DocumentHost>(host: &H, id: NodeId) -> Option<Self> {
        let style = host.computed_style(id)?;
        Some(Self {
            bounds: host.bounds(id)?,
            left: style.px("left"),
            top: style.px("top"),
        })
    }
}

// ─── Operations ──────────────────────────────────────────────────────────

/// Force a static element into `mode` with `left`/`top` reset to zero.
/// Returns true when the element was changed.
pub fn ensure_positioned<H: DocumentHost>(host: &mut H, id: NodeId, mode: PositionMode) -> bool {
    let Some(style) = host.computed_style(id) else {
        return false;
    };
    if style.position().is_positioned() {
        return false;
    }
    host.set_inline_style(id, "position", mode.as_str());
    host.set_inline_style(id, "left", "0px");
    host.set_inline_style(id, "top", "0px");
    log::debug!("{id}: static → {mode}");
    true
}

/// Place the element at `origin + (dx, dy)`, deltas in logical pixels.
pub fn move_element<H: DocumentHost>(
    host: &mut H,
    id: NodeId,
    origin: &ElementOrigin,
    dx: f32,
    dy: f32,
) -> bool {
    if !host.contains(id) {
        return false;
    }
    host.set_inline_style(id, "left", &format_px(origin.left + dx));
    host.set_inline_style(id, "top", &format_px(origin.top + dy))
}

/// Apply a resize to `target`, a box in logical coordinates.
///
/// Only the axes `handle` implies are written. Sizes below `min_size` are
/// clamped with the opposite edge anchored.
pub fn resize_element<H: DocumentHost>(
    host: &mut H,
    id: NodeId,
    handle: ResizeHandle,
    target: Bounds,
    origin: &ElementOrigin,
    min_size: f32,
) -> bool {
    if !host.contains(id) {
        return false;
    }

    if handle.affects_width() {
        let width = target.width.max(min_size);
        if handle.moves_left() {
            let x = target.right() - width;
            let left = origin.left + (x - origin.bounds.x);
            host.set_inline_style(id, "left", &format_px(left));
        }
        host.set_inline_style(id, "width", &format_px(width));
    }
    if handle.affects_height() {
        let height = target.height.max(min_size);
        if handle.moves_top() {
            let y = target.bottom() - height;
            let top = origin.top + (y - origin.bounds.y);
            host.set_inline_style(id, "top", &format_px(top));
        }
        host.set_inline_style(id, "height", &format_px(height));
    }
    true
}

/// Resolved stacking values of every element child of `id`'s parent,
/// `id` included.
fn sibling_z_values<H: DocumentHost>(host: &H, id: NodeId) -> Vec<i32> {
    let Some(parent) = host.parent(id) else {
        return vec![0];
    };
    let values: Vec<i32> = host
        .children(parent)
        .into_iter()
        .filter_map(|sibling| host.computed_style(sibling))
        .map(|style| style.z_index())
        .collect();
    if values.is_empty() { vec![0] } else { values }
}

/// Change the element's stacking value. Returns the value written.
pub fn change_z_order<H: DocumentHost>(
    host: &mut H,
    id: NodeId,
    action: ZOrderAction,
) -> Option<i32> {
    let current = host.computed_style(id)?.z_index();
    ensure_positioned(host, id, PositionMode::Relative);

    let z = match action {
        ZOrderAction::Front => sibling_z_values(host, id)
            .into_iter()
            .max()
            .unwrap_or(0)
            .saturating_add(1),
        ZOrderAction::Back => sibling_z_values(host, id)
            .into_iter()
            .min()
            .unwrap_or(0)
            .saturating_sub(1),
        ZOrderAction::Forward => current.saturating_add(1),
        ZOrderAction::Backward => current.saturating_sub(1),
    };
    host.set_inline_style(id, "z-index", &z.to_string());
    log::debug!("{id}: z-index {current} → {z} ({action})");
    Some(z)
}

/// Write one inline declaration; an empty value removes it.
pub fn set_style<H: DocumentHost>(host: &mut H, id: NodeId, property: &str, value: &str) -> bool {
    host.set_inline_style(id, property, value)
}

/// Deep-copy the element into the same parent, shifted by `offset`.
///
/// Out-of-flow elements keep their mode and get `left`/`top` + offset. Flow
/// elements become absolute at their current box + offset, with the box
/// size pinned, so the copy lands next to the original rather than at the
/// end of the flow.
pub fn duplicate<H: DocumentHost>(host: &mut H, id: NodeId, offset: (f32, f32)) -> Option<NodeId> {
    if !host.is_selectable(id) {
        return None;
    }
    let style = host.computed_style(id)?;
    let parent = host.parent(id)?;
    let copy = host.deep_clone(id)?;

    if style.position().is_out_of_flow() {
        host.set_inline_style(copy, "left", &format_px(style.px("left") + offset.0));
        host.set_inline_style(copy, "top", &format_px(style.px("top") + offset.1));
    } else {
        let bounds = host.bounds(id).unwrap_or_default();
        let container = host.bounds(parent).unwrap_or_default();
        host.set_inline_style(copy, "position", PositionMode::Absolute.as_str());
        host.set_inline_style(copy, "left", &format_px(bounds.x - container.x + offset.0));
        host.set_inline_style(copy, "top", &format_px(bounds.y - container.y + offset.1));
        host.set_inline_style(copy, "width", &format_px(bounds.width));
        host.set_inline_style(copy, "height", &format_px(bounds.height));
    }

    if !host.append_child(parent, copy) {
        host.remove(copy);
        return None;
    }
    log::debug!("{id}: duplicated as {copy}");
    Some(copy)
}

/// Remove the element. The document root, `html` and `body` are refused.
pub fn delete<H: DocumentHost>(host: &mut H, id: NodeId) -> bool {
    if !host.is_selectable(id) {
        return false;
    }
    log::debug!("{id}: deleted");
    host.remove(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use poster_core::document::PosterDocument;
    use poster_core::layout::Viewport;
    use pretty_assertions::assert_eq;

    fn doc(src: &str) -> PosterDocument {
        PosterDocument::from_markup(src, Viewport::default()).unwrap()
    }

    fn id(name: &str) -> NodeId {
        NodeId::intern(name)
    }

    const SIBLINGS: &str = r#"<body><div class="poster-container">
      <div id="z1" style="position: absolute; z-index: 1"></div>
      <div id="z3" style="position: absolute; z-index: 3"></div>
      <div id="z2" style="position: absolute; z-index: 2"></div>
    </div></body>"#;

    // ─── Resize handles ──────────────────────────────────────────────────

    #[test]
    fn bottom_right_grows_size_only() {
        let start = Bounds::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(
            ResizeHandle::BottomRight.apply(start, 30.0, 10.0, MIN_SIZE),
            Bounds::new(0.0, 0.0, 130.0, 60.0)
        );
    }

    #[test]
    fn top_left_moves_origin_and_shrinks() {
        let start = Bounds::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(
            ResizeHandle::TopLeft.apply(start, 30.0, 10.0, MIN_SIZE),
            Bounds::new(30.0, 10.0, 70.0, 40.0)
        );
    }

    #[test]
    fn edge_handles_touch_one_axis() {
        let start = Bounds::new(10.0, 10.0, 100.0, 50.0);
        assert_eq!(
            ResizeHandle::Right.apply(start, 15.0, 99.0, MIN_SIZE),
            Bounds::new(10.0, 10.0, 115.0, 50.0)
        );
        assert_eq!(
            ResizeHandle::Top.apply(start, 99.0, -10.0, MIN_SIZE),
            Bounds::new(10.0, 0.0, 100.0, 60.0)
        );
    }

    #[test]
    fn sizes_clamp_to_floor() {
        let start = Bounds::new(0.0, 0.0, 100.0, 50.0);
        let shrunk = ResizeHandle::BottomRight.apply(start, -500.0, -500.0, MIN_SIZE);
        assert_eq!((shrunk.width, shrunk.height), (20.0, 20.0));

        // Leading edge clamps against the anchored far edge.
        let pushed = ResizeHandle::TopLeft.apply(start, 500.0, 500.0, MIN_SIZE);
        assert_eq!(pushed, Bounds::new(80.0, 30.0, 20.0, 20.0));
    }

    #[test]
    fn handle_names_parse() {
        for handle in ResizeHandle::ALL {
            assert_eq!(handle.as_str().parse::<ResizeHandle>(), Ok(handle));
        }
        assert!("middle".parse::<ResizeHandle>().is_err());
        assert_eq!(
            serde_json::to_string(&ResizeHandle::BottomLeft).unwrap(),
            r#""bottom-left""#
        );
    }

    // ─── Z-order ─────────────────────────────────────────────────────────

    #[test]
    fn front_is_above_every_sibling() {
        let mut doc = doc(SIBLINGS);
        assert_eq!(change_z_order(&mut doc, id("z1"), ZOrderAction::Front), Some(4));
        assert_eq!(doc.inline_style(id("z1"), "z-index").as_deref(), Some("4"));
        // Siblings are re-scanned on every call.
        assert_eq!(change_z_order(&mut doc, id("z2"), ZOrderAction::Front), Some(5));
    }

    #[test]
    fn back_is_below_every_sibling() {
        let mut doc = doc(SIBLINGS);
        assert_eq!(change_z_order(&mut doc, id("z1"), ZOrderAction::Back), Some(0));
        assert_eq!(change_z_order(&mut doc, id("z3"), ZOrderAction::Back), Some(-1));
    }

    #[test]
    fn forward_and_backward_step_by_one() {
        let mut doc = doc(SIBLINGS);
        assert_eq!(change_z_order(&mut doc, id("z3"), ZOrderAction::Forward), Some(4));
        assert_eq!(change_z_order(&mut doc, id("z3"), ZOrderAction::Backward), Some(3));
        assert_eq!(change_z_order(&mut doc, id("z3"), ZOrderAction::Backward), Some(2));
    }

    #[test]
    fn z_order_saturates_at_the_integer_limits() {
        let mut doc = doc(
            r#"<body><div class="poster-container">
              <div id="overlay" style="position: fixed; z-index: 2147483647"></div>
              <div id="under" style="position: absolute; z-index: -2147483648"></div>
              <div id="card" style="position: absolute; z-index: 1"></div>
            </div></body>"#,
        );
        assert_eq!(
            change_z_order(&mut doc, id("card"), ZOrderAction::Front),
            Some(i32::MAX)
        );
        assert_eq!(
            change_z_order(&mut doc, id("overlay"), ZOrderAction::Forward),
            Some(i32::MAX)
        );
        assert_eq!(
            change_z_order(&mut doc, id("card"), ZOrderAction::Back),
            Some(i32::MIN)
        );
        assert_eq!(
            change_z_order(&mut doc, id("under"), ZOrderAction::Backward),
            Some(i32::MIN)
        );
    }

    #[test]
    fn z_order_positions_static_elements() {
        let mut doc = doc(r#"<div id="plain">x</div>"#);
        assert_eq!(
            change_z_order(&mut doc, id("plain"), ZOrderAction::Forward),
            Some(1)
        );
        let style = doc.computed_style(id("plain")).unwrap();
        assert_eq!(style.position(), PositionMode::Relative);
        assert_eq!(style.z_index(), 1);
    }

    #[test]
    fn stylesheet_z_index_is_read() {
        let mut doc = doc(
            r#"<html><head><style>.top { position: absolute; z-index: 7 }</style></head>
            <body><div id="a" class="top"></div><div id="b"></div></body></html>"#,
        );
        assert_eq!(change_z_order(&mut doc, id("b"), ZOrderAction::Front), Some(8));
    }

    #[test]
    fn missing_node_is_a_no_op() {
        let mut doc = doc(SIBLINGS);
        assert_eq!(change_z_order(&mut doc, id("nope"), ZOrderAction::Front), None);
        assert!(!delete(&mut doc, id("nope")));
        assert_eq!(duplicate(&mut doc, id("nope"), DUPLICATE_OFFSET), None);
    }

    // ─── Move and resize ─────────────────────────────────────────────────

    #[test]
    fn first_drag_of_static_element_does_not_jump() {
        let mut doc = doc(
            r#"<body><div style="height: 40px"></div>
            <p id="p" style="height: 30px">text</p></body>"#,
        );
        let p = id("p");
        let before = doc.bounds(p).unwrap();
        assert_eq!(before.y, 40.0);

        assert!(ensure_positioned(&mut doc, p, PositionMode::Relative));
        assert_eq!(doc.bounds(p), Some(before));
        assert!(!ensure_positioned(&mut doc, p, PositionMode::Relative));

        let origin = ElementOrigin::capture(&doc, p).unwrap();
        move_element(&mut doc, p, &origin, 10.0, 5.0);
        let after = doc.bounds(p).unwrap();
        assert_eq!((after.x, after.y), (10.0, 45.0));
    }

    #[test]
    fn moves_are_computed_from_the_origin() {
        let mut doc = doc(r#"<div id="a" style="position: absolute; left: 100px; top: 100px"></div>"#);
        let a = id("a");
        let origin = ElementOrigin::capture(&doc, a).unwrap();
        move_element(&mut doc, a, &origin, 5.0, 5.0);
        move_element(&mut doc, a, &origin, 12.5, -3.0);
        assert_eq!(doc.inline_style(a, "left").as_deref(), Some("112.5px"));
        assert_eq!(doc.inline_style(a, "top").as_deref(), Some("97px"));
    }

    #[test]
    fn resize_writes_only_implied_axes() {
        let mut doc = doc(
            r#"<div id="a" style="position: absolute; left: 0px; top: 0px; width: 100px; height: 50px"></div>"#,
        );
        let a = id("a");
        let origin = ElementOrigin::capture(&doc, a).unwrap();

        let target = ResizeHandle::Right.apply(origin.bounds, 30.0, 10.0, MIN_SIZE);
        resize_element(&mut doc, a, ResizeHandle::Right, target, &origin, MIN_SIZE);
        assert_eq!(doc.bounds(a), Some(Bounds::new(0.0, 0.0, 130.0, 50.0)));
        assert_eq!(doc.inline_style(a, "height").as_deref(), Some("50px"));

        let target = ResizeHandle::TopLeft.apply(origin.bounds, 30.0, 10.0, MIN_SIZE);
        resize_element(&mut doc, a, ResizeHandle::TopLeft, target, &origin, MIN_SIZE);
        assert_eq!(doc.bounds(a), Some(Bounds::new(30.0, 10.0, 70.0, 40.0)));
    }

    #[test]
    fn resize_clamps_unvalidated_targets() {
        let mut doc = doc(
            r#"<div id="a" style="position: absolute; left: 0px; top: 0px; width: 100px; height: 50px"></div>"#,
        );
        let a = id("a");
        let origin = ElementOrigin::capture(&doc, a).unwrap();
        let target = Bounds::new(0.0, 0.0, -40.0, 5.0);
        resize_element(&mut doc, a, ResizeHandle::BottomRight, target, &origin, MIN_SIZE);
        assert_eq!(doc.bounds(a), Some(Bounds::new(0.0, 0.0, 20.0, 20.0)));
    }

    // ─── Duplicate and delete ────────────────────────────────────────────

    #[test]
    fn duplicate_offsets_and_copies_content() {
        let mut doc = doc(
            r#"<body><div class="poster-container">
              <div id="card" style="position: absolute; left: 50px; top: 50px; width: 80px; height: 40px; color: red">
                <span>hello</span>
              </div>
            </div></body>"#,
        );
        let card = id("card");
        let copy = duplicate(&mut doc, card, DUPLICATE_OFFSET).unwrap();
        assert_ne!(copy, card);
        assert_eq!(doc.bounds(copy), Some(Bounds::new(70.0, 70.0, 80.0, 40.0)));
        assert_eq!(doc.inline_style(copy, "color").as_deref(), Some("red"));
        assert_eq!(doc.text_content(copy), doc.text_content(card));
        assert_eq!(doc.parent(copy), doc.parent(card));
        assert_eq!(doc.attribute(copy, "id").as_deref(), Some("card"));
    }

    #[test]
    fn duplicate_keeps_id_selected_rules() {
        let mut doc = doc(
            r#"<html><head><style>#card { position: absolute; left: 50px; top: 50px; background-color: red; color: blue }</style></head>
            <body><div class="poster-container"><div id="card">Card</div></div></body></html>"#,
        );
        let card = id("card");
        let copy = duplicate(&mut doc, card, DUPLICATE_OFFSET).unwrap();
        let style = doc.computed_style(copy).unwrap();
        assert_eq!(style.get("background-color"), "red");
        assert_eq!(style.get("color"), "blue");
        assert_eq!((style.px("left"), style.px("top")), (70.0, 70.0));
        // The authored id still names the original.
        assert_eq!(doc.computed_style(card).unwrap().px("left"), 50.0);
    }

    #[test]
    fn duplicate_of_flow_element_lands_beside_it() {
        let mut doc = doc(r#"<body><div style="height: 40px"></div><p id="p" style="height: 30px">t</p></body>"#);
        let p = id("p");
        let before = doc.bounds(p).unwrap();
        let copy = duplicate(&mut doc, p, DUPLICATE_OFFSET).unwrap();
        assert_eq!(
            doc.bounds(copy),
            Some(Bounds::new(before.x + 20.0, before.y + 20.0, before.width, before.height))
        );
    }

    #[test]
    fn delete_refuses_document_chrome() {
        let mut doc = doc(SIBLINGS);
        let body = doc.body().unwrap();
        assert!(!delete(&mut doc, body));
        assert!(delete(&mut doc, id("z3")));
        assert!(!doc.contains(id("z3")));
    }
}

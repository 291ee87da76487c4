//! Tool system for canvas interactions.
//!
//! Each tool translates pointer events into `ToolAction`s that the session
//! applies against the document. Tools only track pointer state; element
//! origins and history live in the session's `Gesture`.

use crate::input::InputEvent;
use crate::mutate::{ElementOrigin, ResizeHandle};
use poster_core::id::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The active tool determines how input events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Select => "select",
            Self::Pan => "pan",
        })
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "select" => Ok(Self::Select),
            "pan" => Ok(Self::Pan),
            other => Err(format!("unknown tool: {other}")),
        }
    }
}

/// What a tool asks the session to do. Deltas are visual pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolAction {
    Select(NodeId),
    Deselect,
    BeginDrag(NodeId),
    /// Total pointer travel since `BeginDrag`.
    DragTo { dx: f32, dy: f32 },
    EndDrag,
    BeginPan,
    /// Pointer travel since the previous pan event.
    PanBy { dx: f32, dy: f32 },
    EndPan,
}

/// Trait for tools that handle input and produce actions.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an input event. `hit_node` is the selectable element under the
    /// pointer, if any.
    fn handle(&mut self, event: &InputEvent, hit_node: Option<NodeId>) -> Vec<ToolAction>;

    /// Forget any in-progress pointer state.
    fn reset(&mut self);
}

pub fn tool_for(kind: ToolKind) -> Box<dyn Tool> {
    match kind {
        ToolKind::Select => Box::new(SelectTool::new()),
        ToolKind::Pan => Box::new(PanTool::new()),
    }
}

// ─── Select Tool ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SelectTool {
    /// Node being dragged, if the pointer is down on one.
    dragging: Option<NodeId>,
    start_x: f32,
    start_y: f32,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn handle(&mut self, event: &InputEvent, hit_node: Option<NodeId>) -> Vec<ToolAction> {
        match *event {
            InputEvent::PointerDown { x, y } => match hit_node {
                Some(id) => {
                    self.dragging = Some(id);
                    self.start_x = x;
                    self.start_y = y;
                    vec![ToolAction::Select(id), ToolAction::BeginDrag(id)]
                }
                None => {
                    self.dragging = None;
                    vec![ToolAction::Deselect]
                }
            },
            InputEvent::PointerMove { x, y } => {
                if self.dragging.is_none() {
                    return vec![];
                }
                vec![ToolAction::DragTo {
                    dx: x - self.start_x,
                    dy: y - self.start_y,
                }]
            }
            InputEvent::PointerUp { .. } => match self.dragging.take() {
                Some(_) => vec![ToolAction::EndDrag],
                None => vec![],
            },
        }
    }

    fn reset(&mut self) {
        self.dragging = None;
    }
}

// ─── Pan Tool ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct PanTool {
    panning: bool,
    last_x: f32,
    last_y: f32,
}

impl PanTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for PanTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pan
    }

    fn handle(&mut self, event: &InputEvent, _hit_node: Option<NodeId>) -> Vec<ToolAction> {
        match *event {
            InputEvent::PointerDown { x, y } => {
                self.panning = true;
                self.last_x = x;
                self.last_y = y;
                vec![ToolAction::BeginPan]
            }
            InputEvent::PointerMove { x, y } => {
                if !self.panning {
                    return vec![];
                }
                let (dx, dy) = (x - self.last_x, y - self.last_y);
                self.last_x = x;
                self.last_y = y;
                vec![ToolAction::PanBy { dx, dy }]
            }
            InputEvent::PointerUp { .. } => {
                if std::mem::take(&mut self.panning) {
                    vec![ToolAction::EndPan]
                } else {
                    vec![]
                }
            }
        }
    }

    fn reset(&mut self) {
        self.panning = false;
    }
}

// ─── Gesture ─────────────────────────────────────────────────────────────

/// The one gesture in progress. Starting a gesture replaces any other.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging {
        id: NodeId,
        origin: ElementOrigin,
    },
    Resizing {
        id: NodeId,
        handle: ResizeHandle,
        /// Pointer position at grab time, visual coordinates.
        pointer_x: f32,
        pointer_y: f32,
        origin: ElementOrigin,
    },
    Panning,
}

impl Gesture {
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self, Self::Resizing { .. })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Element the gesture acts on.
    pub fn target(&self) -> Option<NodeId> {
        match self {
            Self::Dragging { id, .. } | Self::Resizing { id, .. } => Some(*id),
            Self::Idle | Self::Panning => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn select_tool_drag() {
        let mut tool = SelectTool::new();
        let id = NodeId::intern("box");

        let actions = tool.handle(&InputEvent::PointerDown { x: 10.0, y: 10.0 }, Some(id));
        assert_eq!(actions, vec![ToolAction::Select(id), ToolAction::BeginDrag(id)]);
        assert!(tool.is_dragging());

        tool.handle(&InputEvent::PointerMove { x: 15.0, y: 12.0 }, None);
        // Deltas are totals from the press, not increments.
        let actions = tool.handle(&InputEvent::PointerMove { x: 30.0, y: 25.0 }, None);
        assert_eq!(actions, vec![ToolAction::DragTo { dx: 20.0, dy: 15.0 }]);

        let actions = tool.handle(&InputEvent::PointerUp { x: 30.0, y: 25.0 }, None);
        assert_eq!(actions, vec![ToolAction::EndDrag]);
        assert!(!tool.is_dragging());
    }

    #[test]
    fn select_tool_background_click_deselects() {
        let mut tool = SelectTool::new();
        let actions = tool.handle(&InputEvent::PointerDown { x: 1.0, y: 1.0 }, None);
        assert_eq!(actions, vec![ToolAction::Deselect]);
        assert!(
            tool.handle(&InputEvent::PointerMove { x: 9.0, y: 9.0 }, None)
                .is_empty()
        );
        assert!(tool.handle(&InputEvent::PointerUp { x: 9.0, y: 9.0 }, None).is_empty());
    }

    #[test]
    fn pan_tool_reports_increments() {
        let mut tool = PanTool::new();
        let hit = Some(NodeId::intern("box"));
        assert_eq!(
            tool.handle(&InputEvent::PointerDown { x: 0.0, y: 0.0 }, hit),
            vec![ToolAction::BeginPan]
        );
        tool.handle(&InputEvent::PointerMove { x: 5.0, y: 5.0 }, hit);
        assert_eq!(
            tool.handle(&InputEvent::PointerMove { x: 8.0, y: 4.0 }, hit),
            vec![ToolAction::PanBy { dx: 3.0, dy: -1.0 }]
        );
        assert_eq!(
            tool.handle(&InputEvent::PointerUp { x: 8.0, y: 4.0 }, hit),
            vec![ToolAction::EndPan]
        );
    }

    #[test]
    fn reset_abandons_drag() {
        let mut tool = tool_for(ToolKind::Select);
        tool.handle(&InputEvent::PointerDown { x: 0.0, y: 0.0 }, Some(NodeId::intern("a")));
        tool.reset();
        assert!(tool.handle(&InputEvent::PointerUp { x: 0.0, y: 0.0 }, None).is_empty());
        assert_eq!(tool.kind(), ToolKind::Select);
    }

    #[test]
    fn tool_names_parse() {
        assert_eq!("pan".parse::<ToolKind>(), Ok(ToolKind::Pan));
        assert_eq!(ToolKind::Select.to_string(), "select");
        assert!("pen".parse::<ToolKind>().is_err());
    }
}

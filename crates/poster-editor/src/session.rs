//! Editor session: one open poster.
//!
//! Owns the document host, the history, the selection and the gesture in
//! progress. Every mutation entry point is a no-op returning `None` (or
//! `false`) when nothing is selected. Discrete commands commit a snapshot
//! immediately; continuous style edits are debounced; drags and resizes
//! commit once when they end.

use crate::config::EditorConfig;
use crate::debounce::Debouncer;
use crate::history::{History, Snapshot};
use crate::input::InputEvent;
use crate::layers::{self, LayerItem};
use crate::mutate::{self, ElementOrigin, ResizeHandle, ZOrderAction};
use crate::selection::SelectedElement;
use crate::tools::{Gesture, Tool, ToolAction, ToolKind, tool_for};
use crate::viewport::CanvasTransform;
use poster_core::host::DocumentHost;
use poster_core::id::NodeId;
use poster_core::model::Bounds;
use poster_core::style::{PositionMode, format_px};
use std::time::Instant;

/// Placeholder text of a freshly added text element.
pub const NEW_TEXT: &str = "Double-click to edit";

/// Elements the toolbar can add.
#[derive(Debug, Clone, PartialEq)]
pub enum AddElement {
    Text,
    /// An image with the given source URL.
    Image(String),
    Rectangle,
    Circle,
    Line,
}

impl AddElement {
    fn tag(&self) -> &'static str {
        match self {
            Self::Image(_) => "img",
            _ => "div",
        }
    }

    /// Attributes other than `style`.
    fn attributes(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Text => vec![("data-editable", "true"), ("data-type", "text")],
            Self::Image(src) => vec![("src", src.as_str()), ("data-type", "image")],
            Self::Rectangle => vec![("data-shape", "rectangle")],
            Self::Circle => vec![("data-shape", "circle")],
            Self::Line => vec![("data-shape", "line")],
        }
    }

    /// Declarations after `position`, `left` and `top`.
    fn declarations(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Text => &[
                ("font-size", "24px"),
                ("font-family", "'Inter', sans-serif"),
                ("color", "#000000"),
                ("padding", "8px 16px"),
                ("z-index", "100"),
                ("white-space", "nowrap"),
            ],
            Self::Image(_) => &[("width", "200px"), ("height", "auto"), ("z-index", "99")],
            Self::Rectangle => &[
                ("z-index", "99"),
                ("width", "150px"),
                ("height", "100px"),
                ("background-color", "#8b5cf6"),
            ],
            Self::Circle => &[
                ("z-index", "99"),
                ("width", "120px"),
                ("height", "120px"),
                ("background-color", "#14b8a6"),
                ("border-radius", "50%"),
            ],
            Self::Line => &[
                ("z-index", "99"),
                ("width", "200px"),
                ("height", "4px"),
                ("background-color", "#000000"),
                ("transform-origin", "left center"),
            ],
        }
    }
}

/// One open poster: the document host plus everything the editor keeps
/// about it (history, selection, gesture, canvas transform).
pub struct EditorSession<H: DocumentHost> {
    host: H,
    config: EditorConfig,
    history: History,
    selection: Option<SelectedElement>,
    gesture: Gesture,
    tool: Box<dyn Tool>,
    transform: CanvasTransform,
    debouncer: Debouncer,
    /// Bumped whenever the document is replaced; stale deadlines compare
    /// against it.
    generation: u64,
    /// Element whose text is being edited.
    editing: Option<NodeId>,
    /// Set while a snapshot is being handed back to the host.
    restoring: bool,
}

impl<H: DocumentHost> EditorSession<H> {
    pub fn new(host: H, config: EditorConfig) -> Self {
        Self {
            history: History::new(config.history_capacity),
            transform: CanvasTransform::new(config.zoom),
            debouncer: Debouncer::new(config.debounce()),
            host,
            config,
            selection: None,
            gesture: Gesture::Idle,
            tool: tool_for(ToolKind::Select),
            generation: 0,
            editing: None,
            restoring: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn transform(&self) -> &CanvasTransform {
        &self.transform
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn tool(&self) -> ToolKind {
        self.tool.kind()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_dragging()
    }

    pub fn has_pending_commit(&self) -> bool {
        self.debouncer.is_pending()
    }

    // ─── Document lifecycle ──────────────────────────────────────────────

    /// Replace the document. History restarts with the loaded state.
    pub fn load_document(&mut self, markup: &str) -> Result<(), String> {
        self.debouncer.cancel();
        self.host.load(markup)?;
        self.invalidate();
        let snapshot = self.capture_snapshot();
        self.history.reset(snapshot);
        log::debug!("document loaded (generation {})", self.generation);
        Ok(())
    }

    /// Tear down: nothing pending may fire afterwards.
    pub fn close(&mut self) {
        self.debouncer.cancel();
        self.invalidate();
        self.history.clear();
        log::debug!("session closed");
    }

    /// The document as it would be saved, editor overlay excluded.
    pub fn capture_snapshot(&self) -> Snapshot {
        Snapshot::from(self.host.serialize())
    }

    pub fn export_html(&self) -> String {
        self.host.serialize()
    }

    /// Forget everything tied to the previous document.
    fn invalidate(&mut self) {
        self.generation += 1;
        self.selection = None;
        self.gesture = Gesture::Idle;
        self.editing = None;
        self.tool.reset();
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Push the current document now, superseding any pending commit.
    pub fn commit(&mut self) {
        if self.restoring {
            return;
        }
        self.debouncer.cancel();
        let snapshot = self.capture_snapshot();
        self.history.push(snapshot);
    }

    /// Commit after the quiet period, restarting it if already pending.
    pub fn schedule_commit(&mut self, now: Instant) {
        self.debouncer.schedule(now, self.generation);
    }

    /// Fire a due debounced commit. Returns true if one was pushed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.debouncer.fire_if_due(now, self.generation) {
            return false;
        }
        self.commit();
        true
    }

    /// Step back. A pending debounced commit is discarded, not flushed.
    /// With nothing to undo, or if the host rejects the snapshot, nothing
    /// changes and a pending commit stays scheduled.
    pub fn undo(&mut self) -> Option<Snapshot> {
        if !self.history.can_undo() {
            return None;
        }
        let snapshot = self.history.undo()?;
        if let Err(e) = self.restore(&snapshot) {
            log::warn!("undo failed, staying put: {e}");
            self.history.redo();
            return None;
        }
        Some(snapshot)
    }

    /// Step forward. Same rules as [`EditorSession::undo`].
    pub fn redo(&mut self) -> Option<Snapshot> {
        if !self.history.can_redo() {
            return None;
        }
        let snapshot = self.history.redo()?;
        if let Err(e) = self.restore(&snapshot) {
            log::warn!("redo failed, staying put: {e}");
            self.history.undo();
            return None;
        }
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), String> {
        self.restoring = true;
        let loaded = self.host.load(snapshot.as_str());
        self.restoring = false;
        loaded?;
        self.debouncer.cancel();
        self.invalidate();
        Ok(())
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn selection(&self) -> Option<&SelectedElement> {
        self.selection.as_ref()
    }

    /// Select `id`. Unselectable or stale ids clear the selection.
    pub fn select(&mut self, id: NodeId) -> Option<&SelectedElement> {
        self.selection = SelectedElement::resolve(&self.host, id, &self.transform);
        self.selection.as_ref()
    }

    /// Select whatever is under a visual point; background clears.
    pub fn select_at(&mut self, x: f32, y: f32) -> Option<&SelectedElement> {
        match self.hit(x, y) {
            Some(id) => self.select(id),
            None => {
                self.clear_selection();
                None
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.editing = None;
    }

    /// Re-read the selected element's box and style from the host.
    pub fn refresh_selection(&mut self) -> Option<&SelectedElement> {
        if let Some(id) = self.selected_id() {
            self.selection = SelectedElement::resolve(&self.host, id, &self.transform);
        } else {
            self.selection = None;
        }
        self.selection.as_ref()
    }

    fn selected_id(&self) -> Option<NodeId> {
        self.selection.as_ref().map(|s| s.id)
    }

    fn hit(&self, x: f32, y: f32) -> Option<NodeId> {
        let (lx, ly) = self.transform.to_logical_point(x, y);
        self.host
            .hit_test(lx, ly)
            .filter(|&id| self.host.is_selectable(id))
    }

    // ─── Tools and gestures ──────────────────────────────────────────────

    pub fn set_tool(&mut self, kind: ToolKind) {
        if kind == self.tool.kind() {
            return;
        }
        self.finish_gesture();
        self.tool = tool_for(kind);
        if kind != ToolKind::Select {
            self.clear_selection();
        }
        log::debug!("tool → {kind}");
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.handle_input(InputEvent::PointerDown { x, y });
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.handle_input(InputEvent::PointerMove { x, y });
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        self.handle_input(InputEvent::PointerUp { x, y });
    }

    /// Feed one pointer event (visual coordinates) through the active tool.
    pub fn handle_input(&mut self, event: InputEvent) {
        let hit = if event.is_down() {
            let (x, y) = event.position();
            self.hit(x, y)
        } else {
            None
        };
        if event.is_down() && self.editing.is_some() && hit != self.editing {
            self.editing = None;
        }

        for action in self.tool.handle(&event, hit) {
            self.apply_action(action);
        }
    }

    fn apply_action(&mut self, action: ToolAction) {
        match action {
            ToolAction::Select(id) => {
                self.select(id);
            }
            ToolAction::Deselect => self.clear_selection(),
            ToolAction::BeginDrag(id) => self.begin_drag(id),
            ToolAction::DragTo { dx, dy } => {
                if let Gesture::Dragging { id, origin } = self.gesture {
                    let (dx, dy) = self.transform.scale_delta(dx, dy);
                    mutate::move_element(&mut self.host, id, &origin, dx, dy);
                    log::trace!("drag {id} by ({dx}, {dy})");
                    self.refresh_selection();
                }
            }
            ToolAction::EndDrag => {
                if self.gesture.is_dragging() {
                    self.finish_gesture();
                }
            }
            ToolAction::BeginPan => {
                self.finish_gesture();
                self.gesture = Gesture::Panning;
            }
            ToolAction::PanBy { dx, dy } => self.pan_by(dx, dy),
            ToolAction::EndPan => {
                if self.gesture == Gesture::Panning {
                    self.gesture = Gesture::Idle;
                }
            }
        }
    }

    fn begin_drag(&mut self, id: NodeId) {
        self.finish_gesture();
        mutate::ensure_positioned(&mut self.host, id, PositionMode::Relative);
        let Some(origin) = ElementOrigin::capture(&self.host, id) else {
            return;
        };
        self.gesture = Gesture::Dragging { id, origin };
        self.refresh_selection();
    }

    /// End the current gesture; a drag or resize commits its final state.
    fn finish_gesture(&mut self) {
        match std::mem::take(&mut self.gesture) {
            Gesture::Dragging { id, .. } | Gesture::Resizing { id, .. } => {
                log::debug!("gesture on {id} finished");
                self.commit();
            }
            Gesture::Idle | Gesture::Panning => {}
        }
    }

    /// Grab a resize handle of the selection at a visual point.
    pub fn begin_resize(&mut self, handle: ResizeHandle, x: f32, y: f32) -> bool {
        let Some(id) = self.selected_id() else {
            return false;
        };
        self.finish_gesture();
        mutate::ensure_positioned(&mut self.host, id, PositionMode::Relative);
        let Some(origin) = ElementOrigin::capture(&self.host, id) else {
            return false;
        };
        self.gesture = Gesture::Resizing {
            id,
            handle,
            pointer_x: x,
            pointer_y: y,
            origin,
        };
        true
    }

    /// Drag the grabbed handle to a visual point.
    pub fn resize_to(&mut self, x: f32, y: f32) -> Option<&SelectedElement> {
        let Gesture::Resizing {
            id,
            handle,
            pointer_x,
            pointer_y,
            origin,
        } = self.gesture
        else {
            return None;
        };
        let (dx, dy) = self.transform.scale_delta(x - pointer_x, y - pointer_y);
        let target = handle.apply(origin.bounds, dx, dy, self.config.min_size);
        mutate::resize_element(&mut self.host, id, handle, target, &origin, self.config.min_size);
        log::trace!("resize {id} via {handle} to {target:?}");
        self.refresh_selection()
    }

    pub fn end_resize(&mut self) {
        if self.gesture.is_resizing() {
            self.finish_gesture();
        }
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Nudge the selection by a visual delta.
    pub fn move_by(&mut self, dx: f32, dy: f32) -> Option<&SelectedElement> {
        let id = self.selected_id()?;
        mutate::ensure_positioned(&mut self.host, id, PositionMode::Relative);
        let origin = ElementOrigin::capture(&self.host, id)?;
        let (dx, dy) = self.transform.scale_delta(dx, dy);
        mutate::move_element(&mut self.host, id, &origin, dx, dy);
        self.commit();
        self.refresh_selection()
    }

    /// Resize the selection to a box in visual coordinates.
    pub fn resize(&mut self, handle: ResizeHandle, bounds: Bounds) -> Option<&SelectedElement> {
        let id = self.selected_id()?;
        mutate::ensure_positioned(&mut self.host, id, PositionMode::Relative);
        let origin = ElementOrigin::capture(&self.host, id)?;
        let target = self.transform.to_logical_bounds(bounds);
        mutate::resize_element(&mut self.host, id, handle, target, &origin, self.config.min_size);
        self.commit();
        self.refresh_selection()
    }

    pub fn change_z_order(&mut self, action: ZOrderAction) -> Option<&SelectedElement> {
        let id = self.selected_id()?;
        mutate::change_z_order(&mut self.host, id, action)?;
        self.commit();
        self.refresh_selection()
    }

    /// Set an inline style property; committed after the quiet period.
    pub fn set_style(&mut self, property: &str, value: &str, now: Instant) -> Option<&SelectedElement> {
        let id = self.selected_id()?;
        if !mutate::set_style(&mut self.host, id, property, value) {
            return None;
        }
        self.schedule_commit(now);
        self.refresh_selection()
    }

    /// Opacity in `0.0..=1.0`.
    pub fn set_opacity(&mut self, opacity: f32, now: Instant) -> Option<&SelectedElement> {
        let value = opacity.clamp(0.0, 1.0).to_string();
        self.set_style("opacity", &value, now)
    }

    /// Copy the selection next to itself and select the copy.
    pub fn duplicate(&mut self) -> Option<&SelectedElement> {
        let id = self.selected_id()?;
        let copy = mutate::duplicate(&mut self.host, id, self.config.duplicate_offset)?;
        self.select(copy);
        self.commit();
        self.selection.as_ref()
    }

    /// Remove the selection. Ignored while its text is being edited.
    pub fn delete(&mut self) -> bool {
        let Some(id) = self.selected_id() else {
            return false;
        };
        if self.editing.is_some() {
            return false;
        }
        if self.gesture.target() == Some(id) {
            self.gesture = Gesture::Idle;
        }
        if !mutate::delete(&mut self.host, id) {
            return false;
        }
        self.clear_selection();
        self.commit();
        true
    }

    /// Add a new element centred on the canvas, select it and commit.
    pub fn add_element(&mut self, kind: AddElement) -> Option<&SelectedElement> {
        if matches!(&kind, AddElement::Image(src) if src.is_empty()) {
            return None;
        }
        let container = layers::layer_container(&self.host)?;
        let x = self.config.canvas.width / 2.0 - 50.0;
        let y = self.config.canvas.height / 2.0 - 50.0;

        let id = self.host.create_element(kind.tag());
        for (name, value) in kind.attributes() {
            self.host.set_attribute(id, name, value);
        }
        self.host.set_inline_style(id, "position", PositionMode::Absolute.as_str());
        self.host.set_inline_style(id, "left", &format_px(x));
        self.host.set_inline_style(id, "top", &format_px(y));
        for (property, value) in kind.declarations() {
            self.host.set_inline_style(id, property, value);
        }
        if kind == AddElement::Text {
            self.host.set_text(id, NEW_TEXT);
        }

        if !self.host.append_child(container, id) {
            self.host.remove(id);
            return None;
        }
        log::debug!("added {kind:?} as {id}");
        self.select(id);
        self.commit();
        self.selection.as_ref()
    }

    // ─── Text editing ────────────────────────────────────────────────────

    /// Start editing the selection's text. Shapes and images are refused.
    pub fn begin_text_edit(&mut self) -> bool {
        let Some(id) = self.selected_id() else {
            return false;
        };
        if !self.is_text_editable(id) {
            return false;
        }
        self.finish_gesture();
        self.editing = Some(id);
        true
    }

    fn is_text_editable(&self, id: NodeId) -> bool {
        if self.host.tag_name(id).as_deref() == Some("img") {
            return false;
        }
        let data_type = self.host.attribute(id, "data-type");
        if data_type.as_deref() == Some("text") {
            return true;
        }
        data_type.is_none()
            && self.host.attribute(id, "data-shape").is_none()
            && self
                .host
                .text_content(id)
                .is_some_and(|text| !text.is_empty())
    }

    pub fn is_editing_text(&self) -> bool {
        self.editing.is_some()
    }

    /// Finish editing with the new text and commit.
    pub fn commit_text_edit(&mut self, text: &str) -> Option<&SelectedElement> {
        let id = self.editing.take()?;
        self.host.set_text(id, text);
        self.commit();
        self.refresh_selection()
    }

    /// Leave edit mode without touching the document.
    pub fn cancel_text_edit(&mut self) {
        self.editing = None;
    }

    // ─── Canvas ──────────────────────────────────────────────────────────

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        let zoom = self.transform.set_zoom(zoom);
        self.refresh_selection();
        zoom
    }

    pub fn zoom_in(&mut self) -> f32 {
        let zoom = self.transform.zoom_in();
        self.refresh_selection();
        zoom
    }

    pub fn zoom_out(&mut self) -> f32 {
        let zoom = self.transform.zoom_out();
        self.refresh_selection();
        zoom
    }

    pub fn zoom_to_fit(&mut self) -> f32 {
        let zoom = self.transform.zoom_to_fit();
        self.refresh_selection();
        zoom
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.transform.pan_by(dx, dy);
        self.refresh_selection();
    }

    // ─── Layers ──────────────────────────────────────────────────────────

    pub fn layers(&self) -> Vec<LayerItem> {
        layers::layers(&self.host)
    }

    pub fn move_layer_up(&mut self, id: NodeId) -> bool {
        let changed = layers::move_layer_up(&mut self.host, id);
        self.after_layer_change(changed)
    }

    pub fn move_layer_down(&mut self, id: NodeId) -> bool {
        let changed = layers::move_layer_down(&mut self.host, id);
        self.after_layer_change(changed)
    }

    pub fn toggle_layer_visibility(&mut self, id: NodeId) -> bool {
        let changed = layers::toggle_visibility(&mut self.host, id);
        self.after_layer_change(changed)
    }

    /// Restack layers from a top-first ordering.
    pub fn reorder_layers(&mut self, top_first: &[NodeId]) -> bool {
        let changed = layers::reorder_layers(&mut self.host, top_first);
        self.after_layer_change(changed)
    }

    pub fn delete_layer(&mut self, id: NodeId) -> bool {
        if self.gesture.target() == Some(id) {
            self.gesture = Gesture::Idle;
        }
        let changed = layers::delete_layer(&mut self.host, id);
        self.after_layer_change(changed)
    }

    fn after_layer_change(&mut self, changed: bool) -> bool {
        if changed {
            self.commit();
            self.refresh_selection();
        }
        changed
    }
}

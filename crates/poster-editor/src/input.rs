//! Input abstraction layer.
//!
//! Pointer events in visual (screen) coordinates, as delivered by the host
//! surface. Tools interpret them; the session converts to logical space.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed.
    PointerDown { x: f32, y: f32 },

    /// Pointer moved, pressed or not.
    PointerMove { x: f32, y: f32 },

    /// Pointer released.
    PointerUp { x: f32, y: f32 },
}

impl InputEvent {
    pub fn position(&self) -> (f32, f32) {
        match *self {
            Self::PointerDown { x, y } | Self::PointerMove { x, y } | Self::PointerUp { x, y } => {
                (x, y)
            }
        }
    }

    pub fn is_down(&self) -> bool {
        matches!(self, Self::PointerDown { .. })
    }
}

//! Editor configuration.
//!
//! Every field has a default, so a partial JSON document only overrides
//! what it names.

use crate::history::DEFAULT_CAPACITY;
use crate::mutate::{DUPLICATE_OFFSET, MIN_SIZE};
use crate::viewport::ZoomLimits;
use poster_core::layout::Viewport;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        let viewport = Viewport::default();
        Self {
            width: viewport.width,
            height: viewport.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snapshots kept for undo. Default: **50**.
    pub history_capacity: usize,

    /// Quiet period before a continuous edit is committed. Default: **500**.
    pub debounce_ms: u64,

    /// Resize floor in logical pixels. Default: **20**.
    pub min_size: f32,

    /// Shift applied to duplicates. Default: **(20, 20)**.
    pub duplicate_offset: (f32, f32),

    pub zoom: ZoomLimits,

    pub canvas: CanvasSize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            debounce_ms: 500,
            min_size: MIN_SIZE,
            duplicate_offset: DUPLICATE_OFFSET,
            zoom: ZoomLimits::default(),
            canvas: CanvasSize::default(),
        }
    }
}

impl EditorConfig {
    /// # Errors
    /// Returns a message if the JSON is malformed, a field has the wrong
    /// type, or a value fails [`EditorConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| format!("config parse error: {e}"))?;
        config
            .validate()
            .map_err(|e| format!("config parse error: {e}"))?;
        Ok(config)
    }

    /// Check the values the editor divides by or clamps with.
    pub fn validate(&self) -> Result<(), String> {
        let zoom = &self.zoom;
        if !(zoom.min.is_finite() && zoom.min > 0.0) {
            return Err(format!("zoom.min must be positive, got {}", zoom.min));
        }
        if !(zoom.max.is_finite() && zoom.max >= zoom.min) {
            return Err(format!(
                "zoom.max must be at least zoom.min ({}), got {}",
                zoom.min, zoom.max
            ));
        }
        if !(zoom.fit >= zoom.min && zoom.fit <= zoom.max) {
            return Err(format!(
                "zoom.fit must lie in {}..={}, got {}",
                zoom.min, zoom.max, zoom.fit
            ));
        }
        if !(zoom.step.is_finite() && zoom.step > 0.0) {
            return Err(format!("zoom.step must be positive, got {}", zoom.step));
        }
        if !(self.min_size.is_finite() && self.min_size >= 0.0) {
            return Err(format!("min_size must be non-negative, got {}", self.min_size));
        }
        let (dx, dy) = self.duplicate_offset;
        if !(dx.is_finite() && dy.is_finite()) {
            return Err("duplicate_offset must be finite".to_string());
        }
        let canvas = &self.canvas;
        if !(canvas.width.is_finite() && canvas.width > 0.0)
            || !(canvas.height.is_finite() && canvas.height > 0.0)
        {
            return Err(format!(
                "canvas must have a positive size, got {}x{}",
                canvas.width, canvas.height
            ));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.canvas.width,
            height: self.canvas.height,
        }
    }
}

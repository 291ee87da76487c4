//! Canvas transform: logical document pixels ↔ visual screen pixels.
//!
//! `visual = logical × zoom + pan`. Selection boxes and pointer events live
//! in visual space; every style write happens in logical space.

use poster_core::model::Bounds;
use serde::{Deserialize, Serialize};

/// Zoom limits and step sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    /// Zoom used on load and by "fit".
    pub fit: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 2.0,
            step: 0.1,
            fit: 0.5,
        }
    }
}

impl ZoomLimits {
    pub fn clamp(&self, zoom: f32) -> f32 {
        if zoom.is_finite() {
            // `f32::clamp` panics when min > max.
            zoom.max(self.min).min(self.max)
        } else {
            self.fit
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
    pub limits: ZoomLimits,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self::new(ZoomLimits::default())
    }
}

impl CanvasTransform {
    pub fn new(limits: ZoomLimits) -> Self {
        Self {
            zoom: limits.fit,
            pan_x: 0.0,
            pan_y: 0.0,
            limits,
        }
    }

    pub fn to_visual_point(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.zoom + self.pan_x, y * self.zoom + self.pan_y)
    }

    pub fn to_logical_point(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pan_x) / self.zoom, (y - self.pan_y) / self.zoom)
    }

    pub fn to_visual(&self, b: Bounds) -> Bounds {
        let (x, y) = self.to_visual_point(b.x, b.y);
        Bounds::new(x, y, b.width * self.zoom, b.height * self.zoom)
    }

    pub fn to_logical_bounds(&self, b: Bounds) -> Bounds {
        let (x, y) = self.to_logical_point(b.x, b.y);
        Bounds::new(x, y, b.width / self.zoom, b.height / self.zoom)
    }

    /// Convert a visual delta into logical pixels (pan does not apply).
    pub fn scale_delta(&self, dx: f32, dy: f32) -> (f32, f32) {
        (dx / self.zoom, dy / self.zoom)
    }

    /// Set the zoom, clamped. Returns the value applied.
    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        self.zoom = self.limits.clamp(zoom);
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set_zoom(self.zoom + self.limits.step)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_zoom(self.zoom - self.limits.step)
    }

    /// Back to the fit zoom with no pan.
    pub fn zoom_to_fit(&mut self) -> f32 {
        self.pan_x = 0.0;
        self.pan_y = 0.0;
        self.set_zoom(self.limits.fit)
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }
}

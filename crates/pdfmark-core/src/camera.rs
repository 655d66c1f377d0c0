//! Scroll offset and zoom scale of the page container.

use crate::config::{MAX_SCALE, MIN_SCALE};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Camera over the scrolled page column.
///
/// Content coordinates are container pixels at scale 1. A container point
/// `p` shows content point `(scroll + p) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Scroll offset of the container in logical pixels.
    pub scroll: Vec2,
    /// Current zoom scale.
    pub scale: f64,
    /// Minimum allowed scale.
    pub min_scale: f64,
    /// Maximum allowed scale.
    pub max_scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            scroll: Vec2::ZERO,
            scale: 1.0,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

impl Camera {
    /// Create a camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera with explicit bounds; `scale` is clamped into them.
    pub fn with_bounds(scale: f64, min_scale: f64, max_scale: f64) -> Self {
        Self {
            scroll: Vec2::ZERO,
            scale: scale.clamp(min_scale, max_scale),
            min_scale,
            max_scale,
        }
    }

    /// Clamp a requested scale into range. NaN yields `None`.
    pub fn clamp_scale(&self, scale: f64) -> Option<f64> {
        if scale.is_nan() {
            return None;
        }
        Some(scale.clamp(self.min_scale, self.max_scale))
    }

    /// Convert a container point to content coordinates.
    pub fn container_to_content(&self, point: Point) -> Point {
        Point::new(
            (self.scroll.x + point.x) / self.scale,
            (self.scroll.y + point.y) / self.scale,
        )
    }

    /// Convert a content point to container coordinates.
    pub fn content_to_container(&self, point: Point) -> Point {
        Point::new(
            point.x * self.scale - self.scroll.x,
            point.y * self.scale - self.scroll.y,
        )
    }

    /// Set the scroll offset. Scroll offsets never go negative.
    pub fn scroll_to(&mut self, scroll: Vec2) {
        self.scroll = Vec2::new(scroll.x.max(0.0), scroll.y.max(0.0));
    }

    /// Scroll by a delta in container pixels.
    pub fn scroll_by(&mut self, delta: Vec2) {
        self.scroll_to(self.scroll + delta);
    }

    /// Zoom to `scale`, keeping the content under `focal` (container
    /// coordinates) in place. Returns false when the scale did not change.
    pub fn zoom_to(&mut self, scale: f64, focal: Point) -> bool {
        let Some(new_scale) = self.clamp_scale(scale) else {
            return false;
        };
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return false;
        }

        let ratio = new_scale / self.scale;
        let focal = focal.to_vec2();
        self.scale = new_scale;
        self.scroll_to((self.scroll + focal) * ratio - focal);
        true
    }

    /// Reset scroll and scale.
    pub fn reset(&mut self, scale: f64) {
        self.scroll = Vec2::ZERO;
        self.scale = scale.clamp(self.min_scale, self.max_scale);
    }
}

//! Viewport pan/zoom transform.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Pan and zoom of the canvas view.
///
/// World coordinates map to screen coordinates as `screen = world * zoom + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Horizontal pan in screen pixels.
    pub x: f64,
    /// Vertical pan in screen pixels.
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Finite pan and a positive finite zoom.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.zoom.is_finite() && self.zoom > 0.0
    }

    /// World to screen transform, for renderers.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset()) * Affine::scale(self.zoom)
    }

    /// Screen to world transform, for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset())
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Convert a length in screen pixels to world units.
    pub fn screen_to_world_distance(&self, distance: f64) -> f64 {
        distance / self.zoom
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Zoom by `factor`, keeping `screen_point` fixed. The resulting zoom is
    /// clamped to `[min_zoom, max_zoom]`. Bounds that do not form a positive
    /// range leave the view unchanged.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64, min_zoom: f64, max_zoom: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        if !(min_zoom > 0.0 && min_zoom <= max_zoom) {
            log::warn!("Ignoring zoom with bounds [{}, {}]", min_zoom, max_zoom);
            return;
        }
        let new_zoom = (self.zoom * factor).clamp(min_zoom, max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.screen_to_world(screen_point);
        self.zoom = new_zoom;

        // Shift the pan so world_point stays under the cursor
        let new_screen = self.world_to_screen(world_point);
        self.pan(screen_point - new_screen);
    }

    /// Reset to the identity view.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

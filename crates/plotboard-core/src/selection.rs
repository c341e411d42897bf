//! Resize handles and corner resizing.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Position of this corner on `bounds`.
    pub fn point_on(self, bounds: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(bounds.x0, bounds.y0),
            Corner::TopRight => Point::new(bounds.x1, bounds.y0),
            Corner::BottomLeft => Point::new(bounds.x0, bounds.y1),
            Corner::BottomRight => Point::new(bounds.x1, bounds.y1),
        }
    }
}

/// A resize handle at a corner of the selected element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    pub corner: Corner,
}

impl Handle {
    pub fn new(position: Point, corner: Corner) -> Self {
        Self { position, corner }
    }

    /// Check if a world point hits this handle.
    /// `tolerance` is in world units, already adjusted for zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// The four corner handles of an element's absolute bounds.
pub fn corner_handles(bounds: Rect) -> [Handle; 4] {
    Corner::ALL.map(|corner| Handle::new(corner.point_on(bounds), corner))
}

/// The corner handle under `point`, if any.
pub fn hit_test_handles(bounds: Rect, point: Point, tolerance: f64) -> Option<Corner> {
    corner_handles(bounds)
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.corner)
}

/// Resize `start` by dragging `corner` by `delta`.
///
/// The two edges meeting at the dragged corner move; the opposite corner
/// stays pinned. Width and height never drop below `min_size`.
pub fn apply_corner_resize(start: Rect, corner: Corner, delta: Vec2, min_size: f64) -> Rect {
    let start = start.abs();
    let (mut x0, mut y0, mut x1, mut y1) = (start.x0, start.y0, start.x1, start.y1);
    match corner {
        Corner::TopLeft => {
            x0 = (x0 + delta.x).min(x1 - min_size);
            y0 = (y0 + delta.y).min(y1 - min_size);
        }
        Corner::TopRight => {
            x1 = (x1 + delta.x).max(x0 + min_size);
            y0 = (y0 + delta.y).min(y1 - min_size);
        }
        Corner::BottomLeft => {
            x0 = (x0 + delta.x).min(x1 - min_size);
            y1 = (y1 + delta.y).max(y0 + min_size);
        }
        Corner::BottomRight => {
            x1 = (x1 + delta.x).max(x0 + min_size);
            y1 = (y1 + delta.y).max(y0 + min_size);
        }
    }
    Rect::new(x0, y0, x1, y1)
}

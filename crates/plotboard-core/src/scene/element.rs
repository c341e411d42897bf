//! Scene elements.

use super::ElementStyle;
use crate::blocks::CardTemplate;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random element id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Rectangle,
    Ellipse,
    Diamond,
    Text,
    Freehand,
    /// Groups other elements through PARENT relations.
    Container,
    /// Structured card holding an ordered block list.
    Card,
}

impl ElementKind {
    pub const ALL: [ElementKind; 7] = [
        ElementKind::Rectangle,
        ElementKind::Ellipse,
        ElementKind::Diamond,
        ElementKind::Text,
        ElementKind::Freehand,
        ElementKind::Container,
        ElementKind::Card,
    ];

    pub fn is_container(self) -> bool {
        self == ElementKind::Container
    }

    /// Whether the element carries plain text.
    pub fn holds_text(self) -> bool {
        matches!(
            self,
            ElementKind::Text | ElementKind::Rectangle | ElementKind::Ellipse | ElementKind::Diamond
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Rectangle => "rectangle",
            ElementKind::Ellipse => "ellipse",
            ElementKind::Diamond => "diamond",
            ElementKind::Text => "text",
            ElementKind::Freehand => "freehand",
            ElementKind::Container => "container",
            ElementKind::Card => "card",
        }
    }
}

/// One drawable unit of the scene.
///
/// `x`/`y` are relative to the parent container when the element has one,
/// absolute otherwise. Freehand points are relative to the element origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub z_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ElementStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Card content (cards only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<CardTemplate>,
    /// Stroke path (freehand only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
}

impl Element {
    /// Create an element with a fresh id.
    pub fn new(kind: ElementKind, bounds: Rect) -> Self {
        Self::with_id(ElementId::generate(), kind, bounds)
    }

    pub fn with_id(id: ElementId, kind: ElementKind, bounds: Rect) -> Self {
        let bounds = bounds.abs();
        Self {
            id,
            kind,
            x: bounds.x0,
            y: bounds.y0,
            width: bounds.width(),
            height: bounds.height(),
            z_index: 0,
            style: None,
            text: None,
            template: None,
            points: None,
        }
    }

    /// Create a freehand stroke from absolute points. The element's bounds
    /// enclose the path and the stored points are made origin-relative.
    pub fn freehand(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let bounds = points
            .iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p));
        let origin = bounds.origin().to_vec2();
        let mut element = Self::new(ElementKind::Freehand, bounds);
        element.points = Some(points.iter().map(|p| *p - origin).collect());
        Some(element)
    }

    pub fn with_z_index(mut self, z_index: i64) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_template(mut self, template: CardTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Local position (parent-relative when parented).
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bounds in the element's own coordinate space (parent-relative when parented).
    pub fn local_bounds(&self) -> Rect {
        Rect::from_origin_size(self.position(), self.size())
    }

    /// Replace position and size, rescaling a freehand path to match.
    pub fn set_local_bounds(&mut self, bounds: Rect) {
        let bounds = bounds.abs();
        if let Some(points) = &mut self.points {
            let sx = if self.width > 0.0 { bounds.width() / self.width } else { 1.0 };
            let sy = if self.height > 0.0 { bounds.height() / self.height } else { 1.0 };
            for p in points.iter_mut() {
                p.x *= sx;
                p.y *= sy;
            }
        }
        self.x = bounds.x0;
        self.y = bounds.y0;
        self.width = bounds.width();
        self.height = bounds.height();
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    /// Bytes of inline content (text, card blocks, stroke points) this
    /// element adds to every save.
    pub fn inline_payload_bytes(&self) -> usize {
        let text = self.text.as_ref().map_or(0, String::len);
        let template = self.template.as_ref().map_or(0, CardTemplate::inline_payload_bytes);
        let points = self
            .points
            .as_ref()
            .map_or(0, |p| p.len() * 2 * std::mem::size_of::<f64>());
        text + template + points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_bounds() {
        let element = Element::new(ElementKind::Rectangle, Rect::new(10.0, 20.0, 110.0, 70.0));
        assert!((element.width - 100.0).abs() < f64::EPSILON);
        assert!((element.height - 50.0).abs() < f64::EPSILON);
        assert_eq!(element.local_bounds(), Rect::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn test_freehand_points_are_origin_relative() {
        let element = Element::freehand(&[
            Point::new(50.0, 80.0),
            Point::new(70.0, 60.0),
            Point::new(90.0, 100.0),
        ])
        .unwrap();
        assert_eq!(element.position(), Point::new(50.0, 60.0));
        assert_eq!(element.size(), Size::new(40.0, 40.0));
        let points = element.points.as_ref().unwrap();
        assert_eq!(points[0], Point::new(0.0, 20.0));
        assert_eq!(points[2], Point::new(40.0, 40.0));
        assert!(Element::freehand(&[]).is_none());
    }

    #[test]
    fn test_set_local_bounds_scales_path() {
        let mut element =
            Element::freehand(&[Point::new(0.0, 0.0), Point::new(10.0, 20.0)]).unwrap();
        element.set_local_bounds(Rect::new(5.0, 5.0, 25.0, 15.0));
        let points = element.points.as_ref().unwrap();
        assert_eq!(points[1], Point::new(20.0, 10.0));
        assert_eq!(element.position(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_element_json_shape() {
        let element = Element::with_id(
            ElementId::new("r1"),
            ElementKind::Rectangle,
            Rect::new(0.0, 0.0, 10.0, 10.0),
        )
        .with_z_index(3);
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["id"], "r1");
        assert_eq!(json["kind"], "rectangle");
        assert_eq!(json["zIndex"], 3);
        assert!(json.get("template").is_none());
    }
}

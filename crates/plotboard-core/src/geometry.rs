//! Coordinate-space transforms and drop-target resolution.
//!
//! Element positions are stored relative to their parent container. These
//! functions walk the parent chain of any [`NodeTree`] to move between local
//! and absolute (world) coordinates, and decide which container a dropped
//! element lands in.

use crate::error::{GeometryError, GeometryResult};
use crate::scene::{ElementId, ElementKind};
use kurbo::{Point, Rect};

/// Longest parent chain walked before the data is treated as malformed.
pub const MAX_PARENT_DEPTH: usize = 8;

/// Read access to a tree of positioned nodes.
pub trait NodeTree {
    /// Bounds of a node in its parent's coordinate space.
    fn local_bounds(&self, id: &ElementId) -> Option<Rect>;

    /// The node's parent, if it has one.
    fn parent_of(&self, id: &ElementId) -> Option<&ElementId>;
}

fn local_bounds_of<T: NodeTree + ?Sized>(tree: &T, id: &ElementId) -> GeometryResult<Rect> {
    tree.local_bounds(id)
        .ok_or_else(|| GeometryError::UnknownNode(id.clone()))
}

/// Absolute position of a node: its local position plus the offsets of
/// every ancestor.
pub fn to_absolute_position<T: NodeTree + ?Sized>(tree: &T, id: &ElementId) -> GeometryResult<Point> {
    let mut position = local_bounds_of(tree, id)?.origin();
    let mut current = tree.parent_of(id);
    let mut depth = 0;
    while let Some(parent) = current {
        depth += 1;
        if depth > MAX_PARENT_DEPTH {
            return Err(GeometryError::ChainTooDeep(id.clone()));
        }
        position += local_bounds_of(tree, parent)?.origin().to_vec2();
        current = tree.parent_of(parent);
    }
    Ok(position)
}

/// Absolute bounds of a node.
pub fn node_absolute_bounds<T: NodeTree + ?Sized>(tree: &T, id: &ElementId) -> GeometryResult<Rect> {
    let size = local_bounds_of(tree, id)?.size();
    Ok(Rect::from_origin_size(to_absolute_position(tree, id)?, size))
}

/// Express an absolute point in the coordinate space of `parent`.
/// With no parent the point is already in root space.
pub fn to_parent_relative_position<T: NodeTree + ?Sized>(
    tree: &T,
    absolute: Point,
    parent: Option<&ElementId>,
) -> GeometryResult<Point> {
    match parent {
        Some(parent) => Ok(absolute - to_absolute_position(tree, parent)?.to_vec2()),
        None => Ok(absolute),
    }
}

/// Point containment, inclusive on all four edges.
pub fn is_point_inside_bounds(point: Point, bounds: Rect) -> bool {
    let bounds = bounds.abs();
    point.x >= bounds.x0 && point.x <= bounds.x1 && point.y >= bounds.y0 && point.y <= bounds.y1
}

/// Rectangle overlap. Touching edges count.
pub fn bounds_overlap(a: Rect, b: Rect) -> bool {
    let (a, b) = (a.abs(), b.abs());
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Smallest rectangle enclosing every input, or `None` for no input.
pub fn union_bounds(bounds: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    bounds.into_iter().map(|r| r.abs()).reduce(|acc, r| acc.union(r))
}

/// A node considered during drop resolution, with absolute bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct DropCandidate {
    pub id: ElementId,
    pub kind: ElementKind,
    pub bounds: Rect,
    pub z_index: i64,
}

/// The container a dropped node lands in: the highest-z container (other than
/// the node itself) whose bounds overlap the node's. Later candidates win ties.
/// Containers are never dropped into containers.
pub fn pick_drop_container_for_node<'a>(
    dragged: &DropCandidate,
    candidates: &'a [DropCandidate],
) -> Option<&'a DropCandidate> {
    if dragged.kind.is_container() {
        return None;
    }
    candidates
        .iter()
        .filter(|c| c.kind.is_container() && c.id != dragged.id)
        .filter(|c| bounds_overlap(c.bounds, dragged.bounds))
        .fold(None, |best: Option<&DropCandidate>, c| match best {
            Some(b) if b.z_index > c.z_index => Some(b),
            _ => Some(c),
        })
}

/// Membership is only reconciled when a single element is dropped; a
/// multi-selection keeps its existing parents.
pub fn should_reconcile_container_membership_after_drop(selected: &[ElementId]) -> bool {
    selected.len() == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct TestTree {
        nodes: HashMap<ElementId, (Rect, Option<ElementId>)>,
    }

    impl TestTree {
        fn add(&mut self, id: &str, bounds: Rect, parent: Option<&str>) {
            self.nodes
                .insert(ElementId::new(id), (bounds, parent.map(ElementId::new)));
        }
    }

    impl NodeTree for TestTree {
        fn local_bounds(&self, id: &ElementId) -> Option<Rect> {
            self.nodes.get(id).map(|(b, _)| *b)
        }

        fn parent_of(&self, id: &ElementId) -> Option<&ElementId> {
            self.nodes.get(id).and_then(|(_, p)| p.as_ref())
        }
    }

    fn candidate(id: &str, kind: ElementKind, bounds: Rect, z_index: i64) -> DropCandidate {
        DropCandidate {
            id: ElementId::new(id),
            kind,
            bounds,
            z_index,
        }
    }

    #[test]
    fn test_absolute_position_of_child() {
        let mut tree = TestTree::default();
        tree.add("box", Rect::new(10.0, 20.0, 310.0, 220.0), None);
        tree.add("child", Rect::new(50.0, 40.0, 110.0, 90.0), Some("box"));

        let abs = to_absolute_position(&tree, &ElementId::new("child")).unwrap();
        assert_eq!(abs, Point::new(60.0, 60.0));
        let root = to_absolute_position(&tree, &ElementId::new("box")).unwrap();
        assert_eq!(root, Point::new(10.0, 20.0));

        let bounds = node_absolute_bounds(&tree, &ElementId::new("child")).unwrap();
        assert_eq!(bounds, Rect::new(60.0, 60.0, 120.0, 110.0));
    }

    #[test]
    fn test_relative_round_trip() {
        let mut tree = TestTree::default();
        tree.add("box", Rect::new(-35.5, 12.25, 100.0, 100.0), None);
        let parent = ElementId::new("box");
        let p = Point::new(71.3, -8.9);

        let local = to_parent_relative_position(&tree, p, Some(&parent)).unwrap();
        tree.add("moved", Rect::from_origin_size(local, (10.0, 10.0)), Some("box"));
        let back = to_absolute_position(&tree, &ElementId::new("moved")).unwrap();
        assert!((back.x - p.x).abs() < 1e-9);
        assert!((back.y - p.y).abs() < 1e-9);

        assert_eq!(to_parent_relative_position(&tree, p, None).unwrap(), p);
    }

    #[test]
    fn test_unknown_and_cyclic_nodes() {
        let mut tree = TestTree::default();
        assert!(matches!(
            to_absolute_position(&tree, &ElementId::new("nope")),
            Err(GeometryError::UnknownNode(_))
        ));

        tree.add("a", Rect::new(0.0, 0.0, 1.0, 1.0), Some("b"));
        tree.add("b", Rect::new(0.0, 0.0, 1.0, 1.0), Some("a"));
        assert!(matches!(
            to_absolute_position(&tree, &ElementId::new("a")),
            Err(GeometryError::ChainTooDeep(_))
        ));

        tree.add("orphan", Rect::new(0.0, 0.0, 1.0, 1.0), Some("missing"));
        assert!(matches!(
            to_absolute_position(&tree, &ElementId::new("orphan")),
            Err(GeometryError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_point_inside_inclusive() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert!(is_point_inside_bounds(Point::new(0.0, 0.0), bounds));
        assert!(is_point_inside_bounds(Point::new(100.0, 50.0), bounds));
        assert!(is_point_inside_bounds(Point::new(50.0, 25.0), bounds));
        assert!(!is_point_inside_bounds(Point::new(100.1, 25.0), bounds));
        assert!(!is_point_inside_bounds(Point::new(50.0, -0.1), bounds));
    }

    #[test]
    fn test_overlap_and_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(bounds_overlap(a, Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!bounds_overlap(a, Rect::new(10.5, 0.0, 20.0, 10.0)));
        assert_eq!(
            union_bounds([a, Rect::new(5.0, -5.0, 30.0, 8.0)]),
            Some(Rect::new(0.0, -5.0, 30.0, 10.0))
        );
        assert_eq!(union_bounds(std::iter::empty()), None);
    }

    #[test]
    fn test_pick_highest_z_container() {
        let candidates = vec![
            candidate("A", ElementKind::Container, Rect::new(0.0, 0.0, 320.0, 260.0), 1),
            candidate("B", ElementKind::Container, Rect::new(40.0, 40.0, 300.0, 260.0), 3),
        ];
        let dragged = candidate(
            "r",
            ElementKind::Rectangle,
            Rect::from_origin_size((120.0, 100.0), (60.0, 50.0)),
            5,
        );
        let picked = pick_drop_container_for_node(&dragged, &candidates).unwrap();
        assert_eq!(picked.id.as_str(), "B");
    }

    #[test]
    fn test_pick_tie_and_exclusions() {
        let dragged = candidate("r", ElementKind::Rectangle, Rect::new(0.0, 0.0, 10.0, 10.0), 0);
        let candidates = vec![
            candidate("first", ElementKind::Container, Rect::new(0.0, 0.0, 50.0, 50.0), 2),
            candidate("shape", ElementKind::Rectangle, Rect::new(0.0, 0.0, 50.0, 50.0), 9),
            candidate("second", ElementKind::Container, Rect::new(5.0, 5.0, 50.0, 50.0), 2),
            candidate("far", ElementKind::Container, Rect::new(500.0, 500.0, 600.0, 600.0), 10),
        ];
        let picked = pick_drop_container_for_node(&dragged, &candidates).unwrap();
        assert_eq!(picked.id.as_str(), "second");

        assert!(pick_drop_container_for_node(&dragged, &candidates[3..]).is_none());

        let container = candidate("first", ElementKind::Container, Rect::new(0.0, 0.0, 10.0, 10.0), 0);
        assert!(pick_drop_container_for_node(&container, &candidates).is_none());
    }

    #[test]
    fn test_reconcile_only_single_drop() {
        assert!(should_reconcile_container_membership_after_drop(&[ElementId::new("a")]));
        assert!(!should_reconcile_container_membership_after_drop(&[
            ElementId::new("a"),
            ElementId::new("b"),
        ]));
        assert!(!should_reconcile_container_membership_after_drop(&[]));
    }
}

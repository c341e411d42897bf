//! Interaction state machine states.

use crate::mapper::SceneGraph;
use crate::scene::ElementId;
use crate::selection::Corner;
use kurbo::{Point, Rect};
use std::collections::HashSet;

/// Which interaction is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging,
    Resizing,
    Connecting,
    Panning,
    FreehandDrawing,
    Erasing,
}

/// Rigid-group drag of the selection.
#[derive(Debug)]
pub struct DragState {
    /// World point where the drag started.
    pub start: Point,
    /// Local start position of every moved element.
    pub origins: Vec<(ElementId, Point)>,
    pub moved: bool,
}

impl DragState {
    /// Put every moved element back at its start position.
    pub fn rewind(&self, graph: &mut SceneGraph) {
        for (id, origin) in &self.origins {
            if let Some(element) = graph.element_mut(id) {
                element.set_position(*origin);
            }
        }
    }
}

/// Corner resize of a single element.
#[derive(Debug)]
pub struct ResizeState {
    pub id: ElementId,
    pub corner: Corner,
    pub start: Point,
    /// Local bounds at pointer-down.
    pub start_bounds: Rect,
}

impl ResizeState {
    pub fn rewind(&self, graph: &mut SceneGraph) {
        if let Some(element) = graph.element_mut(&self.id) {
            element.set_local_bounds(self.start_bounds);
        }
    }
}

#[derive(Debug)]
pub struct ConnectState {
    pub source: ElementId,
    /// Transient endpoint following the pointer, in world coordinates.
    pub preview: Point,
}

#[derive(Debug)]
pub struct PanState {
    /// Last pointer position in screen coordinates.
    pub last: Point,
}

#[derive(Debug, Default)]
pub struct FreehandState {
    /// Stroke path in world coordinates.
    pub points: Vec<Point>,
}

#[derive(Debug, Default)]
pub struct EraseState {
    pub marked: Vec<ElementId>,
    seen: HashSet<ElementId>,
}

impl EraseState {
    pub fn mark(&mut self, id: ElementId) {
        if self.seen.insert(id.clone()) {
            self.marked.push(id);
        }
    }
}

/// State of the pointer interaction, with the data each mode needs.
#[derive(Debug, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging(DragState),
    Resizing(ResizeState),
    Connecting(ConnectState),
    Panning(PanState),
    FreehandDrawing(FreehandState),
    Erasing(EraseState),
}

impl InteractionState {
    pub fn mode(&self) -> InteractionMode {
        match self {
            InteractionState::Idle => InteractionMode::Idle,
            InteractionState::Dragging(_) => InteractionMode::Dragging,
            InteractionState::Resizing(_) => InteractionMode::Resizing,
            InteractionState::Connecting(_) => InteractionMode::Connecting,
            InteractionState::Panning(_) => InteractionMode::Panning,
            InteractionState::FreehandDrawing(_) => InteractionMode::FreehandDrawing,
            InteractionState::Erasing(_) => InteractionMode::Erasing,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erase_marks_once() {
        let mut erase = EraseState::default();
        erase.mark(ElementId::new("a"));
        erase.mark(ElementId::new("b"));
        erase.mark(ElementId::new("a"));
        assert_eq!(erase.marked.len(), 2);
        assert_eq!(InteractionState::Erasing(erase).mode(), InteractionMode::Erasing);
    }
}

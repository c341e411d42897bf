//! Bounded snapshot undo/redo.

use crate::mapper::{ExternalLink, SceneGraph};
use std::collections::VecDeque;

/// Whole-scene state restored by undo and redo. The viewport is not part of
/// the history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub graph: SceneGraph,
    pub external_links: Vec<ExternalLink>,
}

/// Undo and redo stacks of committed states.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record the state a commit replaced. Clears the redo stack and drops
    /// the oldest entry beyond the limit.
    pub fn push(&mut self, before: Snapshot) {
        self.undo_stack.push_back(before);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
    }

    /// Step back. `current` moves to the redo stack; returns the state to restore.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Step forward. `current` moves to the undo stack; returns the state to restore.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ElementId;

    fn snapshot(links: usize) -> Snapshot {
        Snapshot {
            graph: SceneGraph::new(),
            external_links: (0..links)
                .map(|i| ExternalLink::new(ElementId::new("e"), format!("T-{i}")))
                .collect(),
        }
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::new(10);
        assert!(!history.can_undo());

        history.push(snapshot(0));
        let restored = history.undo(snapshot(1)).unwrap();
        assert_eq!(restored.external_links.len(), 0);
        assert!(history.can_redo());

        let redone = history.redo(snapshot(0)).unwrap();
        assert_eq!(redone.external_links.len(), 1);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = History::new(10);
        history.push(snapshot(0));
        history.undo(snapshot(1));
        history.push(snapshot(0));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_bounded() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.push(snapshot(i));
        }
        assert_eq!(history.undo_len(), 3);
        // Oldest two were dropped.
        let mut oldest = None;
        while let Some(s) = history.undo(snapshot(99)) {
            oldest = Some(s);
        }
        assert_eq!(oldest.unwrap().external_links.len(), 2);
    }
}

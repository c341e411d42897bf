//! Editing session: the live scene, its history and the commit boundary.

use super::history::{History, Snapshot};
use crate::mapper::{ExternalLink, MappedScene, SceneGraph, build_scene, map_scene_to_state};
use crate::scene::Scene;
use crate::storage::CommitSink;
use crate::viewport::Viewport;
use std::rc::Rc;

/// Live scene state of one canvas.
pub struct Session {
    pub graph: SceneGraph,
    pub external_links: Vec<ExternalLink>,
    pub viewport: Viewport,
    history: History,
    dirty: bool,
    sink: Option<Rc<dyn CommitSink>>,
    max_inline_payload_bytes: usize,
    last_generation: Option<u64>,
}

impl Session {
    pub fn new(history_limit: usize, max_inline_payload_bytes: usize) -> Self {
        Self {
            graph: SceneGraph::new(),
            external_links: Vec::new(),
            viewport: Viewport::default(),
            history: History::new(history_limit),
            dirty: false,
            sink: None,
            max_inline_payload_bytes,
            last_generation: None,
        }
    }

    pub fn set_sink(&mut self, sink: Option<Rc<dyn CommitSink>>) {
        self.sink = sink;
    }

    /// Replace the live state with a freshly mapped scene and forget history.
    pub fn load(&mut self, scene: &Scene) {
        let MappedScene {
            graph,
            external_links,
            viewport,
        } = map_scene_to_state(scene);
        self.graph = graph;
        self.external_links = external_links;
        self.viewport = viewport;
        self.history.clear();
        self.dirty = false;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            graph: self.graph.clone(),
            external_links: self.external_links.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.graph = snapshot.graph;
        self.external_links = snapshot.external_links;
    }

    /// Persisted form of the live state.
    pub fn scene(&self) -> Scene {
        build_scene(&self.graph, &self.external_links, self.viewport)
    }

    /// Commit boundary: record `before` for undo, then publish.
    pub fn commit(&mut self, before: Snapshot) {
        self.history.push(before);
        self.publish();
    }

    /// Hand the current scene to the sink without touching history.
    pub fn publish(&mut self) {
        self.dirty = true;
        let scene = self.scene();
        let payload = scene.inline_payload_bytes();
        if payload > self.max_inline_payload_bytes {
            log::warn!(
                "Scene inline payload is {} bytes, above the {} byte bound",
                payload,
                self.max_inline_payload_bytes
            );
        }
        if let Some(sink) = &self.sink {
            let generation = sink.submit(scene);
            log::debug!("Committed scene generation {}", generation);
            self.last_generation = Some(generation);
        }
    }

    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                self.publish();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                self.publish();
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Whether anything was committed since load or the last [`Session::mark_clean`].
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Generation returned by the sink for the latest commit.
    pub fn last_generation(&self) -> Option<u64> {
        self.last_generation
    }
}

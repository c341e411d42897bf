//! Interaction controller: the tool-driven pointer state machine over a live
//! editing session.
//!
//! Pointer positions come in screen coordinates and are mapped through the
//! session viewport. Every completed edit is a commit: the state it replaced
//! goes onto the undo stack and the rebuilt scene is handed to the commit
//! sink. Drag and resize capture their undo state at pointer-down so that
//! pointer-move only touches the elements being moved.

mod capture;
mod history;
mod session;
mod state;

pub use capture::{CaptureGuard, CaptureHost};
pub use history::{History, Snapshot};
pub use session::Session;
pub use state::{InteractionMode, InteractionState};

use crate::blocks::{
    BlockId, BlockKind, CardTemplate, create_block, ensure_template, insert_block, move_by_id,
    move_by_index, remove_block, required_body_block_id,
};
use crate::config::EngineConfig;
use crate::error::{EditError, EditResult, OrderingError, OrderingResult};
use crate::geometry::{
    NodeTree, pick_drop_container_for_node, should_reconcile_container_membership_after_drop,
    union_bounds,
};
use crate::input::{Modifiers, MouseButton, PointerEvent};
use crate::mapper::{Connector, ExternalLink, SceneGraph};
use crate::scene::{Element, ElementId, ElementKind, Scene};
use crate::selection::{apply_corner_resize, hit_test_handles};
use crate::storage::CommitSink;
use crate::tools::{ToolKind, ToolManager};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Vec2};
use state::{ConnectState, DragState, EraseState, FreehandState, PanState, ResizeState};
use std::collections::HashSet;
use std::rc::Rc;

/// Zoom factor applied per wheel notch.
const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Stateful editing layer for one canvas.
pub struct InteractionController {
    config: EngineConfig,
    session: Session,
    tools: ToolManager,
    selection: Vec<ElementId>,
    state: InteractionState,
    capture_host: Option<Rc<dyn CaptureHost>>,
    capture: Option<CaptureGuard>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl InteractionController {
    pub fn new(config: EngineConfig) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("{e}");
        }
        let session = Session::new(config.history_limit, config.max_inline_payload_bytes);
        Self {
            config,
            session,
            tools: ToolManager::new(),
            selection: Vec::new(),
            state: InteractionState::Idle,
            capture_host: None,
            capture: None,
        }
    }

    /// Route committed scenes to `sink`.
    pub fn set_commit_sink(&mut self, sink: Option<Rc<dyn CommitSink>>) {
        self.session.set_sink(sink);
    }

    pub fn set_capture_host(&mut self, host: Option<Rc<dyn CaptureHost>>) {
        self.capture_host = host;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.session.graph
    }

    pub fn external_links(&self) -> &[ExternalLink] {
        &self.session.external_links
    }

    pub fn viewport(&self) -> Viewport {
        self.session.viewport
    }

    pub fn selection(&self) -> &[ElementId] {
        &self.selection
    }

    pub fn mode(&self) -> InteractionMode {
        self.state.mode()
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    pub fn tools_mut(&mut self) -> &mut ToolManager {
        &mut self.tools
    }

    /// Switch tools, abandoning any interaction in progress.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if !self.state.is_idle() {
            self.cancel();
        }
        self.tools.set_tool(tool);
    }

    /// Source and transient endpoint of the connector being drawn.
    pub fn connector_preview(&self) -> Option<(&ElementId, Point)> {
        match &self.state {
            InteractionState::Connecting(c) => Some((&c.source, c.preview)),
            _ => None,
        }
    }

    /// World-space path of the stroke being drawn.
    pub fn freehand_preview(&self) -> Option<&[Point]> {
        match &self.state {
            InteractionState::FreehandDrawing(f) => Some(&f.points),
            _ => None,
        }
    }

    /// Elements marked by the eraser so far.
    pub fn erase_preview(&self) -> Option<&[ElementId]> {
        match &self.state {
            InteractionState::Erasing(e) => Some(&e.marked),
            _ => None,
        }
    }

    // --- Loading -----------------------------------------------------------

    /// Replace the session with `scene`. History and selection are reset.
    pub fn load(&mut self, scene: &Scene) {
        self.cancel();
        self.session.load(scene);
        self.selection.clear();
        log::debug!(
            "Loaded scene with {} elements and {} links",
            self.session.graph.len(),
            self.session.external_links.len()
        );
    }

    /// Load persisted JSON, falling back to an empty scene when it is invalid.
    pub fn load_json(&mut self, json: &str) {
        self.load(&Scene::load_or_default(json));
    }

    /// Persisted form of the current state.
    pub fn scene(&self) -> Scene {
        self.session.scene()
    }

    // --- Pointer state machine ---------------------------------------------

    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        match *event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => self.pointer_down(position, button, modifiers),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position, button } => self.pointer_up(position, button),
            PointerEvent::Scroll { position, delta } => {
                if delta.y > 0.0 {
                    self.zoom_at(position, 1.0 / WHEEL_ZOOM_STEP);
                } else if delta.y < 0.0 {
                    self.zoom_at(position, WHEEL_ZOOM_STEP);
                }
            }
        }
    }

    pub fn pointer_down(&mut self, screen: Point, button: MouseButton, modifiers: Modifiers) {
        if !self.state.is_idle() {
            log::trace!("Ignoring pointer-down while {:?}", self.state.mode());
            return;
        }
        match button {
            MouseButton::Left => {}
            MouseButton::Middle => {
                self.enter(InteractionState::Panning(PanState { last: screen }));
                return;
            }
            MouseButton::Right => return,
        }

        let world = self.session.viewport.screen_to_world(screen);
        match self.tools.current_tool {
            ToolKind::Select => self.select_down(world, modifiers),
            ToolKind::Pan => self.enter(InteractionState::Panning(PanState { last: screen })),
            ToolKind::Connector => {
                if let Some(source) = self.session.graph.hit_test(world) {
                    self.enter(InteractionState::Connecting(ConnectState {
                        source,
                        preview: world,
                    }));
                }
            }
            ToolKind::Freehand => self.enter(InteractionState::FreehandDrawing(FreehandState {
                points: vec![world],
            })),
            ToolKind::Eraser => {
                let mut erase = EraseState::default();
                for id in self.session.graph.nodes_at(world) {
                    erase.mark(id);
                }
                self.enter(InteractionState::Erasing(erase));
            }
            placement => {
                if let Some(kind) = placement.placement_kind() {
                    self.place_element(kind, world);
                }
            }
        }
    }

    pub fn pointer_move(&mut self, screen: Point) {
        let world = self.session.viewport.screen_to_world(screen);
        match &mut self.state {
            InteractionState::Idle => {}
            InteractionState::Dragging(drag) => {
                let delta = world - drag.start;
                for (id, origin) in &drag.origins {
                    if let Some(element) = self.session.graph.element_mut(id) {
                        element.set_position(*origin + delta);
                    }
                }
                drag.moved |= delta != Vec2::ZERO;
            }
            InteractionState::Resizing(resize) => {
                let bounds = apply_corner_resize(
                    resize.start_bounds,
                    resize.corner,
                    world - resize.start,
                    self.config.min_element_size,
                );
                if let Some(element) = self.session.graph.element_mut(&resize.id) {
                    element.set_local_bounds(bounds);
                }
            }
            InteractionState::Connecting(connect) => connect.preview = world,
            InteractionState::Panning(pan) => {
                self.session.viewport.pan(screen - pan.last);
                pan.last = screen;
            }
            InteractionState::FreehandDrawing(stroke) => {
                if stroke.points.last() != Some(&world) {
                    stroke.points.push(world);
                }
            }
            InteractionState::Erasing(erase) => {
                for id in self.session.graph.nodes_at(world) {
                    erase.mark(id);
                }
            }
        }
    }

    pub fn pointer_up(&mut self, screen: Point, _button: MouseButton) {
        let world = self.session.viewport.screen_to_world(screen);
        let state = std::mem::take(&mut self.state);
        self.capture = None;

        match state {
            InteractionState::Idle => {}
            InteractionState::Dragging(drag) => self.finish_drag(drag),
            InteractionState::Resizing(resize) => {
                let changed = self
                    .session
                    .graph
                    .element(&resize.id)
                    .is_some_and(|e| e.local_bounds() != resize.start_bounds);
                if changed {
                    let mut before = self.session.snapshot();
                    resize.rewind(&mut before.graph);
                    self.session.commit(before);
                }
            }
            InteractionState::Connecting(connect) => self.finish_connect(connect, world),
            InteractionState::Panning(_) => self.session.publish(),
            InteractionState::FreehandDrawing(mut stroke) => {
                if stroke.points.last() != Some(&world) {
                    stroke.points.push(world);
                }
                self.finish_stroke(&stroke.points);
            }
            InteractionState::Erasing(erase) => {
                if !erase.marked.is_empty() {
                    let before = self.session.snapshot();
                    self.remove_with_cascade(&erase.marked);
                    self.session.commit(before);
                }
            }
        }
    }

    /// Abandon the interaction in progress and return to idle. Drags and
    /// resizes are rolled back.
    pub fn cancel(&mut self) {
        let state = std::mem::take(&mut self.state);
        self.capture = None;
        match state {
            InteractionState::Dragging(drag) => drag.rewind(&mut self.session.graph),
            InteractionState::Resizing(resize) => resize.rewind(&mut self.session.graph),
            InteractionState::Idle
            | InteractionState::Connecting(_)
            | InteractionState::Panning(_)
            | InteractionState::FreehandDrawing(_)
            | InteractionState::Erasing(_) => {}
        }
    }

    fn enter(&mut self, state: InteractionState) {
        log::debug!("{:?} -> {:?}", self.state.mode(), state.mode());
        self.state = state;
        if self.capture.is_none() {
            self.capture = self.capture_host.clone().map(CaptureGuard::acquire);
        }
    }

    fn select_down(&mut self, world: Point, modifiers: Modifiers) {
        let single = match self.selection.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        if let Some(id) = single {
            let tolerance = self
                .session
                .viewport
                .screen_to_world_distance(self.config.handle_tolerance);
            let corner = self
                .session
                .graph
                .absolute_bounds(&id)
                .ok()
                .and_then(|bounds| hit_test_handles(bounds, world, tolerance));
            let start_bounds = self.session.graph.element(&id).map(Element::local_bounds);
            if let (Some(corner), Some(start_bounds)) = (corner, start_bounds) {
                self.enter(InteractionState::Resizing(ResizeState {
                    id,
                    corner,
                    start: world,
                    start_bounds,
                }));
                return;
            }
        }

        let Some(hit) = self.session.graph.hit_test(world) else {
            if !modifiers.shift {
                self.selection.clear();
            }
            return;
        };

        if modifiers.shift {
            if let Some(pos) = self.selection.iter().position(|s| s == &hit) {
                self.selection.remove(pos);
                return;
            }
            self.selection.push(hit);
        } else if !self.selection.contains(&hit) {
            self.selection = vec![hit];
        }
        self.begin_drag(world);
    }

    fn begin_drag(&mut self, world: Point) {
        let graph = &self.session.graph;
        let selected: HashSet<&ElementId> = self.selection.iter().collect();
        let origins: Vec<(ElementId, Point)> = self
            .selection
            .iter()
            .filter(|id| !graph.parent_of(id).is_some_and(|p| selected.contains(p)))
            .filter_map(|id| graph.element(id).map(|e| (id.clone(), e.position())))
            .collect();
        self.enter(InteractionState::Dragging(DragState {
            start: world,
            origins,
            moved: false,
        }));
    }

    fn finish_drag(&mut self, drag: DragState) {
        if !drag.moved {
            return;
        }
        // The undo state is the current one with the moved elements put back,
        // taken before membership changes.
        let mut before = self.session.snapshot();
        drag.rewind(&mut before.graph);
        let moved: Vec<ElementId> = drag.origins.into_iter().map(|(id, _)| id).collect();
        if should_reconcile_container_membership_after_drop(&moved) {
            self.reconcile_membership(&moved[0]);
        }
        self.session.commit(before);
    }

    /// Parent a dropped element into the container under it, or detach it to
    /// the root when no container overlaps. Its absolute position is kept.
    fn reconcile_membership(&mut self, id: &ElementId) {
        let graph = &self.session.graph;
        let Ok(dragged) = graph.drop_candidate(id) else {
            return;
        };
        if dragged.kind.is_container() {
            return;
        }
        let candidates = graph.container_candidates();
        let target = pick_drop_container_for_node(&dragged, &candidates).map(|c| c.id.clone());
        if graph.parent_of(id) == target.as_ref() {
            return;
        }
        log::debug!("Moving {} into {:?}", id, target);
        if let Err(e) = self.session.graph.reparent(id, target.as_ref()) {
            log::warn!("Could not reconcile membership of {}: {}", id, e);
        }
    }

    fn finish_connect(&mut self, connect: ConnectState, world: Point) {
        match self.session.graph.hit_test(world) {
            Some(target) if target != connect.source => {
                let before = self.session.snapshot();
                self.session
                    .graph
                    .add_connector(Connector::new(connect.source, target));
                self.session.commit(before);
            }
            Some(_) => log::debug!("Rejected self-connection on {}", connect.source),
            None => {}
        }
    }

    fn finish_stroke(&mut self, points: &[Point]) {
        if points.len() < 2 {
            return;
        }
        let Some(element) = Element::freehand(points) else {
            return;
        };
        let before = self.session.snapshot();
        let z_index = self.next_z_index();
        let mut element = element.with_z_index(z_index);
        element.style = self.tools.style_for_new_element();
        self.session.graph.insert(element, None);
        self.session.commit(before);
    }

    fn place_element(&mut self, kind: ElementKind, world: Point) {
        let Some(size) = self.config.default_sizes.for_kind(kind) else {
            return;
        };
        let before = self.session.snapshot();
        let z_index = self.next_z_index();
        let mut element = Element::new(kind, Rect::from_center_size(world, size)).with_z_index(z_index);
        element.style = self.tools.style_for_new_element();
        match kind {
            ElementKind::Card => element.template = Some(CardTemplate::starter(BlockId::generate)),
            ElementKind::Text => element.text = Some(String::new()),
            _ => {}
        }
        let id = element.id.clone();
        self.session.graph.insert(element, None);
        if !kind.is_container() {
            self.reconcile_membership(&id);
        }
        log::debug!("Placed {} {}", kind.name(), id);
        self.selection = vec![id];
        self.tools.revert_to_select();
        self.session.commit(before);
    }

    fn next_z_index(&self) -> i64 {
        self.session.graph.max_z_index().map_or(0, |z| z + 1)
    }

    // --- Selection ---------------------------------------------------------

    pub fn select(&mut self, id: &ElementId) {
        if self.session.graph.contains(id) {
            self.selection = vec![id.clone()];
        }
    }

    pub fn add_to_selection(&mut self, id: &ElementId) {
        if self.session.graph.contains(id) && !self.selection.contains(id) {
            self.selection.push(id.clone());
        }
    }

    pub fn select_all(&mut self) {
        self.selection = self.session.graph.ids().cloned().collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.selection.contains(id)
    }

    // --- Structural edits --------------------------------------------------

    /// Group the selected non-container elements into a new container whose
    /// bounds are their padded union. Needs at least two elements.
    pub fn group_selected(&mut self) -> Option<ElementId> {
        let graph = &self.session.graph;
        let members: Vec<ElementId> = self
            .selection
            .iter()
            .filter(|id| graph.element(id).is_some_and(|e| !e.is_container()))
            .cloned()
            .collect();
        if members.len() < 2 {
            return None;
        }
        let union = union_bounds(members.iter().filter_map(|id| graph.absolute_bounds(id).ok()))?;
        let padding = self.config.group_padding;
        let min_z = members
            .iter()
            .filter_map(|id| graph.element(id).map(|e| e.z_index))
            .min()
            .unwrap_or(0);

        let before = self.session.snapshot();
        let container = Element::new(ElementKind::Container, union.inflate(padding, padding))
            .with_z_index(min_z - 1);
        let container_id = container.id.clone();
        self.session.graph.insert(container, None);
        for id in &members {
            if let Err(e) = self.session.graph.reparent(id, Some(&container_id)) {
                log::warn!("Could not group {}: {}", id, e);
            }
        }
        log::debug!("Grouped {} elements into {}", members.len(), container_id);
        self.selection = vec![container_id.clone()];
        self.session.commit(before);
        Some(container_id)
    }

    /// Remove the selected containers, returning their children to the root
    /// at unchanged absolute positions. Returns the freed children.
    pub fn ungroup_selected(&mut self) -> Vec<ElementId> {
        let containers: Vec<ElementId> = self
            .selection
            .iter()
            .filter(|id| self.session.graph.element(id).is_some_and(Element::is_container))
            .cloned()
            .collect();
        if containers.is_empty() {
            return Vec::new();
        }

        let before = self.session.snapshot();
        let children: Vec<ElementId> = containers
            .iter()
            .flat_map(|c| self.session.graph.children_of(c))
            .collect();
        self.remove_with_cascade(&containers);
        self.selection = children.clone();
        self.session.commit(before);
        children
    }

    /// Delete the selection. See [`InteractionController::delete_elements`].
    pub fn delete_selected(&mut self) -> Vec<ElementId> {
        let ids = self.selection.clone();
        self.delete_elements(&ids)
    }

    /// Delete elements along with every relation naming them. Children of a
    /// deleted container move to the root. Returns the ids actually removed.
    pub fn delete_elements(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        if !ids.iter().any(|id| self.session.graph.contains(id)) {
            return Vec::new();
        }
        let before = self.session.snapshot();
        let removed = self.remove_with_cascade(ids);
        self.session.commit(before);
        removed
    }

    fn remove_with_cascade(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let removed = self.session.graph.remove_cascade(ids);
        let gone: HashSet<&ElementId> = removed.iter().collect();
        self.session
            .external_links
            .retain(|l| !gone.contains(&l.element_id));
        self.selection.retain(|id| !gone.contains(id));
        log::debug!("Removed {} elements", removed.len());
        removed
    }

    /// Raise the selection above every other element, keeping its relative order.
    pub fn bring_to_front(&mut self) {
        let Some(top) = self.session.graph.max_z_index() else {
            return;
        };
        let ordered = self.selection_by_z();
        if ordered.is_empty() {
            return;
        }
        let before = self.session.snapshot();
        for (i, id) in ordered.iter().enumerate() {
            if let Some(element) = self.session.graph.element_mut(id) {
                element.z_index = top + 1 + i as i64;
            }
        }
        self.session.commit(before);
    }

    /// Lower the selection below every other element, keeping its relative order.
    pub fn send_to_back(&mut self) {
        let Some(bottom) = self.session.graph.min_z_index() else {
            return;
        };
        let ordered = self.selection_by_z();
        if ordered.is_empty() {
            return;
        }
        let before = self.session.snapshot();
        let count = ordered.len() as i64;
        for (i, id) in ordered.iter().enumerate() {
            if let Some(element) = self.session.graph.element_mut(id) {
                element.z_index = bottom - count + i as i64;
            }
        }
        self.session.commit(before);
    }

    fn selection_by_z(&self) -> Vec<ElementId> {
        let mut ordered: Vec<(i64, ElementId)> = self
            .selection
            .iter()
            .filter_map(|id| self.session.graph.element(id).map(|e| (e.z_index, id.clone())))
            .collect();
        ordered.sort_by_key(|(z, _)| *z);
        ordered.into_iter().map(|(_, id)| id).collect()
    }

    // --- Content edits -----------------------------------------------------

    /// Replace the plain text of a text-bearing element.
    pub fn set_text(&mut self, id: &ElementId, text: impl Into<String>) -> EditResult<()> {
        let element = self
            .session
            .graph
            .element(id)
            .ok_or_else(|| EditError::UnknownElement(id.clone()))?;
        if !element.kind.holds_text() {
            return Err(EditError::NotText(id.clone()));
        }
        let before = self.session.snapshot();
        if let Some(element) = self.session.graph.element_mut(id) {
            element.text = Some(text.into());
        }
        self.session.commit(before);
        Ok(())
    }

    /// Apply `edit` to a copy of a card's template. On success the result is
    /// normalized and committed; on failure the card is left untouched.
    pub fn update_card_template<T>(
        &mut self,
        id: &ElementId,
        edit: impl FnOnce(&mut CardTemplate) -> OrderingResult<T>,
    ) -> EditResult<T> {
        let element = self
            .session
            .graph
            .element(id)
            .ok_or_else(|| EditError::UnknownElement(id.clone()))?;
        if element.kind != ElementKind::Card {
            return Err(EditError::NotACard(id.clone()));
        }
        let mut template = element.template.clone().unwrap_or_default();
        let result = edit(&mut template)?;

        let before = self.session.snapshot();
        if let Some(element) = self.session.graph.element_mut(id) {
            element.template = Some(ensure_template(template));
        }
        self.session.commit(before);
        Ok(result)
    }

    pub fn move_block(&mut self, card: &ElementId, from: usize, to: usize) -> EditResult<()> {
        self.update_card_template(card, |t| move_by_index(&mut t.blocks, from, to))
    }

    pub fn move_block_by_id(
        &mut self,
        card: &ElementId,
        source: &BlockId,
        target: &BlockId,
    ) -> EditResult<()> {
        self.update_card_template(card, |t| move_by_id(&mut t.blocks, source, target))
    }

    /// Insert a new block of `kind` at `index` (clamped). Returns its id.
    pub fn add_block(&mut self, card: &ElementId, kind: BlockKind, index: usize) -> EditResult<BlockId> {
        self.update_card_template(card, |t| {
            let block = create_block(kind, BlockId::generate, 0);
            let id = block.id.clone();
            insert_block(&mut t.blocks, block, index);
            Ok(id)
        })
    }

    pub fn remove_block(&mut self, card: &ElementId, block: &BlockId) -> EditResult<()> {
        self.update_card_template(card, |t| remove_block(&mut t.blocks, block).map(|_| ()))
    }

    pub fn set_block_text(
        &mut self,
        card: &ElementId,
        block: &BlockId,
        text: impl Into<String>,
    ) -> EditResult<()> {
        let text = text.into();
        self.update_card_template(card, |t| {
            let target = t
                .block_mut(block)
                .ok_or_else(|| OrderingError::UnknownBlock(block.clone()))?;
            target.text = text;
            Ok(())
        })
    }

    pub fn set_card_subject(&mut self, card: &ElementId, subject: impl Into<String>) -> EditResult<()> {
        let subject = subject.into();
        self.update_card_template(card, |t| {
            t.subject = subject;
            Ok(())
        })
    }

    /// The card's protected body block, if it has exactly one.
    pub fn required_body_block(&self, card: &ElementId) -> Option<BlockId> {
        let template = self.session.graph.element(card)?.template.as_ref()?;
        required_body_block_id(template).cloned()
    }

    // --- External links ----------------------------------------------------

    /// Link an element to a ticket. The ticket id is stored as given. Linking
    /// the same pair twice returns the existing link id.
    pub fn link_external(&mut self, element: &ElementId, ticket_id: &str) -> EditResult<String> {
        if !self.session.graph.contains(element) {
            return Err(EditError::UnknownElement(element.clone()));
        }
        if let Some(existing) = self
            .session
            .external_links
            .iter()
            .find(|l| &l.element_id == element && l.target_id == ticket_id)
        {
            return Ok(existing.id.clone());
        }
        let before = self.session.snapshot();
        let link = ExternalLink::new(element.clone(), ticket_id);
        let id = link.id.clone();
        self.session.external_links.push(link);
        self.session.commit(before);
        Ok(id)
    }

    /// Remove a link by id. Returns whether it existed.
    pub fn unlink_external(&mut self, link_id: &str) -> bool {
        if !self.session.external_links.iter().any(|l| l.id == link_id) {
            return false;
        }
        let before = self.session.snapshot();
        self.session.external_links.retain(|l| l.id != link_id);
        self.session.commit(before);
        true
    }

    pub fn external_links_of(&self, element: &ElementId) -> Vec<&ExternalLink> {
        self.session
            .external_links
            .iter()
            .filter(|l| &l.element_id == element)
            .collect()
    }

    /// Every ticket id linked from the scene, sorted and deduplicated.
    pub fn linked_ticket_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .session
            .external_links
            .iter()
            .map(|l| l.target_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    // --- View and history --------------------------------------------------

    /// Zoom around a screen point within the configured bounds.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        let previous = self.session.viewport;
        self.session
            .viewport
            .zoom_at(screen, factor, self.config.min_zoom, self.config.max_zoom);
        if self.session.viewport != previous {
            self.session.publish();
        }
    }

    pub fn undo(&mut self) -> bool {
        self.cancel();
        let undone = self.session.undo();
        if undone {
            self.prune_selection();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.cancel();
        let redone = self.session.redo();
        if redone {
            self.prune_selection();
        }
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    fn prune_selection(&mut self) {
        let graph = &self.session.graph;
        self.selection.retain(|id| graph.contains(id));
    }
}

//! Conversion between the persisted [`Scene`] and the runtime [`SceneGraph`].
//!
//! The graph is an id-addressed arena of nodes with derived parent pointers.
//! PARENT relations become parent pointers on load and are regenerated from
//! them on save; connector and external-link records keep their ids.

use crate::blocks::ensure_template;
use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{
    DropCandidate, NodeTree, is_point_inside_bounds, node_absolute_bounds, to_absolute_position,
    to_parent_relative_position,
};
use crate::scene::{Element, ElementId, ElementKind, Relation, RelationKind, Scene};
use crate::viewport::Viewport;
use kurbo::{Point, Rect};
use std::collections::{HashMap, HashSet};

/// Runtime node: an element plus its derived parent pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub element: Element,
    pub parent: Option<ElementId>,
}

impl Node {
    pub fn id(&self) -> &ElementId {
        &self.element.id
    }
}

/// A retained CONNECTOR relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub id: String,
    pub from: ElementId,
    pub to: ElementId,
    pub metadata: serde_json::Value,
}

impl Connector {
    pub fn new(from: ElementId, to: ElementId) -> Self {
        let relation = Relation::connector(from.clone(), to.clone());
        Self {
            id: relation.id,
            from,
            to,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn mentions(&self, id: &ElementId) -> bool {
        &self.from == id || &self.to == id
    }
}

/// A link from an element to a ticket outside the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalLink {
    pub id: String,
    pub element_id: ElementId,
    /// Ticket id. Never validated.
    pub target_id: String,
    pub metadata: serde_json::Value,
}

impl ExternalLink {
    pub fn new(element_id: ElementId, target_id: impl Into<String>) -> Self {
        let relation = Relation::external_link(element_id.clone(), target_id);
        Self {
            id: relation.id,
            element_id,
            target_id: relation.to_id,
            metadata: serde_json::Value::Null,
        }
    }
}

/// Id-addressed arena of nodes plus retained connectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGraph {
    nodes: HashMap<ElementId, Node>,
    /// Document order, used for stable output and z-index ties.
    order: Vec<ElementId>,
    connectors: Vec<Connector>,
}

impl NodeTree for SceneGraph {
    fn local_bounds(&self, id: &ElementId) -> Option<Rect> {
        self.nodes.get(id).map(|n| n.element.local_bounds())
    }

    fn parent_of(&self, id: &ElementId) -> Option<&ElementId> {
        self.nodes.get(id).and_then(|n| n.parent.as_ref())
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &ElementId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.nodes.get(id).map(|n| &n.element)
    }

    pub fn element_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.nodes.get_mut(id).map(|n| &mut n.element)
    }

    /// Add an element, or replace the element with the same id in place.
    pub fn insert(&mut self, element: Element, parent: Option<ElementId>) {
        let id = element.id.clone();
        if self.nodes.insert(id.clone(), Node { element, parent }).is_none() {
            self.order.push(id);
        }
    }

    /// Remove a single node. Children and connectors are left untouched;
    /// see [`SceneGraph::remove_cascade`].
    pub fn remove(&mut self, id: &ElementId) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        self.order.retain(|o| o != id);
        Some(node)
    }

    /// Nodes in document order.
    pub fn nodes_ordered(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = &ElementId> {
        self.order.iter()
    }

    /// Nodes back to front: ascending z-index, document order within equal z.
    pub fn paint_order(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes_ordered().collect();
        nodes.sort_by_key(|n| n.element.z_index);
        nodes
    }

    pub fn children_of(&self, id: &ElementId) -> Vec<ElementId> {
        self.nodes_ordered()
            .filter(|n| n.parent.as_ref() == Some(id))
            .map(|n| n.element.id.clone())
            .collect()
    }

    pub fn max_z_index(&self) -> Option<i64> {
        self.nodes.values().map(|n| n.element.z_index).max()
    }

    pub fn min_z_index(&self) -> Option<i64> {
        self.nodes.values().map(|n| n.element.z_index).min()
    }

    /// Move a node under `new_parent` (or to the root), converting its local
    /// position so its absolute position is unchanged. A parent that is not a
    /// container, or the node itself, is ignored.
    pub fn reparent(&mut self, id: &ElementId, new_parent: Option<&ElementId>) -> GeometryResult<()> {
        if let Some(parent) = new_parent {
            let valid = parent != id && self.element(parent).is_some_and(Element::is_container);
            if !valid {
                log::warn!("Refusing to parent {} into non-container {}", id, parent);
                return Ok(());
            }
        }
        let absolute = to_absolute_position(self, id)?;
        let local = to_parent_relative_position(self, absolute, new_parent)?;
        if let Some(node) = self.nodes.get_mut(id) {
            node.element.set_position(local);
            node.parent = new_parent.cloned();
        }
        Ok(())
    }

    /// Absolute bounds of a node.
    pub fn absolute_bounds(&self, id: &ElementId) -> GeometryResult<Rect> {
        node_absolute_bounds(self, id)
    }

    pub fn drop_candidate(&self, id: &ElementId) -> GeometryResult<DropCandidate> {
        let element = self
            .element(id)
            .ok_or_else(|| GeometryError::UnknownNode(id.clone()))?;
        Ok(DropCandidate {
            id: id.clone(),
            kind: element.kind,
            bounds: self.absolute_bounds(id)?,
            z_index: element.z_index,
        })
    }

    /// Every container as a drop candidate, in document order.
    pub fn container_candidates(&self) -> Vec<DropCandidate> {
        self.nodes_ordered()
            .filter(|n| n.element.is_container())
            .filter_map(|n| self.drop_candidate(n.id()).ok())
            .collect()
    }

    /// Topmost node whose absolute bounds contain `point`.
    pub fn hit_test(&self, point: Point) -> Option<ElementId> {
        self.paint_order()
            .into_iter()
            .rev()
            .find(|n| {
                self.absolute_bounds(n.id())
                    .is_ok_and(|b| is_point_inside_bounds(point, b))
            })
            .map(|n| n.element.id.clone())
    }

    /// Every node whose absolute bounds contain `point`, topmost first.
    pub fn nodes_at(&self, point: Point) -> Vec<ElementId> {
        self.paint_order()
            .into_iter()
            .rev()
            .filter(|n| {
                self.absolute_bounds(n.id())
                    .is_ok_and(|b| is_point_inside_bounds(point, b))
            })
            .map(|n| n.element.id.clone())
            .collect()
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn add_connector(&mut self, connector: Connector) {
        self.connectors.push(connector);
    }

    /// Delete nodes and every connector naming them. Children of a deleted
    /// container move to the root with their absolute position preserved.
    /// Returns the removed ids.
    pub fn remove_cascade(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let doomed: HashSet<&ElementId> = ids.iter().filter(|id| self.contains(id)).collect();

        let orphans: Vec<(ElementId, Point)> = self
            .nodes_ordered()
            .filter(|n| !doomed.contains(n.id()))
            .filter(|n| n.parent.as_ref().is_some_and(|p| doomed.contains(p)))
            .filter_map(|n| {
                to_absolute_position(self, n.id())
                    .ok()
                    .map(|abs| (n.element.id.clone(), abs))
            })
            .collect();

        for (id, absolute) in orphans {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.element.set_position(absolute);
                node.parent = None;
            }
        }

        let removed: Vec<ElementId> = doomed.into_iter().cloned().collect();
        for id in &removed {
            self.remove(id);
        }
        self.connectors
            .retain(|c| !removed.iter().any(|id| c.mentions(id)));
        removed
    }
}

/// Runtime state produced from a persisted scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedScene {
    pub graph: SceneGraph,
    pub external_links: Vec<ExternalLink>,
    pub viewport: Viewport,
}

/// Build the runtime graph from a persisted scene.
///
/// Children keep their stored bounds even when they extend past their
/// container. Card templates are normalized, containers nested in
/// containers are moved to the root, and relations naming unknown elements
/// are dropped with a warning.
pub fn map_scene_to_state(scene: &Scene) -> MappedScene {
    let mut graph = SceneGraph::new();
    for element in &scene.elements {
        let mut element = element.clone();
        if element.kind == ElementKind::Card {
            let template = element.template.take().unwrap_or_default();
            element.template = Some(ensure_template(template));
        }
        if graph.contains(&element.id) {
            log::warn!("Skipping duplicate element {}", element.id);
            continue;
        }
        graph.insert(element, None);
    }

    let mut external_links = Vec::new();
    for relation in &scene.relations {
        if !graph.contains(&relation.from_id) {
            log::warn!("Dropping relation {} from unknown element {}", relation.id, relation.from_id);
            continue;
        }
        match relation.kind {
            RelationKind::Parent => {
                let container = ElementId::new(relation.to_id.clone());
                if !graph.element(&container).is_some_and(Element::is_container) {
                    log::warn!("Dropping relation {}: {} is not a container", relation.id, container);
                    continue;
                }
                if let Some(node) = graph.get_mut(&relation.from_id) {
                    if node.parent.is_some() {
                        log::warn!("Element {} already has a parent, ignoring {}", relation.from_id, relation.id);
                    } else {
                        node.parent = Some(container);
                    }
                }
            }
            RelationKind::Connector => {
                let to = ElementId::new(relation.to_id.clone());
                if !graph.contains(&to) {
                    log::warn!("Dropping connector {} to unknown element {}", relation.id, to);
                    continue;
                }
                graph.add_connector(Connector {
                    id: relation.id.clone(),
                    from: relation.from_id.clone(),
                    to,
                    metadata: relation.metadata.clone(),
                });
            }
            RelationKind::ExternalLink => external_links.push(ExternalLink {
                id: relation.id.clone(),
                element_id: relation.from_id.clone(),
                target_id: relation.to_id.clone(),
                metadata: relation.metadata.clone(),
            }),
        }
    }

    flatten_nested_containers(&mut graph);

    let viewport = if scene.viewport.is_valid() {
        scene.viewport
    } else {
        log::warn!("Resetting invalid viewport");
        Viewport::default()
    };

    MappedScene {
        graph,
        external_links,
        viewport,
    }
}

/// Detach containers that were parented into containers, keeping their
/// absolute position. Their own children move with them.
fn flatten_nested_containers(graph: &mut SceneGraph) {
    let nested: Vec<(ElementId, Point)> = graph
        .nodes_ordered()
        .filter(|n| n.element.is_container() && n.parent.is_some())
        .map(|n| {
            let absolute = to_absolute_position(graph, n.id()).unwrap_or_else(|e| {
                log::warn!("Cannot resolve position of {}: {}", n.id(), e);
                n.element.position()
            });
            (n.element.id.clone(), absolute)
        })
        .collect();

    for (id, absolute) in nested {
        log::warn!("Flattening nested container {}", id);
        if let Some(node) = graph.get_mut(&id) {
            node.element.set_position(absolute);
            node.parent = None;
        }
    }
}

/// Flatten the runtime state back into a persisted scene.
pub fn build_scene(graph: &SceneGraph, external_links: &[ExternalLink], viewport: Viewport) -> Scene {
    let elements = graph.nodes_ordered().map(|n| n.element.clone()).collect();

    let parents = graph.nodes_ordered().filter_map(|n| {
        n.parent
            .as_ref()
            .map(|p| Relation::parent(n.element.id.clone(), p.clone()))
    });
    let connectors = graph.connectors().iter().map(|c| {
        Relation::connector(c.from.clone(), c.to.clone())
            .with_id(c.id.clone())
            .with_metadata(c.metadata.clone())
    });
    let links = external_links.iter().map(|l| {
        Relation::external_link(l.element_id.clone(), l.target_id.clone())
            .with_id(l.id.clone())
            .with_metadata(l.metadata.clone())
    });

    Scene {
        elements,
        relations: parents.chain(connectors).chain(links).collect(),
        viewport,
        ..Scene::default()
    }
}

impl MappedScene {
    pub fn from_scene(scene: &Scene) -> Self {
        map_scene_to_state(scene)
    }

    pub fn to_scene(&self) -> Scene {
        build_scene(&self.graph, &self.external_links, self.viewport)
    }
}

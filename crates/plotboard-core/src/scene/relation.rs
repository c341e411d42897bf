//! Typed edges between elements.

use super::ElementId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Relation type tag as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    /// Containment, directed child to container.
    Parent,
    /// Visual connection between two elements.
    Connector,
    /// Link from an element to a ticket outside the scene.
    ExternalLink,
}

impl RelationKind {
    /// Persisted type tag.
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Parent => "PARENT",
            RelationKind::Connector => "CONNECTOR",
            RelationKind::ExternalLink => "EXTERNAL_LINK",
        }
    }
}

/// A typed edge. For `ExternalLink` the `to_id` is a ticket id and is never
/// resolved against the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RelationKind,
    pub from_id: ElementId,
    pub to_id: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl Relation {
    fn new(kind: RelationKind, from_id: ElementId, to_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            from_id,
            to_id,
            metadata: serde_json::Value::Null,
        }
    }

    /// `child` is contained by `container`.
    pub fn parent(child: ElementId, container: ElementId) -> Self {
        Self::new(RelationKind::Parent, child, container.as_str().to_string())
    }

    pub fn connector(from: ElementId, to: ElementId) -> Self {
        Self::new(RelationKind::Connector, from, to.as_str().to_string())
    }

    pub fn external_link(from: ElementId, ticket_id: impl Into<String>) -> Self {
        Self::new(RelationKind::ExternalLink, from, ticket_id.into())
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Element at the far end of the edge. External links point outside the scene.
    pub fn target_element(&self) -> Option<ElementId> {
        match self.kind {
            RelationKind::Parent | RelationKind::Connector => Some(ElementId::new(self.to_id.clone())),
            RelationKind::ExternalLink => None,
        }
    }

    /// Whether either end of the edge names `id`.
    pub fn mentions(&self, id: &ElementId) -> bool {
        &self.from_id == id
            || (self.kind != RelationKind::ExternalLink && self.to_id == id.as_str())
    }
}

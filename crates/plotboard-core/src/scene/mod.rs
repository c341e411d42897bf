//! Persisted scene model.
//!
//! A [`Scene`] is the unit written to storage: a flat element list, typed
//! relations between elements and the viewport. Containment lives only in
//! PARENT relations here; the runtime graph with parent pointers is derived
//! by [`crate::mapper`].

mod element;
mod relation;
mod style;
mod validate;

pub use element::{Element, ElementId, ElementKind};
pub use relation::{Relation, RelationKind};
pub use style::{ElementStyle, SerializableColor};

use crate::error::{SceneError, SceneResult};
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};

/// Current persisted scene format version.
pub const SCENE_VERSION: u32 = 2;

/// Persisted scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub version: u32,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub viewport: Viewport,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            version: SCENE_VERSION,
            elements: Vec::new(),
            relations: Vec::new(),
            viewport: Viewport::default(),
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a scene, checking the version tag before the body so that
    /// documents from other format versions are rejected rather than
    /// half-read. Does not validate references; see [`Scene::validate`].
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let found = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .ok_or(SceneError::MissingVersion)?;
        if found != u64::from(SCENE_VERSION) {
            return Err(SceneError::UnsupportedVersion {
                found,
                expected: SCENE_VERSION,
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Parse and validate, falling back to an empty scene on any failure.
    pub fn load_or_default(json: &str) -> Self {
        match Self::from_json(json).and_then(|scene| scene.validate().map(|()| scene)) {
            Ok(scene) => scene,
            Err(e) => {
                log::warn!("Discarding unreadable scene: {}", e);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    pub fn relations_of_kind(&self, kind: RelationKind) -> impl Iterator<Item = &Relation> {
        self.relations.iter().filter(move |r| r.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.relations.is_empty()
    }

    /// Total inline payload (text, block content, stroke points) carried by
    /// the scene.
    pub fn inline_payload_bytes(&self) -> usize {
        self.elements.iter().map(Element::inline_payload_bytes).sum()
    }
}

/// Load a persisted scene, failing closed to an empty scene.
pub fn load_scene(json: &str) -> Scene {
    Scene::load_or_default(json)
}

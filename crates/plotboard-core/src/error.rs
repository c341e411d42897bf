//! Error types for scene loading, geometry and block ordering.

use crate::blocks::BlockId;
use crate::scene::ElementId;
use thiserror::Error;

/// Validation failures found while loading a persisted scene.
///
/// Loaders never surface these to the user directly: they log the error and
/// fall back to an empty scene.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Unsupported scene version {found} (expected {expected})")]
    UnsupportedVersion { found: u64, expected: u32 },
    #[error("Scene has no version tag")]
    MissingVersion,
    #[error("Duplicate element id: {0}")]
    DuplicateElement(ElementId),
    #[error("Relation {relation} references missing element {element}")]
    DanglingRelation { relation: String, element: String },
    #[error("Element {0} has more than one parent")]
    DuplicateParent(ElementId),
    #[error("Relation {relation} parents into non-container {target}")]
    InvalidParent { relation: String, target: ElementId },
    #[error("Viewport must have finite pan and a positive finite zoom")]
    InvalidViewport,
    #[error("Malformed scene JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for scene validation.
pub type SceneResult<T> = Result<T, SceneError>;

/// Failures of coordinate-space operations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("Unknown node: {0}")]
    UnknownNode(ElementId),
    #[error("Parent chain of {0} is too deep")]
    ChainTooDeep(ElementId),
}

/// Result type for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Failures of card block list mutations.
#[derive(Debug, Error)]
pub enum OrderingError {
    #[error("Card has {count} body blocks, no single required block")]
    AmbiguousRequiredBody { count: usize },
    #[error("Unknown block: {0}")]
    UnknownBlock(BlockId),
    #[error("Block index {index} out of range for {len} blocks")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Block {0} is the card's required body block")]
    RequiredBlock(BlockId),
}

/// Result type for block ordering operations.
pub type OrderingResult<T> = Result<T, OrderingError>;

/// Failures of explicit editing commands on the interaction controller.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("Unknown element: {0}")]
    UnknownElement(ElementId),
    #[error("Element {0} is not a card")]
    NotACard(ElementId),
    #[error("Element {0} does not hold text")]
    NotText(ElementId),
    #[error(transparent)]
    Ordering(#[from] OrderingError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Result type for editing commands.
pub type EditResult<T> = Result<T, EditError>;

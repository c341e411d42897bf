//! Plotboard Core Library
//!
//! Scene model, coordinate geometry, card block ordering and the pointer
//! interaction layer for the Plotboard whiteboard canvas.

pub mod blocks;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod input;
pub mod mapper;
pub mod scene;
pub mod selection;
pub mod storage;
pub mod tools;
pub mod viewport;

pub use blocks::{Block, BlockAlign, BlockId, BlockKind, BlockMetrics, CardTemplate};
pub use config::{ConfigError, EngineConfig};
pub use controller::{CaptureHost, InteractionController, InteractionMode, Session};
pub use error::{EditError, GeometryError, OrderingError, SceneError};
pub use geometry::{DropCandidate, NodeTree};
pub use input::{Modifiers, MouseButton, PointerEvent};
pub use mapper::{MappedScene, SceneGraph, build_scene, map_scene_to_state};
pub use scene::{Element, ElementId, ElementKind, Relation, RelationKind, Scene, load_scene};
pub use storage::{CommitSink, CommitWriter, FileStore, MemoryStore, SceneStore, StorageError};
pub use tools::{ToolKind, ToolManager};
pub use viewport::Viewport;

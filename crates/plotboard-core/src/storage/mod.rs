//! Storage abstraction for committed scenes.

mod file;
mod memory;
mod writer;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use writer::{CommitSink, CommitWriter};

use crate::scene::Scene;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Scene not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for store operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Persistence sink for whole scenes, keyed by canvas id.
///
/// Every save carries a complete scene; stores never merge.
pub trait SceneStore: Send + Sync {
    /// Save a scene, replacing any previous one under `id`.
    fn save(&self, id: &str, scene: &Scene) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a scene.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Scene>>;

    /// Delete a scene. Deleting a missing scene is not an error.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all canvas ids.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a scene exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

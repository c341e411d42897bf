//! In-memory scene store.

use super::{BoxFuture, SceneStore, StorageError, StorageResult};
use crate::scene::Scene;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    scenes: RwLock<HashMap<String, Scene>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl SceneStore for MemoryStore {
    fn save(&self, id: &str, scene: &Scene) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let scene = scene.clone();
        Box::pin(async move {
            self.scenes.write().map_err(lock_error)?.insert(id, scene);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Scene>> {
        let id = id.to_string();
        Box::pin(async move {
            let scenes = self.scenes.read().map_err(lock_error)?;
            scenes.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.scenes.write().map_err(lock_error)?.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let scenes = self.scenes.read().map_err(lock_error)?;
            let mut ids: Vec<String> = scenes.keys().cloned().collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.scenes.read().map_err(lock_error)?.contains_key(&id)) })
    }
}

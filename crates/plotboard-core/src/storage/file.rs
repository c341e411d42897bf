//! File-based scene store.

use super::{BoxFuture, SceneStore, StorageError, StorageResult};
use crate::scene::Scene;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each scene as a pretty-printed JSON file in a base directory.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// crash mid-write leaves the previous scene intact.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::Io(format!("Failed to create storage directory: {}", e))
        })?;
        Ok(Self { base_path })
    }

    /// Store in the platform data directory, under `plotboard/scenes`.
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine data directory".to_string()))?;
        Self::new(base.join("plotboard").join("scenes"))
    }

    fn scene_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl SceneStore for FileStore {
    fn save(&self, id: &str, scene: &Scene) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.scene_path(id);
        let json = scene.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e))
            })?;
            fs::rename(&tmp, &path).map_err(|e| {
                StorageError::Io(format!("Failed to replace {}: {}", path.display(), e))
            })
        })
    }

    /// Unreadable or invalid files load as an empty scene; see
    /// [`Scene::load_or_default`].
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Scene>> {
        let path = self.scene_path(id);
        let id = id.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id));
            }
            let json = fs::read_to_string(&path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;
            Ok(Scene::load_or_default(&json))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.scene_path(id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut ids: Vec<String> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
                .collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.scene_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Element, ElementKind};
    use kurbo::Rect;
    use pollster::block_on;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_save_load() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        let mut scene = Scene::new();
        scene
            .elements
            .push(Element::new(ElementKind::Rectangle, Rect::new(0.0, 0.0, 40.0, 30.0)));

        block_on(store.save("board-1", &scene)).unwrap();
        let loaded = block_on(store.load("board-1")).unwrap();
        assert_eq!(loaded, scene);
        assert!(!dir.path().join("board-1.json.tmp").exists());
    }

    #[test]
    fn test_file_store_not_found() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let result = block_on(store.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_invalid_file_fails_closed() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        fs::write(dir.path().join("old.json"), r#"{ "version": 1, "elements": [] }"#).unwrap();
        let loaded = block_on(store.load("old")).unwrap();
        assert_eq!(loaded, Scene::default());
    }

    #[test]
    fn test_file_store_list_and_delete() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let scene = Scene::new();

        block_on(store.save("doc2", &scene)).unwrap();
        block_on(store.save("doc1", &scene)).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        assert_eq!(
            block_on(store.list()).unwrap(),
            vec!["doc1".to_string(), "doc2".to_string()]
        );

        block_on(store.delete("doc1")).unwrap();
        assert!(!block_on(store.exists("doc1")).unwrap());
        assert!(block_on(store.exists("doc2")).unwrap());
    }

    #[test]
    fn test_ids_are_sanitized() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        block_on(store.save("../escape", &Scene::new())).unwrap();
        assert!(dir.path().join("___escape.json").exists());
    }
}

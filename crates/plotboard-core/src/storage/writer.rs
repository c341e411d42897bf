//! Last-write-wins commit writer.
//!
//! Commits arrive synchronously from the interaction layer; writes happen
//! when the host drives [`CommitWriter::flush`]. Only the newest unwritten
//! scene is kept, so a burst of commits during a slow write collapses into a
//! single follow-up write.

use super::{SceneStore, StorageResult};
use crate::scene::Scene;
use std::cell::RefCell;
use std::sync::Arc;

/// Receiver of committed scenes.
pub trait CommitSink {
    /// Hand over a committed scene. Returns the commit's generation number.
    fn submit(&self, scene: Scene) -> u64;
}

#[derive(Default)]
struct WriterState {
    /// Newest committed scene not yet handed to the store.
    pending: Option<(u64, Scene)>,
    in_flight: bool,
    generation: u64,
    last_written: Option<u64>,
}

/// Writes committed scenes of one canvas to a [`SceneStore`].
pub struct CommitWriter<S: SceneStore> {
    store: Arc<S>,
    canvas_id: String,
    state: RefCell<WriterState>,
}

impl<S: SceneStore> CommitWriter<S> {
    pub fn new(store: Arc<S>, canvas_id: impl Into<String>) -> Self {
        Self {
            store,
            canvas_id: canvas_id.into(),
            state: RefCell::new(WriterState::default()),
        }
    }

    pub fn canvas_id(&self) -> &str {
        &self.canvas_id
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Generation of the newest scene successfully written.
    pub fn last_written(&self) -> Option<u64> {
        self.state.borrow().last_written
    }

    /// Generation of the scene waiting to be written.
    pub fn pending_generation(&self) -> Option<u64> {
        self.state.borrow().pending.as_ref().map(|(generation, _)| *generation)
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.borrow().in_flight
    }

    pub fn has_unsaved(&self) -> bool {
        let state = self.state.borrow();
        state.pending.is_some() || state.in_flight
    }

    /// Write pending scenes until none is left.
    ///
    /// Returns the generation last written by this call, or `None` when
    /// nothing was pending or another flush is already writing (that flush
    /// picks up anything submitted meanwhile). A failed write is logged and
    /// its scene dropped unless a newer one replaced it; the error is
    /// returned once the queue is drained.
    ///
    /// Dropping the future mid-write releases the writer and puts the
    /// unfinished scene back unless a newer commit took its place.
    pub async fn flush(&self) -> StorageResult<Option<u64>> {
        let Some(mut guard) = FlushGuard::acquire(&self.state) else {
            return Ok(None);
        };

        let mut written = None;
        let mut failure = None;
        loop {
            let next = self.state.borrow_mut().pending.take();
            let Some((generation, scene)) = next else {
                break;
            };
            log::debug!("Writing scene {} generation {}", self.canvas_id, generation);
            let save = self.store.save(&self.canvas_id, &scene);
            guard.writing = Some((generation, scene));
            let result = save.await;
            guard.writing = None;
            match result {
                Ok(()) => {
                    written = Some(generation);
                    self.state.borrow_mut().last_written = Some(generation);
                }
                Err(e) => {
                    log::warn!("Failed to save scene {}: {}", self.canvas_id, e);
                    failure = Some(e);
                }
            }
        }

        drop(guard);
        match failure {
            Some(e) if written.is_none() => Err(e),
            _ => Ok(written),
        }
    }
}

/// Holds the writer's `in_flight` flag for the lifetime of one flush.
struct FlushGuard<'a> {
    state: &'a RefCell<WriterState>,
    /// Scene handed to the store whose write has not completed.
    writing: Option<(u64, Scene)>,
}

impl<'a> FlushGuard<'a> {
    fn acquire(state: &'a RefCell<WriterState>) -> Option<Self> {
        let mut inner = state.borrow_mut();
        if inner.in_flight {
            return None;
        }
        inner.in_flight = true;
        drop(inner);
        Some(Self {
            state,
            writing: None,
        })
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.in_flight = false;
        if let Some((generation, scene)) = self.writing.take() {
            log::debug!("Flush of generation {} abandoned mid-write", generation);
            if state.pending.is_none() {
                state.pending = Some((generation, scene));
            }
        }
    }
}

impl<S: SceneStore> CommitSink for CommitWriter<S> {
    fn submit(&self, scene: Scene) -> u64 {
        let mut state = self.state.borrow_mut();
        state.generation += 1;
        let generation = state.generation;
        if let Some((replaced, _)) = state.pending.replace((generation, scene)) {
            log::trace!("Commit {} superseded by {}", replaced, generation);
        }
        generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BoxFuture, MemoryStore, StorageError};
    use crate::viewport::Viewport;
    use pollster::block_on;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll, Waker};

    fn scene_with_zoom(zoom: f64) -> Scene {
        Scene {
            viewport: Viewport::new(0.0, 0.0, zoom),
            ..Scene::default()
        }
    }

    /// Future that is pending on its first poll.
    struct YieldOnce(bool);

    impl Future for YieldOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                Poll::Ready(())
            } else {
                self.0 = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    /// Store that records every save and yields once inside each write.
    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<f64>>,
        fail: bool,
    }

    impl SceneStore for RecordingStore {
        fn save(&self, _id: &str, scene: &Scene) -> BoxFuture<'_, StorageResult<()>> {
            let zoom = scene.viewport.zoom;
            Box::pin(async move {
                YieldOnce(false).await;
                if self.fail {
                    return Err(StorageError::Io("disk full".to_string()));
                }
                self.saved
                    .lock()
                    .map_err(|e| StorageError::Other(e.to_string()))?
                    .push(zoom);
                Ok(())
            })
        }

        fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Scene>> {
            let id = id.to_string();
            Box::pin(async move { Err(StorageError::NotFound(id)) })
        }

        fn delete(&self, _id: &str) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn exists(&self, _id: &str) -> BoxFuture<'_, StorageResult<bool>> {
            Box::pin(async { Ok(false) })
        }
    }

    /// Store whose first `stalls` saves never complete.
    struct StallingStore {
        inner: RecordingStore,
        stalls: Mutex<usize>,
    }

    impl SceneStore for StallingStore {
        fn save(&self, id: &str, scene: &Scene) -> BoxFuture<'_, StorageResult<()>> {
            let stall = match self.stalls.lock() {
                Ok(mut stalls) if *stalls > 0 => {
                    *stalls -= 1;
                    true
                }
                _ => false,
            };
            if stall {
                Box::pin(std::future::pending::<StorageResult<()>>())
            } else {
                self.inner.save(id, scene)
            }
        }

        fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Scene>> {
            self.inner.load(id)
        }

        fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
            self.inner.delete(id)
        }

        fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
            self.inner.list()
        }

        fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
            self.inner.exists(id)
        }
    }

    fn stalling_store(stalls: usize) -> Arc<StallingStore> {
        Arc::new(StallingStore {
            inner: RecordingStore::default(),
            stalls: Mutex::new(stalls),
        })
    }

    /// Poll a flush once and drop it while its write is outstanding.
    fn abandon_flush<S: SceneStore>(writer: &CommitWriter<S>) {
        let mut cx = Context::from_waker(Waker::noop());
        let mut flush = Box::pin(writer.flush());
        assert!(flush.as_mut().poll(&mut cx).is_pending());
        assert!(writer.is_in_flight());
    }

    #[test]
    fn test_burst_collapses_to_latest() {
        let store = Arc::new(RecordingStore::default());
        let writer = CommitWriter::new(store.clone(), "board");

        assert_eq!(writer.submit(scene_with_zoom(1.0)), 1);
        assert_eq!(writer.submit(scene_with_zoom(2.0)), 2);
        assert_eq!(writer.submit(scene_with_zoom(3.0)), 3);
        assert_eq!(writer.pending_generation(), Some(3));

        assert_eq!(block_on(writer.flush()).unwrap(), Some(3));
        assert_eq!(*store.saved.lock().unwrap(), vec![3.0]);
        assert!(!writer.has_unsaved());
        assert_eq!(block_on(writer.flush()).unwrap(), None);
    }

    #[test]
    fn test_commit_during_write_wins() {
        let store = Arc::new(RecordingStore::default());
        let writer = CommitWriter::new(store.clone(), "board");
        writer.submit(scene_with_zoom(1.0));

        let mut cx = Context::from_waker(Waker::noop());
        let mut flush = Box::pin(writer.flush());
        assert!(flush.as_mut().poll(&mut cx).is_pending());
        assert!(writer.is_in_flight());

        // Newer commits while the first write is in flight; only the last survives.
        writer.submit(scene_with_zoom(2.0));
        writer.submit(scene_with_zoom(3.0));
        assert_eq!(block_on(writer.flush()).unwrap(), None);

        let result = loop {
            if let Poll::Ready(result) = flush.as_mut().poll(&mut cx) {
                break result;
            }
        };
        assert_eq!(result.unwrap(), Some(3));
        assert_eq!(*store.saved.lock().unwrap(), vec![1.0, 3.0]);
        assert_eq!(writer.last_written(), Some(3));
    }

    #[test]
    fn test_failed_write_reported() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..RecordingStore::default()
        });
        let writer = CommitWriter::new(store, "board");
        writer.submit(scene_with_zoom(1.0));
        assert!(matches!(block_on(writer.flush()), Err(StorageError::Io(_))));
        assert!(!writer.is_in_flight());
        assert_eq!(writer.last_written(), None);
    }

    #[test]
    fn test_writes_to_memory_store() {
        let store = Arc::new(MemoryStore::new());
        let writer = CommitWriter::new(store.clone(), "board");
        writer.submit(scene_with_zoom(1.5));
        block_on(writer.flush()).unwrap();
        let saved = block_on(store.load("board")).unwrap();
        assert!((saved.viewport.zoom - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dropped_flush_releases_writer() {
        let store = stalling_store(1);
        let writer = CommitWriter::new(store.clone(), "board");
        writer.submit(scene_with_zoom(1.0));
        abandon_flush(&writer);
        assert!(!writer.is_in_flight());

        writer.submit(scene_with_zoom(2.0));
        assert_eq!(block_on(writer.flush()).unwrap(), Some(2));
        assert_eq!(*store.inner.saved.lock().unwrap(), vec![2.0]);
        assert!(!writer.has_unsaved());
    }

    #[test]
    fn test_dropped_flush_keeps_unfinished_scene() {
        let store = stalling_store(1);
        let writer = CommitWriter::new(store.clone(), "board");
        writer.submit(scene_with_zoom(1.5));
        abandon_flush(&writer);

        assert_eq!(writer.pending_generation(), Some(1));
        assert!(writer.has_unsaved());
        assert_eq!(block_on(writer.flush()).unwrap(), Some(1));
        assert_eq!(*store.inner.saved.lock().unwrap(), vec![1.5]);
    }
}

//! Periodic saving of the open canvas.

use super::{Storage, StorageResult};
use crate::scene::SceneDocument;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Key under which the most recently saved scene is mirrored.
pub const LAST_CANVAS_KEY: &str = "__last_canvas__";

/// Dirty flag plus save interval for one canvas.
///
/// The host calls [`AutoSaveManager::mark_dirty`] from the engine's change
/// listener and polls [`AutoSaveManager::maybe_save`] from its own timer.
pub struct AutoSaveManager<S: Storage + ?Sized> {
    storage: Arc<S>,
    canvas_id: String,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
}

impl<S: Storage + ?Sized> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>, canvas_id: impl Into<String>) -> Self {
        Self {
            storage,
            canvas_id: canvas_id.into(),
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn canvas_id(&self) -> &str {
        &self.canvas_id
    }

    /// Switch to another canvas. The dirty flag is cleared.
    pub fn set_canvas_id(&mut self, canvas_id: impl Into<String>) {
        self.canvas_id = canvas_id.into();
        self.dirty = false;
        self.last_save = None;
    }

    /// Dirty and either never saved or the interval has elapsed.
    pub fn should_save(&self) -> bool {
        self.dirty && self.last_save.is_none_or(|last| last.elapsed() >= self.interval)
    }

    /// Save if [`Self::should_save`]. Returns whether a save happened.
    pub async fn maybe_save(&mut self, document: &SceneDocument) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(document).await?;
        Ok(true)
    }

    /// Save now, under the canvas id and the last-canvas key.
    pub async fn save(&mut self, document: &SceneDocument) -> StorageResult<()> {
        self.storage.save(&self.canvas_id, document).await?;
        self.storage.save(LAST_CANVAS_KEY, document).await?;
        self.last_save = Some(Instant::now());
        self.dirty = false;
        log::debug!("Auto-saved canvas {}", self.canvas_id);
        Ok(())
    }

    /// Load the managed canvas.
    pub async fn load(&mut self) -> StorageResult<SceneDocument> {
        let document = self.storage.load(&self.canvas_id).await?;
        self.dirty = false;
        self.last_save = Some(Instant::now());
        Ok(document)
    }

    /// The most recently saved scene of any canvas, if there is one.
    pub async fn load_last(&self) -> Option<SceneDocument> {
        match self.storage.load(LAST_CANVAS_KEY).await {
            Ok(document) => Some(document),
            Err(e) => {
                log::debug!("No last canvas: {e}");
                None
            }
        }
    }

    /// Saved canvas ids, without the last-canvas key.
    pub async fn list_canvases(&self) -> StorageResult<Vec<String>> {
        let mut ids = self.storage.list().await?;
        ids.retain(|id| id != LAST_CANVAS_KEY);
        Ok(ids)
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Ellipse, Shape};
    use crate::storage::{MemoryStorage, block_on};
    use kurbo::Point;

    fn document() -> SceneDocument {
        SceneDocument::new(vec![Shape::Ellipse(Ellipse::new(Point::new(5.0, 5.0), 2.0, 3.0))])
    }

    #[test]
    fn test_clean_manager_does_not_save() {
        let manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()), "c1");
        assert!(!manager.is_dirty());
        assert!(!manager.should_save());
        assert_eq!(manager.interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_save_clears_dirty() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()), "c1");
        manager.mark_dirty();
        assert!(manager.should_save());
        assert!(block_on(manager.maybe_save(&document())).unwrap());
        assert!(!manager.is_dirty());
        assert!(!block_on(manager.maybe_save(&document())).unwrap());
    }

    #[test]
    fn test_interval_gates_saves() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()), "c1");
        manager.mark_dirty();
        block_on(manager.save(&document())).unwrap();
        manager.mark_dirty();
        assert!(!manager.should_save());
        manager.set_interval(Duration::ZERO);
        assert!(manager.should_save());
    }

    #[test]
    fn test_load_last_and_list() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(storage.clone(), "biology");
        manager.mark_dirty();
        block_on(manager.save(&document())).unwrap();

        let other = AutoSaveManager::new(storage, "chemistry");
        assert_eq!(block_on(other.load_last()), Some(document()));
        assert_eq!(block_on(other.list_canvases()).unwrap(), vec!["biology".to_string()]);
    }

    #[test]
    fn test_load_missing_canvas_fails() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()), "missing");
        assert!(block_on(manager.load()).is_err());
        assert!(block_on(manager.load_last()).is_none());
    }
}

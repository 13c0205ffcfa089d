//! In-memory storage.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::scene::SceneDocument;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    scenes: RwLock<HashMap<String, SceneDocument>>,
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {e}"))
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn save(&self, canvas_id: &str, document: &SceneDocument) -> BoxFuture<'_, StorageResult<()>> {
        let canvas_id = canvas_id.to_string();
        let document = document.clone();
        Box::pin(async move {
            self.scenes
                .write()
                .map_err(lock_error)?
                .insert(canvas_id, document);
            Ok(())
        })
    }

    fn load(&self, canvas_id: &str) -> BoxFuture<'_, StorageResult<SceneDocument>> {
        let canvas_id = canvas_id.to_string();
        Box::pin(async move {
            self.scenes
                .read()
                .map_err(lock_error)?
                .get(&canvas_id)
                .cloned()
                .ok_or(StorageError::NotFound(canvas_id))
        })
    }

    fn delete(&self, canvas_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let canvas_id = canvas_id.to_string();
        Box::pin(async move {
            self.scenes.write().map_err(lock_error)?.remove(&canvas_id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let mut ids: Vec<String> = self.scenes.read().map_err(lock_error)?.keys().cloned().collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, canvas_id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let canvas_id = canvas_id.to_string();
        Box::pin(async move { Ok(self.scenes.read().map_err(lock_error)?.contains_key(&canvas_id)) })
    }
}

//! Scene persistence keyed by canvas id.

mod autosave;
mod file;
mod memory;

pub use autosave::{AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_SECS, LAST_CANVAS_KEY};
pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::scene::SceneDocument;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Canvas not found: {0}")]
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

/// Boxed future returned by [`Storage`] operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A scene store keyed by canvas id.
///
/// Calls return futures so hosts can back this with async I/O; the engine
/// only awaits them outside the interaction path.
pub trait Storage: Send + Sync {
    fn save(&self, canvas_id: &str, document: &SceneDocument) -> BoxFuture<'_, StorageResult<()>>;

    fn load(&self, canvas_id: &str) -> BoxFuture<'_, StorageResult<SceneDocument>>;

    /// Delete a scene. Deleting a missing id succeeds.
    fn delete(&self, canvas_id: &str) -> BoxFuture<'_, StorageResult<()>>;

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    fn exists(&self, canvas_id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Poll a future to completion on the current thread. The storage backends
/// here never return `Pending`, so a no-op waker is enough.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, Waker};

    let mut cx = Context::from_waker(Waker::noop());
    let mut f = std::pin::pin!(f);
    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}

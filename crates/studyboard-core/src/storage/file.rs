//! File-based storage: one JSON scene file per canvas.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::scene::SceneDocument;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each canvas as `<encoded id>.json` in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Use `base_path`, creating it if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::Io(format!("Failed to create {}: {e}", base_path.display()))
        })?;
        Ok(Self { base_path })
    }

    /// `studyboard/canvases` under the local data directory, or the home
    /// directory when there is none.
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine a data directory".to_string()))?;
        Self::new(base.join("studyboard").join("canvases"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn scene_path(&self, canvas_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", encode_id(canvas_id)))
    }
}

/// Map an id onto a safe file stem. ASCII letters, digits, `-` and `_` are
/// kept; every other byte becomes `%XX`, so distinct ids never share a file.
fn encode_id(id: &str) -> String {
    let mut stem = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    stem
}

/// Inverse of [`encode_id`]. Stems that [`encode_id`] could not have
/// produced yield `None`.
fn decode_id(stem: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(stem.len());
    let mut rest = stem.as_bytes();
    while let Some((&byte, tail)) = rest.split_first() {
        if byte == b'%' {
            let hex = std::str::from_utf8(tail.get(..2)?).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            rest = &tail[2..];
        } else {
            bytes.push(byte);
            rest = tail;
        }
    }
    let id = String::from_utf8(bytes).ok()?;
    (encode_id(&id) == stem).then_some(id)
}

impl Storage for FileStorage {
    fn save(&self, canvas_id: &str, document: &SceneDocument) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.scene_path(canvas_id);
        let json = document.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            fs::write(&path, json)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", path.display())))?;
            log::info!("Saved scene to {}", path.display());
            Ok(())
        })
    }

    fn load(&self, canvas_id: &str) -> BoxFuture<'_, StorageResult<SceneDocument>> {
        let path = self.scene_path(canvas_id);
        let canvas_id = canvas_id.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(canvas_id));
            }
            let json = fs::read_to_string(&path)
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {e}", path.display())))?;
            SceneDocument::from_json(&json).map_err(|e| {
                StorageError::Serialization(format!("Failed to parse {}: {e}", path.display()))
            })
        })
    }

    fn delete(&self, canvas_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.scene_path(canvas_id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {e}", path.display()))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(Vec::new());
            }
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {e}")))?;
            let mut ids: Vec<String> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| {
                    let stem = path.file_stem()?.to_str()?;
                    let id = decode_id(stem);
                    if id.is_none() {
                        log::debug!("Skipping {}: not a canvas file name", path.display());
                    }
                    id
                })
                .collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, canvas_id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.scene_path(canvas_id);
        Box::pin(async move { Ok(path.exists()) })
    }
}

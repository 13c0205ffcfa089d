//! Canvas toolbar/layout preferences and the key-value store they live in.
//!
//! The record is read once when the canvas mounts and written back after
//! every change. There is no migration: anything that does not parse is
//! replaced by the default.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Store key of the layout record.
pub const LAYOUT_PREFERENCES_KEY: &str = "canvas-layout-preferences";

pub const MIN_SIDEBAR_WIDTH: u32 = 200;
pub const MAX_SIDEBAR_WIDTH: u32 = 400;
pub const DEFAULT_SIDEBAR_WIDTH: u32 = 280;

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Could not determine a config directory")]
    NoConfigDir,
}

pub type PreferenceResult<T> = Result<T, PreferenceError>;

/// Where the toolbar sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    #[default]
    Topbar,
    SidebarLeft,
    SidebarRight,
    Minimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutPreferences {
    pub layout_mode: LayoutMode,
    #[serde(deserialize_with = "clamped_width")]
    pub sidebar_width: u32,
    pub show_grid_lines: bool,
    pub snap_to_grid: bool,
}

impl Default for LayoutPreferences {
    fn default() -> Self {
        Self {
            layout_mode: LayoutMode::Topbar,
            sidebar_width: DEFAULT_SIDEBAR_WIDTH,
            show_grid_lines: false,
            snap_to_grid: false,
        }
    }
}

pub fn clamp_sidebar_width(width: f64) -> u32 {
    if width.is_nan() {
        return DEFAULT_SIDEBAR_WIDTH;
    }
    width.round().clamp(f64::from(MIN_SIDEBAR_WIDTH), f64::from(MAX_SIDEBAR_WIDTH)) as u32
}

fn clamped_width<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(clamp_sidebar_width(f64::deserialize(deserializer)?))
}

impl LayoutPreferences {
    /// Parse a stored record, falling back to the default.
    pub fn from_stored(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        serde_json::from_str(raw).unwrap_or_else(|e| {
            log::warn!("Ignoring unparseable layout preferences: {e}");
            Self::default()
        })
    }
}

/// A small durable key-value store.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> PreferenceResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> PreferenceResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: HashMap<String, String>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> PreferenceResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> PreferenceResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key in a directory.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    dir: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> PreferenceResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// `studyboard` under the user's config directory.
    pub fn default_location() -> PreferenceResult<Self> {
        let base = dirs::config_dir().ok_or(PreferenceError::NoConfigDir)?;
        Self::new(base.join("studyboard"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let stem: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{stem}.json"))
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> PreferenceResult<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> PreferenceResult<()> {
        fs::write(self.key_path(key), value)?;
        Ok(())
    }
}

/// Owns the layout record and writes it back through the store on every
/// change.
#[derive(Debug)]
pub struct LayoutPreferenceManager<P: PreferenceStore> {
    store: P,
    preferences: LayoutPreferences,
}

impl<P: PreferenceStore> LayoutPreferenceManager<P> {
    /// Read the record once. A failed read uses the default.
    pub fn load(store: P) -> Self {
        let raw = store.get(LAYOUT_PREFERENCES_KEY).unwrap_or_else(|e| {
            log::warn!("Could not read layout preferences: {e}");
            None
        });
        let preferences = LayoutPreferences::from_stored(raw.as_deref());
        Self { store, preferences }
    }

    pub fn preferences(&self) -> &LayoutPreferences {
        &self.preferences
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn into_store(self) -> P {
        self.store
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) -> PreferenceResult<()> {
        self.preferences.layout_mode = mode;
        self.persist()
    }

    /// Set the sidebar width, clamped to the allowed range.
    pub fn set_sidebar_width(&mut self, width: f64) -> PreferenceResult<()> {
        self.preferences.sidebar_width = clamp_sidebar_width(width);
        self.persist()
    }

    pub fn set_show_grid_lines(&mut self, show: bool) -> PreferenceResult<()> {
        self.preferences.show_grid_lines = show;
        self.persist()
    }

    pub fn set_snap_to_grid(&mut self, snap: bool) -> PreferenceResult<()> {
        self.preferences.snap_to_grid = snap;
        self.persist()
    }

    pub fn toggle_grid_lines(&mut self) -> PreferenceResult<bool> {
        self.set_show_grid_lines(!self.preferences.show_grid_lines)?;
        Ok(self.preferences.show_grid_lines)
    }

    pub fn toggle_snap_to_grid(&mut self) -> PreferenceResult<bool> {
        self.set_snap_to_grid(!self.preferences.snap_to_grid)?;
        Ok(self.preferences.snap_to_grid)
    }

    fn persist(&mut self) -> PreferenceResult<()> {
        let json = serde_json::to_string(&self.preferences)?;
        self.store.set(LAYOUT_PREFERENCES_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_default_record() {
        assert_eq!(
            serde_json::to_value(LayoutPreferences::default()).unwrap(),
            serde_json::json!({
                "layoutMode": "topbar",
                "sidebarWidth": 280,
                "showGridLines": false,
                "snapToGrid": false
            })
        );
    }

    #[test]
    fn test_width_clamped_on_read() {
        let prefs = LayoutPreferences::from_stored(Some(
            r#"{"layoutMode":"sidebar-left","sidebarWidth":950,"showGridLines":true,"snapToGrid":false}"#,
        ));
        assert_eq!(prefs.layout_mode, LayoutMode::SidebarLeft);
        assert_eq!(prefs.sidebar_width, MAX_SIDEBAR_WIDTH);
        assert!(prefs.show_grid_lines);

        let prefs = LayoutPreferences::from_stored(Some(r#"{"sidebarWidth":12.4}"#));
        assert_eq!(prefs.sidebar_width, MIN_SIDEBAR_WIDTH);
        assert_eq!(prefs.layout_mode, LayoutMode::Topbar);
    }

    #[test]
    fn test_unparseable_falls_back() {
        assert_eq!(LayoutPreferences::from_stored(Some("not json")), LayoutPreferences::default());
        assert_eq!(
            LayoutPreferences::from_stored(Some(r#"{"layoutMode":"floating"}"#)),
            LayoutPreferences::default()
        );
        assert_eq!(LayoutPreferences::from_stored(None), LayoutPreferences::default());
    }

    #[test]
    fn test_manager_writes_back_every_change() {
        let mut manager = LayoutPreferenceManager::load(MemoryPreferenceStore::new());
        manager.set_layout_mode(LayoutMode::Minimal).unwrap();
        manager.set_sidebar_width(150.0).unwrap();
        assert!(manager.toggle_grid_lines().unwrap());

        let reloaded = LayoutPreferenceManager::load(manager.into_store());
        assert_eq!(
            *reloaded.preferences(),
            LayoutPreferences {
                layout_mode: LayoutMode::Minimal,
                sidebar_width: MIN_SIDEBAR_WIDTH,
                show_grid_lines: true,
                snap_to_grid: false,
            }
        );
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let mut manager = LayoutPreferenceManager::load(FilePreferenceStore::new(dir.path()).unwrap());
        assert_eq!(*manager.preferences(), LayoutPreferences::default());
        manager.set_snap_to_grid(true).unwrap();
        assert!(dir.path().join("canvas-layout-preferences.json").exists());

        let reloaded = LayoutPreferenceManager::load(FilePreferenceStore::new(dir.path()).unwrap());
        assert!(reloaded.preferences().snap_to_grid);
    }

    #[test]
    fn test_clamp_sidebar_width() {
        assert_eq!(clamp_sidebar_width(299.6), 300);
        assert_eq!(clamp_sidebar_width(f64::NAN), DEFAULT_SIDEBAR_WIDTH);
        assert_eq!(clamp_sidebar_width(-5.0), MIN_SIDEBAR_WIDTH);
    }
}

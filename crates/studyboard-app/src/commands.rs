//! Subcommand implementations. Each returns a value the binary prints, so
//! the logic stays testable without capturing stdout.

use crate::script::{ReplayStats, ScriptError, parse_script, run_script};
use kurbo::{Rect, Size};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use studyboard_core::layout::{FilePreferenceStore, PreferenceError};
use studyboard_core::{
    CanvasEngine, DiagramError, DisplayList, EngineConfig, LayoutMode, LayoutPreferenceManager,
    LayoutPreferences, PreferenceStore, SceneDocument, SceneError, import_diagram,
};
use thiserror::Error;

/// Viewport used when no size is given.
pub const DEFAULT_VIEWPORT: Size = Size::new(1280.0, 800.0);

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("{path}: {source}")]
    Scene { path: PathBuf, source: SceneError },
    #[error("{path}: {source}")]
    Diagram { path: PathBuf, source: DiagramError },
    #[error("{path}: {source}")]
    Script { path: PathBuf, source: ScriptError },
    #[error("preferences: {0}")]
    Preferences(#[from] PreferenceError),
    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },
}

pub type CliResult<T> = Result<T, CliError>;

fn read(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> CliResult<()> {
    fs::write(path, contents).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn scene_error(path: &Path) -> impl FnOnce(SceneError) -> CliError + '_ {
    move |source| CliError::Scene {
        path: path.to_path_buf(),
        source,
    }
}

fn headless_engine(viewport: Size) -> CliResult<CanvasEngine<DisplayList>> {
    if !(viewport.width > 0.0 && viewport.height > 0.0) || !viewport.is_finite() {
        return Err(CliError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    let surface = DisplayList::new(viewport).with_approximate_metrics();
    Ok(CanvasEngine::new(surface, EngineConfig::default()))
}

/// Summary of a scene file.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneReport {
    pub version: u32,
    pub elements: usize,
    pub by_kind: BTreeMap<&'static str, usize>,
    pub bounds: Option<Rect>,
}

impl fmt::Display for SceneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version:  {}", self.version)?;
        writeln!(f, "elements: {}", self.elements)?;
        for (kind, count) in &self.by_kind {
            writeln!(f, "  {kind:<10} {count}")?;
        }
        match self.bounds {
            Some(b) => write!(
                f,
                "bounds:   ({:.1}, {:.1}) to ({:.1}, {:.1})",
                b.x0, b.y0, b.x1, b.y1
            ),
            None => write!(f, "bounds:   empty"),
        }
    }
}

pub fn inspect(path: &Path) -> CliResult<SceneReport> {
    let document = SceneDocument::from_json(&read(path)?).map_err(scene_error(path))?;
    let mut by_kind = BTreeMap::new();
    for shape in &document.elements {
        *by_kind.entry(shape.kind().as_str()).or_insert(0) += 1;
    }
    let bounds = document
        .elements
        .iter()
        .map(|shape| shape.bounds())
        .reduce(|acc, b| acc.union(b));
    Ok(SceneReport {
        version: document.version,
        elements: document.elements.len(),
        by_kind,
        bounds,
    })
}

/// Convert a diagram and write the resulting scene. With `into`, the shapes
/// are added on top of that scene. Returns the number of shapes added.
pub fn import_diagram_file(diagram: &Path, into: Option<&Path>, out: &Path) -> CliResult<usize> {
    let shapes = import_diagram(&read(diagram)?).map_err(|source| CliError::Diagram {
        path: diagram.to_path_buf(),
        source,
    })?;
    let mut engine = headless_engine(DEFAULT_VIEWPORT)?;
    if let Some(base) = into {
        engine.from_json(&read(base)?).map_err(scene_error(base))?;
    }
    let added = engine.add_shapes(shapes).len();
    write(out, &engine.to_json().map_err(scene_error(out))?)?;
    log::info!("Imported {added} shapes from {} into {}", diagram.display(), out.display());
    Ok(added)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    pub stats: ReplayStats,
    pub shapes: usize,
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} steps, {} shapes, {} refused tool changes, {} unhandled keys",
            self.stats.steps, self.shapes, self.stats.refused_tool_changes, self.stats.unhandled_keys
        )
    }
}

/// Replay a pointer script against a scene and write the result to `out`
/// (or back to `scene`). A missing scene file starts from an empty canvas.
pub fn replay(scene: &Path, script: &Path, out: Option<&Path>, viewport: Size) -> CliResult<ReplayReport> {
    let steps = parse_script(&read(script)?).map_err(|source| CliError::Script {
        path: script.to_path_buf(),
        source,
    })?;
    let mut engine = headless_engine(viewport)?;
    if scene.exists() {
        engine.from_json(&read(scene)?).map_err(scene_error(scene))?;
    } else {
        log::info!("{} does not exist, starting from an empty canvas", scene.display());
    }

    let stats = run_script(&mut engine, &steps);
    let target = out.unwrap_or(scene);
    write(target, &engine.to_json().map_err(scene_error(target))?)?;
    Ok(ReplayReport {
        stats,
        shapes: engine.scene().len(),
    })
}

/// Fields to change; `None` leaves a field alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PreferenceUpdate {
    pub layout_mode: Option<LayoutMode>,
    pub sidebar_width: Option<f64>,
    pub show_grid_lines: Option<bool>,
    pub snap_to_grid: Option<bool>,
}

pub fn preference_store(data_dir: Option<&Path>) -> CliResult<FilePreferenceStore> {
    Ok(match data_dir {
        Some(dir) => FilePreferenceStore::new(dir)?,
        None => FilePreferenceStore::default_location()?,
    })
}

pub fn show_preferences<P: PreferenceStore>(store: P) -> LayoutPreferences {
    *LayoutPreferenceManager::load(store).preferences()
}

pub fn set_preferences<P: PreferenceStore>(store: P, update: PreferenceUpdate) -> CliResult<LayoutPreferences> {
    let mut manager = LayoutPreferenceManager::load(store);
    if let Some(mode) = update.layout_mode {
        manager.set_layout_mode(mode)?;
    }
    if let Some(width) = update.sidebar_width {
        manager.set_sidebar_width(width)?;
    }
    if let Some(show) = update.show_grid_lines {
        manager.set_show_grid_lines(show)?;
    }
    if let Some(snap) = update.snap_to_grid {
        manager.set_snap_to_grid(snap)?;
    }
    Ok(*manager.preferences())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use studyboard_core::layout::MAX_SIDEBAR_WIDTH;
    use tempfile::tempdir;

    const DIAGRAM: &str = r#"{
        "nodes": [
            {"id": "q", "type": "diamond", "label": "Ready?", "x": 0, "y": 0},
            {"id": "go", "type": "rectangle", "label": "Start", "x": 300, "y": 0}
        ],
        "connections": [{"from": "q", "to": "go", "label": "yes"}]
    }"#;

    #[test]
    fn test_import_then_inspect() {
        let dir = tempdir().unwrap();
        let diagram = dir.path().join("diagram.json");
        let out = dir.path().join("scene.json");
        fs::write(&diagram, DIAGRAM).unwrap();

        // Two shapes, two labels, one arrow, one arrow label.
        assert_eq!(import_diagram_file(&diagram, None, &out).unwrap(), 6);

        let report = inspect(&out).unwrap();
        assert_eq!(report.version, 1);
        assert_eq!(report.elements, 6);
        assert_eq!(report.by_kind.get("text"), Some(&3));
        assert_eq!(report.by_kind.get("arrow"), Some(&1));
        assert!(report.bounds.is_some());

        // Importing on top of an existing scene keeps what was there.
        let merged = dir.path().join("merged.json");
        assert_eq!(import_diagram_file(&diagram, Some(&out), &merged).unwrap(), 6);
        assert_eq!(inspect(&merged).unwrap().elements, 12);
    }

    #[test]
    fn test_inspect_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            inspect(&dir.path().join("missing.json")),
            Err(CliError::Read { .. })
        ));
        let future = dir.path().join("future.json");
        fs::write(&future, r#"{"version": 99, "elements": []}"#).unwrap();
        assert!(matches!(
            inspect(&future),
            Err(CliError::Scene {
                source: SceneError::UnsupportedVersion { found: 99, .. },
                ..
            })
        ));
        let empty = dir.path().join("legacy.json");
        fs::write(&empty, "[]").unwrap();
        assert_eq!(inspect(&empty).unwrap().to_string().lines().last(), Some("bounds:   empty"));
    }

    #[test]
    fn test_replay_writes_scene() {
        let dir = tempdir().unwrap();
        let scene = dir.path().join("scene.json");
        let script = dir.path().join("draw.txt");
        fs::write(&script, "tool rectangle\ndown 10 10\nmove 40 40\nup 110 60\n").unwrap();

        let report = replay(&scene, &script, None, DEFAULT_VIEWPORT).unwrap();
        assert_eq!(report.shapes, 1);
        assert_eq!(report.stats.steps, 4);

        let bounds = inspect(&scene).unwrap().bounds.unwrap();
        assert_eq!(bounds, Rect::new(10.0, 10.0, 110.0, 60.0));

        fs::write(&script, "down 50 30\nup 50 30\nkey Delete\n").unwrap();
        let out = dir.path().join("after.json");
        let report = replay(&scene, &script, Some(&out), DEFAULT_VIEWPORT).unwrap();
        assert_eq!(report.shapes, 0);
        assert_eq!(inspect(&scene).unwrap().elements, 1);
    }

    #[test]
    fn test_replay_rejects_bad_script() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("bad.txt");
        fs::write(&script, "tool select\nwiggle\n").unwrap();
        let err = replay(&dir.path().join("s.json"), &script, None, DEFAULT_VIEWPORT).unwrap_err();
        assert!(err.to_string().ends_with("line 2: unknown command `wiggle`"));

        fs::write(&script, "tool select\n").unwrap();
        assert!(matches!(
            replay(&dir.path().join("s.json"), &script, None, Size::new(0.0, 10.0)),
            Err(CliError::InvalidViewport { .. })
        ));
    }

    #[test]
    fn test_preferences_round_trip() {
        let dir = tempdir().unwrap();
        let store = preference_store(Some(dir.path())).unwrap();
        assert_eq!(show_preferences(store.clone()), LayoutPreferences::default());

        let update = PreferenceUpdate {
            layout_mode: Some(LayoutMode::SidebarRight),
            sidebar_width: Some(1000.0),
            snap_to_grid: Some(true),
            ..Default::default()
        };
        let saved = set_preferences(store, update).unwrap();
        assert_eq!(saved.sidebar_width, MAX_SIDEBAR_WIDTH);

        let reloaded = show_preferences(preference_store(Some(dir.path())).unwrap());
        assert_eq!(reloaded, saved);
        assert_eq!(reloaded.layout_mode, LayoutMode::SidebarRight);
        assert!(!reloaded.show_grid_lines);
    }
}

//! StudyBoard Core Library
//!
//! Platform-agnostic engine for the StudyBoard freehand canvas: shapes, the
//! scene, pointer tools, selection, rendering onto an abstract surface, and
//! persistence.

pub mod camera;
pub mod canvas;
pub mod diagram;
pub mod geometry;
pub mod layout;
pub mod render;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod snap;
pub mod storage;
pub mod tools;

pub use camera::{Camera, ZoomInfo};
pub use canvas::{CanvasEngine, EngineConfig};
pub use diagram::{DiagramError, DiagramSpec, diagram_to_shapes, import_diagram};
pub use layout::{LayoutMode, LayoutPreferenceManager, LayoutPreferences, PreferenceStore};
pub use render::{DisplayList, DrawCommand, RenderSurface};
pub use scene::{Scene, SceneDocument, SceneError};
pub use selection::{Corner, SelectionController};
pub use shapes::{Shape, ShapeId, ShapeKind, ShapeStyle};
pub use snap::{GRID_SIZE, snap_to_grid};
pub use storage::{Storage, StorageError};
pub use tools::{Gesture, ToolKind};

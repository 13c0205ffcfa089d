//! The canvas engine: scene, tools, selection, viewport and rendering.

use crate::camera::{Camera, ZoomInfo};
use crate::layout::LayoutPreferences;
use crate::render::{RenderSurface, measure_text_block, render_grid, render_shape};
use crate::scene::{Scene, SceneDocument, SceneResult};
use crate::selection::{SelectionController, is_point_in_shape};
use crate::shapes::{
    CornerStyle, FillPattern, FontFamily, FontSize, SerializableColor, Shape, ShapeId, ShapeKind,
    ShapeStyle, Sloppiness, StrokeStyle, StrokeWidth, StyleChange, Text, TextAlign,
};
use crate::snap::{GRID_SIZE, snap_to_grid};
use crate::storage::{Storage, StorageError};
use crate::tools::{Gesture, ToolKind};
use kurbo::{Affine, Point, Size};
use serde::{Deserialize, Serialize};

/// Ramer-Douglas-Peucker tolerance applied to finished free-draw strokes.
pub const FREEHAND_SIMPLIFY_TOLERANCE: f64 = 0.5;

/// Engine construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
    /// Grid spacing for grid lines and snapping, in world units.
    pub grid_size: f64,
    pub background: SerializableColor,
    pub selection_color: SerializableColor,
    pub grid_color: SerializableColor,
    pub device_pixel_ratio: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 5.0,
            zoom_step: crate::camera::ZOOM_STEP,
            grid_size: GRID_SIZE,
            background: SerializableColor::white(),
            selection_color: SerializableColor::new(0x69, 0x65, 0xdb, 0xff),
            grid_color: SerializableColor::new(0xe5, 0xe5, 0xe5, 0xff),
            device_pixel_ratio: 1.0,
        }
    }
}

/// Called after every committed scene mutation.
pub type ChangeListener = Box<dyn FnMut(&Scene)>;

/// The interactive canvas.
///
/// Pointer positions are in CSS pixels relative to the surface; the camera
/// maps them into world coordinates. Every mutating call redraws the surface
/// before it returns.
pub struct CanvasEngine<S: RenderSurface> {
    surface: S,
    scene: Scene,
    selection: SelectionController,
    tool: ToolKind,
    style: ShapeStyle,
    camera: Camera,
    config: EngineConfig,
    viewport: Size,
    gesture: Gesture,
    show_grid_lines: bool,
    snap_to_grid: bool,
    read_only: bool,
    destroyed: bool,
    listeners: Vec<ChangeListener>,
}

impl<S: RenderSurface> CanvasEngine<S> {
    pub fn new(surface: S, mut config: EngineConfig) -> Self {
        if !(config.device_pixel_ratio.is_finite() && config.device_pixel_ratio > 0.0) {
            config.device_pixel_ratio = 1.0;
        }
        let size = surface.size();
        let viewport = Size::new(
            size.width / config.device_pixel_ratio,
            size.height / config.device_pixel_ratio,
        );
        let camera = Camera::with_limits(config.min_zoom, config.max_zoom, config.zoom_step);
        config.min_zoom = camera.min_zoom;
        config.max_zoom = camera.max_zoom;
        config.zoom_step = camera.zoom_step;
        let mut engine = Self {
            surface,
            scene: Scene::new(),
            selection: SelectionController::new(),
            tool: ToolKind::default(),
            style: ShapeStyle::default(),
            camera,
            config,
            viewport,
            gesture: Gesture::Idle,
            show_grid_lines: false,
            snap_to_grid: false,
            read_only: false,
            destroyed: false,
            listeners: Vec::new(),
        };
        engine.render();
        engine
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.selection.get_selected_shape(&self.scene)
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Style applied to new shapes.
    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Viewport size in CSS pixels.
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn show_grid_lines(&self) -> bool {
        self.show_grid_lines
    }

    pub fn snap_to_grid(&self) -> bool {
        self.snap_to_grid
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn is_interactive(&self) -> bool {
        !self.destroyed && !self.read_only
    }

    // --- tools and style ---

    /// Switch tools. Refused while a gesture is in progress. Leaving the
    /// select tool drops the selection.
    pub fn set_tool(&mut self, tool: ToolKind) -> bool {
        if self.destroyed {
            return false;
        }
        if !self.gesture.is_idle() {
            log::debug!("Ignoring switch to {tool} during {:?}", self.gesture);
            return false;
        }
        if tool != ToolKind::Select {
            self.select(None);
        }
        log::debug!("Tool: {} -> {tool}", self.tool);
        self.tool = tool;
        self.render();
        true
    }

    pub fn set_stroke_width(&mut self, width: StrokeWidth) {
        self.apply_style_change(StyleChange::StrokeWidth(width));
    }

    pub fn set_stroke_color(&mut self, color: SerializableColor) {
        self.apply_style_change(StyleChange::StrokeColor(color));
    }

    pub fn set_fill_color(&mut self, color: SerializableColor) {
        self.apply_style_change(StyleChange::FillColor(color));
    }

    pub fn set_stroke_style(&mut self, style: StrokeStyle) {
        self.apply_style_change(StyleChange::StrokeStyle(style));
    }

    pub fn set_rough_style(&mut self, sloppiness: Sloppiness) {
        self.apply_style_change(StyleChange::Sloppiness(sloppiness));
    }

    pub fn set_fill_pattern(&mut self, pattern: FillPattern) {
        self.apply_style_change(StyleChange::FillPattern(pattern));
    }

    pub fn set_corner_style(&mut self, corners: CornerStyle) {
        self.apply_style_change(StyleChange::CornerStyle(corners));
    }

    pub fn set_font_size(&mut self, size: FontSize) {
        self.apply_style_change(StyleChange::FontSize(size));
    }

    pub fn set_font_family(&mut self, family: FontFamily) {
        self.apply_style_change(StyleChange::FontFamily(family));
    }

    pub fn set_text_align(&mut self, align: TextAlign) {
        self.apply_style_change(StyleChange::TextAlign(align));
    }

    /// Update the default for new shapes and, when the selected shape has the
    /// field, the selection.
    fn apply_style_change(&mut self, change: StyleChange) {
        if !self.is_interactive() {
            return;
        }
        self.style.apply(change);
        let Some(id) = self.selection.selected_id().cloned() else {
            return;
        };
        let Some(shape) = self.scene.get_mut(&id) else {
            return;
        };
        if shape.apply_style_change(change) {
            measure_if_needed(&self.surface, shape);
            self.notify();
            self.render();
        }
    }

    /// Replace the content of the selected text shape. Returns whether a
    /// text shape was selected.
    pub fn set_text(&mut self, content: &str) -> bool {
        if !self.is_interactive() {
            return false;
        }
        let Some(id) = self.selection.selected_id().cloned() else {
            return false;
        };
        let Some(text) = self.scene.get_mut(&id).and_then(Shape::as_text_mut) else {
            return false;
        };
        text.set_content(content.to_string());
        if let Some(size) = measure_text_block(&self.surface, text) {
            text.set_measured_size(size);
        }
        self.notify();
        self.render();
        true
    }

    // --- scene operations ---

    /// Append shapes on top, keeping their ids unless already taken.
    pub fn add_shapes(&mut self, shapes: impl IntoIterator<Item = Shape>) -> Vec<ShapeId> {
        if self.destroyed {
            return Vec::new();
        }
        let ids: Vec<ShapeId> = shapes
            .into_iter()
            .map(|mut shape| {
                shape.normalize();
                measure_if_needed(&self.surface, &mut shape);
                self.scene.add_shape(shape)
            })
            .collect();
        if !ids.is_empty() {
            log::debug!("Added {} shapes", ids.len());
            self.notify();
            self.render();
        }
        ids
    }

    /// Replace the scene and switch to read-only viewing.
    pub fn load_elements(&mut self, shapes: impl IntoIterator<Item = Shape>) {
        if self.destroyed {
            return;
        }
        self.replace_scene(shapes);
        self.read_only = true;
        self.render();
    }

    /// Remove every shape.
    pub fn clear(&mut self) {
        if self.destroyed {
            return;
        }
        self.scene.clear();
        self.selection.set_selected_shape(None);
        self.gesture = Gesture::Idle;
        self.notify();
        self.render();
    }

    /// Remove the selected shape. Returns whether a shape was removed.
    pub fn delete_selected(&mut self) -> bool {
        if !self.is_interactive() {
            return false;
        }
        let Some(id) = self.selection.selected_id().cloned() else {
            return false;
        };
        self.selection.set_selected_shape(None);
        if matches!(self.gesture, Gesture::Dragging | Gesture::Resizing) {
            self.gesture = Gesture::Idle;
        }
        let removed = self.scene.remove_shape(&id).is_some();
        if removed {
            log::debug!("Deleted {id}");
            self.notify();
        }
        self.render();
        removed
    }

    fn replace_scene(&mut self, shapes: impl IntoIterator<Item = Shape>) {
        let surface = &self.surface;
        self.scene = Scene::from_shapes(shapes.into_iter().map(|mut shape| {
            shape.normalize();
            measure_if_needed(surface, &mut shape);
            shape
        }));
        self.selection.set_selected_shape(None);
        self.gesture = Gesture::Idle;
    }

    fn select(&mut self, id: Option<ShapeId>) {
        if let Some(previous) = self.selection.selected_id().cloned() {
            if Some(&previous) != id.as_ref() {
                self.prune_blank_text(&previous);
            }
        }
        self.selection.set_selected_shape(id);
    }

    /// Text left empty when it loses the selection is removed.
    fn prune_blank_text(&mut self, id: &ShapeId) {
        let blank = self
            .scene
            .get(id)
            .and_then(Shape::as_text)
            .is_some_and(Text::is_blank);
        if blank {
            log::debug!("Removing empty text {id}");
            self.scene.remove_shape(id);
            self.notify();
        }
    }

    // --- viewport ---

    /// Resize to `width` x `height` CSS pixels at the given device pixel
    /// ratio. The backing buffer is sized in device pixels.
    pub fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) {
        if self.destroyed {
            return;
        }
        let dpr = if device_pixel_ratio > 0.0 { device_pixel_ratio } else { 1.0 };
        self.config.device_pixel_ratio = dpr;
        self.viewport = Size::new(width.max(0.0), height.max(0.0));
        self.surface
            .resize(Size::new(self.viewport.width * dpr, self.viewport.height * dpr));
        self.render();
    }

    fn viewport_center(&self) -> Point {
        Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0)
    }

    pub fn zoom_in(&mut self) {
        if self.destroyed {
            return;
        }
        self.camera.zoom_in(self.viewport_center());
        self.render();
    }

    pub fn zoom_out(&mut self) {
        if self.destroyed {
            return;
        }
        self.camera.zoom_out(self.viewport_center());
        self.render();
    }

    /// Back to scale 1, or the nearest allowed zoom, with no pan.
    pub fn reset_zoom(&mut self) {
        if self.destroyed {
            return;
        }
        self.camera.reset();
        self.render();
    }

    pub fn get_zoom_info(&self) -> ZoomInfo {
        self.camera.zoom_info()
    }

    pub fn set_show_grid_lines(&mut self, show: bool) {
        self.show_grid_lines = show;
        self.render();
    }

    pub fn set_snap_to_grid(&mut self, snap: bool) {
        self.snap_to_grid = snap;
    }

    pub fn apply_layout_preferences(&mut self, preferences: &LayoutPreferences) {
        self.snap_to_grid = preferences.snap_to_grid;
        self.set_show_grid_lines(preferences.show_grid_lines);
    }

    fn snap(&self, world: Point) -> Point {
        if self.snap_to_grid {
            snap_to_grid(world, self.config.grid_size)
        } else {
            world
        }
    }

    // --- input ---

    pub fn pointer_down(&mut self, screen: Point) {
        if !self.is_interactive() || !self.gesture.is_idle() {
            return;
        }
        let world = self.camera.screen_to_world(screen);
        match self.tool {
            ToolKind::Select => self.begin_select(world),
            ToolKind::Pan => self.gesture = Gesture::Panning { last: screen },
            ToolKind::Eraser => {
                let erased = self.erase_at(world);
                self.gesture = Gesture::Erasing { erased, last: world };
            }
            ToolKind::Text => self.begin_text(world),
            tool => {
                if let Some(kind) = tool.shape_kind() {
                    self.begin_creating(kind, world);
                }
            }
        }
        self.render();
    }

    pub fn pointer_move(&mut self, screen: Point) {
        if !self.is_interactive() {
            return;
        }
        if self.track_pointer(screen) {
            self.render();
        }
    }

    pub fn pointer_up(&mut self, screen: Point) {
        if !self.is_interactive() {
            return;
        }
        self.track_pointer(screen);
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle | Gesture::Panning { .. } => {}
            Gesture::Creating { id, .. } => self.finish_creating(&id),
            Gesture::Dragging | Gesture::Resizing => {
                let changed = self.selection.has_changed(&self.scene);
                self.selection.stop_dragging();
                self.selection.stop_resizing();
                if changed {
                    self.notify();
                }
            }
            Gesture::Erasing { erased, .. } => {
                if erased {
                    self.notify();
                }
            }
        }
        self.render();
    }

    /// Handle a key press. Returns whether the key did anything.
    pub fn key_down(&mut self, key: &str) -> bool {
        if !self.is_interactive() || !self.gesture.is_idle() {
            return false;
        }
        match key {
            "Delete" | "Backspace" => self.delete_selected(),
            "Escape" => {
                let had_selection = self.selection.selected_id().is_some();
                self.select(None);
                self.render();
                had_selection
            }
            _ => false,
        }
    }

    fn begin_select(&mut self, world: Point) {
        if self.selection.start_resizing(&self.scene, world, self.snap(world)) {
            self.gesture = Gesture::Resizing;
            return;
        }
        match self.scene.topmost_where(|shape| is_point_in_shape(world, shape)) {
            Some(id) => {
                self.select(Some(id));
                let start = self.snap(world);
                self.selection.start_dragging(&self.scene, start);
                self.gesture = Gesture::Dragging;
            }
            None => self.select(None),
        }
    }

    fn begin_text(&mut self, world: Point) {
        let existing = self
            .scene
            .topmost_where(|shape| shape.kind() == ShapeKind::Text && is_point_in_shape(world, shape));
        if let Some(id) = existing {
            self.select(Some(id));
            return;
        }
        let start = self.snap(world);
        let shape = Shape::create(ShapeKind::Text, start, start, &self.style);
        self.select(None);
        let id = self.scene.add_shape(shape);
        self.selection.set_selected_shape(Some(id.clone()));
        self.gesture = Gesture::Creating { id, start };
    }

    fn begin_creating(&mut self, kind: ShapeKind, world: Point) {
        let start = if kind == ShapeKind::FreeDraw { world } else { self.snap(world) };
        self.select(None);
        let id = self.scene.add_shape(Shape::create(kind, start, start, &self.style));
        log::debug!("Creating {kind:?} {id}");
        self.gesture = Gesture::Creating { id, start };
    }

    /// Feed a pointer position to the active gesture. Returns whether
    /// anything changed.
    fn track_pointer(&mut self, screen: Point) -> bool {
        let world = self.camera.screen_to_world(screen);
        match self.gesture.clone() {
            Gesture::Idle => false,
            Gesture::Creating { id, start } => {
                let free_draw = self.scene.get(&id).is_some_and(|s| s.kind() == ShapeKind::FreeDraw);
                let point = if free_draw { world } else { self.snap(world) };
                match self.scene.get_mut(&id) {
                    Some(shape) => {
                        shape.drag_to(start, point);
                        true
                    }
                    None => false,
                }
            }
            Gesture::Dragging => {
                let point = self.snap(world);
                self.selection.update_dragging(&mut self.scene, point);
                true
            }
            Gesture::Resizing => {
                let point = self.snap(world);
                self.selection.update_resizing(&mut self.scene, point);
                true
            }
            Gesture::Panning { last } => {
                self.camera.pan(screen - last);
                self.gesture = Gesture::Panning { last: screen };
                true
            }
            Gesture::Erasing { erased, last } => {
                // Resting on one spot erases a single layer.
                if world == last {
                    return false;
                }
                let now = self.erase_at(world);
                self.gesture = Gesture::Erasing {
                    erased: erased || now,
                    last: world,
                };
                now
            }
        }
    }

    fn finish_creating(&mut self, id: &ShapeId) {
        let Some(shape) = self.scene.get_mut(id) else {
            return;
        };
        shape.normalize();
        if let Shape::FreeDraw(stroke) = shape {
            stroke.simplify(FREEHAND_SIMPLIFY_TOLERANCE);
        }
        if shape.is_degenerate() {
            log::debug!("Discarding zero-size {:?}", shape.kind());
            self.scene.remove_shape(id);
            return;
        }
        self.notify();
    }

    /// Remove the topmost shape under `world`.
    fn erase_at(&mut self, world: Point) -> bool {
        let Some(id) = self.scene.topmost_where(|shape| is_point_in_shape(world, shape)) else {
            return false;
        };
        if self.selection.selected_id() == Some(&id) {
            self.selection.set_selected_shape(None);
        }
        self.scene.remove_shape(&id);
        log::debug!("Erased {id}");
        true
    }

    // --- persistence ---

    /// Value copy of the shapes in paint order.
    pub fn snapshot(&self) -> Vec<Shape> {
        self.scene.snapshot()
    }

    pub fn to_document(&self) -> SceneDocument {
        self.scene.to_document()
    }

    pub fn to_json(&self) -> SceneResult<String> {
        self.scene.to_json()
    }

    /// Replace the scene from a scene file and leave read-only mode.
    pub fn from_json(&mut self, json: &str) -> SceneResult<()> {
        let document = SceneDocument::from_json(json)?;
        if !self.destroyed {
            self.replace_scene(document.elements);
            self.read_only = false;
            self.render();
        }
        Ok(())
    }

    /// Load a canvas from storage. A failed load leaves an empty scene.
    /// Returns whether the scene was loaded.
    pub async fn load_from_storage<St: Storage + ?Sized>(&mut self, storage: &St, canvas_id: &str) -> bool {
        let (elements, loaded) = match storage.load(canvas_id).await {
            Ok(document) => (document.elements, true),
            Err(StorageError::NotFound(_)) => {
                log::info!("Canvas {canvas_id} has no saved scene");
                (Vec::new(), false)
            }
            Err(e) => {
                log::warn!("Could not load canvas {canvas_id}: {e}");
                (Vec::new(), false)
            }
        };
        if self.destroyed {
            return false;
        }
        self.replace_scene(elements);
        self.read_only = false;
        self.render();
        loaded
    }

    /// Register a listener called after every committed scene change.
    pub fn on_change(&mut self, listener: impl FnMut(&Scene) + 'static) {
        if !self.destroyed {
            self.listeners.push(Box::new(listener));
        }
    }

    fn notify(&mut self) {
        for listener in &mut self.listeners {
            listener(&self.scene);
        }
    }

    /// Release listeners and stop reacting to input. Safe to call again.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.listeners.clear();
        self.selection.set_selected_shape(None);
        self.gesture = Gesture::Idle;
        self.destroyed = true;
        log::debug!("Canvas engine destroyed");
    }

    // --- rendering ---

    /// Redraw everything: background, grid, shapes in paint order, then the
    /// selection chrome.
    pub fn render(&mut self) {
        if self.destroyed {
            return;
        }
        let zoom = self.camera.zoom;
        self.surface.clear(self.config.background.into());
        self.surface
            .set_transform(Affine::scale(self.config.device_pixel_ratio) * self.camera.transform());
        if self.show_grid_lines {
            render_grid(
                &mut self.surface,
                self.camera.visible_world_rect(self.viewport),
                self.config.grid_size,
                self.config.grid_color.into(),
                zoom,
            );
        }
        for shape in self.scene.shapes_ordered() {
            render_shape(&mut self.surface, shape, zoom);
        }
        if let Some(selected) = self.selection.get_selected_shape(&self.scene) {
            SelectionController::draw_selection_box(
                &mut self.surface,
                selected.bounds(),
                self.config.selection_color.into(),
                zoom,
            );
        }
    }
}

/// Measure a text shape that has no stored size yet.
fn measure_if_needed<S: RenderSurface + ?Sized>(surface: &S, shape: &mut Shape) {
    let Some(text) = shape.as_text_mut() else {
        return;
    };
    if text.has_measured_size() {
        return;
    }
    if let Some(size) = measure_text_block(surface, text) {
        text.set_measured_size(size);
    }
}

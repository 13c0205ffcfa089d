//! End-to-end engine sessions: drawing through the camera, layout
//! preferences, diagram import and persistence.

use kurbo::{Point, Rect, Size};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use studyboard_core::layout::MemoryPreferenceStore;
use studyboard_core::storage::{AutoSaveManager, FileStorage};
use studyboard_core::{
    CanvasEngine, DisplayList, EngineConfig, LayoutPreferenceManager, Shape, ShapeKind, ToolKind,
    import_diagram, snap_to_grid,
};
use tempfile::tempdir;

fn block_on<F: Future>(f: F) -> F::Output {
    let mut cx = Context::from_waker(Waker::noop());
    let mut f = std::pin::pin!(f);
    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}

fn new_engine() -> CanvasEngine<DisplayList> {
    CanvasEngine::new(
        DisplayList::new(Size::new(800.0, 600.0)).with_approximate_metrics(),
        EngineConfig::default(),
    )
}

fn drag(engine: &mut CanvasEngine<DisplayList>, from: Point, to: Point) {
    engine.pointer_down(from);
    engine.pointer_move(from.midpoint(to));
    engine.pointer_up(to);
}

#[test]
fn test_drawing_session_with_preferences() {
    let mut prefs = LayoutPreferenceManager::load(MemoryPreferenceStore::new());
    prefs.set_snap_to_grid(true).unwrap();
    prefs.set_show_grid_lines(true).unwrap();

    let mut engine = new_engine();
    engine.apply_layout_preferences(prefs.preferences());
    assert!(engine.snap_to_grid());
    assert!(engine.show_grid_lines());

    let changes = Rc::new(Cell::new(0));
    let counter = changes.clone();
    engine.on_change(move |_| counter.set(counter.get() + 1));

    engine.set_tool(ToolKind::Rectangle);
    drag(&mut engine, Point::new(13.0, 17.0), Point::new(118.0, 62.0));
    assert_eq!(changes.get(), 1);
    let rect = engine.scene().shapes_ordered().next().unwrap().bounds();
    assert_eq!(rect, Rect::new(20.0, 20.0, 120.0, 60.0));

    // Draw through a zoomed and panned camera.
    engine.zoom_in();
    engine.set_tool(ToolKind::Pan);
    drag(&mut engine, Point::new(100.0, 100.0), Point::new(150.0, 120.0));
    assert_eq!(changes.get(), 1);

    let (a, b) = (Point::new(300.0, 300.0), Point::new(420.0, 380.0));
    let expected_start = snap_to_grid(engine.camera().screen_to_world(a), 20.0);
    let expected_end = snap_to_grid(engine.camera().screen_to_world(b), 20.0);
    engine.set_tool(ToolKind::Arrow);
    drag(&mut engine, a, b);
    assert_eq!(changes.get(), 2);

    let Some(Shape::Arrow(arrow)) = engine.scene().shapes_ordered().last() else {
        panic!("Expected Arrow shape on top");
    };
    assert!((arrow.start() - expected_start).hypot() < 1e-9);
    assert!((arrow.end() - expected_end).hypot() < 1e-9);

    // Select the rectangle on screen and delete it.
    engine.set_tool(ToolKind::Select);
    let on_screen = engine.camera().world_to_screen(Point::new(70.0, 40.0));
    engine.pointer_down(on_screen);
    engine.pointer_up(on_screen);
    assert_eq!(engine.selected_shape().map(Shape::kind), Some(ShapeKind::Rectangle));
    assert!(engine.key_down("Delete"));
    assert_eq!(changes.get(), 3);
    assert_eq!(engine.scene().len(), 1);
}

#[test]
fn test_imported_diagram_renders_labels() {
    let shapes = import_diagram(
        r#"{
            "nodes": [
                {"id": "cell", "type": "ellipse", "label": "Cell", "x": 40, "y": 40},
                {"id": "nucleus", "type": "circle", "label": "Nucleus", "x": 40, "y": 40}
            ],
            "connections": [{"from": "cell", "to": "nucleus", "label": "contains"}]
        }"#,
    )
    .unwrap();

    let mut engine = new_engine();
    let ids = engine.add_shapes(shapes);
    assert_eq!(ids.len(), 6);

    let texts: Vec<&str> = engine.surface().texts().collect();
    assert_eq!(texts, vec!["Cell", "Nucleus", "contains"]);

    let ellipses: Vec<Rect> = engine
        .scene()
        .shapes_ordered()
        .filter(|s| s.kind() == ShapeKind::Ellipse)
        .map(Shape::bounds)
        .collect();
    assert_eq!(ellipses.len(), 2);
    assert!(ellipses[1].x0 >= ellipses[0].x0 + 200.0);
}

#[test]
fn test_autosave_and_reload_from_files() {
    let dir = tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
    let mut autosave = AutoSaveManager::new(storage.clone(), "biology-notes");

    let mut engine = new_engine();
    let dirty = Rc::new(Cell::new(false));
    let flag = dirty.clone();
    engine.on_change(move |_| flag.set(true));

    engine.set_tool(ToolKind::FreeDraw);
    engine.pointer_down(Point::new(10.0, 10.0));
    for i in 1..=20 {
        engine.pointer_move(Point::new(10.0 + f64::from(i) * 5.0, 10.0 + f64::from(i % 3)));
    }
    engine.pointer_up(Point::new(120.0, 12.0));
    engine.set_tool(ToolKind::Text);
    engine.pointer_down(Point::new(200.0, 200.0));
    engine.pointer_up(Point::new(200.0, 200.0));
    assert!(engine.set_text("mitosis\nmeiosis"));

    if dirty.replace(false) {
        autosave.mark_dirty();
    }
    assert!(block_on(autosave.maybe_save(&engine.to_document())).unwrap());
    assert!(!block_on(autosave.maybe_save(&engine.to_document())).unwrap());
    assert_eq!(
        block_on(autosave.list_canvases()).unwrap(),
        vec!["biology-notes".to_string()]
    );

    let mut reloaded = new_engine();
    assert!(block_on(reloaded.load_from_storage(storage.as_ref(), "biology-notes")));
    assert_eq!(reloaded.snapshot(), engine.snapshot());
    assert!(!reloaded.is_read_only());

    let text = reloaded
        .scene()
        .shapes_ordered()
        .find_map(Shape::as_text)
        .unwrap();
    assert_eq!(text.content(), "mitosis\nmeiosis");
    assert!(text.has_measured_size());

    assert!(!block_on(reloaded.load_from_storage(storage.as_ref(), "chemistry")));
    assert!(reloaded.scene().is_empty());
}

#[test]
fn test_viewer_mode_ignores_input() {
    let mut engine = new_engine();
    engine.load_elements(import_diagram(r#"{"nodes": [{"id": "a", "x": 0, "y": 0}]}"#).unwrap());
    assert!(engine.is_read_only());

    engine.set_tool(ToolKind::Eraser);
    drag(&mut engine, Point::new(0.0, 0.0), Point::new(160.0, 80.0));
    assert_eq!(engine.scene().len(), 1);
    assert!(!engine.key_down("Delete"));
}

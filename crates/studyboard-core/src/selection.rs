//! Selection controller: the selected shape, move and resize gestures, hit
//! testing and selection chrome.
//!
//! The controller never owns or borrows a shape between calls. It keeps the
//! selected id and resolves it through the [`Scene`] on every operation, so a
//! shape removed from the scene simply reads as "no selection".

use crate::render::RenderSurface;
use crate::scene::Scene;
use crate::shapes::{Shape, ShapeId};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Stroke, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Pick tolerance for lines, arrows and free-draw strokes, in world units.
pub const HIT_TOLERANCE: f64 = 10.0;
/// Distance from a bounds corner that still grabs its resize handle.
pub const HANDLE_HIT_RADIUS: f64 = 10.0;
/// Gap between the shape bounds and the dashed selection outline.
pub const SELECTION_PADDING: f64 = 5.0;
/// Side of a corner marker in screen pixels.
pub const HANDLE_SIZE: f64 = 8.0;

/// Resize handle at a corner of the selection bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    #[serde(rename = "tl")]
    TopLeft,
    #[serde(rename = "tr")]
    TopRight,
    #[serde(rename = "bl")]
    BottomLeft,
    #[serde(rename = "br")]
    BottomRight,
}

impl Corner {
    /// Hit-test order.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Corner::TopLeft => "tl",
            Corner::TopRight => "tr",
            Corner::BottomLeft => "bl",
            Corner::BottomRight => "br",
        }
    }

    pub fn position(self, bounds: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(bounds.x0, bounds.y0),
            Corner::TopRight => Point::new(bounds.x1, bounds.y0),
            Corner::BottomLeft => Point::new(bounds.x0, bounds.y1),
            Corner::BottomRight => Point::new(bounds.x1, bounds.y1),
        }
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }
}

/// Normalized bounds of a shape in world coordinates.
pub fn get_shape_bounds(shape: &Shape) -> Rect {
    shape.bounds()
}

/// Whether a world point picks `shape`.
///
/// Strokes (line, arrow, free-draw) use a distance tolerance; filled kinds
/// use exact containment.
pub fn is_point_in_shape(point: Point, shape: &Shape) -> bool {
    match shape {
        Shape::Line(_) | Shape::Arrow(_) | Shape::FreeDraw(_) => shape.hit_test(point, HIT_TOLERANCE),
        Shape::Rectangle(_) | Shape::Diamond(_) | Shape::Ellipse(_) | Shape::Text(_) => {
            shape.hit_test(point, 0.0)
        }
    }
}

/// The corner handle within [`HANDLE_HIT_RADIUS`] of `point`, checked in
/// `tl, tr, bl, br` order.
pub fn get_resize_handle_at_point(point: Point, bounds: Rect) -> Option<Corner> {
    Corner::ALL
        .into_iter()
        .find(|corner| (point - corner.position(bounds)).hypot() <= HANDLE_HIT_RADIUS)
}

/// Resize a copy of `baseline` by dragging `handle` by `delta`. The opposite
/// corner of the baseline bounds stays put.
pub fn resize_shape(baseline: &Shape, handle: Corner, delta: Vec2) -> Shape {
    let bounds = baseline.bounds();
    let fixed = handle.opposite().position(bounds);
    let grabbed = handle.position(bounds);
    let moved = grabbed + delta;
    let new_box = Rect::from_points(fixed, moved);

    let mut shape = baseline.clone();
    match &mut shape {
        Shape::Rectangle(r) | Shape::Diamond(r) => r.set_rect(new_box),
        Shape::Ellipse(e) => e.set_rect(new_box),
        Shape::Text(t) => t.set_rect(new_box),
        Shape::Line(l) | Shape::Arrow(l) => {
            // Ties go to the start point.
            if (l.start() - grabbed).hypot() <= (l.end() - grabbed).hypot() {
                l.set_start(l.start() + delta);
            } else {
                l.set_end(l.end() + delta);
            }
        }
        Shape::FreeDraw(f) => {
            let old = grabbed - fixed;
            let new = moved - fixed;
            for p in &mut f.points {
                // A flat axis cannot be scaled, so it follows the pointer.
                p.x = if old.x.abs() > f64::EPSILON {
                    fixed.x + (p.x - fixed.x) * new.x / old.x
                } else {
                    p.x + delta.x
                };
                p.y = if old.y.abs() > f64::EPSILON {
                    fixed.y + (p.y - fixed.y) * new.y / old.y
                } else {
                    p.y + delta.y
                };
            }
        }
    }
    shape
}

#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    Dragging {
        start: Point,
        baseline: Shape,
    },
    Resizing {
        start: Point,
        baseline: Shape,
        handle: Corner,
    },
}

/// Tracks the selected shape and the move/resize gesture on it.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selected: Option<ShapeId>,
    gesture: Gesture,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection. Any gesture in progress is dropped.
    pub fn set_selected_shape(&mut self, id: Option<ShapeId>) {
        self.selected = id;
        self.gesture = Gesture::Idle;
    }

    /// The selected id as last set, whether or not it still resolves.
    pub fn selected_id(&self) -> Option<&ShapeId> {
        self.selected.as_ref()
    }

    /// The selected shape, if its id is still in the scene.
    pub fn get_selected_shape<'a>(&self, scene: &'a Scene) -> Option<&'a Shape> {
        self.selected.as_ref().and_then(|id| scene.get(id))
    }

    pub fn has_selection(&self, scene: &Scene) -> bool {
        self.get_selected_shape(scene).is_some()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.gesture, Gesture::Resizing { .. })
    }

    pub fn active_handle(&self) -> Option<Corner> {
        match self.gesture {
            Gesture::Resizing { handle, .. } => Some(handle),
            _ => None,
        }
    }

    /// Whether the active drag or resize has left the shape different from
    /// its baseline.
    pub fn has_changed(&self, scene: &Scene) -> bool {
        let baseline = match &self.gesture {
            Gesture::Dragging { baseline, .. } | Gesture::Resizing { baseline, .. } => baseline,
            Gesture::Idle => return false,
        };
        self.get_selected_shape(scene).is_some_and(|shape| shape != baseline)
    }

    /// Begin moving the selected shape. No-op without a selection.
    pub fn start_dragging(&mut self, scene: &Scene, point: Point) {
        let Some(shape) = self.get_selected_shape(scene) else {
            log::trace!("start_dragging without a selection");
            return;
        };
        self.gesture = Gesture::Dragging {
            start: point,
            baseline: shape.clone(),
        };
    }

    /// Move the selected shape to baseline + total pointer displacement.
    pub fn update_dragging(&mut self, scene: &mut Scene, point: Point) {
        let Gesture::Dragging { start, baseline } = &self.gesture else {
            return;
        };
        let Some(live) = self.selected.as_ref().and_then(|id| scene.get_mut(id)) else {
            return;
        };
        let mut moved = baseline.clone();
        moved.translate(point - *start);
        *live = moved;
    }

    pub fn stop_dragging(&mut self) {
        if self.is_dragging() {
            self.gesture = Gesture::Idle;
        }
    }

    /// Begin resizing if `point` grabs a corner handle of the selected
    /// shape's bounds. Later displacements are measured from `origin`, which
    /// is `point` unless the caller snaps pointer positions. Returns whether
    /// a resize started.
    pub fn start_resizing(&mut self, scene: &Scene, point: Point, origin: Point) -> bool {
        let Some(shape) = self.get_selected_shape(scene) else {
            return false;
        };
        let Some(handle) = get_resize_handle_at_point(point, get_shape_bounds(shape)) else {
            return false;
        };
        log::debug!("Resizing {} from {}", shape.id(), handle.as_str());
        self.gesture = Gesture::Resizing {
            start: origin,
            baseline: shape.clone(),
            handle,
        };
        true
    }

    /// Resize the selected shape from its baseline by the total pointer
    /// displacement.
    pub fn update_resizing(&mut self, scene: &mut Scene, point: Point) {
        let Gesture::Resizing {
            start,
            baseline,
            handle,
        } = &self.gesture
        else {
            return;
        };
        let Some(live) = self.selected.as_ref().and_then(|id| scene.get_mut(id)) else {
            return;
        };
        *live = resize_shape(baseline, *handle, point - *start);
    }

    pub fn stop_resizing(&mut self) {
        if self.is_resizing() {
            self.gesture = Gesture::Idle;
        }
    }

    /// Draw the dashed selection outline and corner markers around `bounds`.
    /// Sizes are divided by `zoom` so the chrome keeps its on-screen size.
    pub fn draw_selection_box<S: RenderSurface + ?Sized>(
        surface: &mut S,
        bounds: Rect,
        color: Color,
        zoom: f64,
    ) {
        let zoom = zoom.max(f64::EPSILON);
        let outline = bounds.inflate(SELECTION_PADDING, SELECTION_PADDING);
        let dash = 5.0 / zoom;
        let stroke = Stroke::new(1.0 / zoom).with_dashes(0.0, [dash, dash]);
        surface.stroke(&outline.to_path(0.1), &stroke, color);

        let half = HANDLE_SIZE / zoom / 2.0;
        let mut markers = BezPath::new();
        for corner in Corner::ALL {
            let c = corner.position(bounds);
            markers.extend(Rect::new(c.x - half, c.y - half, c.x + half, c.y + half).path_elements(0.1));
        }
        surface.fill(&markers, Color::WHITE);
        surface.stroke(&markers, &Stroke::new(1.0 / zoom), color);
    }
}

//! Line and arrow shapes.

use super::{
    default_stroke_color, SerializableColor, ShapeId, ShapeTrait, Sloppiness, StrokeStyle,
    StrokeWidth, StyleChange,
};
use crate::geometry::distance_to_segment;
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Length of an arrowhead barb along the shaft.
pub const ARROW_HEAD_SIZE: f64 = 15.0;

/// A straight segment from `(x, y)` to `(x2, y2)`. Backs both the `line` and
/// `arrow` variants; arrows add a head at the end point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub(crate) id: ShapeId,
    pub x: f64,
    pub y: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default)]
    pub stroke_width: StrokeWidth,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: SerializableColor,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    #[serde(default, rename = "roughStyle")]
    pub sloppiness: Sloppiness,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: ShapeId::new(),
            x: start.x,
            y: start.y,
            x2: end.x,
            y2: end.y,
            stroke_width: StrokeWidth::default(),
            stroke_color: default_stroke_color(),
            stroke_style: StrokeStyle::default(),
            sloppiness: Sloppiness::default(),
        }
    }

    pub fn start(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    pub fn set_start(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y;
    }

    pub fn set_end(&mut self, p: Point) {
        self.x2 = p.x;
        self.y2 = p.y;
    }

    pub fn length(&self) -> f64 {
        (self.end() - self.start()).hypot()
    }

    /// The two barb tips of an arrowhead at the end point, or `None` for a
    /// zero-length segment.
    pub fn arrow_head(&self) -> Option<[Point; 2]> {
        let shaft = self.end() - self.start();
        let len = shaft.hypot();
        if len < f64::EPSILON {
            return None;
        }
        let dir = shaft / len;
        let perp = Vec2::new(-dir.y, dir.x);
        let back = self.end() - dir * ARROW_HEAD_SIZE;
        Some([
            back + perp * (ARROW_HEAD_SIZE * 0.5),
            back - perp * (ARROW_HEAD_SIZE * 0.5),
        ])
    }

    /// Arrowhead as two open segments meeting at the end point.
    pub fn arrow_head_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if let Some([left, right]) = self.arrow_head() {
            path.move_to(left);
            path.line_to(self.end());
            path.line_to(right);
        }
        path
    }

    pub(crate) fn apply_style_change(&mut self, change: StyleChange) -> bool {
        match change {
            StyleChange::StrokeWidth(v) => self.stroke_width = v,
            StyleChange::StrokeColor(v) => self.stroke_color = v,
            StyleChange::StrokeStyle(v) => self.stroke_style = v,
            StyleChange::Sloppiness(v) => self.sloppiness = v,
            _ => return false,
        }
        true
    }
}

impl ShapeTrait for Line {
    fn id(&self) -> &ShapeId {
        &self.id
    }

    fn bounds(&self) -> Rect {
        Rect::from_points(self.start(), self.end())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        distance_to_segment(point, self.start(), self.end()) <= tolerance
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start());
        path.line_to(self.end());
        path
    }

    fn translate(&mut self, delta: Vec2) {
        self.set_start(self.start() + delta);
        self.set_end(self.end() + delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_bounds() {
        let line = Line::new(Point::new(100.0, 10.0), Point::new(0.0, 50.0));
        assert_eq!(line.bounds(), Rect::new(0.0, 10.0, 100.0, 50.0));
    }

    #[test]
    fn test_hit_test_tolerance() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(line.hit_test(Point::new(50.0, 10.0), 10.0));
        assert!(!line.hit_test(Point::new(50.0, 10.5), 10.0));
        assert!(!line.hit_test(Point::new(115.0, 0.0), 10.0));
    }

    #[test]
    fn test_arrow_head() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let [left, right] = line.arrow_head().unwrap();
        assert!((left.x - 85.0).abs() < 1e-9);
        assert!((right.x - 85.0).abs() < 1e-9);
        assert!((left.y - 7.5).abs() < 1e-9);
        assert!((right.y + 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_has_no_head() {
        let line = Line::new(Point::new(5.0, 5.0), Point::new(5.0, 5.0));
        assert!(line.arrow_head().is_none());
        assert!(line.arrow_head_path().elements().is_empty());
    }

    #[test]
    fn test_translate_moves_both_ends() {
        let mut line = Line::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        line.translate(Vec2::new(5.0, -5.0));
        assert_eq!(line.start(), Point::new(5.0, -5.0));
        assert_eq!(line.end(), Point::new(15.0, 5.0));
    }
}

//! Freehand drawing shape.

use super::{
    default_fill_color, default_stroke_color, FillPattern, SerializableColor, ShapeId,
    ShapeTrait, StrokeStyle, StrokeWidth, StyleChange,
};
use crate::geometry::{distance_to_polyline, points_bounds};
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A freehand stroke (series of points). Bounds are derived from the points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Freehand {
    pub(crate) id: ShapeId,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub stroke_width: StrokeWidth,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: SerializableColor,
    #[serde(default = "default_fill_color")]
    pub fill_color: SerializableColor,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    #[serde(default, rename = "fillStyle")]
    pub fill_pattern: FillPattern,
}

impl Freehand {
    pub fn new() -> Self {
        Self::from_points(Vec::new())
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            id: ShapeId::new(),
            points,
            stroke_width: StrokeWidth::default(),
            stroke_color: default_stroke_color(),
            fill_color: default_fill_color(),
            stroke_style: StrokeStyle::default(),
            fill_pattern: FillPattern::default(),
        }
    }

    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Simplify the path by removing redundant points.
    pub fn simplify(&mut self, tolerance: f64) {
        if self.points.len() < 3 {
            return;
        }

        // Ramer-Douglas-Peucker algorithm
        self.points = rdp_simplify(&self.points, tolerance);
    }

    pub(crate) fn apply_style_change(&mut self, change: StyleChange) -> bool {
        match change {
            StyleChange::StrokeWidth(v) => self.stroke_width = v,
            StyleChange::StrokeColor(v) => self.stroke_color = v,
            StyleChange::FillColor(v) => self.fill_color = v,
            StyleChange::StrokeStyle(v) => self.stroke_style = v,
            StyleChange::FillPattern(v) => self.fill_pattern = v,
            _ => return false,
        }
        true
    }
}

impl Default for Freehand {
    fn default() -> Self {
        Self::new()
    }
}

/// Ramer-Douglas-Peucker line simplification.
fn rdp_simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_index = 0;
    for (i, point) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let dist = perpendicular_distance(*point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        let mut left = rdp_simplify(&points[..=max_index], tolerance);
        let right = rdp_simplify(&points[max_index..], tolerance);
        // Junction point appears in both halves.
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

/// Distance from a point to the infinite line through two points.
fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let d = line_end - line_start;
    let len = d.hypot();
    if len < f64::EPSILON {
        return (point - line_start).hypot();
    }
    (point - line_start).cross(d).abs() / len
}

impl ShapeTrait for Freehand {
    fn id(&self) -> &ShapeId {
        &self.id
    }

    fn bounds(&self) -> Rect {
        points_bounds(self.points.iter().copied())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        distance_to_polyline(point, &self.points) <= tolerance
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some((first, rest)) = self.points.split_first() else {
            return path;
        };
        path.move_to(*first);
        if rest.is_empty() {
            // A dot: zero-length segment so round caps still paint.
            path.line_to(*first);
        }
        for p in rest {
            path.line_to(*p);
        }
        path
    }

    fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bounds_is_zero_box() {
        let freehand = Freehand::new();
        assert_eq!(freehand.bounds(), Rect::ZERO);
    }

    #[test]
    fn test_bounds_from_mixed_points() {
        let freehand = Freehand::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(-3.0, 8.0),
        ]);
        assert_eq!(freehand.bounds(), Rect::new(-3.0, 0.0, 10.0, 8.0));
    }

    #[test]
    fn test_single_point_hit_test() {
        let freehand = Freehand::from_points(vec![Point::new(10.0, 10.0)]);
        assert!(freehand.hit_test(Point::new(16.0, 18.0), 10.0));
        assert!(!freehand.hit_test(Point::new(20.0, 20.0), 10.0));
    }

    #[test]
    fn test_simplify_drops_collinear_points() {
        let mut freehand = Freehand::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.01),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.02),
            Point::new(4.0, 0.0),
        ]);
        freehand.simplify(0.5);
        assert_eq!(freehand.points, vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0)]);
    }

    #[test]
    fn test_simplify_keeps_corners() {
        let mut freehand = Freehand::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ]);
        freehand.simplify(0.5);
        assert_eq!(
            freehand.points,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)]
        );
    }

    #[test]
    fn test_translate() {
        let mut freehand = Freehand::from_points(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        freehand.translate(Vec2::new(2.0, 3.0));
        assert_eq!(freehand.points, vec![Point::new(2.0, 3.0), Point::new(3.0, 4.0)]);
    }
}

//! Rectangle and diamond shapes.

use super::{
    default_fill_color, default_stroke_color, CornerStyle, FillPattern, SerializableColor,
    ShapeId, ShapeTrait, Sloppiness, StrokeStyle, StrokeWidth, StyleChange,
};
use crate::geometry::normalize_rect;
use kurbo::{BezPath, Point, Rect, RoundedRect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// An axis-aligned box. Backs both the `rectangle` and `diamond` variants;
/// a diamond is inscribed in the box with its vertices at the edge midpoints.
///
/// `width` and `height` are signed while a creation gesture is live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub stroke_width: StrokeWidth,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: SerializableColor,
    #[serde(default = "default_fill_color")]
    pub fill_color: SerializableColor,
    #[serde(default)]
    pub corner_style: CornerStyle,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    #[serde(default, rename = "roughStyle")]
    pub sloppiness: Sloppiness,
    #[serde(default, rename = "fillStyle")]
    pub fill_pattern: FillPattern,
}

impl Rectangle {
    /// Upper limit for the rounded-corner radius in world units.
    pub const MAX_CORNER_RADIUS: f64 = 32.0;

    /// Radius as a fraction of the shorter side.
    pub const PROPORTIONAL_RADIUS: f64 = 0.25;

    /// Create a new rectangle with a fresh id.
    pub fn new(origin: Point, width: f64, height: f64) -> Self {
        Self::with_id(ShapeId::new(), origin, width, height)
    }

    pub fn with_id(id: ShapeId, origin: Point, width: f64, height: f64) -> Self {
        Self {
            id,
            x: origin.x,
            y: origin.y,
            width,
            height,
            stroke_width: StrokeWidth::default(),
            stroke_color: default_stroke_color(),
            fill_color: default_fill_color(),
            corner_style: CornerStyle::default(),
            stroke_style: StrokeStyle::default(),
            sloppiness: Sloppiness::default(),
            fill_pattern: FillPattern::default(),
        }
    }

    /// Normalized box.
    pub fn as_rect(&self) -> Rect {
        normalize_rect(self.x, self.y, self.width, self.height)
    }

    /// Store the normalized box in place of signed extents.
    pub fn normalize(&mut self) {
        let rect = self.as_rect();
        self.x = rect.x0;
        self.y = rect.y0;
        self.width = rect.width();
        self.height = rect.height();
    }

    /// Replace origin and extents from a box.
    pub fn set_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        self.x = rect.x0;
        self.y = rect.y0;
        self.width = rect.width();
        self.height = rect.height();
    }

    /// Corner radius for the current corner style.
    pub fn corner_radius(&self) -> f64 {
        match self.corner_style {
            CornerStyle::Sharp => 0.0,
            CornerStyle::Round => {
                let rect = self.as_rect();
                (rect.width().min(rect.height()) * Self::PROPORTIONAL_RADIUS)
                    .min(Self::MAX_CORNER_RADIUS)
            }
        }
    }

    /// Diamond vertices: top, right, bottom, left.
    pub fn diamond_points(&self) -> [Point; 4] {
        let rect = self.as_rect();
        let center = rect.center();
        [
            Point::new(center.x, rect.y0),
            Point::new(rect.x1, center.y),
            Point::new(center.x, rect.y1),
            Point::new(rect.x0, center.y),
        ]
    }

    /// Outline of the inscribed diamond.
    pub fn diamond_path(&self) -> BezPath {
        let points = self.diamond_points();
        let radius = self.corner_radius();
        if radius > 0.0 {
            rounded_polygon(&points, radius)
        } else {
            let mut path = BezPath::new();
            path.move_to(points[0]);
            for p in &points[1..] {
                path.line_to(*p);
            }
            path.close_path();
            path
        }
    }

    pub(crate) fn apply_style_change(&mut self, change: StyleChange) -> bool {
        match change {
            StyleChange::StrokeWidth(v) => self.stroke_width = v,
            StyleChange::StrokeColor(v) => self.stroke_color = v,
            StyleChange::FillColor(v) => self.fill_color = v,
            StyleChange::StrokeStyle(v) => self.stroke_style = v,
            StyleChange::Sloppiness(v) => self.sloppiness = v,
            StyleChange::FillPattern(v) => self.fill_pattern = v,
            StyleChange::CornerStyle(v) => self.corner_style = v,
            StyleChange::FontSize(_) | StyleChange::FontFamily(_) | StyleChange::TextAlign(_) => {
                return false;
            }
        }
        true
    }
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> &ShapeId {
        &self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let rect = self.as_rect().inflate(tolerance, tolerance);
        rect.x0 <= point.x && point.x <= rect.x1 && rect.y0 <= point.y && point.y <= rect.y1
    }

    fn to_path(&self) -> BezPath {
        let radius = self.corner_radius();
        if radius > 0.0 {
            RoundedRect::from_rect(self.as_rect(), radius).to_path(0.1)
        } else {
            self.as_rect().to_path(0.1)
        }
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

/// Closed polygon with each vertex replaced by a quadratic curve that starts
/// and ends `radius` along the adjacent edges.
fn rounded_polygon(points: &[Point], radius: f64) -> BezPath {
    let n = points.len();
    let mut path = BezPath::new();
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let vertex = points[i];
        let next = points[(i + 1) % n];
        let to_prev = prev - vertex;
        let to_next = next - vertex;
        let r_prev = radius.min(to_prev.hypot() / 2.0);
        let r_next = radius.min(to_next.hypot() / 2.0);
        let entry = vertex + to_prev.normalize() * r_prev;
        let exit = vertex + to_next.normalize() * r_next;
        if i == 0 {
            path.move_to(entry);
        } else {
            path.line_to(entry);
        }
        path.quad_to(vertex, exit);
    }
    path.close_path();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_creation() {
        let rect = Rectangle::new(Point::new(10.0, 20.0), 100.0, 50.0);
        assert!((rect.x - 10.0).abs() < f64::EPSILON);
        assert!((rect.y - 20.0).abs() < f64::EPSILON);
        assert!((rect.width - 100.0).abs() < f64::EPSILON);
        assert!((rect.height - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_extent_bounds() {
        let rect = Rectangle::new(Point::new(100.0, 100.0), -50.0, -30.0);
        let bounds = rect.bounds();
        assert!((bounds.x0 - 50.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 70.0).abs() < f64::EPSILON);
        assert!((bounds.width() - 50.0).abs() < f64::EPSILON);
        assert!((bounds.height() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test() {
        let rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        assert!(rect.hit_test(Point::new(50.0, 50.0), 0.0));
        assert!(rect.hit_test(Point::new(100.0, 100.0), 0.0));
        assert!(!rect.hit_test(Point::new(150.0, 50.0), 0.0));
        assert!(rect.hit_test(Point::new(105.0, 50.0), 10.0));
    }

    #[test]
    fn test_hit_test_flipped() {
        let rect = Rectangle::new(Point::new(100.0, 100.0), -50.0, -30.0);
        assert!(rect.hit_test(Point::new(75.0, 85.0), 0.0));
        assert!(!rect.hit_test(Point::new(125.0, 115.0), 0.0));
    }

    #[test]
    fn test_corner_radius() {
        let mut rect = Rectangle::new(Point::ZERO, 400.0, 60.0);
        assert!(rect.corner_radius().abs() < f64::EPSILON);
        rect.corner_style = CornerStyle::Round;
        assert!((rect.corner_radius() - 15.0).abs() < f64::EPSILON);
        rect.height = 1000.0;
        assert!((rect.corner_radius() - Rectangle::MAX_CORNER_RADIUS).abs() < f64::EPSILON);
    }

    #[test]
    fn test_diamond_points() {
        let rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 60.0);
        let [top, right, bottom, left] = rect.diamond_points();
        assert_eq!(top, Point::new(50.0, 0.0));
        assert_eq!(right, Point::new(100.0, 30.0));
        assert_eq!(bottom, Point::new(50.0, 60.0));
        assert_eq!(left, Point::new(0.0, 30.0));
    }

    #[test]
    fn test_rounded_diamond_stays_inside_bounds() {
        let mut rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 60.0);
        rect.corner_style = CornerStyle::Round;
        let bbox = rect.diamond_path().bounding_box();
        assert!(bbox.x0 >= -1e-9 && bbox.x1 <= 100.0 + 1e-9);
        assert!(bbox.y0 >= -1e-9 && bbox.y1 <= 60.0 + 1e-9);
    }
}

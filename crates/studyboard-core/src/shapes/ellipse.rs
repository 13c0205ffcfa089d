//! Ellipse shape.

use super::{
    default_fill_color, default_stroke_color, FillPattern, SerializableColor, ShapeId,
    ShapeTrait, Sloppiness, StrokeStyle, StrokeWidth, StyleChange,
};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// An axis-aligned ellipse stored as center and radii.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ellipse {
    pub(crate) id: ShapeId,
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    pub radius_x: f64,
    pub radius_y: f64,
    #[serde(default)]
    pub stroke_width: StrokeWidth,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: SerializableColor,
    #[serde(default = "default_fill_color")]
    pub fill_color: SerializableColor,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    #[serde(default, rename = "roughStyle")]
    pub sloppiness: Sloppiness,
    #[serde(default, rename = "fillStyle")]
    pub fill_pattern: FillPattern,
}

impl Ellipse {
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self {
            id: ShapeId::new(),
            x: center.x,
            y: center.y,
            radius_x: radius_x.abs(),
            radius_y: radius_y.abs(),
            stroke_width: StrokeWidth::default(),
            stroke_color: default_stroke_color(),
            fill_color: default_fill_color(),
            stroke_style: StrokeStyle::default(),
            sloppiness: Sloppiness::default(),
            fill_pattern: FillPattern::default(),
        }
    }

    /// Ellipse inscribed in a box.
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.center(), rect.width() / 2.0, rect.height() / 2.0)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn as_kurbo(&self) -> kurbo::Ellipse {
        kurbo::Ellipse::new(self.center(), (self.radius_x, self.radius_y), 0.0)
    }

    /// Refit to a box: radii are half extents, center is the box center.
    pub fn set_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        let center = rect.center();
        self.x = center.x;
        self.y = center.y;
        self.radius_x = rect.width() / 2.0;
        self.radius_y = rect.height() / 2.0;
    }

    pub(crate) fn apply_style_change(&mut self, change: StyleChange) -> bool {
        match change {
            StyleChange::StrokeWidth(v) => self.stroke_width = v,
            StyleChange::StrokeColor(v) => self.stroke_color = v,
            StyleChange::FillColor(v) => self.fill_color = v,
            StyleChange::StrokeStyle(v) => self.stroke_style = v,
            StyleChange::Sloppiness(v) => self.sloppiness = v,
            StyleChange::FillPattern(v) => self.fill_pattern = v,
            StyleChange::CornerStyle(_)
            | StyleChange::FontSize(_)
            | StyleChange::FontFamily(_)
            | StyleChange::TextAlign(_) => return false,
        }
        true
    }
}

impl ShapeTrait for Ellipse {
    fn id(&self) -> &ShapeId {
        &self.id
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.x - self.radius_x,
            self.y - self.radius_y,
            self.x + self.radius_x,
            self.y + self.radius_y,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let rx = self.radius_x + tolerance;
        let ry = self.radius_y + tolerance;
        if rx <= 0.0 || ry <= 0.0 {
            // Collapsed to a segment or a point.
            let b = self.bounds().inflate(tolerance, tolerance);
            return b.x0 <= point.x && point.x <= b.x1 && b.y0 <= point.y && point.y <= b.y1;
        }
        let dx = (point.x - self.x) / rx;
        let dy = (point.y - self.y) / ry;
        dx * dx + dy * dy <= 1.0
    }

    fn to_path(&self) -> BezPath {
        self.as_kurbo().to_path(0.1)
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

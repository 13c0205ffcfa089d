//! Shape definitions for the drawing canvas.

mod ellipse;
mod freehand;
mod line;
mod rectangle;
mod text;

pub use ellipse::Ellipse;
pub use freehand::Freehand;
pub use line::{ARROW_HEAD_SIZE, Line};
pub use rectangle::Rectangle;
pub use text::{FontFamily, FontSize, LINE_HEIGHT, TEXT_FALLBACK_SIZE, Text, TextAlign};

use kurbo::{BezPath, Point, Rect, Vec2};
use peniko::Color;
use peniko::color::Srgb;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for shapes.
///
/// Opaque string on the wire. Freshly created shapes get a UUID v4; shapes
/// loaded from storage or supplied by a diagram import keep whatever id they
/// carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Generate a new random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ShapeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShapeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ShapeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Serializable color representation (RGBA8), stored as a CSS hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Parse any CSS color: hex, named (`blue`, `transparent`) or functional
    /// (`rgb(...)`) syntax.
    pub fn parse(color: &str) -> Option<Self> {
        let parsed = peniko::color::parse_color(color.trim()).ok()?;
        let rgba = parsed.to_alpha_color::<Srgb>().to_rgba8();
        Some(Self::new(rgba.r, rgba.g, rgba.b, rgba.a))
    }
}

impl From<String> for SerializableColor {
    fn from(value: String) -> Self {
        Self::parse(&value).unwrap_or_else(|| {
            log::warn!("Unrecognized color {value:?}, using black");
            Self::black()
        })
    }
}

impl From<SerializableColor> for String {
    fn from(color: SerializableColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for SerializableColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.a {
            0 => f.write_str("transparent"),
            255 => write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b),
            a => write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, a),
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

pub(crate) fn default_stroke_color() -> SerializableColor {
    SerializableColor::black()
}

pub(crate) fn default_fill_color() -> SerializableColor {
    SerializableColor::transparent()
}

/// Stroke width, restricted to the toolbar's three presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub enum StrokeWidth {
    Thin,
    #[default]
    Medium,
    Thick,
}

impl StrokeWidth {
    pub fn value(self) -> f64 {
        match self {
            StrokeWidth::Thin => 1.0,
            StrokeWidth::Medium => 2.0,
            StrokeWidth::Thick => 4.0,
        }
    }
}

impl From<f64> for StrokeWidth {
    /// Snap an arbitrary width to the nearest preset.
    fn from(width: f64) -> Self {
        if width < 1.5 {
            StrokeWidth::Thin
        } else if width < 3.0 {
            StrokeWidth::Medium
        } else {
            StrokeWidth::Thick
        }
    }
}

impl From<StrokeWidth> for f64 {
    fn from(width: StrokeWidth) -> Self {
        width.value()
    }
}

/// Sloppiness level for the hand-drawn effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Sloppiness {
    /// Clean, precise lines.
    Architect,
    /// Slight hand-drawn feel.
    #[default]
    Artist,
    /// Very sketchy.
    Cartoonist,
}

impl Sloppiness {
    /// Jitter amplitude used by the renderer.
    pub fn roughness(&self) -> f64 {
        match self {
            Sloppiness::Architect => 0.0,
            Sloppiness::Artist => 1.0,
            Sloppiness::Cartoonist => 2.0,
        }
    }
}

impl From<u8> for Sloppiness {
    fn from(level: u8) -> Self {
        match level {
            0 => Sloppiness::Architect,
            1 => Sloppiness::Artist,
            _ => Sloppiness::Cartoonist,
        }
    }
}

impl From<Sloppiness> for u8 {
    fn from(level: Sloppiness) -> Self {
        match level {
            Sloppiness::Architect => 0,
            Sloppiness::Artist => 1,
            Sloppiness::Cartoonist => 2,
        }
    }
}

/// Fill pattern style for closed shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillPattern {
    /// Parallel diagonal lines.
    #[default]
    Hachure,
    Solid,
    #[serde(rename = "zigzag")]
    ZigZag,
    CrossHatch,
    Dots,
}

/// Dash style for outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    /// Dash pattern scaled by the stroke width. Empty means solid.
    pub fn dash_pattern(&self, stroke_width: f64) -> Vec<f64> {
        match self {
            StrokeStyle::Solid => Vec::new(),
            StrokeStyle::Dashed => vec![8.0 * stroke_width, 6.0 * stroke_width],
            StrokeStyle::Dotted => vec![1.5 * stroke_width, 6.0 * stroke_width],
        }
    }
}

/// Corner treatment for rectangles and diamonds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerStyle {
    #[default]
    Sharp,
    Round,
}

/// The variant tag of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeKind {
    Rectangle,
    Diamond,
    Ellipse,
    Line,
    Arrow,
    FreeDraw,
    Text,
}

impl ShapeKind {
    /// The record's `type` tag.
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Diamond => "diamond",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Line => "line",
            ShapeKind::Arrow => "arrow",
            ShapeKind::FreeDraw => "free-draw",
            ShapeKind::Text => "text",
        }
    }
}

/// Style applied to newly created shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    pub stroke_width: StrokeWidth,
    pub stroke_color: SerializableColor,
    pub fill_color: SerializableColor,
    pub stroke_style: StrokeStyle,
    pub sloppiness: Sloppiness,
    pub fill_pattern: FillPattern,
    pub corner_style: CornerStyle,
    pub font_size: FontSize,
    pub font_family: FontFamily,
    pub text_align: TextAlign,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_width: StrokeWidth::default(),
            stroke_color: SerializableColor::black(),
            fill_color: SerializableColor::transparent(),
            stroke_style: StrokeStyle::default(),
            sloppiness: Sloppiness::default(),
            fill_pattern: FillPattern::default(),
            corner_style: CornerStyle::default(),
            font_size: FontSize::default(),
            font_family: FontFamily::default(),
            text_align: TextAlign::default(),
        }
    }
}

/// A single style property edit, as issued by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleChange {
    StrokeWidth(StrokeWidth),
    StrokeColor(SerializableColor),
    FillColor(SerializableColor),
    StrokeStyle(StrokeStyle),
    Sloppiness(Sloppiness),
    FillPattern(FillPattern),
    CornerStyle(CornerStyle),
    FontSize(FontSize),
    FontFamily(FontFamily),
    TextAlign(TextAlign),
}

impl ShapeStyle {
    pub fn apply(&mut self, change: StyleChange) {
        match change {
            StyleChange::StrokeWidth(v) => self.stroke_width = v,
            StyleChange::StrokeColor(v) => self.stroke_color = v,
            StyleChange::FillColor(v) => self.fill_color = v,
            StyleChange::StrokeStyle(v) => self.stroke_style = v,
            StyleChange::Sloppiness(v) => self.sloppiness = v,
            StyleChange::FillPattern(v) => self.fill_pattern = v,
            StyleChange::CornerStyle(v) => self.corner_style = v,
            StyleChange::FontSize(v) => self.font_size = v,
            StyleChange::FontFamily(v) => self.font_family = v,
            StyleChange::TextAlign(v) => self.text_align = v,
        }
    }
}

/// Common geometry for all shape records.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> &ShapeId;

    /// Normalized bounding box in world coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a point (in world coordinates) hits this shape.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Outline path for rendering.
    fn to_path(&self) -> BezPath;

    /// Move the shape by `delta`.
    fn translate(&mut self, delta: Vec2);
}

/// A drawable primitive. The tag is the record's `type` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Shape {
    Rectangle(Rectangle),
    Diamond(Rectangle),
    Ellipse(Ellipse),
    Line(Line),
    Arrow(Line),
    #[serde(alias = "freedraw", alias = "freehand")]
    FreeDraw(Freehand),
    Text(Text),
}

impl Shape {
    /// Build a shape of `kind` from the raw drag parameters of a creation
    /// gesture. Rectangles and diamonds keep the signed extent while the
    /// gesture is live; call [`Shape::normalize`] to finalize.
    pub fn create(kind: ShapeKind, start: Point, current: Point, style: &ShapeStyle) -> Shape {
        let mut shape = match kind {
            ShapeKind::Rectangle => Shape::Rectangle(Rectangle::new(
                start,
                current.x - start.x,
                current.y - start.y,
            )),
            ShapeKind::Diamond => Shape::Diamond(Rectangle::new(
                start,
                current.x - start.x,
                current.y - start.y,
            )),
            ShapeKind::Ellipse => Shape::Ellipse(Ellipse::from_rect(Rect::from_points(start, current))),
            ShapeKind::Line => Shape::Line(Line::new(start, current)),
            ShapeKind::Arrow => Shape::Arrow(Line::new(start, current)),
            ShapeKind::FreeDraw => {
                let mut points = vec![start];
                if current != start {
                    points.push(current);
                }
                Shape::FreeDraw(Freehand::from_points(points))
            }
            ShapeKind::Text => Shape::Text(Text::new(start, String::new())),
        };
        shape.apply_style(style);
        shape
    }

    /// Update a shape under construction to the pointer at `current`. The id
    /// and style are kept. Free-draw strokes append the point instead.
    pub fn drag_to(&mut self, start: Point, current: Point) {
        match self {
            Shape::Rectangle(r) | Shape::Diamond(r) => {
                r.x = start.x;
                r.y = start.y;
                r.width = current.x - start.x;
                r.height = current.y - start.y;
            }
            Shape::Ellipse(e) => e.set_rect(Rect::from_points(start, current)),
            Shape::Line(l) | Shape::Arrow(l) => {
                l.set_start(start);
                l.set_end(current);
            }
            Shape::FreeDraw(f) => {
                if f.points.last() != Some(&current) {
                    f.add_point(current);
                }
            }
            Shape::Text(_) => {}
        }
    }

    pub fn id(&self) -> &ShapeId {
        match self {
            Shape::Rectangle(s) | Shape::Diamond(s) => s.id(),
            Shape::Ellipse(s) => s.id(),
            Shape::Line(s) | Shape::Arrow(s) => s.id(),
            Shape::FreeDraw(s) => s.id(),
            Shape::Text(s) => s.id(),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Diamond(_) => ShapeKind::Diamond,
            Shape::Ellipse(_) => ShapeKind::Ellipse,
            Shape::Line(_) => ShapeKind::Line,
            Shape::Arrow(_) => ShapeKind::Arrow,
            Shape::FreeDraw(_) => ShapeKind::FreeDraw,
            Shape::Text(_) => ShapeKind::Text,
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Rectangle(s) | Shape::Diamond(s) => s.bounds(),
            Shape::Ellipse(s) => s.bounds(),
            Shape::Line(s) | Shape::Arrow(s) => s.bounds(),
            Shape::FreeDraw(s) => s.bounds(),
            Shape::Text(s) => s.bounds(),
        }
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        match self {
            Shape::Rectangle(s) | Shape::Diamond(s) => s.hit_test(point, tolerance),
            Shape::Ellipse(s) => s.hit_test(point, tolerance),
            Shape::Line(s) | Shape::Arrow(s) => s.hit_test(point, tolerance),
            Shape::FreeDraw(s) => s.hit_test(point, tolerance),
            Shape::Text(s) => s.hit_test(point, tolerance),
        }
    }

    pub fn to_path(&self) -> BezPath {
        match self {
            Shape::Rectangle(s) => s.to_path(),
            Shape::Diamond(s) => s.diamond_path(),
            Shape::Ellipse(s) => s.to_path(),
            Shape::Line(s) | Shape::Arrow(s) => s.to_path(),
            Shape::FreeDraw(s) => s.to_path(),
            Shape::Text(s) => s.to_path(),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Shape::Rectangle(s) | Shape::Diamond(s) => s.translate(delta),
            Shape::Ellipse(s) => s.translate(delta),
            Shape::Line(s) | Shape::Arrow(s) => s.translate(delta),
            Shape::FreeDraw(s) => s.translate(delta),
            Shape::Text(s) => s.translate(delta),
        }
    }

    /// Rewrite negative rectangle/diamond extents so the stored origin is the
    /// true top-left corner. Other variants are already normalized.
    pub fn normalize(&mut self) {
        if let Shape::Rectangle(r) | Shape::Diamond(r) = self {
            r.normalize();
        }
    }

    /// Whether the shape has no visible extent (a click without a drag).
    pub fn is_degenerate(&self) -> bool {
        match self {
            Shape::Rectangle(r) | Shape::Diamond(r) => r.width == 0.0 || r.height == 0.0,
            Shape::Ellipse(e) => e.radius_x == 0.0 || e.radius_y == 0.0,
            Shape::Line(l) | Shape::Arrow(l) => l.start() == l.end(),
            Shape::FreeDraw(f) => f.is_empty(),
            Shape::Text(_) => false,
        }
    }

    pub fn stroke_width(&self) -> StrokeWidth {
        match self {
            Shape::Rectangle(s) | Shape::Diamond(s) => s.stroke_width,
            Shape::Ellipse(s) => s.stroke_width,
            Shape::Line(s) | Shape::Arrow(s) => s.stroke_width,
            Shape::FreeDraw(s) => s.stroke_width,
            Shape::Text(s) => s.stroke_width,
        }
    }

    pub fn stroke_color(&self) -> SerializableColor {
        match self {
            Shape::Rectangle(s) | Shape::Diamond(s) => s.stroke_color,
            Shape::Ellipse(s) => s.stroke_color,
            Shape::Line(s) | Shape::Arrow(s) => s.stroke_color,
            Shape::FreeDraw(s) => s.stroke_color,
            Shape::Text(s) => s.stroke_color,
        }
    }

    /// Apply every applicable field of `style`.
    pub fn apply_style(&mut self, style: &ShapeStyle) {
        for change in [
            StyleChange::StrokeWidth(style.stroke_width),
            StyleChange::StrokeColor(style.stroke_color),
            StyleChange::FillColor(style.fill_color),
            StyleChange::StrokeStyle(style.stroke_style),
            StyleChange::Sloppiness(style.sloppiness),
            StyleChange::FillPattern(style.fill_pattern),
            StyleChange::CornerStyle(style.corner_style),
            StyleChange::FontSize(style.font_size),
            StyleChange::FontFamily(style.font_family),
            StyleChange::TextAlign(style.text_align),
        ] {
            self.apply_style_change(change);
        }
    }

    /// Apply one property edit. Returns `false` when the variant has no such
    /// field.
    pub fn apply_style_change(&mut self, change: StyleChange) -> bool {
        match (self, change) {
            (Shape::Rectangle(s) | Shape::Diamond(s), change) => s.apply_style_change(change),
            (Shape::Ellipse(s), change) => s.apply_style_change(change),
            (Shape::Line(s) | Shape::Arrow(s), change) => s.apply_style_change(change),
            (Shape::FreeDraw(s), change) => s.apply_style_change(change),
            (Shape::Text(s), change) => s.apply_style_change(change),
        }
    }

    /// Give the shape a fresh unique id.
    pub fn regenerate_id(&mut self) {
        let new_id = ShapeId::new();
        match self {
            Shape::Rectangle(s) | Shape::Diamond(s) => s.id = new_id,
            Shape::Ellipse(s) => s.id = new_id,
            Shape::Line(s) | Shape::Arrow(s) => s.id = new_id,
            Shape::FreeDraw(s) => s.id = new_id,
            Shape::Text(s) => s.id = new_id,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Stable per-shape seed for the hand-drawn effect (FNV-1a of the id).
    pub fn seed(&self) -> u32 {
        self.id()
            .as_str()
            .bytes()
            .fold(0x811c_9dc5_u32, |hash, byte| (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193))
    }
}

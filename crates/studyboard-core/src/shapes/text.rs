//! Text shape.

use super::{default_stroke_color, SerializableColor, ShapeId, ShapeTrait, StrokeWidth, StyleChange};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Bounds used for text whose size has not been measured.
pub const TEXT_FALLBACK_SIZE: Size = Size::new(100.0, 20.0);

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.2;

/// Font size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    /// Size in pixels.
    pub fn px(&self) -> f64 {
        match self {
            FontSize::Small => 16.0,
            FontSize::Medium => 20.0,
            FontSize::Large => 28.0,
        }
    }
}

/// Font family class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    #[default]
    HandDrawn,
    Normal,
    Code,
}

impl FontFamily {
    /// CSS-style family name handed to the render surface.
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::HandDrawn => "Virgil, Segoe Print, cursive",
            FontFamily::Normal => "Helvetica, Arial, sans-serif",
            FontFamily::Code => "Cascadia Code, Menlo, monospace",
        }
    }

    /// Average glyph advance as a fraction of the font size.
    pub fn char_width_factor(&self) -> f64 {
        match self {
            FontFamily::HandDrawn => 0.55,
            FontFamily::Normal => 0.52,
            FontFamily::Code => 0.60,
        }
    }
}

/// Horizontal alignment of lines within the text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// A text block anchored at its top-left corner.
///
/// `width`/`height` hold the last measured size; zero means unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub(crate) id: ShapeId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub font_size: FontSize,
    #[serde(default)]
    pub font_family: FontFamily,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub stroke_width: StrokeWidth,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: SerializableColor,
}

impl Text {
    pub fn new(origin: Point, content: String) -> Self {
        let mut text = Self {
            id: ShapeId::new(),
            x: origin.x,
            y: origin.y,
            width: 0.0,
            height: 0.0,
            text: String::new(),
            lines: Vec::new(),
            font_size: FontSize::default(),
            font_family: FontFamily::default(),
            text_align: TextAlign::default(),
            stroke_width: StrokeWidth::default(),
            stroke_color: default_stroke_color(),
        };
        text.set_content(content);
        text
    }

    pub fn content(&self) -> &str {
        &self.text
    }

    /// Replace the content and split it into rendered lines. The measured
    /// size is reset until the next measurement.
    pub fn set_content(&mut self, content: String) {
        self.lines = content.split('\n').map(str::to_string).collect();
        self.text = content;
        self.width = 0.0;
        self.height = 0.0;
    }

    /// Rendered lines, falling back to splitting the content when the stored
    /// record carries none.
    pub fn display_lines(&self) -> Vec<&str> {
        if self.lines.is_empty() {
            self.text.split('\n').collect()
        } else {
            self.lines.iter().map(String::as_str).collect()
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn line_height(&self) -> f64 {
        self.font_size.px() * LINE_HEIGHT
    }

    pub fn has_measured_size(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn set_measured_size(&mut self, size: Size) {
        self.width = size.width;
        self.height = size.height;
    }

    /// Size estimate from character counts, for surfaces without text
    /// metrics.
    pub fn approximate_size(&self) -> Size {
        let lines = self.display_lines();
        let max_chars = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let width = max_chars as f64 * self.font_size.px() * self.font_family.char_width_factor();
        let height = lines.len().max(1) as f64 * self.line_height();
        Size::new(width, height)
    }

    /// Stored box when measured, otherwise the fallback size at the origin.
    pub fn box_size(&self) -> Size {
        if self.has_measured_size() {
            Size::new(self.width, self.height)
        } else {
            TEXT_FALLBACK_SIZE
        }
    }

    /// Replace origin and size from a box. Font size is left alone.
    pub fn set_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        self.x = rect.x0;
        self.y = rect.y0;
        self.width = rect.width();
        self.height = rect.height();
    }

    pub(crate) fn apply_style_change(&mut self, change: StyleChange) -> bool {
        match change {
            StyleChange::StrokeWidth(v) => self.stroke_width = v,
            StyleChange::StrokeColor(v) => self.stroke_color = v,
            StyleChange::FontSize(v) => {
                self.font_size = v;
                // Measured size no longer matches the glyphs.
                self.width = 0.0;
                self.height = 0.0;
            }
            StyleChange::FontFamily(v) => {
                self.font_family = v;
                self.width = 0.0;
                self.height = 0.0;
            }
            StyleChange::TextAlign(v) => self.text_align = v,
            _ => return false,
        }
        true
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> &ShapeId {
        &self.id
    }

    fn bounds(&self) -> Rect {
        Rect::from_origin_size(Point::new(self.x, self.y), self.box_size())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let b = self.bounds().inflate(tolerance, tolerance);
        b.x0 <= point.x && point.x <= b.x1 && b.y0 <= point.y && point.y <= b.y1
    }

    fn to_path(&self) -> BezPath {
        self.bounds().to_path(0.1)
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

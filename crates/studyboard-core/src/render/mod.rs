//! Rendering through an immediate-mode 2D surface.
//!
//! The engine never rasterizes itself. Hosts implement [`RenderSurface`] over
//! whatever 2D context they have; [`DisplayList`] records the calls for
//! headless use and tests.

mod display_list;
pub mod fill;
pub mod rough;

pub use display_list::{DisplayList, DrawCommand};
pub use rough::apply_hand_drawn_effect;

use crate::shapes::{
    FillPattern, FontFamily, LINE_HEIGHT, SerializableColor, Shape, StrokeStyle, Text, TextAlign,
};
use kurbo::{Affine, BezPath, Cap, Join, Point, Rect, Size, Stroke};
use peniko::Color;

/// Hatch line angle in degrees.
pub const HACHURE_ANGLE: f64 = 45.0;

/// Hatch spacing as a multiple of the stroke width.
pub const HACHURE_GAP_FACTOR: f64 = 4.0;

/// Smallest hatch spacing in world units.
pub const MIN_HACHURE_GAP: f64 = 4.0;

/// Font parameters for a text draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size: f64,
    pub family: FontFamily,
    pub align: TextAlign,
}

impl TextStyle {
    pub fn new(size: f64, family: FontFamily, align: TextAlign) -> Self {
        Self {
            size,
            family,
            align,
        }
    }

    pub fn for_text(text: &Text) -> Self {
        Self::new(text.font_size.px(), text.font_family, text.text_align)
    }

    pub fn line_height(&self) -> f64 {
        self.size * LINE_HEIGHT
    }
}

/// An immediate-mode 2D drawing surface.
///
/// Coordinates passed to the drawing calls are transformed by the last
/// [`RenderSurface::set_transform`].
pub trait RenderSurface {
    /// Backing buffer size in device pixels.
    fn size(&self) -> Size;

    /// Resize the backing buffer.
    fn resize(&mut self, size: Size);

    /// Reset the transform and fill the whole buffer.
    fn clear(&mut self, color: Color);

    fn set_transform(&mut self, transform: Affine);

    fn stroke(&mut self, path: &BezPath, style: &Stroke, color: Color);

    fn fill(&mut self, path: &BezPath, color: Color);

    /// Draw one line of text. `origin` is the top of the line box, at the
    /// left edge, center or right edge depending on `style.align`.
    fn fill_text(&mut self, text: &str, origin: Point, style: &TextStyle, color: Color);

    /// Size of one line of text, when the surface can measure it.
    fn measure_text(&self, _text: &str, _style: &TextStyle) -> Option<Size> {
        None
    }
}

/// Measure a text shape's block: the widest line by the line count.
pub fn measure_text_block<S: RenderSurface + ?Sized>(surface: &S, text: &Text) -> Option<Size> {
    let style = TextStyle::for_text(text);
    let lines = text.display_lines();
    let mut width: f64 = 0.0;
    for line in &lines {
        width = width.max(surface.measure_text(line, &style)?.width);
    }
    Some(Size::new(width, lines.len().max(1) as f64 * style.line_height()))
}

/// Stroke parameters shared by every outline.
struct Outline {
    width: f64,
    color: Color,
    dash: StrokeStyle,
    roughness: f64,
}

impl Outline {
    fn stroke(&self) -> Stroke {
        let stroke = Stroke::new(self.width)
            .with_caps(Cap::Round)
            .with_join(Join::Round);
        let dashes = self.dash.dash_pattern(self.width);
        if dashes.is_empty() {
            stroke
        } else {
            stroke.with_dashes(0.0, dashes)
        }
    }
}

/// Draw one shape in world coordinates.
pub fn render_shape<S: RenderSurface + ?Sized>(surface: &mut S, shape: &Shape, zoom: f64) {
    let seed = shape.seed();
    match shape {
        Shape::Rectangle(r) | Shape::Diamond(r) => {
            let outline = shape.to_path();
            let width = r.stroke_width.value();
            render_fill(surface, &outline, r.fill_color, r.fill_pattern, width);
            let style = Outline {
                width,
                color: r.stroke_color.into(),
                dash: r.stroke_style,
                roughness: r.sloppiness.roughness(),
            };
            stroke_outline(surface, &outline, &style, seed, zoom);
        }
        Shape::Ellipse(e) => {
            let outline = shape.to_path();
            let width = e.stroke_width.value();
            render_fill(surface, &outline, e.fill_color, e.fill_pattern, width);
            let style = Outline {
                width,
                color: e.stroke_color.into(),
                dash: e.stroke_style,
                roughness: e.sloppiness.roughness(),
            };
            stroke_outline(surface, &outline, &style, seed, zoom);
        }
        Shape::Line(l) | Shape::Arrow(l) => {
            let style = Outline {
                width: l.stroke_width.value(),
                color: l.stroke_color.into(),
                dash: l.stroke_style,
                roughness: l.sloppiness.roughness(),
            };
            stroke_outline(surface, &shape.to_path(), &style, seed, zoom);
            if matches!(shape, Shape::Arrow(_)) {
                // The head is always solid.
                let head = Outline {
                    dash: StrokeStyle::Solid,
                    ..style
                };
                stroke_outline(surface, &l.arrow_head_path(), &head, seed.wrapping_add(1), zoom);
            }
        }
        Shape::FreeDraw(f) => {
            let path = shape.to_path();
            let width = f.stroke_width.value();
            if f.points.len() >= 3 {
                let mut closed = path.clone();
                closed.close_path();
                render_fill(surface, &closed, f.fill_color, f.fill_pattern, width);
            }
            let style = Outline {
                width,
                color: f.stroke_color.into(),
                dash: f.stroke_style,
                roughness: 0.0,
            };
            stroke_outline(surface, &path, &style, seed, zoom);
        }
        Shape::Text(t) => render_text(surface, t),
    }
}

fn stroke_outline<S: RenderSurface + ?Sized>(
    surface: &mut S,
    path: &BezPath,
    style: &Outline,
    seed: u32,
    zoom: f64,
) {
    let stroke = style.stroke();
    if style.roughness > 0.0 {
        // Two jittered passes give the sketched double line.
        for pass in 0..2 {
            let rough = apply_hand_drawn_effect(path, style.roughness, zoom, seed, pass);
            surface.stroke(&rough, &stroke, style.color);
        }
    } else {
        surface.stroke(path, &stroke, style.color);
    }
}

/// Fill a closed outline with a color and pattern. Transparent colors draw
/// nothing.
pub fn render_fill<S: RenderSurface + ?Sized>(
    surface: &mut S,
    outline: &BezPath,
    color: SerializableColor,
    pattern: FillPattern,
    stroke_width: f64,
) {
    if color.is_transparent() {
        return;
    }
    let color: Color = color.into();
    if pattern == FillPattern::Solid {
        surface.fill(outline, color);
        return;
    }

    let polygons = fill::outline_polygons(outline);
    let gap = (stroke_width * HACHURE_GAP_FACTOR).max(MIN_HACHURE_GAP);
    let line = Stroke::new((stroke_width / 2.0).max(0.5)).with_caps(Cap::Round);
    match pattern {
        FillPattern::Solid => {}
        FillPattern::Hachure => {
            let segments = fill::hachure_segments(&polygons, HACHURE_ANGLE, gap);
            surface.stroke(&fill::segments_path(&segments), &line, color);
        }
        FillPattern::CrossHatch => {
            let mut segments = fill::hachure_segments(&polygons, HACHURE_ANGLE, gap);
            segments.extend(fill::hachure_segments(&polygons, -HACHURE_ANGLE, gap));
            surface.stroke(&fill::segments_path(&segments), &line, color);
        }
        FillPattern::ZigZag => {
            let segments = fill::hachure_segments(&polygons, HACHURE_ANGLE, gap);
            surface.stroke(&fill::zigzag_path(&segments), &line, color);
        }
        FillPattern::Dots => {
            let centers = fill::dot_centers(&polygons, gap);
            surface.fill(&fill::dots_path(&centers, (stroke_width / 2.0).max(1.0)), color);
        }
    }
}

/// Draw each line of a text shape.
pub fn render_text<S: RenderSurface + ?Sized>(surface: &mut S, text: &Text) {
    let style = TextStyle::for_text(text);
    let box_width = text.box_size().width;
    let x = match style.align {
        TextAlign::Left => text.x,
        TextAlign::Center => text.x + box_width / 2.0,
        TextAlign::Right => text.x + box_width,
    };
    let color: Color = text.stroke_color.into();
    for (i, line) in text.display_lines().into_iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let origin = Point::new(x, text.y + i as f64 * style.line_height());
        surface.fill_text(line, origin, &style, color);
    }
}

/// Draw grid lines covering `visible` (world coordinates).
pub fn render_grid<S: RenderSurface + ?Sized>(
    surface: &mut S,
    visible: Rect,
    grid_size: f64,
    color: Color,
    zoom: f64,
) {
    if grid_size <= 0.0 {
        return;
    }
    let start_x = (visible.x0 / grid_size).floor() * grid_size;
    let start_y = (visible.y0 / grid_size).floor() * grid_size;
    let end_x = (visible.x1 / grid_size).ceil() * grid_size;
    let end_y = (visible.y1 / grid_size).ceil() * grid_size;

    // Batch every line into one path.
    let mut path = BezPath::new();
    let mut x = start_x;
    while x <= end_x {
        path.move_to(Point::new(x, start_y));
        path.line_to(Point::new(x, end_y));
        x += grid_size;
    }
    let mut y = start_y;
    while y <= end_y {
        path.move_to(Point::new(start_x, y));
        path.line_to(Point::new(end_x, y));
        y += grid_size;
    }
    surface.stroke(&path, &Stroke::new(1.0 / zoom.max(f64::EPSILON)), color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{
        CornerStyle, Ellipse, Line, Rectangle, Sloppiness, StyleChange,
    };

    fn surface() -> DisplayList {
        DisplayList::new(Size::new(800.0, 600.0))
    }

    fn clean_rect() -> Rectangle {
        let mut rect = Rectangle::with_id("r".into(), Point::new(0.0, 0.0), 100.0, 60.0);
        rect.sloppiness = Sloppiness::Architect;
        rect
    }

    #[test]
    fn test_transparent_fill_draws_nothing() {
        let mut s = surface();
        render_shape(&mut s, &Shape::Rectangle(clean_rect()), 1.0);
        assert_eq!(s.fill_count(), 0);
        assert_eq!(s.stroke_count(), 1);
    }

    #[test]
    fn test_solid_fill() {
        let mut rect = clean_rect();
        rect.fill_color = SerializableColor::new(255, 0, 0, 255);
        rect.fill_pattern = FillPattern::Solid;
        let mut s = surface();
        render_shape(&mut s, &Shape::Rectangle(rect), 1.0);
        assert_eq!(s.fill_count(), 1);
    }

    #[test]
    fn test_hachure_fill_is_stroked() {
        let mut rect = clean_rect();
        rect.fill_color = SerializableColor::new(255, 0, 0, 255);
        let mut s = surface();
        render_shape(&mut s, &Shape::Rectangle(rect), 1.0);
        assert_eq!(s.fill_count(), 0);
        assert_eq!(s.stroke_count(), 2);
    }

    #[test]
    fn test_dash_patterns_scale_with_width() {
        let mut line = Line::new(Point::ZERO, Point::new(100.0, 0.0));
        line.sloppiness = Sloppiness::Architect;
        line.apply_style_change(StyleChange::StrokeStyle(StrokeStyle::Dashed));
        line.apply_style_change(StyleChange::StrokeWidth(crate::shapes::StrokeWidth::Thick));
        let mut s = surface();
        render_shape(&mut s, &Shape::Line(line), 1.0);
        let DrawCommand::Stroke { dashes, .. } = &s.commands()[0] else {
            panic!("Expected a stroke");
        };
        assert_eq!(dashes, &vec![32.0, 24.0]);
    }

    #[test]
    fn test_sketchy_draws_two_stable_passes() {
        let mut ellipse = Ellipse::new(Point::new(50.0, 50.0), 40.0, 20.0);
        ellipse.sloppiness = Sloppiness::Cartoonist;
        let shape = Shape::Ellipse(ellipse);

        let mut first = surface();
        render_shape(&mut first, &shape, 1.0);
        let mut second = surface();
        render_shape(&mut second, &shape, 1.0);
        assert_eq!(first.stroke_count(), 2);
        assert_eq!(first.commands(), second.commands());
    }

    #[test]
    fn test_arrow_has_head() {
        let mut line = Line::new(Point::ZERO, Point::new(100.0, 0.0));
        line.sloppiness = Sloppiness::Architect;
        let mut s = surface();
        render_shape(&mut s, &Shape::Arrow(line.clone()), 1.0);
        assert_eq!(s.stroke_count(), 2);
        let mut s = surface();
        render_shape(&mut s, &Shape::Line(line), 1.0);
        assert_eq!(s.stroke_count(), 1);
    }

    #[test]
    fn test_rounded_rect_path_differs() {
        let sharp = clean_rect();
        let mut round = clean_rect();
        round.corner_style = CornerStyle::Round;
        assert_ne!(
            Shape::Rectangle(sharp).to_path(),
            Shape::Rectangle(round).to_path()
        );
    }

    #[test]
    fn test_text_lines_and_alignment() {
        let mut text = Text::new(Point::new(10.0, 10.0), "one\ntwo".to_string());
        text.text_align = TextAlign::Center;
        let mut s = surface();
        render_shape(&mut s, &Shape::Text(text), 1.0);
        let texts: Vec<&str> = s.texts().collect();
        assert_eq!(texts, vec!["one", "two"]);
        let DrawCommand::Text { origin, .. } = &s.commands()[1] else {
            panic!("Expected text");
        };
        assert!((origin.x - 60.0).abs() < f64::EPSILON);
        assert!((origin.y - 34.0).abs() < 1e-9);
    }

    #[test]
    fn test_measure_text_block() {
        let text = Text::new(Point::ZERO, "ab\nabcd".to_string());
        assert!(measure_text_block(&surface(), &text).is_none());
        let s = surface().with_approximate_metrics();
        let size = measure_text_block(&s, &text).unwrap();
        assert!((size.width - 4.0 * 20.0 * 0.55).abs() < 1e-9);
        assert!((size.height - 48.0).abs() < 1e-9);
    }

    #[test]
    fn test_grid_is_one_batched_stroke() {
        let mut s = surface();
        render_grid(&mut s, Rect::new(0.0, 0.0, 100.0, 100.0), 20.0, Color::BLACK, 1.0);
        assert_eq!(s.stroke_count(), 1);
    }
}

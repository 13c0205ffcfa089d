//! A render surface that records draw calls instead of rasterizing.

use super::{RenderSurface, TextStyle};
use crate::shapes::{FontFamily, SerializableColor, TextAlign};
use kurbo::{Affine, BezPath, Point, Size, Stroke};
use peniko::Color;

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(SerializableColor),
    SetTransform(Affine),
    Stroke {
        path: BezPath,
        width: f64,
        dashes: Vec<f64>,
        color: SerializableColor,
    },
    Fill {
        path: BezPath,
        color: SerializableColor,
    },
    Text {
        text: String,
        origin: Point,
        font_size: f64,
        family: FontFamily,
        align: TextAlign,
        color: SerializableColor,
    },
}

/// Headless surface. Holds the commands of the last frame; `clear` starts a
/// new one.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    size: Size,
    commands: Vec<DrawCommand>,
    approximate_metrics: bool,
}

impl DisplayList {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            commands: Vec::new(),
            approximate_metrics: false,
        }
    }

    /// Report character-count text metrics from `measure_text`.
    pub fn with_approximate_metrics(mut self) -> Self {
        self.approximate_metrics = true;
        self
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Recorded text draws, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn stroke_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke { .. }))
            .count()
    }

    pub fn fill_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Fill { .. }))
            .count()
    }
}

impl RenderSurface for DisplayList {
    fn size(&self) -> Size {
        self.size
    }

    fn resize(&mut self, size: Size) {
        self.size = size;
    }

    fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color.into()));
    }

    fn set_transform(&mut self, transform: Affine) {
        self.commands.push(DrawCommand::SetTransform(transform));
    }

    fn stroke(&mut self, path: &BezPath, style: &Stroke, color: Color) {
        self.commands.push(DrawCommand::Stroke {
            path: path.clone(),
            width: style.width,
            dashes: style.dash_pattern.to_vec(),
            color: color.into(),
        });
    }

    fn fill(&mut self, path: &BezPath, color: Color) {
        self.commands.push(DrawCommand::Fill {
            path: path.clone(),
            color: color.into(),
        });
    }

    fn fill_text(&mut self, text: &str, origin: Point, style: &TextStyle, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            origin,
            font_size: style.size,
            family: style.family,
            align: style.align,
            color: color.into(),
        });
    }

    fn measure_text(&self, text: &str, style: &TextStyle) -> Option<Size> {
        self.approximate_metrics.then(|| {
            Size::new(
                text.chars().count() as f64 * style.size * style.family.char_width_factor(),
                style.line_height(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Rect, Shape as KurboShape};

    #[test]
    fn test_clear_starts_a_new_frame() {
        let mut list = DisplayList::new(Size::new(100.0, 100.0));
        list.fill(&Rect::new(0.0, 0.0, 1.0, 1.0).to_path(0.1), Color::BLACK);
        list.clear(Color::WHITE);
        assert_eq!(list.commands(), &[DrawCommand::Clear(SerializableColor::white())]);
    }

    #[test]
    fn test_records_dashes() {
        let mut list = DisplayList::new(Size::new(100.0, 100.0));
        let stroke = Stroke::new(2.0).with_dashes(0.0, [16.0, 12.0]);
        list.stroke(&BezPath::new(), &stroke, Color::BLACK);
        assert!(matches!(
            &list.commands()[0],
            DrawCommand::Stroke { width, dashes, .. } if *width == 2.0 && dashes == &vec![16.0, 12.0]
        ));
    }

    #[test]
    fn test_metrics_are_opt_in() {
        let style = TextStyle::new(20.0, FontFamily::Code, TextAlign::Left);
        let list = DisplayList::new(Size::ZERO);
        assert!(list.measure_text("abc", &style).is_none());
        let list = list.with_approximate_metrics();
        let size = list.measure_text("abc", &style).unwrap();
        assert!((size.width - 36.0).abs() < 1e-9);
        assert!((size.height - 24.0).abs() < 1e-9);
    }
}

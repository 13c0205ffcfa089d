//! Tools and the pointer gesture state machine.

use crate::shapes::{ShapeId, ShapeKind};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Rectangle,
    Diamond,
    Ellipse,
    Line,
    Arrow,
    FreeDraw,
    Text,
    Eraser,
}

impl ToolKind {
    pub const ALL: [ToolKind; 10] = [
        ToolKind::Select,
        ToolKind::Pan,
        ToolKind::Rectangle,
        ToolKind::Diamond,
        ToolKind::Ellipse,
        ToolKind::Line,
        ToolKind::Arrow,
        ToolKind::FreeDraw,
        ToolKind::Text,
        ToolKind::Eraser,
    ];

    /// The shape this tool creates, if it is a drawing tool.
    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            ToolKind::Rectangle => Some(ShapeKind::Rectangle),
            ToolKind::Diamond => Some(ShapeKind::Diamond),
            ToolKind::Ellipse => Some(ShapeKind::Ellipse),
            ToolKind::Line => Some(ShapeKind::Line),
            ToolKind::Arrow => Some(ShapeKind::Arrow),
            ToolKind::FreeDraw => Some(ShapeKind::FreeDraw),
            ToolKind::Text => Some(ShapeKind::Text),
            ToolKind::Select | ToolKind::Pan | ToolKind::Eraser => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pan => "pan",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Diamond => "diamond",
            ToolKind::Ellipse => "ellipse",
            ToolKind::Line => "line",
            ToolKind::Arrow => "arrow",
            ToolKind::FreeDraw => "free-draw",
            ToolKind::Text => "text",
            ToolKind::Eraser => "eraser",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tool: {0}")]
pub struct ParseToolError(pub String);

impl FromStr for ToolKind {
    type Err = ParseToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| ParseToolError(s.to_string()))
    }
}

/// The engine's in-progress pointer gesture.
///
/// Pointer-down is the only way out of `Idle` and pointer-up the only way
/// back.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    /// A drawing tool is sizing the shape `id`, anchored at `start` (world).
    Creating { id: ShapeId, start: Point },
    /// The selection controller is moving the selected shape.
    Dragging,
    /// The selection controller is resizing the selected shape.
    Resizing,
    /// The camera follows the pointer; `last` is in screen coordinates.
    Panning { last: Point },
    /// The eraser is down at `last` (world). `erased` records whether
    /// anything was removed.
    Erasing { erased: bool, last: Point },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}

//! Conversion of generated diagram descriptions into shapes.
//!
//! Input is `{ "nodes": [...], "connections": [...] }`. Each node becomes one
//! primary shape plus a centered label; each connection becomes an arrow
//! between the facing edges of its two nodes. Nodes are nudged right, then
//! down, until they stop overlapping earlier nodes or the attempts run out.

use crate::geometry::rects_overlap;
use crate::shapes::{Ellipse, Line, Rectangle, SerializableColor, Shape, Text, TextAlign};
use kurbo::{Point, Rect, Size, Vec2};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

pub const DEFAULT_NODE_SIZE: Size = Size::new(160.0, 80.0);
/// Horizontal nudge per attempt; also the minimum footprint width.
pub const NODE_SPACING_X: f64 = 200.0;
/// Vertical nudge per attempt; also the minimum footprint height.
pub const NODE_SPACING_Y: f64 = 150.0;
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 5;
const RIGHT_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("Invalid diagram JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),
}

pub type DiagramResult<T> = Result<T, DiagramError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Rectangle,
    Diamond,
    Ellipse,
    Circle,
    Text,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiagramNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub color: Option<String>,
}

impl DiagramNode {
    fn size(&self) -> Size {
        let width = self.width.filter(|w| *w > 0.0).unwrap_or(DEFAULT_NODE_SIZE.width);
        let height = self.height.filter(|h| *h > 0.0).unwrap_or(DEFAULT_NODE_SIZE.height);
        if self.kind == NodeKind::Circle {
            let d = width.min(height);
            Size::new(d, d)
        } else {
            Size::new(width, height)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiagramConnection {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DiagramSpec {
    #[serde(default)]
    pub nodes: Vec<DiagramNode>,
    #[serde(default)]
    pub connections: Vec<DiagramConnection>,
}

impl DiagramSpec {
    pub fn from_json(json: &str) -> DiagramResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Parse and convert a diagram in one step.
pub fn import_diagram(json: &str) -> DiagramResult<Vec<Shape>> {
    diagram_to_shapes(&DiagramSpec::from_json(json)?)
}

/// Space a node occupies for overlap checks.
fn footprint(origin: Point, size: Size) -> Rect {
    Rect::from_origin_size(
        origin,
        Size::new(size.width.max(NODE_SPACING_X), size.height.max(NODE_SPACING_Y)),
    )
}

/// Find a position near `requested` whose footprint clears `placed`.
///
/// Attempts 1-3 move right one step each; attempts 4-5 go back to the
/// requested x and move down. The last candidate is kept even if it still
/// overlaps.
pub fn resolve_position(requested: Point, size: Size, placed: &[Rect]) -> Point {
    let is_free = |origin: Point| {
        let candidate = footprint(origin, size);
        !placed.iter().any(|r| rects_overlap(*r, candidate))
    };
    if is_free(requested) {
        return requested;
    }
    let mut candidate = requested;
    for attempt in 1..=MAX_PLACEMENT_ATTEMPTS {
        candidate = if attempt <= RIGHT_ATTEMPTS {
            requested + Vec2::new(NODE_SPACING_X * f64::from(attempt), 0.0)
        } else {
            requested + Vec2::new(0.0, NODE_SPACING_Y * f64::from(attempt - RIGHT_ATTEMPTS))
        };
        if is_free(candidate) {
            return candidate;
        }
    }
    log::debug!("Node at {requested:?} still overlaps after {MAX_PLACEMENT_ATTEMPTS} attempts");
    candidate
}

/// A label centered on `center`, sized by character count.
fn centered_label(content: &str, center: Point, color: SerializableColor) -> Shape {
    let mut text = Text::new(Point::ZERO, content.to_string());
    text.text_align = TextAlign::Center;
    text.stroke_color = color;
    let size = text.approximate_size();
    text.set_measured_size(size);
    text.x = center.x - size.width / 2.0;
    text.y = center.y - size.height / 2.0;
    Shape::Text(text)
}

/// Midpoints of the facing edges of two boxes, from `a` towards `b`.
fn connection_points(a: Rect, b: Rect) -> (Point, Point) {
    let delta = b.center() - a.center();
    if delta.x.abs() >= delta.y.abs() {
        let (from_x, to_x) = if delta.x >= 0.0 { (a.x1, b.x0) } else { (a.x0, b.x1) };
        (Point::new(from_x, a.center().y), Point::new(to_x, b.center().y))
    } else {
        let (from_y, to_y) = if delta.y >= 0.0 { (a.y1, b.y0) } else { (a.y0, b.y1) };
        (Point::new(a.center().x, from_y), Point::new(b.center().x, to_y))
    }
}

/// Convert a diagram into shapes: for each node its primary shape followed
/// by its label, then one arrow (and optional label) per connection.
pub fn diagram_to_shapes(spec: &DiagramSpec) -> DiagramResult<Vec<Shape>> {
    let mut shapes = Vec::new();
    let mut placed: Vec<Rect> = Vec::new();
    let mut boxes: HashMap<&str, Rect> = HashMap::new();

    for node in &spec.nodes {
        if boxes.contains_key(node.id.as_str()) {
            return Err(DiagramError::DuplicateNode(node.id.clone()));
        }
        let size = node.size();
        let origin = resolve_position(Point::new(node.x, node.y), size, &placed);
        placed.push(footprint(origin, size));
        let bounds = Rect::from_origin_size(origin, size);
        boxes.insert(node.id.as_str(), bounds);

        let color = match node.color.as_deref() {
            Some(raw) => SerializableColor::parse(raw).unwrap_or_else(|| {
                log::warn!("Node {} has unknown color {raw:?}", node.id);
                SerializableColor::black()
            }),
            None => SerializableColor::black(),
        };

        let primary = match node.kind {
            NodeKind::Text => {
                let mut text = Text::new(origin, node.label.clone());
                text.stroke_color = color;
                shapes.push(Shape::Text(text));
                continue;
            }
            NodeKind::Diamond => {
                let mut r = Rectangle::new(origin, size.width, size.height);
                r.stroke_color = color;
                Shape::Diamond(r)
            }
            NodeKind::Ellipse | NodeKind::Circle => {
                let mut e = Ellipse::from_rect(bounds);
                e.stroke_color = color;
                Shape::Ellipse(e)
            }
            NodeKind::Rectangle | NodeKind::Unknown => {
                if node.kind == NodeKind::Unknown {
                    log::warn!("Node {} has an unknown type, drawing a rectangle", node.id);
                }
                let mut r = Rectangle::new(origin, size.width, size.height);
                r.stroke_color = color;
                Shape::Rectangle(r)
            }
        };
        shapes.push(primary);
        if !node.label.trim().is_empty() {
            shapes.push(centered_label(&node.label, bounds.center(), SerializableColor::black()));
        }
    }

    for connection in &spec.connections {
        let (Some(from), Some(to)) = (
            boxes.get(connection.from.as_str()),
            boxes.get(connection.to.as_str()),
        ) else {
            log::warn!(
                "Skipping connection {} -> {}: unknown node",
                connection.from,
                connection.to
            );
            continue;
        };
        let (start, end) = connection_points(*from, *to);
        shapes.push(Shape::Arrow(Line::new(start, end)));
        if let Some(label) = connection.label.as_deref().filter(|l| !l.trim().is_empty()) {
            shapes.push(centered_label(label, start.midpoint(end), SerializableColor::black()));
        }
    }

    Ok(shapes)
}

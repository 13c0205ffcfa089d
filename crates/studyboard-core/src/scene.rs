//! Scene storage: the shape list in paint order and its JSON file format.

use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Scene file format version written by this crate.
pub const SCENE_VERSION: u32 = 1;

/// Errors reading a scene file.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("invalid scene JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("scene version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u64, supported: u32 },
    #[error("invalid scene: {0}")]
    InvalidFormat(String),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// On-disk scene representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub version: u32,
    pub elements: Vec<Shape>,
}

impl SceneDocument {
    pub fn new(elements: Vec<Shape>) -> Self {
        Self {
            version: SCENE_VERSION,
            elements,
        }
    }

    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a versioned scene or a legacy bare array of records.
    ///
    /// Records that fail to parse are skipped with a warning.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let records = match value {
            serde_json::Value::Array(records) => records,
            serde_json::Value::Object(mut map) => {
                let version = match map.get("version") {
                    Some(v) => v.as_u64().ok_or_else(|| {
                        SceneError::InvalidFormat("version must be an unsigned integer".into())
                    })?,
                    None => u64::from(SCENE_VERSION),
                };
                if version > u64::from(SCENE_VERSION) {
                    return Err(SceneError::UnsupportedVersion {
                        found: version,
                        supported: SCENE_VERSION,
                    });
                }
                match map.remove("elements") {
                    Some(serde_json::Value::Array(records)) => records,
                    Some(_) => {
                        return Err(SceneError::InvalidFormat("elements must be an array".into()));
                    }
                    None => Vec::new(),
                }
            }
            _ => {
                return Err(SceneError::InvalidFormat(
                    "expected an object or an array of shapes".into(),
                ));
            }
        };

        let elements = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value::<Shape>(record) {
                Ok(shape) => Some(shape),
                Err(e) => {
                    log::warn!("Skipping scene record {index}: {e}");
                    None
                }
            })
            .collect();

        Ok(Self::new(elements))
    }
}

/// The live shape list.
///
/// Shapes are keyed by id with a separate z-order (back to front). Ids of
/// removed shapes are retired and never handed out again.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    shapes: HashMap<ShapeId, Shape>,
    z_order: Vec<ShapeId>,
    retired: HashSet<ShapeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from records, in order.
    pub fn from_shapes(shapes: impl IntoIterator<Item = Shape>) -> Self {
        let mut scene = Self::new();
        for shape in shapes {
            scene.add_shape(shape);
        }
        scene
    }

    /// Whether `id` is live or was used by a removed shape.
    pub fn is_id_taken(&self, id: &ShapeId) -> bool {
        self.shapes.contains_key(id) || self.retired.contains(id)
    }

    /// Append a shape on top. A shape whose id is already taken gets a fresh
    /// one. Returns the id the shape ended up with.
    pub fn add_shape(&mut self, mut shape: Shape) -> ShapeId {
        if self.is_id_taken(shape.id()) {
            log::debug!("Shape id {} already used, assigning a fresh id", shape.id());
            while self.is_id_taken(shape.id()) {
                shape.regenerate_id();
            }
        }
        let id = shape.id().clone();
        self.z_order.push(id.clone());
        self.shapes.insert(id.clone(), shape);
        id
    }

    /// Remove a shape and retire its id.
    pub fn remove_shape(&mut self, id: &ShapeId) -> Option<Shape> {
        let shape = self.shapes.remove(id)?;
        self.z_order.retain(|shape_id| shape_id != id);
        self.retired.insert(id.clone());
        Some(shape)
    }

    /// Remove every shape. Their ids stay retired.
    pub fn clear(&mut self) {
        self.retired.extend(self.z_order.drain(..));
        self.shapes.clear();
    }

    pub fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn get_mut(&mut self, id: &ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id)
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.shapes.contains_key(id)
    }

    /// Shapes in paint order (back to front).
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Topmost shape for which `hit` returns true.
    pub fn topmost_where(&self, mut hit: impl FnMut(&Shape) -> bool) -> Option<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .find(|id| self.shapes.get(*id).is_some_and(&mut hit))
            .cloned()
    }

    /// Ids of shapes whose bounds contain `point`, front to back.
    pub fn shapes_at_point(&self, point: Point, tolerance: f64) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .filter(|id| {
                self.shapes
                    .get(*id)
                    .is_some_and(|s| s.hit_test(point, tolerance))
            })
            .cloned()
            .collect()
    }

    /// Bounding box of all shapes.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes_ordered()
            .map(Shape::bounds)
            .reduce(|acc, b| acc.union(b))
    }

    pub fn len(&self) -> usize {
        self.z_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z_order.is_empty()
    }

    /// Value copy of the shape list in paint order.
    pub fn snapshot(&self) -> Vec<Shape> {
        self.shapes_ordered().cloned().collect()
    }

    pub fn to_document(&self) -> SceneDocument {
        SceneDocument::new(self.snapshot())
    }

    pub fn to_json(&self) -> SceneResult<String> {
        self.to_document().to_json()
    }

    pub fn from_json(json: &str) -> SceneResult<Self> {
        Ok(Self::from_shapes(SceneDocument::from_json(json)?.elements))
    }
}

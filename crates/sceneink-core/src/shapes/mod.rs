//! Shape definitions for the scene tree.

mod frame;

pub use frame::Frame;

use crate::layout::Layout;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smallest width or height a shape may have after any resize or transform.
pub const MIN_SHAPE_SIZE: f64 = 10.0;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Clamp a dimension to the minimum shape size.
///
/// Non-finite input degrades to the minimum as well.
pub fn clamp_size(value: f64) -> f64 {
    if value.is_finite() {
        value.max(MIN_SHAPE_SIZE)
    } else {
        MIN_SHAPE_SIZE
    }
}

/// Payload-free tag of a shape's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rectangle,
    Circle,
    Frame,
}

/// Kind of a shape. Only frames carry children and layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Frame(Frame),
}

/// A positioned, rotatable shape in the scene tree.
///
/// `position` is the top-left corner. For root shapes it is in world space;
/// for nested shapes it is relative to the parent's unrotated top-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ShapeId,
    pub(crate) kind: ShapeKind,
    /// Top-left corner position.
    pub position: Point,
    /// Width of the shape.
    pub width: f64,
    /// Height of the shape.
    pub height: f64,
    /// Rotation angle in degrees (around center).
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub(crate) parent_id: Option<ShapeId>,
}

impl Shape {
    fn new(kind: ShapeKind, position: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            width: clamp_size(width),
            height: clamp_size(height),
            rotation: 0.0,
            parent_id: None,
        }
    }

    /// Create a new rectangle.
    pub fn rectangle(position: Point, width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Rectangle, position, width, height)
    }

    /// Create a new circle (an ellipse inscribed in its bounds).
    pub fn circle(position: Point, width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Circle, position, width, height)
    }

    /// Create a new, empty frame with the given layout.
    pub fn frame(position: Point, width: f64, height: f64, layout: Layout) -> Self {
        Self::new(ShapeKind::Frame(Frame::new(layout)), position, width, height)
    }

    /// Replace the generated ID with a specific one (for stores that own IDs).
    pub fn with_id(mut self, id: ShapeId) -> Self {
        self.id = id;
        self
    }

    /// Set the initial rotation in degrees.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// The parent frame, if this shape is nested.
    pub fn parent_id(&self) -> Option<ShapeId> {
        self.parent_id
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn shape_type(&self) -> ShapeType {
        match self.kind {
            ShapeKind::Rectangle => ShapeType::Rectangle,
            ShapeKind::Circle => ShapeType::Circle,
            ShapeKind::Frame(_) => ShapeType::Frame,
        }
    }

    /// Check if this shape is a frame.
    pub fn is_frame(&self) -> bool {
        matches!(self.kind, ShapeKind::Frame(_))
    }

    /// Get the frame payload if this shape is a frame.
    pub fn as_frame(&self) -> Option<&Frame> {
        match &self.kind {
            ShapeKind::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// Get the mutable frame payload if this shape is a frame.
    pub(crate) fn as_frame_mut(&mut self) -> Option<&mut Frame> {
        match &mut self.kind {
            ShapeKind::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// Ordered child IDs. Always empty for leaves.
    pub fn children(&self) -> &[ShapeId] {
        self.as_frame().map_or(&[], Frame::children)
    }

    /// Layout settings, present only on frames.
    pub fn layout(&self) -> Option<&Layout> {
        self.as_frame().map(Frame::layout)
    }

    /// Replace the layout settings. Returns false for leaves.
    pub fn set_layout(&mut self, layout: Layout) -> bool {
        match self.as_frame_mut() {
            Some(frame) => {
                frame.set_layout(layout);
                true
            }
            None => false,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Set the size, enforcing the minimum shape size.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = clamp_size(width);
        self.height = clamp_size(height);
    }

    /// Unrotated bounds in the parent's coordinate space.
    pub fn local_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size())
    }

    /// Center in the parent's coordinate space.
    pub fn center(&self) -> Point {
        self.position + Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Transform from this shape's own space (origin at its unrotated
    /// top-left) into its parent's space, rotating about the center.
    pub fn local_transform(&self) -> Affine {
        let half = Vec2::new(self.width / 2.0, self.height / 2.0);
        Affine::translate(self.position.to_vec2() + half)
            * Affine::rotate(self.rotation.to_radians())
            * Affine::translate(-half)
    }

    /// Check if a point in this shape's own space lies inside it.
    pub fn contains_local_point(&self, point: Point, tolerance: f64) -> bool {
        match self.kind {
            ShapeKind::Circle => {
                let rx = self.width / 2.0 + tolerance;
                let ry = self.height / 2.0 + tolerance;
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let dx = (point.x - self.width / 2.0) / rx;
                let dy = (point.y - self.height / 2.0) / ry;
                dx * dx + dy * dy <= 1.0
            }
            ShapeKind::Rectangle | ShapeKind::Frame(_) => Rect::new(0.0, 0.0, self.width, self.height)
                .inflate(tolerance, tolerance)
                .contains(point),
        }
    }
}

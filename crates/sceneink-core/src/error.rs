//! Errors for structural operations on the scene tree.

use crate::shapes::ShapeId;
use thiserror::Error;

/// Structural errors. Geometry never fails; lookups return `Option` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("Shape not found: {0}")]
    ShapeNotFound(ShapeId),
    #[error("Shape {0} is not a frame and cannot own children")]
    NotAFrame(ShapeId),
    #[error("Shape {0} cannot be nested in itself")]
    SelfNesting(ShapeId),
    #[error("Nesting {child} in {parent} would create a cycle")]
    WouldCycle { child: ShapeId, parent: ShapeId },
    #[error("Shape {child} is not contained in frame {parent}")]
    NotContained { child: ShapeId, parent: ShapeId },
    #[error("Shape {child} and parent {parent:?} do not reference each other")]
    BrokenBackReference {
        child: ShapeId,
        parent: Option<ShapeId>,
    },
    #[error("Shape {child} references missing parent {parent}")]
    DanglingParent { child: ShapeId, parent: ShapeId },
    #[error("Shape {0} has a non-positive size")]
    InvalidSize(ShapeId),
    #[error("Root list references missing shape {0}")]
    UnknownRoot(ShapeId),
}

/// Result type for structural scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

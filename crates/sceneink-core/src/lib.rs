//! SceneInk Core Library
//!
//! Scene-graph geometry for a 2D design canvas: a tree of positioned,
//! rotatable, nestable shapes with auto-layout frames and snapping.

pub mod editor;
pub mod error;
pub mod hierarchy;
pub mod layout;
pub mod scene;
pub mod shapes;
pub mod snap;
pub mod transform;

pub use editor::{MoveOutcome, MovePreview, ResizeOutcome, RotationOutcome, SceneEditor};
pub use error::{SceneError, SceneResult};
pub use hierarchy::WorldTransform;
pub use layout::{Layout, Placement, compute_positions};
pub use scene::SceneTree;
pub use shapes::{MIN_SHAPE_SIZE, Shape, ShapeId, ShapeKind, ShapeType};
pub use snap::{
    Guide, GuideKind, GuideOrientation, ResizeHandle, SnapConfig, SnapEngine, find_potential_parent,
};

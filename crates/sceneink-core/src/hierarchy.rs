//! Ancestor/descendant traversal, nesting and cascading updates.
//!
//! Nested positions are stored relative to the parent's unrotated top-left,
//! so a container's rotation is applied to its subtree when world poses are
//! read, not baked into the children. Moving or rotating a frame therefore
//! only writes the frame itself; every descendant's world pose follows.
//! Resizing a frame keeps each direct child at the same fraction of the
//! frame's width and height.

use crate::error::{SceneError, SceneResult};
use crate::scene::SceneTree;
use crate::shapes::{Shape, ShapeId, clamp_size};
use crate::transform;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Slack allowed when comparing world bounds for containment.
const CONTAINMENT_EPSILON: f64 = 1e-9;

/// Flattened world pose of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldTransform {
    /// Maps the shape's own space (origin at its unrotated top-left) to world space.
    pub matrix: Affine,
    /// Top-left of the shape's unrotated box when centered on `center`.
    pub position: Point,
    /// Center in world space.
    pub center: Point,
    /// Accumulated rotation in degrees.
    pub rotation: f64,
}

/// Check if `inner` lies within `outer` on all four edges.
pub fn rect_contains(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 - CONTAINMENT_EPSILON
        && inner.y0 >= outer.y0 - CONTAINMENT_EPSILON
        && inner.x1 <= outer.x1 + CONTAINMENT_EPSILON
        && inner.y1 <= outer.y1 + CONTAINMENT_EPSILON
}

impl SceneTree {
    /// Ancestor IDs, nearest first. Empty for roots and missing IDs.
    pub fn ancestors(&self, id: ShapeId) -> Vec<ShapeId> {
        let mut ancestors = Vec::new();
        let mut current = self.get(id).and_then(Shape::parent_id);
        while let Some(parent) = current {
            // A corrupted tree must not loop forever.
            if parent == id || ancestors.contains(&parent) || ancestors.len() >= self.len() {
                log::warn!("Parent chain of {id} is cyclic, stopping at {parent}");
                break;
            }
            ancestors.push(parent);
            current = self.get(parent).and_then(Shape::parent_id);
        }
        ancestors
    }

    /// Descendant IDs in pre-order. Empty for leaves and missing IDs.
    pub fn descendants(&self, id: ShapeId) -> Vec<ShapeId> {
        let mut result = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut stack: Vec<ShapeId> = self.children_of(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if !visited.insert(next) {
                continue;
            }
            result.push(next);
            stack.extend(self.children_of(next).iter().rev().copied());
        }
        result
    }

    /// Check if `ancestor` appears in the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: ShapeId, id: ShapeId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// Fold the ancestor chain into the shape's world pose.
    pub fn world_transform(&self, id: ShapeId) -> Option<WorldTransform> {
        let shape = self.get(id)?;
        let mut matrix = Affine::IDENTITY;
        let mut rotation = 0.0;
        for ancestor in self.ancestors(id).into_iter().rev() {
            let Some(ancestor) = self.get(ancestor) else {
                continue;
            };
            matrix = matrix * ancestor.local_transform();
            rotation += ancestor.rotation;
        }
        matrix = matrix * shape.local_transform();
        rotation += shape.rotation;

        let center = matrix * Point::new(shape.width / 2.0, shape.height / 2.0);
        Some(WorldTransform {
            matrix,
            position: center - Vec2::new(shape.width / 2.0, shape.height / 2.0),
            center,
            rotation,
        })
    }

    /// Axis-aligned world bounding box of the rotated shape.
    pub fn world_bounds(&self, id: ShapeId) -> Option<Rect> {
        let shape = self.get(id)?;
        let world = self.world_transform(id)?;
        Some(world.matrix.transform_rect_bbox(Rect::new(0.0, 0.0, shape.width, shape.height)))
    }

    /// World bounds the shape would have with its top-left moved to
    /// `position` in its parent's space.
    pub fn world_bounds_at(&self, id: ShapeId, position: Point) -> Option<Rect> {
        let shape = self.get(id)?;
        let (parent_matrix, _) = self.child_space(shape.parent_id());
        let mut moved = shape.clone();
        moved.position = position;
        let matrix = parent_matrix * moved.local_transform();
        Some(matrix.transform_rect_bbox(Rect::new(0.0, 0.0, shape.width, shape.height)))
    }

    /// Matrix and rotation of the space a shape's children live in.
    fn child_space(&self, parent: Option<ShapeId>) -> (Affine, f64) {
        parent
            .and_then(|id| self.world_transform(id))
            .map_or((Affine::IDENTITY, 0.0), |world| (world.matrix, world.rotation))
    }

    fn check_nest(&self, child: ShapeId, parent: ShapeId) -> SceneResult<()> {
        if !self.contains(child) {
            return Err(SceneError::ShapeNotFound(child));
        }
        let parent_shape = self.get(parent).ok_or(SceneError::ShapeNotFound(parent))?;
        if child == parent {
            return Err(SceneError::SelfNesting(child));
        }
        if !parent_shape.is_frame() {
            return Err(SceneError::NotAFrame(parent));
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::WouldCycle { child, parent });
        }
        Ok(())
    }

    fn is_contained_in(&self, child: ShapeId, parent: ShapeId) -> bool {
        match (self.world_bounds(child), self.world_bounds(parent)) {
            (Some(inner), Some(outer)) => rect_contains(outer, inner),
            _ => false,
        }
    }

    /// Check if `child` may be nested in `parent`: the parent is a frame,
    /// nesting would not create a cycle, and the child's world bounding box
    /// lies within the parent's.
    pub fn can_nest(&self, child: ShapeId, parent: ShapeId) -> bool {
        self.check_nest(child, parent).is_ok() && self.is_contained_in(child, parent)
    }

    /// Smallest frame that fully contains the shape, skipping the shape
    /// itself, its descendants and `exclude`. Ties go to the first frame in
    /// tree order.
    pub fn find_best_parent(&self, id: ShapeId, exclude: &[ShapeId]) -> Option<ShapeId> {
        let bounds = self.world_bounds(id)?;
        let excluded: HashSet<ShapeId> = std::iter::once(id)
            .chain(self.descendants(id))
            .chain(exclude.iter().copied())
            .collect();
        self.smallest_frame_containing(bounds, &excluded)
    }

    /// Frame with the smallest intrinsic area whose world bounds contain
    /// `bounds`, first in tree order on ties.
    pub(crate) fn smallest_frame_containing(
        &self,
        bounds: Rect,
        excluded: &HashSet<ShapeId>,
    ) -> Option<ShapeId> {
        let mut best: Option<(ShapeId, f64)> = None;
        for candidate in self.iter_tree_order() {
            let candidate_id = candidate.id();
            if !candidate.is_frame() || excluded.contains(&candidate_id) {
                continue;
            }
            let Some(frame_bounds) = self.world_bounds(candidate_id) else {
                continue;
            };
            if !rect_contains(frame_bounds, bounds) {
                continue;
            }
            let area = candidate.area();
            if best.is_none_or(|(_, best_area)| area < best_area) {
                best = Some((candidate_id, area));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Re-link a shape under `new_parent` keeping its world pose.
    fn reparent(&mut self, id: ShapeId, new_parent: Option<ShapeId>) {
        let Some(world) = self.world_transform(id) else {
            return;
        };
        let (parent_matrix, parent_rotation) = self.child_space(new_parent);
        let local_center = transform::world_to_local(world.center, parent_matrix);

        self.detach(id);
        if let Some(shape) = self.get_mut(id) {
            shape.rotation = world.rotation - parent_rotation;
            shape.position = local_center - Vec2::new(shape.width / 2.0, shape.height / 2.0);
        }
        self.attach(id, new_parent);
    }

    /// Nest `child` in `parent`, converting its position to the parent's
    /// local space.
    ///
    /// Refuses missing IDs, non-frame parents and cycles. Containment is not
    /// checked here; see [`SceneTree::can_nest`] and [`SceneTree::try_nest`].
    pub fn nest(&mut self, child: ShapeId, parent: ShapeId) -> SceneResult<()> {
        self.check_nest(child, parent)?;
        if self.get(child).and_then(Shape::parent_id) == Some(parent) {
            return Ok(());
        }
        self.reparent(child, Some(parent));
        log::debug!("Nested {child} in {parent}");
        Ok(())
    }

    /// Nest only if [`SceneTree::can_nest`] allows it.
    pub fn try_nest(&mut self, child: ShapeId, parent: ShapeId) -> SceneResult<()> {
        self.check_nest(child, parent)?;
        if !self.is_contained_in(child, parent) {
            return Err(SceneError::NotContained { child, parent });
        }
        self.nest(child, parent)
    }

    /// Make a nested shape a root again, converting its position back to
    /// world coordinates. Roots are left alone.
    pub fn unnest(&mut self, id: ShapeId) -> SceneResult<()> {
        let shape = self.get(id).ok_or(SceneError::ShapeNotFound(id))?;
        let Some(parent) = shape.parent_id() else {
            return Ok(());
        };
        self.reparent(id, None);
        log::debug!("Unnested {id} from {parent}");
        Ok(())
    }

    /// The shape and all of its descendants, whose world poses depend on it.
    fn subtree(&self, id: ShapeId) -> Vec<ShapeId> {
        let mut affected = vec![id];
        affected.extend(self.descendants(id));
        affected
    }

    /// Move a shape by `delta` in its parent's space.
    ///
    /// Returns the shape and its descendants. Missing IDs yield an empty list.
    pub fn move_by(&mut self, id: ShapeId, delta: Vec2) -> Vec<ShapeId> {
        let Some(shape) = self.get_mut(id) else {
            return Vec::new();
        };
        shape.position += delta;
        self.subtree(id)
    }

    /// Move a shape's top-left to `position` in its parent's space.
    pub fn move_to(&mut self, id: ShapeId, position: Point) -> Vec<ShapeId> {
        let Some(current) = self.get(id).map(|shape| shape.position) else {
            return Vec::new();
        };
        self.move_by(id, position - current)
    }

    /// Rotate a shape about its own center by `delta` degrees.
    ///
    /// Every descendant's world center turns about this shape's world center
    /// by the same delta and its world rotation grows by it.
    pub fn rotate_by(&mut self, id: ShapeId, delta: f64) -> Vec<ShapeId> {
        let Some(shape) = self.get_mut(id) else {
            return Vec::new();
        };
        shape.rotation += delta;
        self.subtree(id)
    }

    /// Set a shape's local bounds (minimum size enforced) and keep each
    /// direct child's center at the same fraction of its width and height.
    pub fn resize(&mut self, id: ShapeId, bounds: Rect) -> Vec<ShapeId> {
        let Some(shape) = self.get_mut(id) else {
            return Vec::new();
        };
        let bounds = bounds.abs();
        let (old_width, old_height) = (shape.width, shape.height);
        shape.position = bounds.origin();
        shape.set_size(bounds.width(), bounds.height());
        let scale_x = shape.width / old_width;
        let scale_y = shape.height / old_height;

        let children = self.children_of(id).to_vec();
        for child_id in children {
            if let Some(child) = self.get_mut(child_id) {
                let center = child.center();
                let new_center = Point::new(center.x * scale_x, center.y * scale_y);
                child.position = new_center - Vec2::new(child.width / 2.0, child.height / 2.0);
            }
        }
        self.subtree(id)
    }

    /// Resize in place, keeping the top-left corner.
    pub fn set_size(&mut self, id: ShapeId, width: f64, height: f64) -> Vec<ShapeId> {
        let Some(position) = self.get(id).map(|shape| shape.position) else {
            return Vec::new();
        };
        let size = Size::new(clamp_size(width), clamp_size(height));
        self.resize(id, Rect::from_origin_size(position, size))
    }
}

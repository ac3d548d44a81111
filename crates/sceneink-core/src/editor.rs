//! Interactive manipulation on top of the scene tree.
//!
//! A pointer move is snapped, checked for a new container, applied through
//! the hierarchy operations and finally re-flowed by the affected frames'
//! layouts.

use crate::error::{SceneError, SceneResult};
use crate::scene::SceneTree;
use crate::shapes::{Shape, ShapeId};
use crate::snap::{Guide, ResizeHandle, SnapConfig, SnapEngine, find_potential_parent};
use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Default canvas size used for canvas-center alignment of root shapes.
pub const DEFAULT_CANVAS_SIZE: Size = Size::new(1920.0, 1080.0);

/// What a drag to a proposed position would do, without applying it.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePreview {
    /// Snapped top-left in the shape's current parent space.
    pub position: Point,
    pub guides: Vec<Guide>,
    /// Frame that would adopt the shape at this position.
    pub new_parent: Option<ShapeId>,
    pub current_parent: Option<ShapeId>,
}

impl MovePreview {
    /// Check if dropping here changes the shape's parent.
    pub fn reparents(&self) -> bool {
        self.new_parent != self.current_parent
    }
}

/// Result of a committed move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub guides: Vec<Guide>,
    pub parent: Option<ShapeId>,
    pub reparented: bool,
    /// Shapes whose world pose changed, including relaid-out siblings.
    pub affected: Vec<ShapeId>,
}

/// Result of a committed resize.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeOutcome {
    /// Final local bounds after snapping and the minimum size.
    pub bounds: Rect,
    pub guides: Vec<Guide>,
    pub affected: Vec<ShapeId>,
}

/// Result of a committed rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationOutcome {
    /// Rotation of the shape after snapping, in degrees.
    pub rotation: f64,
    /// Delta that was actually applied.
    pub applied_delta: f64,
    pub affected: Vec<ShapeId>,
}

/// Owns a scene tree and the snap settings used to edit it.
#[derive(Debug, Clone)]
pub struct SceneEditor {
    pub tree: SceneTree,
    pub snap: SnapEngine,
    /// Canvas extent for canvas-center alignment of root shapes.
    pub canvas_size: Size,
}

impl Default for SceneEditor {
    fn default() -> Self {
        Self::new(SceneTree::new(), SnapConfig::default())
    }
}

impl SceneEditor {
    pub fn new(tree: SceneTree, config: SnapConfig) -> Self {
        Self {
            tree,
            snap: SnapEngine::new(config),
            canvas_size: DEFAULT_CANVAS_SIZE,
        }
    }

    /// Set the canvas size used for center alignment.
    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        self.canvas_size = Size::new(width, height);
    }

    /// Area a shape is centered against: the parent frame for nested
    /// shapes, the canvas for roots.
    fn reference_size(&self, shape: &Shape) -> Size {
        shape
            .parent_id()
            .and_then(|parent| self.tree.get(parent))
            .map_or(self.canvas_size, Shape::size)
    }

    fn siblings(&self, id: ShapeId) -> Vec<&Shape> {
        self.tree
            .siblings_of(id)
            .into_iter()
            .filter_map(|sibling| self.tree.get(sibling))
            .collect()
    }

    /// Snap a drag of `id` to `proposed` (top-left in its parent's space)
    /// and find the frame that would adopt it there.
    pub fn preview_move(&self, id: ShapeId, proposed: Point) -> Option<MovePreview> {
        let shape = self.tree.get(id)?;
        let siblings = self.siblings(id);
        let outcome =
            self.snap
                .snap_shape(shape, proposed, &siblings, self.reference_size(shape));

        let mut moved = shape.clone();
        moved.position = outcome.position;
        let mut spaced: Vec<&Shape> = siblings.clone();
        spaced.push(&moved);
        let mut guides = outcome.guides;
        guides.extend(
            self.snap
                .distribution_guides(&spaced)
                .into_iter()
                .filter(|guide| guide.source_id == id || guide.target_id == Some(id)),
        );

        let world_bounds = self.tree.world_bounds_at(id, outcome.position)?;
        Some(MovePreview {
            position: outcome.position,
            guides,
            new_parent: find_potential_parent(&self.tree, id, world_bounds),
            current_parent: shape.parent_id(),
        })
    }

    /// Apply a drag: snap, move, reparent when the containing frame changed
    /// and re-flow the old and new parents.
    pub fn commit_move(&mut self, id: ShapeId, proposed: Point) -> SceneResult<MoveOutcome> {
        let preview = self
            .preview_move(id, proposed)
            .ok_or(SceneError::ShapeNotFound(id))?;

        let mut affected = self.tree.move_to(id, preview.position);
        let reparented = preview.reparents();
        if reparented {
            match preview.new_parent {
                Some(parent) => self.tree.nest(id, parent)?,
                None => self.tree.unnest(id)?,
            }
            log::debug!(
                "Moved {id} from {:?} to {:?}",
                preview.current_parent,
                preview.new_parent
            );
            if let Some(old_parent) = preview.current_parent {
                affected.extend(self.relayout(old_parent));
            }
        }
        if let Some(parent) = preview.new_parent {
            affected.extend(self.relayout(parent));
        }
        dedup_in_order(&mut affected);

        Ok(MoveOutcome {
            guides: preview.guides,
            parent: preview.new_parent,
            reparented,
            affected,
        })
    }

    /// Apply a resize from `handle` to the proposed local bounds.
    pub fn commit_resize(
        &mut self,
        id: ShapeId,
        handle: ResizeHandle,
        proposed: Rect,
    ) -> SceneResult<ResizeOutcome> {
        let shape = self.tree.get(id).ok_or(SceneError::ShapeNotFound(id))?;
        let parent = shape.parent_id();
        let (before, old_origin) = (shape.local_transform(), shape.position);
        let outcome = self
            .snap
            .snap_resize(shape, handle, proposed, &self.siblings(id));

        let mut affected = self.tree.resize(id, outcome.bounds);
        self.keep_anchor(id, handle, before, old_origin);
        affected.extend(self.relayout(id));
        if let Some(parent) = parent {
            affected.extend(self.relayout(parent));
        }
        dedup_in_order(&mut affected);
        log::debug!("Resized {id} to {:?}", outcome.bounds);

        let bounds = self
            .tree
            .get(id)
            .map_or(outcome.bounds, Shape::local_rect);
        Ok(ResizeOutcome {
            bounds,
            guides: outcome.guides,
            affected,
        })
    }

    /// Shift a resized shape so the point opposite `handle` stays where the
    /// pre-resize rotation put it. Bounds are proposed in the unrotated box,
    /// so this is a no-op for unrotated shapes.
    fn keep_anchor(&mut self, id: ShapeId, handle: ResizeHandle, before: Affine, old_origin: Point) {
        let Some(shape) = self.tree.get_mut(id) else {
            return;
        };
        let anchor = Vec2::new(
            anchor_fraction(handle.west, handle.east) * shape.width,
            anchor_fraction(handle.north, handle.south) * shape.height,
        );
        let target = before * (shape.position + anchor - old_origin).to_point();
        let actual = shape.local_transform() * anchor.to_point();
        shape.position += target - actual;
    }

    /// Rotate by `delta` degrees, snapping the resulting angle to the
    /// configured increment.
    pub fn commit_rotation(&mut self, id: ShapeId, delta: f64) -> SceneResult<RotationOutcome> {
        let current = self
            .tree
            .get(id)
            .map(|shape| shape.rotation)
            .ok_or(SceneError::ShapeNotFound(id))?;
        let rotation = self.snap.snap_rotation(current + delta);
        let applied_delta = rotation - current;
        let affected = self.tree.rotate_by(id, applied_delta);
        log::debug!("Rotated {id} by {applied_delta} degrees");

        Ok(RotationOutcome {
            rotation,
            applied_delta,
            affected,
        })
    }

    /// Re-flow an auto-layout frame, then any auto-layout child frames whose
    /// size the pass changed. Free frames and leaves are a no-op.
    pub fn relayout(&mut self, frame_id: ShapeId) -> Vec<ShapeId> {
        let is_auto = self
            .tree
            .get(frame_id)
            .and_then(Shape::layout)
            .is_some_and(|layout| layout.is_auto());
        if !is_auto {
            return Vec::new();
        }

        let mut affected = Vec::new();
        let mut pending = vec![frame_id];
        while let Some(frame) = pending.pop() {
            for child in self.tree.apply_layout(frame) {
                affected.push(child);
                affected.extend(self.tree.descendants(child));
                let child_is_auto = self
                    .tree
                    .get(child)
                    .and_then(Shape::layout)
                    .is_some_and(|layout| layout.is_auto());
                if child_is_auto && !pending.contains(&child) && child != frame_id {
                    pending.push(child);
                }
            }
        }
        dedup_in_order(&mut affected);
        affected
    }
}

/// Fraction along an axis of the edge a resize keeps fixed.
fn anchor_fraction(moves_start: bool, moves_end: bool) -> f64 {
    match (moves_start, moves_end) {
        (true, false) => 1.0,
        (false, true) => 0.0,
        _ => 0.5,
    }
}

/// Drop repeated IDs, keeping first occurrences.
fn dedup_in_order(ids: &mut Vec<ShapeId>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FlexLayout, Layout};
    use crate::snap::GuideKind;
    use float_cmp::assert_approx_eq;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Shape {
        Shape::rectangle(Point::new(x, y), w, h)
    }

    fn frame(x: f64, y: f64, w: f64, h: f64, layout: Layout) -> Shape {
        Shape::frame(Point::new(x, y), w, h, layout)
    }

    fn editor() -> SceneEditor {
        let mut editor = SceneEditor::default();
        editor.set_canvas_size(1000.0, 800.0);
        editor
    }

    #[test]
    fn test_preview_move_snaps_to_canvas_center() {
        let mut editor = editor();
        editor.set_canvas_size(200.0, 200.0);
        let id = editor.tree.add_shape(rect(0.0, 0.0, 40.0, 40.0));

        let preview = editor.preview_move(id, Point::new(78.0, 100.0)).unwrap();
        assert_eq!(preview.position, Point::new(80.0, 100.0));
        assert_eq!(preview.guides.len(), 1);
        assert_eq!(preview.guides[0].kind, GuideKind::CanvasCenter);
        assert_eq!(preview.new_parent, None);
        assert!(!preview.reparents());
        // Previewing never mutates.
        assert_eq!(editor.tree.get(id).unwrap().position, Point::ORIGIN);
    }

    #[test]
    fn test_commit_move_nests_and_unnests() {
        let mut editor = editor();
        let parent = editor.tree.add_shape(frame(100.0, 100.0, 400.0, 300.0, Layout::Free));
        let id = editor.tree.add_shape(rect(600.0, 600.0, 40.0, 40.0));

        let outcome = editor.commit_move(id, Point::new(203.0, 153.0)).unwrap();
        assert!(outcome.reparented);
        assert_eq!(outcome.parent, Some(parent));
        let shape = editor.tree.get(id).unwrap();
        assert_eq!(shape.parent_id(), Some(parent));
        assert_approx_eq!(f64, shape.position.x, 103.0, epsilon = 1e-9);
        assert_approx_eq!(f64, shape.position.y, 53.0, epsilon = 1e-9);

        // Dragged out of the frame, in the frame's space.
        let outcome = editor.commit_move(id, Point::new(-50.0, -50.0)).unwrap();
        assert!(outcome.reparented);
        assert_eq!(outcome.parent, None);
        let shape = editor.tree.get(id).unwrap();
        assert_eq!(shape.parent_id(), None);
        assert_approx_eq!(f64, shape.position.x, 50.0, epsilon = 1e-9);
        assert_approx_eq!(f64, shape.position.y, 50.0, epsilon = 1e-9);
        assert!(editor.tree.validate().is_ok());
    }

    #[test]
    fn test_commit_move_into_flex_frame_relayouts() {
        let mut editor = editor();
        let flex = Layout::Flex(FlexLayout {
            gap: 10.0,
            ..FlexLayout::default()
        });
        let parent = editor.tree.add_shape(frame(0.0, 0.0, 300.0, 100.0, flex));
        let first = editor
            .tree
            .add_nested_shape(rect(0.0, 0.0, 50.0, 50.0), parent)
            .unwrap();
        editor.relayout(parent);
        let id = editor.tree.add_shape(rect(600.0, 600.0, 50.0, 50.0));

        let outcome = editor.commit_move(id, Point::new(200.0, 20.0)).unwrap();
        assert_eq!(outcome.parent, Some(parent));
        assert_eq!(editor.tree.children_of(parent), &[first, id]);
        assert_eq!(editor.tree.get(first).unwrap().position, Point::new(0.0, 0.0));
        assert_eq!(editor.tree.get(id).unwrap().position, Point::new(60.0, 0.0));
        assert!(outcome.affected.contains(&id));
    }

    #[test]
    fn test_commit_move_missing_shape() {
        let mut editor = editor();
        let missing = uuid::Uuid::new_v4();
        assert_eq!(
            editor.commit_move(missing, Point::ORIGIN),
            Err(SceneError::ShapeNotFound(missing))
        );
    }

    #[test]
    fn test_commit_resize_rescales_children() {
        let mut editor = editor();
        let parent = editor.tree.add_shape(frame(0.0, 0.0, 200.0, 100.0, Layout::Free));
        let child = editor
            .tree
            .add_nested_shape(rect(40.0, 15.0, 20.0, 20.0), parent)
            .unwrap();

        let outcome = editor
            .commit_resize(parent, ResizeHandle::parse("se"), Rect::new(0.0, 0.0, 400.0, 200.0))
            .unwrap();
        assert_eq!(outcome.bounds, Rect::new(0.0, 0.0, 400.0, 200.0));
        assert!(outcome.affected.contains(&child));
        assert_eq!(editor.tree.get(child).unwrap().position, Point::new(90.0, 40.0));
    }

    #[test]
    fn test_commit_resize_enforces_minimum() {
        let mut editor = editor();
        let id = editor.tree.add_shape(rect(0.0, 0.0, 100.0, 100.0));
        let outcome = editor
            .commit_resize(id, ResizeHandle::NORTH_WEST, Rect::new(99.0, 99.0, 100.0, 100.0))
            .unwrap();
        assert_eq!(outcome.bounds, Rect::new(90.0, 90.0, 100.0, 100.0));
    }

    fn world_point(editor: &SceneEditor, id: ShapeId, local: Point) -> Point {
        editor.tree.world_transform(id).unwrap().matrix * local
    }

    fn assert_point_eq(actual: Point, expected: Point) {
        assert_approx_eq!(f64, actual.x, expected.x, epsilon = 1e-6);
        assert_approx_eq!(f64, actual.y, expected.y, epsilon = 1e-6);
    }

    #[test]
    fn test_commit_resize_rotated_keeps_opposite_edge() {
        let mut editor = editor();
        let mut shape = rect(0.0, 0.0, 200.0, 100.0);
        shape.rotation = 90.0;
        let id = editor.tree.add_shape(shape);
        let west_mid = world_point(&editor, id, Point::new(0.0, 50.0));
        assert_point_eq(west_mid, Point::new(100.0, -50.0));

        editor
            .commit_resize(id, ResizeHandle::EAST, Rect::new(0.0, 0.0, 400.0, 100.0))
            .unwrap();

        let shape = editor.tree.get(id).unwrap();
        assert_eq!(shape.width, 400.0);
        assert_point_eq(world_point(&editor, id, Point::new(0.0, 50.0)), west_mid);
        assert_point_eq(
            world_point(&editor, id, Point::new(400.0, 50.0)),
            Point::new(100.0, 350.0),
        );
    }

    #[test]
    fn test_commit_resize_rotated_corner_keeps_opposite_corner() {
        let mut editor = editor();
        let mut shape = rect(100.0, 100.0, 100.0, 60.0);
        shape.rotation = 30.0;
        let id = editor.tree.add_shape(shape);
        let south_east = world_point(&editor, id, Point::new(100.0, 60.0));

        editor
            .commit_resize(id, ResizeHandle::NORTH_WEST, Rect::new(60.0, 80.0, 200.0, 160.0))
            .unwrap();

        let shape = editor.tree.get(id).unwrap();
        assert_eq!(shape.size(), Size::new(140.0, 80.0));
        assert_point_eq(world_point(&editor, id, Point::new(140.0, 80.0)), south_east);
    }

    #[test]
    fn test_commit_rotation_snaps_and_cascades() {
        let mut editor = editor();
        let parent = editor.tree.add_shape(frame(0.0, 0.0, 200.0, 200.0, Layout::Free));
        let child = editor
            .tree
            .add_nested_shape(rect(10.0, 10.0, 20.0, 20.0), parent)
            .unwrap();

        let outcome = editor.commit_rotation(parent, 40.0).unwrap();
        assert_approx_eq!(f64, outcome.rotation, 45.0);
        assert_approx_eq!(f64, outcome.applied_delta, 45.0);
        assert_eq!(outcome.affected, vec![parent, child]);
        let world = editor.tree.world_transform(child).unwrap();
        assert_approx_eq!(f64, world.rotation, 45.0);
    }

    #[test]
    fn test_relayout_ignores_free_frames() {
        let mut editor = editor();
        let parent = editor.tree.add_shape(frame(0.0, 0.0, 200.0, 200.0, Layout::Free));
        editor
            .tree
            .add_nested_shape(rect(10.0, 10.0, 20.0, 20.0), parent)
            .unwrap();
        assert!(editor.relayout(parent).is_empty());
    }
}

//! Scene tree: the flat shape arena every other component reads.

use crate::error::{SceneError, SceneResult};
use crate::shapes::{Shape, ShapeId};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Shapes keyed by ID plus the ordered list of root shapes.
///
/// Ownership lives in the map; `parent_id` and frame `children` are plain ID
/// references kept symmetric by the operations on this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneTree {
    shapes: HashMap<ShapeId, Shape>,
    /// Root shapes in z-order (back to front).
    roots: Vec<ShapeId>,
}

impl SceneTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Get a shape by ID.
    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    /// Get a mutable reference to a shape by ID.
    ///
    /// Structure (`parent_id`, frame children) cannot be changed through it.
    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    /// Root shape IDs in z-order.
    pub fn roots(&self) -> &[ShapeId] {
        &self.roots
    }

    /// Direct children of a shape; empty for leaves and missing IDs.
    pub fn children_of(&self, id: ShapeId) -> &[ShapeId] {
        self.get(id).map_or(&[], Shape::children)
    }

    /// IDs sharing the shape's parent (or the roots), excluding the shape.
    pub fn siblings_of(&self, id: ShapeId) -> Vec<ShapeId> {
        let Some(shape) = self.get(id) else {
            return Vec::new();
        };
        let pool = match shape.parent_id {
            Some(parent) => self.children_of(parent),
            None => &self.roots,
        };
        pool.iter().copied().filter(|&other| other != id).collect()
    }

    /// Add a root shape. Its position is taken as world coordinates.
    ///
    /// Any parent reference or children carried by the shape are dropped.
    pub fn add_shape(&mut self, mut shape: Shape) -> ShapeId {
        let id = shape.id;
        shape.parent_id = None;
        if let Some(frame) = shape.as_frame_mut() {
            frame.children.clear();
        }
        self.roots.push(id);
        self.shapes.insert(id, shape);
        id
    }

    /// Add a shape whose position is in world coordinates and nest it in
    /// `parent`, converting the position to the parent's local space.
    pub fn add_nested_shape(&mut self, shape: Shape, parent: ShapeId) -> SceneResult<ShapeId> {
        let parent_shape = self.get(parent).ok_or(SceneError::ShapeNotFound(parent))?;
        if !parent_shape.is_frame() {
            return Err(SceneError::NotAFrame(parent));
        }
        let id = self.add_shape(shape);
        self.nest(id, parent)?;
        Ok(id)
    }

    /// Remove a shape and all of its descendants.
    ///
    /// Returns the removed shapes, the requested one first.
    pub fn remove_shape(&mut self, id: ShapeId) -> Vec<Shape> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.detach(id);
        let mut removed = Vec::new();
        for shape_id in std::iter::once(id).chain(self.descendants(id)) {
            if let Some(shape) = self.shapes.remove(&shape_id) {
                removed.push(shape);
            }
        }
        log::debug!("Removed shape {id} with {} descendants", removed.len() - 1);
        removed
    }

    /// Move a shape to `index` within its parent's children (or the roots).
    ///
    /// This changes both z-order and flex/grid traversal order.
    pub fn reorder(&mut self, id: ShapeId, index: usize) -> bool {
        let Some(parent) = self.get(id).map(Shape::parent_id) else {
            return false;
        };
        match parent {
            Some(parent) => self
                .get_mut(parent)
                .and_then(Shape::as_frame_mut)
                .is_some_and(|frame| frame.move_child(id, index)),
            None => {
                let Some(pos) = self.roots.iter().position(|&root| root == id) else {
                    return false;
                };
                self.roots.remove(pos);
                let index = index.min(self.roots.len());
                self.roots.insert(index, id);
                true
            }
        }
    }

    /// All shapes in tree order: pre-order over the roots, children in order.
    pub fn iter_tree_order(&self) -> impl Iterator<Item = &Shape> + '_ {
        let mut order = Vec::with_capacity(self.shapes.len());
        for &root in &self.roots {
            order.push(root);
            order.extend(self.descendants(root));
        }
        order.into_iter().filter_map(move |id| self.get(id))
    }

    /// Topmost shape whose rotated world footprint contains `point`.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        let ordered: Vec<&Shape> = self.iter_tree_order().collect();
        ordered.into_iter().rev().find_map(|shape| {
            let world = self.world_transform(shape.id)?;
            let local = crate::transform::world_to_local(point, world.matrix);
            shape
                .contains_local_point(local, tolerance)
                .then_some(shape.id)
        })
    }

    /// Unlink a shape from its parent's children (or the roots) and clear
    /// its parent reference. The shape stays in the map.
    pub(crate) fn detach(&mut self, id: ShapeId) {
        let parent = self.get(id).and_then(Shape::parent_id);
        match parent {
            Some(parent) => {
                if let Some(frame) = self.get_mut(parent).and_then(Shape::as_frame_mut) {
                    frame.remove_child(id);
                }
            }
            None => self.roots.retain(|&root| root != id),
        }
        if let Some(shape) = self.get_mut(id) {
            shape.parent_id = None;
        }
    }

    /// Link a detached shape under `parent` (or as a root when `None`).
    pub(crate) fn attach(&mut self, id: ShapeId, parent: Option<ShapeId>) {
        match parent {
            Some(parent) => {
                if let Some(frame) = self.get_mut(parent).and_then(Shape::as_frame_mut) {
                    frame.push_child(id);
                }
            }
            None => {
                if !self.roots.contains(&id) {
                    self.roots.push(id);
                }
            }
        }
        if let Some(shape) = self.get_mut(id) {
            shape.parent_id = parent;
        }
    }

    /// Check the structural invariants and report the first violation.
    ///
    /// Checks that the parent graph is acyclic, children and parent
    /// references are symmetric, and sizes are positive. Only frames can
    /// own children by construction.
    pub fn validate(&self) -> SceneResult<()> {
        for &root in &self.roots {
            match self.get(root) {
                None => return Err(SceneError::UnknownRoot(root)),
                Some(shape) if shape.parent_id.is_some() => {
                    return Err(SceneError::BrokenBackReference {
                        child: root,
                        parent: shape.parent_id,
                    });
                }
                Some(_) => {}
            }
        }

        for shape in self.shapes.values() {
            if !(shape.width > 0.0 && shape.height > 0.0) {
                return Err(SceneError::InvalidSize(shape.id));
            }
            match shape.parent_id {
                Some(parent_id) => {
                    let parent = self.get(parent_id).ok_or(SceneError::DanglingParent {
                        child: shape.id,
                        parent: parent_id,
                    })?;
                    if !parent.children().contains(&shape.id) {
                        return Err(SceneError::BrokenBackReference {
                            child: shape.id,
                            parent: Some(parent_id),
                        });
                    }
                }
                None if !self.roots.contains(&shape.id) => {
                    return Err(SceneError::BrokenBackReference {
                        child: shape.id,
                        parent: None,
                    });
                }
                None => {}
            }
            for &child_id in shape.children() {
                let child = self.get(child_id).ok_or(SceneError::ShapeNotFound(child_id))?;
                if child.parent_id != Some(shape.id) {
                    return Err(SceneError::BrokenBackReference {
                        child: child_id,
                        parent: Some(shape.id),
                    });
                }
            }
        }

        // Walking up from every shape must reach a root within `len` steps.
        for &start in self.shapes.keys() {
            let mut seen = HashSet::new();
            let mut current = Some(start);
            while let Some(id) = current {
                if !seen.insert(id) {
                    log::warn!("Cycle detected in parent chain of {start}");
                    return Err(SceneError::WouldCycle {
                        child: start,
                        parent: id,
                    });
                }
                current = self.get(id).and_then(Shape::parent_id);
            }
        }
        Ok(())
    }
}

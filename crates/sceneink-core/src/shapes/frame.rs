//! Frame payload: the only shape kind that owns children.

use super::ShapeId;
use crate::layout::Layout;
use serde::{Deserialize, Serialize};

/// Children and layout settings of a frame.
///
/// Child order is meaningful: it is the flex/grid traversal order and the
/// z-order within the frame (back to front).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub(crate) children: Vec<ShapeId>,
    #[serde(default)]
    layout: Layout,
}

impl Frame {
    /// Create an empty frame with the given layout.
    pub fn new(layout: Layout) -> Self {
        Self {
            children: Vec::new(),
            layout,
        }
    }

    /// Get the children of this frame.
    pub fn children(&self) -> &[ShapeId] {
        &self.children
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    /// Check if the given shape is a direct child.
    pub fn contains_child(&self, id: ShapeId) -> bool {
        self.children.contains(&id)
    }

    pub(crate) fn push_child(&mut self, id: ShapeId) {
        if !self.contains_child(id) {
            self.children.push(id);
        }
    }

    pub(crate) fn remove_child(&mut self, id: ShapeId) -> bool {
        let before = self.children.len();
        self.children.retain(|&child| child != id);
        before != self.children.len()
    }

    /// Move a child to `index` (clamped). Returns false if it is not a child.
    pub(crate) fn move_child(&mut self, id: ShapeId, index: usize) -> bool {
        let Some(pos) = self.children.iter().position(|&child| child == id) else {
            return false;
        };
        self.children.remove(pos);
        let index = index.min(self.children.len());
        self.children.insert(index, id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_push_child_ignores_duplicates() {
        let mut frame = Frame::default();
        let id = Uuid::new_v4();
        frame.push_child(id);
        frame.push_child(id);
        assert_eq!(frame.children(), &[id]);
    }

    #[test]
    fn test_remove_child() {
        let mut frame = Frame::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        frame.push_child(a);
        frame.push_child(b);

        assert!(frame.remove_child(a));
        assert!(!frame.remove_child(a));
        assert_eq!(frame.children(), &[b]);
    }

    #[test]
    fn test_move_child_clamps_index() {
        let mut frame = Frame::default();
        let ids: Vec<_> = (0..3).map(|_| Uuid::new_v4()).collect();
        for &id in &ids {
            frame.push_child(id);
        }

        assert!(frame.move_child(ids[0], 99));
        assert_eq!(frame.children(), &[ids[1], ids[2], ids[0]]);

        assert!(frame.move_child(ids[0], 0));
        assert_eq!(frame.children(), &[ids[0], ids[1], ids[2]]);

        assert!(!frame.move_child(Uuid::new_v4(), 0));
    }
}

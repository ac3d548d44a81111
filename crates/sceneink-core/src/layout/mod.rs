//! Child placement for frames.
//!
//! [`compute_positions`] is a pure function of a frame and its direct
//! children: calling it again with unchanged inputs yields the same map.
//! [`SceneTree::apply_layout`] writes the result back into the tree.

mod flex;
mod grid;

use crate::scene::SceneTree;
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Layout mode of a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Layout {
    /// Children keep their stored positions.
    #[default]
    Free,
    /// Single-line flexbox-like placement.
    Flex(FlexLayout),
    /// Fixed-track grid placement.
    Grid(GridLayout),
}

impl Layout {
    /// Check if this layout positions children itself.
    pub fn is_auto(&self) -> bool {
        !matches!(self, Layout::Free)
    }
}

/// Main axis of a flex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlexDirection {
    #[default]
    Row,
    Column,
    RowReverse,
    ColumnReverse,
}

impl FlexDirection {
    /// Check if the main axis is horizontal.
    pub fn is_row(self) -> bool {
        matches!(self, FlexDirection::Row | FlexDirection::RowReverse)
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, FlexDirection::RowReverse | FlexDirection::ColumnReverse)
    }
}

/// Distribution of children along the main axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JustifyContent {
    #[default]
    #[serde(alias = "flex-start")]
    Start,
    #[serde(alias = "flex-end")]
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

/// Placement of children along the cross axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignItems {
    #[default]
    #[serde(alias = "flex-start")]
    Start,
    #[serde(alias = "flex-end")]
    End,
    Center,
    /// Children take the full cross-axis content size.
    Stretch,
    /// Treated as [`AlignItems::Start`].
    Baseline,
}

/// Order in which grid cells are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridAutoFlow {
    #[default]
    Row,
    Column,
}

/// Inner spacing between a frame's edges and its content area.
///
/// Deserializes from either a single number (uniform) or an object with
/// `top`, `right`, `bottom` and `left`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "PaddingRepr")]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Total horizontal padding.
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    /// Total vertical padding.
    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PaddingRepr {
    Uniform(f64),
    Sides {
        #[serde(default)]
        top: f64,
        #[serde(default)]
        right: f64,
        #[serde(default)]
        bottom: f64,
        #[serde(default)]
        left: f64,
    },
}

impl From<PaddingRepr> for Padding {
    fn from(repr: PaddingRepr) -> Self {
        match repr {
            PaddingRepr::Uniform(value) => Padding::uniform(value),
            PaddingRepr::Sides {
                top,
                right,
                bottom,
                left,
            } => Padding {
                top,
                right,
                bottom,
                left,
            },
        }
    }
}

/// Flex layout settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlexLayout {
    pub direction: FlexDirection,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f64,
    pub padding: Padding,
}

/// Grid layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub columns: usize,
    pub rows: usize,
    pub column_gap: f64,
    pub row_gap: f64,
    pub padding: Padding,
    pub auto_flow: GridAutoFlow,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 2,
            rows: 2,
            column_gap: 0.0,
            row_gap: 0.0,
            padding: Padding::default(),
            auto_flow: GridAutoFlow::default(),
        }
    }
}

/// Computed placement of one child, in the frame's local space.
///
/// `width`/`height` are only set when the layout overrides the child's size
/// (flex `stretch` on the cross axis).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Placement {
    /// Placement that leaves the child where it is.
    pub fn keep(child: &Shape) -> Self {
        Self::at(child.position.x, child.position.y)
    }

    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            width: None,
            height: None,
        }
    }
}

/// Compute placements for `children` inside `parent`.
///
/// Non-frame parents behave like free layout.
pub fn compute_positions(parent: &Shape, children: &[&Shape]) -> HashMap<ShapeId, Placement> {
    let container = parent.size();
    let placements = match parent.layout() {
        Some(Layout::Flex(settings)) => flex::layout_flex(settings, container, children),
        Some(Layout::Grid(settings)) => grid::layout_grid(settings, container, children),
        Some(Layout::Free) | None => layout_free(children),
    };
    placements.into_iter().collect()
}

fn layout_free(children: &[&Shape]) -> Vec<(ShapeId, Placement)> {
    children
        .iter()
        .map(|child| (child.id(), Placement::keep(child)))
        .collect()
}

impl SceneTree {
    /// Run the frame's layout and write positions (and stretch sizes) to
    /// its children. Returns the IDs of children that changed.
    ///
    /// Missing IDs and non-frames are a no-op.
    pub fn apply_layout(&mut self, frame_id: ShapeId) -> Vec<ShapeId> {
        let Some(frame) = self.get(frame_id) else {
            return Vec::new();
        };
        if !frame.is_frame() {
            return Vec::new();
        }
        let order = frame.children().to_vec();
        let children: Vec<&Shape> = order.iter().filter_map(|id| self.get(*id)).collect();
        let mut placements = compute_positions(frame, &children);

        let mut changed = Vec::new();
        for id in order {
            let Some(placement) = placements.remove(&id) else {
                continue;
            };
            let Some(child) = self.get(id) else {
                continue;
            };
            let before = (child.position, child.width, child.height);
            let position = Point::new(placement.x, placement.y);
            if placement.width.is_some() || placement.height.is_some() {
                // Stretched frames keep their own children in proportion.
                let size = Size::new(
                    placement.width.unwrap_or(child.width),
                    placement.height.unwrap_or(child.height),
                );
                self.resize(id, Rect::from_origin_size(position, size));
            } else if let Some(child) = self.get_mut(id) {
                child.position = position;
            }
            let after = self
                .get(id)
                .map(|child| (child.position, child.width, child.height));
            if after != Some(before) {
                changed.push(id);
            }
        }
        log::debug!("Laid out frame {frame_id}: {} children moved", changed.len());
        changed
    }
}

/// Size of the content area left after padding.
pub(crate) fn content_size(container: Size, padding: &Padding) -> Size {
    Size::new(
        container.width - padding.horizontal(),
        container.height - padding.vertical(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_free_layout_keeps_positions() {
        let frame = Shape::frame(Point::ORIGIN, 200.0, 200.0, Layout::Free);
        let a = Shape::rectangle(Point::new(5.0, 7.0), 20.0, 20.0);
        let b = Shape::circle(Point::new(50.0, 60.0), 20.0, 20.0);
        let result = compute_positions(&frame, &[&a, &b]);

        assert_eq!(result[&a.id()], Placement::at(5.0, 7.0));
        assert_eq!(result[&b.id()], Placement::at(50.0, 60.0));
    }

    #[test]
    fn test_non_frame_parent_is_free() {
        let parent = Shape::rectangle(Point::ORIGIN, 200.0, 200.0);
        let a = Shape::rectangle(Point::new(5.0, 7.0), 20.0, 20.0);
        let result = compute_positions(&parent, &[&a]);
        assert_eq!(result[&a.id()], Placement::keep(&a));
    }

    #[test]
    fn test_deserialize_flex_settings() {
        let layout: Layout = serde_json::from_str(
            r#"{
                "mode": "flex",
                "direction": "row-reverse",
                "justify_content": "space-between",
                "align_items": "flex-end",
                "gap": 8,
                "padding": 12
            }"#,
        )
        .unwrap();

        let Layout::Flex(flex) = layout else {
            panic!("expected flex layout");
        };
        assert_eq!(flex.direction, FlexDirection::RowReverse);
        assert_eq!(flex.justify_content, JustifyContent::SpaceBetween);
        assert_eq!(flex.align_items, AlignItems::End);
        assert_eq!(flex.gap, 8.0);
        assert_eq!(flex.padding, Padding::uniform(12.0));
    }

    #[test]
    fn test_deserialize_grid_settings_with_defaults() {
        let layout: Layout = serde_json::from_str(
            r#"{"mode": "grid", "columns": 3, "auto_flow": "column", "padding": {"top": 4, "left": 2}}"#,
        )
        .unwrap();

        let Layout::Grid(grid) = layout else {
            panic!("expected grid layout");
        };
        assert_eq!(grid.columns, 3);
        assert_eq!(grid.rows, 2);
        assert_eq!(grid.auto_flow, GridAutoFlow::Column);
        assert_eq!(grid.padding.top, 4.0);
        assert_eq!(grid.padding.left, 2.0);
        assert_eq!(grid.padding.right, 0.0);
    }

    #[test]
    fn test_deserialize_free() {
        let layout: Layout = serde_json::from_str(r#"{"mode": "free"}"#).unwrap();
        assert_eq!(layout, Layout::Free);
        assert!(!layout.is_auto());
    }

    #[test]
    fn test_apply_layout_writes_positions_and_stretch() {
        let mut tree = SceneTree::new();
        let frame = tree.add_shape(Shape::frame(
            Point::ORIGIN,
            300.0,
            100.0,
            Layout::Flex(FlexLayout {
                align_items: AlignItems::Stretch,
                gap: 10.0,
                padding: Padding::uniform(5.0),
                ..FlexLayout::default()
            }),
        ));
        let a = tree
            .add_nested_shape(Shape::rectangle(Point::new(100.0, 20.0), 40.0, 30.0), frame)
            .unwrap();
        let b = tree
            .add_nested_shape(Shape::rectangle(Point::new(200.0, 20.0), 60.0, 30.0), frame)
            .unwrap();

        let changed = tree.apply_layout(frame);
        assert_eq!(changed, vec![a, b]);

        let a = tree.get(a).unwrap();
        assert_eq!(a.position, Point::new(5.0, 5.0));
        assert_eq!(a.height, 90.0);
        let b = tree.get(b).unwrap();
        assert_eq!(b.position, Point::new(55.0, 5.0));
        assert_eq!(b.height, 90.0);

        // Already laid out: nothing moves the second time.
        assert!(tree.apply_layout(frame).is_empty());
    }

    #[test]
    fn test_apply_layout_reports_changes_in_child_order() {
        let mut tree = SceneTree::new();
        let frame = tree.add_shape(Shape::frame(
            Point::ORIGIN,
            400.0,
            100.0,
            Layout::Flex(FlexLayout::default()),
        ));
        let ids: Vec<ShapeId> = (0..6)
            .map(|i| {
                let shape = Shape::rectangle(Point::new(300.0 - 40.0 * i as f64, 50.0), 30.0, 30.0);
                tree.add_nested_shape(shape, frame).unwrap()
            })
            .collect();

        for _ in 0..3 {
            let mut tree = tree.clone();
            assert_eq!(tree.apply_layout(frame), ids);
        }
    }

    #[test]
    fn test_stretch_rescales_nested_frame_children() {
        let mut tree = SceneTree::new();
        let outer = tree.add_shape(Shape::frame(
            Point::ORIGIN,
            300.0,
            200.0,
            Layout::Flex(FlexLayout {
                align_items: AlignItems::Stretch,
                ..FlexLayout::default()
            }),
        ));
        let inner = tree
            .add_nested_shape(Shape::frame(Point::ORIGIN, 100.0, 100.0, Layout::Free), outer)
            .unwrap();
        let leaf = tree
            .add_nested_shape(Shape::rectangle(Point::new(40.0, 40.0), 20.0, 20.0), inner)
            .unwrap();

        tree.apply_layout(outer);

        let inner = tree.get(inner).unwrap();
        assert_eq!(inner.height, 200.0);
        let leaf = tree.get(leaf).unwrap();
        assert_eq!(leaf.center(), Point::new(50.0, 100.0));
        assert_eq!(leaf.center().y / inner.height, 0.5);
    }

    #[test]
    fn test_apply_layout_missing_or_leaf_is_noop() {
        let mut tree = SceneTree::new();
        let rect = tree.add_shape(Shape::rectangle(Point::ORIGIN, 20.0, 20.0));
        assert!(tree.apply_layout(rect).is_empty());
        assert!(tree.apply_layout(uuid::Uuid::new_v4()).is_empty());
    }

    fn layout_strategy() -> impl Strategy<Value = Layout> {
        let justify = prop_oneof![
            Just(JustifyContent::Start),
            Just(JustifyContent::End),
            Just(JustifyContent::Center),
            Just(JustifyContent::SpaceBetween),
            Just(JustifyContent::SpaceAround),
            Just(JustifyContent::SpaceEvenly),
        ];
        let align = prop_oneof![
            Just(AlignItems::Start),
            Just(AlignItems::End),
            Just(AlignItems::Center),
            Just(AlignItems::Stretch),
            Just(AlignItems::Baseline),
        ];
        let direction = prop_oneof![
            Just(FlexDirection::Row),
            Just(FlexDirection::Column),
            Just(FlexDirection::RowReverse),
            Just(FlexDirection::ColumnReverse),
        ];
        let flex = (direction, justify, align, 0.0f64..30.0, 0.0f64..20.0).prop_map(
            |(direction, justify_content, align_items, gap, padding)| {
                Layout::Flex(FlexLayout {
                    direction,
                    justify_content,
                    align_items,
                    gap,
                    padding: Padding::uniform(padding),
                })
            },
        );
        let grid = (1usize..5, 1usize..5, 0.0f64..20.0, any::<bool>()).prop_map(
            |(columns, rows, gap, by_column)| {
                Layout::Grid(GridLayout {
                    columns,
                    rows,
                    column_gap: gap,
                    row_gap: gap,
                    padding: Padding::uniform(4.0),
                    auto_flow: if by_column {
                        GridAutoFlow::Column
                    } else {
                        GridAutoFlow::Row
                    },
                })
            },
        );
        prop_oneof![Just(Layout::Free), flex, grid]
    }

    fn sizes_strategy() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((10.0f64..120.0, 10.0f64..120.0), 0..8)
    }

    fn check_idempotent(layout: Layout, sizes: Vec<(f64, f64)>) -> Result<(), TestCaseError> {
        let frame = Shape::frame(Point::ORIGIN, 400.0, 300.0, layout);
        let children: Vec<Shape> = sizes
            .iter()
            .enumerate()
            .map(|(i, &(w, h))| Shape::rectangle(Point::new(i as f64 * 13.0, 3.0), w, h))
            .collect();
        let refs: Vec<&Shape> = children.iter().collect();

        let first = compute_positions(&frame, &refs);
        let second = compute_positions(&frame, &refs);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), children.len());
        Ok(())
    }

    proptest! {
        #[test]
        fn compute_positions_is_idempotent(layout in layout_strategy(), sizes in sizes_strategy()) {
            check_idempotent(layout, sizes)?;
        }
    }
}

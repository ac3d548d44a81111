//! Snap functionality for aligning dragged and resized shapes.
//!
//! All comparisons happen in one coordinate space: the caller passes the
//! moving shape's proposed position and the shapes it may align with, all
//! expressed in the same (usually the shared parent's) space.

use crate::scene::SceneTree;
use crate::shapes::{MIN_SHAPE_SIZE, Shape, ShapeId};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Distance within which a snap fires (in the shapes' coordinate units).
pub const DEFAULT_SNAP_THRESHOLD: f64 = 8.0;

/// Angle snap increment in degrees.
pub const ANGLE_SNAP_INCREMENT: f64 = 15.0;

/// Snap settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Maximum distance at which a candidate snap fires.
    pub threshold: f64,
    pub enabled: bool,
    /// Grid cell size used when no shape or canvas alignment fires.
    pub grid_size: Option<f64>,
    /// Rotation increment in degrees; `None` disables angle snapping.
    pub angle_increment: Option<f64>,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SNAP_THRESHOLD,
            enabled: true,
            grid_size: None,
            angle_increment: Some(ANGLE_SNAP_INCREMENT),
        }
    }
}

/// Direction of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideOrientation {
    /// A line of constant x.
    Vertical,
    /// A line of constant y.
    Horizontal,
}

/// What produced a guide, for visual feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuideKind {
    /// Edge coincidence with another shape.
    Edge,
    /// Center alignment with another shape.
    Center,
    /// Center alignment with the canvas (or containing frame).
    CanvasCenter,
    /// Equal spacing between neighbouring shapes.
    Distribution,
}

/// An alignment line to draw while editing. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub orientation: GuideOrientation,
    /// x for vertical guides, y for horizontal ones.
    pub position: f64,
    /// Extent along the line: `(start, end)` in y for vertical guides, in x
    /// for horizontal ones.
    pub span: (f64, f64),
    pub source_id: ShapeId,
    /// `None` for canvas guides.
    pub target_id: Option<ShapeId>,
    pub kind: GuideKind,
}

/// Result of snapping a grid point.
#[derive(Debug, Clone, Copy)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Snapped top-left of a dragged shape and the guides that explain it.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapOutcome {
    pub position: Point,
    pub snapped_x: bool,
    pub snapped_y: bool,
    pub guides: Vec<Guide>,
}

/// Snapped bounds of a resized shape and the guides that explain them.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSnapOutcome {
    pub bounds: Rect,
    pub guides: Vec<Guide>,
}

/// Which edges a resize handle moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResizeHandle {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl ResizeHandle {
    pub const NORTH: Self = Self::edges(true, false, false, false);
    pub const SOUTH: Self = Self::edges(false, true, false, false);
    pub const EAST: Self = Self::edges(false, false, true, false);
    pub const WEST: Self = Self::edges(false, false, false, true);
    pub const NORTH_EAST: Self = Self::edges(true, false, true, false);
    pub const NORTH_WEST: Self = Self::edges(true, false, false, true);
    pub const SOUTH_EAST: Self = Self::edges(false, true, true, false);
    pub const SOUTH_WEST: Self = Self::edges(false, true, false, true);

    const fn edges(north: bool, south: bool, east: bool, west: bool) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Parse a handle name such as `"se"` or `"n"`: each of `n`, `s`, `e`,
    /// `w` present in the name activates that edge.
    pub fn parse(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        Self::edges(
            name.contains('n'),
            name.contains('s'),
            name.contains('e'),
            name.contains('w'),
        )
    }

    /// Check if the handle moves no edge at all.
    pub fn is_empty(self) -> bool {
        !(self.north || self.south || self.east || self.west)
    }
}

impl From<&str> for ResizeHandle {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

/// Snap an angle to the nearest increment.
/// Returns the snapped angle in degrees (0-360).
pub fn snap_angle(angle_degrees: f64, increment: f64) -> f64 {
    if increment <= 0.0 {
        return crate::transform::normalize_degrees(angle_degrees);
    }
    let snapped = (angle_degrees / increment).round() * increment;
    crate::transform::normalize_degrees(snapped)
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> SnapResult {
    if grid_size <= 0.0 || !grid_size.is_finite() {
        return SnapResult::none(point);
    }
    SnapResult {
        point: Point::new(
            (point.x / grid_size).round() * grid_size,
            (point.y / grid_size).round() * grid_size,
        ),
        snapped_x: true,
        snapped_y: true,
    }
}

/// Interval of a box along one axis.
#[derive(Debug, Clone, Copy)]
struct Extent {
    start: f64,
    end: f64,
}

impl Extent {
    fn horizontal(rect: Rect) -> Self {
        Self {
            start: rect.x0,
            end: rect.x1,
        }
    }

    fn vertical(rect: Rect) -> Self {
        Self {
            start: rect.y0,
            end: rect.y1,
        }
    }

    fn center(self) -> f64 {
        (self.start + self.end) / 2.0
    }

    fn union(self, other: Self) -> (f64, f64) {
        (self.start.min(other.start), self.end.max(other.end))
    }
}

/// An alignment that fired on one axis.
#[derive(Debug, Clone, Copy)]
struct AxisMatch {
    /// New start (left/top) of the moving shape.
    start: f64,
    /// Where the guide line sits.
    line: f64,
    kind: GuideKind,
}

/// Stateless snapping over caller-supplied shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapEngine {
    pub config: SnapConfig,
}

impl SnapEngine {
    pub fn new(config: SnapConfig) -> Self {
        Self { config }
    }

    fn within(&self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.config.threshold
    }

    /// First of the edge and center rules that fires between the moving
    /// extent and a target extent, in declaration order:
    /// start-start, end-end, start-end, end-start, center-center.
    fn match_axis(&self, moving: Extent, target: Extent) -> Option<AxisMatch> {
        let length = moving.end - moving.start;
        let rules = [
            (moving.start, target.start, 0.0, GuideKind::Edge),
            (moving.end, target.end, length, GuideKind::Edge),
            (moving.start, target.end, 0.0, GuideKind::Edge),
            (moving.end, target.start, length, GuideKind::Edge),
            (moving.center(), target.center(), length / 2.0, GuideKind::Center),
        ];
        rules
            .into_iter()
            .find(|&(value, line, _, _)| self.within(value, line))
            .map(|(_, line, offset, kind)| AxisMatch {
                start: line - offset,
                line,
                kind,
            })
    }

    /// Snap a dragged shape whose top-left is proposed at `position`.
    ///
    /// Each axis is checked independently against the canvas center first
    /// and then against every other shape. A target contributes at most one
    /// guide per axis; when several targets fire, the last one decides the
    /// snapped coordinate. With a grid configured, an axis nothing else
    /// snapped falls back to the grid.
    pub fn snap_shape(
        &self,
        moving: &Shape,
        position: Point,
        others: &[&Shape],
        canvas: Size,
    ) -> SnapOutcome {
        let mut outcome = SnapOutcome {
            position,
            snapped_x: false,
            snapped_y: false,
            guides: Vec::new(),
        };
        if !self.config.enabled {
            return outcome;
        }

        let proposed = Rect::from_origin_size(position, moving.size());
        let moving_x = Extent::horizontal(proposed);
        let moving_y = Extent::vertical(proposed);

        let canvas_x = Extent {
            start: 0.0,
            end: canvas.width,
        };
        let canvas_y = Extent {
            start: 0.0,
            end: canvas.height,
        };
        if self.within(moving_x.center(), canvas_x.center()) {
            outcome.position.x = canvas_x.center() - moving.width / 2.0;
            outcome.snapped_x = true;
            outcome.guides.push(Guide {
                orientation: GuideOrientation::Vertical,
                position: canvas_x.center(),
                span: (0.0, canvas.height),
                source_id: moving.id(),
                target_id: None,
                kind: GuideKind::CanvasCenter,
            });
        }
        if self.within(moving_y.center(), canvas_y.center()) {
            outcome.position.y = canvas_y.center() - moving.height / 2.0;
            outcome.snapped_y = true;
            outcome.guides.push(Guide {
                orientation: GuideOrientation::Horizontal,
                position: canvas_y.center(),
                span: (0.0, canvas.width),
                source_id: moving.id(),
                target_id: None,
                kind: GuideKind::CanvasCenter,
            });
        }

        for other in others.iter().filter(|other| other.id() != moving.id()) {
            let target = other.local_rect();
            let target_x = Extent::horizontal(target);
            let target_y = Extent::vertical(target);

            if let Some(hit) = self.match_axis(moving_x, target_x) {
                outcome.position.x = hit.start;
                outcome.snapped_x = true;
                outcome.guides.push(Guide {
                    orientation: GuideOrientation::Vertical,
                    position: hit.line,
                    span: moving_y.union(target_y),
                    source_id: moving.id(),
                    target_id: Some(other.id()),
                    kind: hit.kind,
                });
            }
            if let Some(hit) = self.match_axis(moving_y, target_y) {
                outcome.position.y = hit.start;
                outcome.snapped_y = true;
                outcome.guides.push(Guide {
                    orientation: GuideOrientation::Horizontal,
                    position: hit.line,
                    span: moving_x.union(target_x),
                    source_id: moving.id(),
                    target_id: Some(other.id()),
                    kind: hit.kind,
                });
            }
        }

        if let Some(grid_size) = self.config.grid_size {
            let grid = snap_to_grid(position, grid_size);
            if !outcome.snapped_x && grid.snapped_x {
                outcome.position.x = grid.point.x;
            }
            if !outcome.snapped_y && grid.snapped_y {
                outcome.position.y = grid.point.y;
            }
        }

        log::trace!(
            "Snapped {} from ({}, {}) to ({}, {}) with {} guides",
            moving.id(),
            position.x,
            position.y,
            outcome.position.x,
            outcome.position.y,
            outcome.guides.len()
        );
        outcome
    }

    /// Snap one moving edge against other shapes' edges on the same axis.
    fn snap_edge(
        &self,
        edge: f64,
        cross: Extent,
        moving_id: ShapeId,
        targets: &[(ShapeId, Extent, Extent)],
        orientation: GuideOrientation,
        guides: &mut Vec<Guide>,
    ) -> f64 {
        let mut snapped = edge;
        let mut fired = false;
        for &(target_id, along, across) in targets {
            let Some(line) = [along.start, along.end]
                .into_iter()
                .find(|&line| self.within(edge, line))
            else {
                continue;
            };
            snapped = line;
            fired = true;
            guides.push(Guide {
                orientation,
                position: line,
                span: cross.union(across),
                source_id: moving_id,
                target_id: Some(target_id),
                kind: GuideKind::Edge,
            });
        }
        if !fired {
            if let Some(grid_size) = self.config.grid_size.filter(|size| *size > 0.0) {
                snapped = (edge / grid_size).round() * grid_size;
            }
        }
        snapped
    }

    /// Snap the edges a resize handle moves, then enforce the minimum size.
    ///
    /// `bounds` is the proposed box. Edges the handle does not move are
    /// left as given; when the minimum size kicks in, the edge opposite the
    /// handle stays anchored.
    pub fn snap_resize(
        &self,
        shape: &Shape,
        handle: ResizeHandle,
        bounds: Rect,
        others: &[&Shape],
    ) -> ResizeSnapOutcome {
        let Rect {
            mut x0,
            mut y0,
            mut x1,
            mut y1,
        } = bounds.abs();
        let mut guides = Vec::new();

        if self.config.enabled {
            let targets_x: Vec<(ShapeId, Extent, Extent)> = others
                .iter()
                .filter(|other| other.id() != shape.id())
                .map(|other| {
                    let rect = other.local_rect();
                    (other.id(), Extent::horizontal(rect), Extent::vertical(rect))
                })
                .collect();
            let targets_y: Vec<(ShapeId, Extent, Extent)> = targets_x
                .iter()
                .map(|&(id, horizontal, vertical)| (id, vertical, horizontal))
                .collect();
            let cross_x = Extent { start: y0, end: y1 };
            let cross_y = Extent { start: x0, end: x1 };
            let vertical = GuideOrientation::Vertical;
            let horizontal = GuideOrientation::Horizontal;

            if handle.west {
                x0 = self.snap_edge(x0, cross_x, shape.id(), &targets_x, vertical, &mut guides);
            }
            if handle.east {
                x1 = self.snap_edge(x1, cross_x, shape.id(), &targets_x, vertical, &mut guides);
            }
            if handle.north {
                y0 = self.snap_edge(y0, cross_y, shape.id(), &targets_y, horizontal, &mut guides);
            }
            if handle.south {
                y1 = self.snap_edge(y1, cross_y, shape.id(), &targets_y, horizontal, &mut guides);
            }
        }

        if x1 - x0 < MIN_SHAPE_SIZE {
            if handle.west && !handle.east {
                x0 = x1 - MIN_SHAPE_SIZE;
            } else {
                x1 = x0 + MIN_SHAPE_SIZE;
            }
        }
        if y1 - y0 < MIN_SHAPE_SIZE {
            if handle.north && !handle.south {
                y0 = y1 - MIN_SHAPE_SIZE;
            } else {
                y1 = y0 + MIN_SHAPE_SIZE;
            }
        }

        ResizeSnapOutcome {
            bounds: Rect::new(x0, y0, x1, y1),
            guides,
        }
    }

    /// Snap a rotation to the configured increment, keeping its sign and
    /// turn count so the change from the previous angle stays small.
    pub fn snap_rotation(&self, degrees: f64) -> f64 {
        match self.config.angle_increment {
            Some(increment) if self.config.enabled && increment > 0.0 => {
                (degrees / increment).round() * increment
            }
            _ => degrees,
        }
    }

    /// Guides for three or more shapes spaced evenly along x.
    ///
    /// Shapes are sorted by left edge; when every gap between neighbours is
    /// within the threshold of the first one, one vertical guide is emitted
    /// per gap at its midpoint. Overlapping neighbours produce no guides.
    pub fn distribution_guides(&self, shapes: &[&Shape]) -> Vec<Guide> {
        self.distribution(shapes, GuideOrientation::Vertical)
    }

    /// Same as [`SnapEngine::distribution_guides`] along y, with horizontal
    /// guides.
    pub fn distribution_guides_vertical(&self, shapes: &[&Shape]) -> Vec<Guide> {
        self.distribution(shapes, GuideOrientation::Horizontal)
    }

    fn distribution(&self, shapes: &[&Shape], orientation: GuideOrientation) -> Vec<Guide> {
        if !self.config.enabled || shapes.len() < 3 {
            return Vec::new();
        }
        let split = |shape: &Shape| {
            let rect = shape.local_rect();
            match orientation {
                GuideOrientation::Vertical => (Extent::horizontal(rect), Extent::vertical(rect)),
                GuideOrientation::Horizontal => (Extent::vertical(rect), Extent::horizontal(rect)),
            }
        };
        let mut sorted: Vec<(ShapeId, Extent, Extent)> = shapes
            .iter()
            .map(|shape| {
                let (along, across) = split(*shape);
                (shape.id(), along, across)
            })
            .collect();
        sorted.sort_by(|a, b| a.1.start.total_cmp(&b.1.start));

        let gaps: Vec<f64> = sorted
            .windows(2)
            .map(|pair| pair[1].1.start - pair[0].1.end)
            .collect();
        let first = gaps[0];
        if gaps
            .iter()
            .any(|&gap| gap < 0.0 || (gap - first).abs() > self.config.threshold)
        {
            return Vec::new();
        }

        sorted
            .windows(2)
            .map(|pair| {
                let (left_id, left, left_across) = pair[0];
                let (right_id, right, right_across) = pair[1];
                Guide {
                    orientation,
                    position: (left.end + right.start) / 2.0,
                    span: left_across.union(right_across),
                    source_id: left_id,
                    target_id: Some(right_id),
                    kind: GuideKind::Distribution,
                }
            })
            .collect()
    }
}

/// Smallest frame whose world bounds fully contain `proposed` (world
/// bounds of `moving` at its drop position), skipping the moving shape and
/// its descendants. Ties go to the first frame in tree order.
pub fn find_potential_parent(tree: &SceneTree, moving: ShapeId, proposed: Rect) -> Option<ShapeId> {
    let excluded: HashSet<ShapeId> = std::iter::once(moving)
        .chain(tree.descendants(moving))
        .collect();
    tree.smallest_frame_containing(proposed, &excluded)
}

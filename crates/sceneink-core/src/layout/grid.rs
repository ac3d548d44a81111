//! Fixed-track grid placement.

use super::{GridAutoFlow, GridLayout, Placement, content_size};
use crate::shapes::{Shape, ShapeId};
use kurbo::Size;

/// Cell width and height for the given grid inside `container`.
pub(crate) fn cell_size(settings: &GridLayout, container: Size) -> Option<Size> {
    if settings.columns == 0 || settings.rows == 0 {
        return None;
    }
    let content = content_size(container, &settings.padding);
    let columns = settings.columns as f64;
    let rows = settings.rows as f64;
    Some(Size::new(
        (content.width - settings.column_gap * (columns - 1.0)) / columns,
        (content.height - settings.row_gap * (rows - 1.0)) / rows,
    ))
}

/// Map a traversal index to `(row, column)` for the flow direction.
fn cell_of(settings: &GridLayout, index: usize) -> (usize, usize) {
    match settings.auto_flow {
        GridAutoFlow::Row => (index / settings.columns, index % settings.columns),
        GridAutoFlow::Column => (index % settings.rows, index / settings.rows),
    }
}

pub(super) fn layout_grid(
    settings: &GridLayout,
    container: Size,
    children: &[&Shape],
) -> Vec<(ShapeId, Placement)> {
    let Some(cell) = cell_size(settings, container) else {
        log::warn!("Grid layout without rows or columns, children keep their positions");
        return children
            .iter()
            .map(|child| (child.id(), Placement::keep(child)))
            .collect();
    };

    children
        .iter()
        .enumerate()
        .map(|(index, child)| {
            let (row, col) = cell_of(settings, index);
            if row >= settings.rows || col >= settings.columns {
                // Overflow stays where it is.
                return (child.id(), Placement::keep(child));
            }
            let cell_x = settings.padding.left + col as f64 * (cell.width + settings.column_gap);
            let cell_y = settings.padding.top + row as f64 * (cell.height + settings.row_gap);
            let placement = Placement::at(
                cell_x + (cell.width - child.width) / 2.0,
                cell_y + (cell.height - child.height) / 2.0,
            );
            (child.id(), placement)
        })
        .collect()
}

//! Single-line flex placement.

use super::{AlignItems, FlexLayout, JustifyContent, Placement, content_size};
use crate::shapes::{Shape, ShapeId, clamp_size};
use kurbo::Size;

pub(super) fn layout_flex(
    settings: &FlexLayout,
    container: Size,
    children: &[&Shape],
) -> Vec<(ShapeId, Placement)> {
    let count = children.len();
    if count == 0 {
        return Vec::new();
    }

    let horizontal = settings.direction.is_row();
    let content = content_size(container, &settings.padding);
    let (main_size, cross_size) = if horizontal {
        (content.width, content.height)
    } else {
        (content.height, content.width)
    };
    let (main_lead, cross_lead) = if horizontal {
        (settings.padding.left, settings.padding.top)
    } else {
        (settings.padding.top, settings.padding.left)
    };
    let main_extent = |shape: &Shape| if horizontal { shape.width } else { shape.height };
    let cross_extent = |shape: &Shape| if horizontal { shape.height } else { shape.width };

    let sizes_sum: f64 = children.iter().map(|&child| main_extent(child)).sum();
    let gap = settings.gap;
    let total = sizes_sum + gap * (count - 1) as f64;
    let free = main_size - total;

    let (main_start, main_gap) = match settings.justify_content {
        JustifyContent::Start => (0.0, gap),
        JustifyContent::End => (free, gap),
        JustifyContent::Center => (free / 2.0, gap),
        JustifyContent::SpaceBetween => {
            if count > 1 {
                (0.0, (main_size - sizes_sum) / (count - 1) as f64)
            } else {
                (0.0, 0.0)
            }
        }
        JustifyContent::SpaceAround => {
            let space = (main_size - sizes_sum) / count as f64;
            (space / 2.0, space)
        }
        JustifyContent::SpaceEvenly => {
            let space = (main_size - sizes_sum) / (count + 1) as f64;
            (space, space)
        }
    };

    let mut ordered: Vec<&Shape> = children.to_vec();
    if settings.direction.is_reversed() {
        ordered.reverse();
    }

    let mut current_main = main_start;
    let mut placements = Vec::with_capacity(count);
    for child in ordered {
        let child_cross = cross_extent(child);
        let (cross_offset, cross_override) = match settings.align_items {
            AlignItems::Start | AlignItems::Baseline => (0.0, None),
            AlignItems::End => (cross_size - child_cross, None),
            AlignItems::Center => ((cross_size - child_cross) / 2.0, None),
            AlignItems::Stretch => (0.0, Some(clamp_size(cross_size))),
        };

        let main_pos = main_lead + current_main;
        let cross_pos = cross_lead + cross_offset;
        let placement = if horizontal {
            Placement {
                x: main_pos,
                y: cross_pos,
                width: None,
                height: cross_override,
            }
        } else {
            Placement {
                x: cross_pos,
                y: main_pos,
                width: cross_override,
                height: None,
            }
        };
        placements.push((child.id(), placement));
        current_main += main_extent(child) + main_gap;
    }
    placements
}

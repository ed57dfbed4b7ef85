//! Stack layout: children one after another along the main axis.

use crate::types::{MainAlign, Orientation, Rect};

use super::types::{align_span, LayoutItem, SizeToken, StackLayout};

/// Main-axis size of every item.
///
/// Fixed and auto items take their size first; proportional items share
/// what is left after those and the spacing, floor-divided, with the
/// rounding remainder given to the last proportional item.
pub fn main_sizes(stack: &StackLayout, available: u16, items: &[LayoutItem]) -> Vec<u16> {
    let main = |size: (u16, u16)| match stack.orientation {
        Orientation::Vertical => size.1,
        Orientation::Horizontal => size.0,
    };

    let mut sizes: Vec<u16> = items
        .iter()
        .map(|item| match item.props.size {
            SizeToken::Fixed(n) => n,
            SizeToken::Auto => main(item.natural()),
            SizeToken::Proportional(_) => 0,
        })
        .collect();

    let fixed: u32 = sizes.iter().map(|s| *s as u32).sum();
    let gaps = stack.spacing as u32 * items.len().saturating_sub(1) as u32;
    let remaining = (available as u32).saturating_sub(fixed + gaps);

    let total_weight: u32 = items
        .iter()
        .map(|item| match item.props.size {
            SizeToken::Proportional(w) => w as u32,
            _ => 0,
        })
        .sum();
    if total_weight == 0 {
        return sizes;
    }

    let mut allocated = 0u32;
    let mut last = None;
    for (i, item) in items.iter().enumerate() {
        if let SizeToken::Proportional(w) = item.props.size {
            let share = remaining * w as u32 / total_weight;
            sizes[i] = share as u16;
            allocated += share;
            last = Some(i);
        }
    }
    if let Some(last) = last {
        sizes[last] += (remaining - allocated) as u16;
    }
    sizes
}

/// Total main-axis extent: sizes plus spacing between them.
pub fn extent(stack: &StackLayout, sizes: &[u16]) -> u32 {
    let gaps = stack.spacing as u32 * sizes.len().saturating_sub(1) as u32;
    sizes.iter().map(|s| *s as u32).sum::<u32>() + gaps
}

/// Lay `items` out inside `content`.
pub fn arrange(stack: &StackLayout, content: Rect, items: &[LayoutItem]) -> Vec<Rect> {
    let vertical = stack.orientation == Orientation::Vertical;
    let (main_origin, main_avail, cross_origin, cross_avail) = if vertical {
        (content.y, content.height, content.x, content.width)
    } else {
        (content.x, content.width, content.y, content.height)
    };

    let sizes = main_sizes(stack, main_avail, items);
    let total = extent(stack, &sizes);
    let free = (main_avail as u32).saturating_sub(total) as u16;
    let mut cursor = main_origin
        + match stack.main_align {
            MainAlign::Start => 0,
            MainAlign::Middle => free / 2,
            MainAlign::End => free,
        };

    let mut rects = Vec::with_capacity(items.len());
    for (item, &main) in items.iter().zip(&sizes) {
        let natural = item.natural();
        let (override_align, cross_natural) = if vertical {
            (item.props.h_align, natural.0)
        } else {
            (item.props.v_align, natural.1)
        };
        let align = override_align.unwrap_or(stack.cross_align);
        let (cross, cross_size) = align_span(cross_origin, cross_avail, cross_natural, align);

        rects.push(if vertical {
            Rect::new(cross, cursor, cross_size, main)
        } else {
            Rect::new(cursor, cross, main, cross_size)
        });
        cursor = cursor.saturating_add(main).saturating_add(stack.spacing);
    }
    rects
}

// =============================================================================
// Tests
// =============================================================================

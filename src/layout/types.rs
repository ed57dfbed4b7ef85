//! Layout Types
//!
//! Per-child constraints, layout strategies and the item/result records the
//! algorithms exchange with the tree.

use serde::{Deserialize, Serialize};

use crate::types::{Align, MainAlign, Orientation, Rect};

use super::grid::GridLayout;

// =============================================================================
// SIZE TOKENS
// =============================================================================

/// How a stack child is sized along the main axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeToken {
    /// Exactly `n` cells.
    Fixed(u16),
    /// A weighted share of the space left after fixed and auto children.
    Proportional(u16),
    /// The child's preferred size, falling back to its current size.
    #[default]
    Auto,
}

// =============================================================================
// LAYOUT PROPS (per-child constraint)
// =============================================================================

/// Constraint attached to a child when it is added to a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutProps {
    pub row: u16,
    pub column: u16,
    pub row_span: u16,
    pub column_span: u16,
    /// Overrides the panel's horizontal alignment for this child.
    pub h_align: Option<Align>,
    /// Overrides the panel's vertical alignment for this child.
    pub v_align: Option<Align>,
    pub size: SizeToken,
}

impl Default for LayoutProps {
    fn default() -> Self {
        Self {
            row: 0,
            column: 0,
            row_span: 1,
            column_span: 1,
            h_align: None,
            v_align: None,
            size: SizeToken::Auto,
        }
    }
}

impl LayoutProps {
    /// Grid cell at `(row, column)`.
    pub fn cell(row: u16, column: u16) -> Self {
        Self {
            row,
            column,
            ..Self::default()
        }
    }

    /// Stack child with the given size token.
    pub fn sized(size: SizeToken) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn span(mut self, rows: u16, columns: u16) -> Self {
        self.row_span = rows;
        self.column_span = columns;
        self
    }

    pub fn align(mut self, h: Align, v: Align) -> Self {
        self.h_align = Some(h);
        self.v_align = Some(v);
        self
    }
}

// =============================================================================
// STRATEGIES
// =============================================================================

/// Sequential arrangement along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StackLayout {
    pub orientation: Orientation,
    pub spacing: u16,
    pub main_align: MainAlign,
    pub cross_align: Align,
}

impl StackLayout {
    pub fn vertical() -> Self {
        Self::default()
    }

    pub fn horizontal() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            ..Self::default()
        }
    }

    pub fn spacing(mut self, spacing: u16) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn main_align(mut self, align: MainAlign) -> Self {
        self.main_align = align;
        self
    }

    pub fn cross_align(mut self, align: Align) -> Self {
        self.cross_align = align;
        self
    }
}

/// A panel's layout strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Layout {
    Stack(StackLayout),
    Grid(GridLayout),
}

// =============================================================================
// ITEMS
// =============================================================================

/// What the algorithms need to know about one visible child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutItem {
    pub props: LayoutProps,
    /// Size the widget asks for, if it has an opinion.
    pub preferred: Option<(u16, u16)>,
    /// Size the child currently has.
    pub current: (u16, u16),
}

impl LayoutItem {
    /// Preferred size, falling back to the current one.
    pub fn natural(&self) -> (u16, u16) {
        self.preferred.unwrap_or(self.current)
    }
}

/// Position `size` within `available` cells starting at `origin`.
///
/// Returns `(offset, size)`; stretch fills, the rest keep `size` clamped to
/// the available extent.
pub fn align_span(origin: u16, available: u16, size: u16, align: Align) -> (u16, u16) {
    let size = size.min(available);
    match align {
        Align::Stretch => (origin, available),
        Align::Start => (origin, size),
        Align::Center => (origin + (available - size) / 2, size),
        Align::End => (origin + (available - size), size),
    }
}

/// Compute child rectangles for `items` inside `content`.
pub fn compute(layout: &Layout, content: Rect, items: &[LayoutItem]) -> Vec<Rect> {
    match layout {
        Layout::Stack(stack) => super::stack::arrange(stack, content, items),
        Layout::Grid(grid) => grid.arrange(content, items),
    }
}

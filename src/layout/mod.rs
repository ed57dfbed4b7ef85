//! Layout Module
//!
//! Stack and grid arrangement of a panel's visible children.
//!
//! The algorithms are pure: they take the panel's content rectangle and one
//! [`LayoutItem`] per visible child and return one rectangle per item. The
//! tree decides when to run them (dirty panels only) and writes the results
//! back into child bounds.
//!
//! # Example
//!
//! ```
//! use spark_panels::layout::{compute, GridLayout, Layout, LayoutItem, LayoutProps};
//! use spark_panels::types::Rect;
//!
//! let grid = GridLayout::parse(&["*"], &["15", "1*", "1*"]).unwrap();
//! let items: Vec<LayoutItem> = (0..3)
//!     .map(|c| LayoutItem { props: LayoutProps::cell(0, c), preferred: None, current: (0, 0) })
//!     .collect();
//! let rects = compute(&Layout::Grid(grid), Rect::new(0, 0, 75, 1), &items);
//! let widths: Vec<u16> = rects.iter().map(|r| r.width).collect();
//! assert_eq!(widths, vec![15, 30, 30]);
//! ```

pub mod grid;
pub mod stack;
mod types;

pub use grid::{distribute, offsets, GridLayout, GridSpec, Track};
pub use types::*;

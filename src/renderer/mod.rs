//! Terminal renderer - the output layer.
//!
//! The renderer knows only about cells. It doesn't understand nodes or
//! layout; the pipeline fills a [`ScreenBuffer`] and [`DiffRenderer`] writes
//! the changed cells to the terminal.

pub mod buffer;
pub mod diff;

pub use buffer::{fit, string_width, truncate, ScreenBuffer};
pub use diff::DiffRenderer;

//! Pipeline
//!
//! Connects the node tree to the terminal:
//!
//! ```text
//! UiTree → layout (dirty panels) → render pass → ScreenBuffer → DiffRenderer
//! ```
//!
//! - [`render`] paints a tree into a buffer
//! - [`Screen`] owns one session and runs the host loop

pub mod mount;
pub mod render;

pub use mount::Screen;
pub use render::{render, RENDER_FAILED};

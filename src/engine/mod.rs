//! Engine - the node arena.
//!
//! - [`UiTree`]: slotmap arena holding every node, the root and the overlay
//!   stack; all structural operations go through it.
//! - [`Node`]: geometry, flags, style and a boxed [`Widget`].
//! - [`Registry`]: kind name → constructor, for building trees from data.
//!
//! # Architecture
//!
//! ```text
//! root (panel, grid)
//! ├── sidebar (panel, stack) ── tree_view
//! └── main (panel, stack)
//!     ├── data_table
//!     └── button
//! ```
//!
//! Parents own children through their `PanelState` child list; a child
//! refers back to its parent by id only.

mod node;
mod registry;
mod tree;

slotmap::new_key_type! {
    /// Handle of a node in a [`UiTree`].
    pub struct NodeId;
}

pub use node::*;
pub use registry::*;
pub use tree::UiTree;

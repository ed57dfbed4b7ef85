//! Primitives - the built-in widgets and their factory functions.
//!
//! Every primitive follows the same shape: a `*Props` struct (serde
//! deserializable, with the common [`NodeProps`] flattened in) and a factory
//! that builds the widget, inserts the node and returns its id.
//!
//! - [`panel`] - bordered container that lays out children
//! - [`label`] - static or wrapped text
//! - [`button`] - focusable caption with an `on_press` callback
//! - [`text_input`] - single-line editor with validation
//! - [`dropdown`] - option list opened as an overlay
//! - [`data_table`] - virtualized, sortable, filterable table
//! - [`tree_view`] - expandable hierarchy
//!
//! ```ignore
//! let root = panel(&mut tree, PanelProps::new("root", Some(Layout::Stack(StackLayout::vertical()))));
//! let ok = button(&mut tree, ButtonProps::new("ok", "OK").on_press(|| println!("pressed")));
//! tree.add_child(root, ok, LayoutProps::sized(SizeToken::Fixed(1)))?;
//! ```

mod button;
mod dropdown;
mod label;
mod panel;
mod text_input;
mod tree_view;
mod types;

pub mod table;

pub use button::{button, Button, ButtonProps};
pub use dropdown::{dropdown, Dropdown, DropdownProps};
pub use label::{label, wrap, Label, LabelProps};
pub use panel::{panel, PanelProps};
pub use table::{data_table, DataTable, TableProps};
pub use text_input::{ensure_cursor_visible, text_input, TextInput, TextInputProps};
pub use tree_view::{tree_view, TreeItem, TreeSelectCallback, TreeView, TreeViewProps, VisibleRow};
pub use types::*;

//! # spark-panels
//!
//! Panel-tree terminal UI toolkit for character-cell screens.
//!
//! ## Architecture
//!
//! Nodes live in a slotmap arena ([`UiTree`]). Panels own ordered child
//! lists and a layout strategy; leaves carry a boxed [`Widget`]. Each frame
//! is a full pass:
//!
//! ```text
//! UiTree ── layout() ──► bounds ── render() ──► ScreenBuffer ── DiffRenderer ──► terminal
//!    ▲                                                              │
//!    └──────── handle_input() ◄── FocusManager ◄── KeyboardEvent ◄──┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - colours, cells, rects, insets, borders, alignment
//! - [`engine`] - node arena, widget trait, kind registry
//! - [`layout`] - stack and grid arrangement
//! - [`renderer`] - screen buffer and diff output
//! - [`state`] - focus ring, keyboard events, input routing, refresh timers
//! - [`pipeline`] - render pass and the [`Screen`] host loop
//! - [`primitives`] - panel, label, button, text input, dropdown, data table, tree view
//! - [`theme`] - colour roles and resolution

pub mod engine;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod primitives;
pub mod renderer;
pub mod state;
pub mod theme;
pub mod types;

pub use types::*;

pub use error::{Error, Result};

pub use engine::{Node, NodeFlags, NodeId, NodeSpec, NodeStyle, PanelWidget, Registry, RenderFrame, UiTree, Widget};

pub use layout::{distribute, GridLayout, Layout, LayoutProps, SizeToken, StackLayout, Track};

pub use renderer::{DiffRenderer, ScreenBuffer};

pub use pipeline::{render, Screen};

pub use primitives::{
    button, data_table, dropdown, label, panel, text_input, tree_view, ButtonProps, DropdownProps, LabelProps,
    NodeProps, PanelProps, TableProps, TextInputProps, TreeItem, TreeViewProps,
};

pub use state::{
    handle_input, FocusManager, GlobalAction, GlobalBindings, InputContext, InputResult, KeyboardEvent, Modifiers,
    RefreshTimer,
};

pub use theme::{roles, ColorResolver, Palette, ThemeColor};

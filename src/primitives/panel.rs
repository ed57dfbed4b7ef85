//! Panel Primitive - Container node with an optional layout.
//!
//! Panels own their children and arrange them with a [`Layout`]; without
//! one, children keep the bounds they were given.
//!
//! # Example
//!
//! ```
//! use spark_panels::engine::UiTree;
//! use spark_panels::layout::{GridLayout, Layout, LayoutProps};
//! use spark_panels::primitives::{label, panel, LabelProps, NodeProps, PanelProps};
//! use spark_panels::types::{BorderStyle, Rect};
//!
//! let mut tree = UiTree::new();
//! let grid = GridLayout::parse(&["*"], &["15", "*", "*"]).unwrap();
//! let root = panel(&mut tree, PanelProps {
//!     node: NodeProps::named("root").bounds(Rect::new(0, 0, 77, 10)).border(BorderStyle::Single),
//!     layout: Some(Layout::Grid(grid)),
//! });
//! let title = label(&mut tree, LabelProps::new("title", "Tasks"));
//! tree.add_child(root, title, LayoutProps::cell(0, 1)).unwrap();
//! tree.set_root(root).unwrap();
//! tree.layout();
//! assert_eq!(tree.get(title).unwrap().bounds(), Rect::new(16, 1, 30, 8));
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::{NodeId, PanelWidget, UiTree};
use crate::layout::Layout;

use super::types::NodeProps;

/// Properties for [`panel`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelProps {
    #[serde(flatten)]
    pub node: NodeProps,
    pub layout: Option<Layout>,
}

impl PanelProps {
    pub fn new(name: impl Into<String>, layout: Option<Layout>) -> Self {
        Self {
            node: NodeProps::named(name),
            layout,
        }
    }
}

/// Create a panel node.
pub fn panel(tree: &mut UiTree, props: PanelProps) -> NodeId {
    tree.insert(props.node.container(Box::new(PanelWidget), props.layout, false))
}

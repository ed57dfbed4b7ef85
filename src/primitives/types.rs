//! Primitive types - props shared by every factory and the callback aliases.
//!
//! Every factory takes a kind-specific props struct that embeds a
//! [`NodeProps`]. Plain-data fields are serde-deserializable so a host can
//! describe screens in JSON; behaviour callbacks are attached in code.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::engine::{Node, NodeStyle, Widget};
use crate::layout::Layout;
use crate::theme::ThemeColor;
use crate::types::{BorderStyle, Insets, Rect};

// =============================================================================
// Callback Types
// =============================================================================

/// Button press callback.
pub type PressCallback = Rc<dyn Fn()>;

/// Value change callback (text input, dropdown).
pub type ChangeCallback = Rc<dyn Fn(&str)>;

/// Submit callback (Enter in a text input).
pub type SubmitCallback = Rc<dyn Fn(&str)>;

/// Validator for a text input: `Err(message)` rejects the value.
pub type Validator = Rc<dyn Fn(&str) -> Result<(), String>>;

/// Dropdown selection callback: index and option text.
pub type DropdownCallback = Rc<dyn Fn(usize, &str)>;

// =============================================================================
// Node Props
// =============================================================================

/// Identity, geometry and box style common to all kinds.
///
/// `focusable: None` means "use the kind's default" (buttons, inputs and
/// data widgets are focusable; panels and labels are not).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeProps {
    pub name: String,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub z_index: i32,
    pub visible: bool,
    pub focusable: Option<bool>,

    pub fg: ThemeColor,
    pub bg: ThemeColor,
    pub border: BorderStyle,
    pub border_color: ThemeColor,
    pub focus_color: ThemeColor,
    pub title: Option<String>,
    pub padding: Insets,
    pub margin: Insets,
}

impl Default for NodeProps {
    fn default() -> Self {
        Self {
            name: String::new(),
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            z_index: 0,
            visible: true,
            focusable: None,
            fg: ThemeColor::Default,
            bg: ThemeColor::Default,
            border: BorderStyle::None,
            border_color: ThemeColor::Default,
            focus_color: ThemeColor::Default,
            title: None,
            padding: Insets::ZERO,
            margin: Insets::ZERO,
        }
    }
}

impl NodeProps {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn bounds(mut self, rect: Rect) -> Self {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
        self
    }

    pub fn border(mut self, border: BorderStyle) -> Self {
        self.border = border;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn style(&self) -> NodeStyle {
        NodeStyle {
            fg: self.fg.clone(),
            bg: self.bg.clone(),
            border: self.border,
            border_color: self.border_color.clone(),
            focus_color: self.focus_color.clone(),
            title: self.title.clone(),
            padding: self.padding,
            margin: self.margin,
        }
    }

    /// Build a leaf node around `widget`.
    pub fn leaf(&self, widget: Box<dyn Widget>, focusable_by_default: bool) -> Node {
        self.finish(Node::new(self.name.clone(), widget), focusable_by_default)
    }

    /// Build a panel node around `widget`.
    pub fn container(&self, widget: Box<dyn Widget>, layout: Option<Layout>, focusable_by_default: bool) -> Node {
        self.finish(Node::panel(self.name.clone(), widget, layout), focusable_by_default)
    }

    fn finish(&self, node: Node, focusable_by_default: bool) -> Node {
        node.with_bounds(self.rect())
            .with_style(self.style())
            .with_z_index(self.z_index)
            .visible(self.visible)
            .focusable(self.focusable.unwrap_or(focusable_by_default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PanelWidget;

    #[test]
    fn test_node_props_from_json() {
        let props: NodeProps = serde_json::from_str(
            r#"{"name": "sidebar", "width": 20, "height": 10, "border": "rounded", "bg": "surface", "padding": {"left": 1}}"#,
        )
        .unwrap();
        assert_eq!(props.name, "sidebar");
        assert!(props.visible);
        assert_eq!(props.border, BorderStyle::Rounded);
        assert_eq!(props.bg, ThemeColor::Named("surface".into()));
        assert_eq!(props.padding.left, 1);
        assert_eq!(props.padding.right, 0);
    }

    #[test]
    fn test_focusable_default_per_kind() {
        let props = NodeProps::named("x");
        assert!(props.leaf(Box::new(PanelWidget), true).is_focusable());
        assert!(!props.leaf(Box::new(PanelWidget), false).is_focusable());

        let forced = NodeProps {
            focusable: Some(false),
            ..NodeProps::named("x")
        };
        assert!(!forced.leaf(Box::new(PanelWidget), true).is_focusable());
    }
}

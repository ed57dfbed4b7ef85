//! Node - the unit stored in the tree arena.
//!
//! A node carries geometry, flags and style; what it *does* lives behind the
//! [`Widget`] trait object. A node with [`PanelState`] is a panel: it owns an
//! ordered child list and optionally a layout strategy.

use std::any::Any;

use crate::error::Result;
use crate::layout::{Layout, LayoutProps};
use crate::renderer::ScreenBuffer;
use crate::state::input::InputContext;
use crate::state::keyboard::KeyboardEvent;
use crate::theme::{ColorResolver, ThemeColor};
use crate::types::{BorderStyle, CellStyle, Insets, Rect, Rgba};

use super::NodeId;

// =============================================================================
// Flags
// =============================================================================

bitflags::bitflags! {
    /// Per-node state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        const VISIBLE = 1 << 0;
        const FOCUSABLE = 1 << 1;
        const FOCUSED = 1 << 2;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

// =============================================================================
// Style
// =============================================================================

/// Visual box properties shared by every node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeStyle {
    pub fg: ThemeColor,
    pub bg: ThemeColor,
    pub border: BorderStyle,
    pub border_color: ThemeColor,
    /// Border colour while the node has focus.
    pub focus_color: ThemeColor,
    pub title: Option<String>,
    pub padding: Insets,
    pub margin: Insets,
}

// =============================================================================
// Widget behaviour
// =============================================================================

/// Downcasting support for widget trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behaviour of a node.
///
/// Only `kind` is required. Panels use the defaults: they draw nothing of
/// their own and ignore input.
pub trait Widget: AsAny {
    /// Kind name, used in logs and by the registry.
    fn kind(&self) -> &'static str;

    /// Draw into the node's content area.
    fn render(&mut self, _frame: &mut RenderFrame<'_>) -> Result<()> {
        Ok(())
    }

    /// Handle a key. `Ok(true)` means handled.
    fn handle_input(&mut self, _event: &KeyboardEvent, _ctx: &mut InputContext) -> Result<bool> {
        Ok(false)
    }

    /// Check the widget's current value.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Size the widget would like, given the space it could have.
    fn measure(&self, _available: Rect) -> Result<Option<(u16, u16)>> {
        Ok(None)
    }

    /// Called after the node's content area changed.
    fn arrange(&mut self, _content: Rect) {}

    /// Called when a refresh tick is observed by the host loop.
    fn refresh(&mut self) -> Result<()> {
        Ok(())
    }

    /// Area painted while the node is an open overlay.
    fn overlay_extent(&self, bounds: Rect) -> Rect {
        bounds
    }
}

impl dyn Widget {
    pub fn downcast_ref<T: Widget>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: Widget>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

/// Behaviour of a plain panel: containers only.
#[derive(Debug, Default)]
pub struct PanelWidget;

impl Widget for PanelWidget {
    fn kind(&self) -> &'static str {
        "panel"
    }
}

// =============================================================================
// Render frame
// =============================================================================

/// Everything a widget may touch while drawing.
pub struct RenderFrame<'a> {
    pub buffer: &'a mut ScreenBuffer,
    pub colors: &'a dyn ColorResolver,
    /// Full node bounds (or overlay extent).
    pub bounds: Rect,
    /// Area inside margin, border and padding.
    pub content: Rect,
    /// Writes outside this rectangle are dropped.
    pub clip: Rect,
    pub focused: bool,
    /// Resolved foreground and background of the node.
    pub fg: Rgba,
    pub bg: Rgba,
}

impl RenderFrame<'_> {
    /// Resolve a colour role with a fallback.
    pub fn color(&self, name: &str, default: Rgba) -> Rgba {
        self.colors.resolve(name, default)
    }

    /// The node's base text style.
    pub fn text_style(&self) -> CellStyle {
        CellStyle::new(self.fg, self.bg)
    }

    /// Write `text` at an offset relative to the content area.
    pub fn write(&mut self, dx: u16, dy: u16, text: &str, style: CellStyle) -> u16 {
        let x = self.content.x.saturating_add(dx);
        let y = self.content.y.saturating_add(dy);
        if y >= self.content.bottom() {
            return 0;
        }
        let clip = self.clip;
        self.buffer.write_str(x, y, text, style, Some(&clip))
    }

    /// Fill a content-relative row with `bg`.
    pub fn fill_row(&mut self, dy: u16, bg: Rgba) {
        let row = Rect::new(self.content.x, self.content.y.saturating_add(dy), self.content.width, 1);
        let clip = self.clip;
        self.buffer.fill_rect(row, bg, Some(&clip));
    }
}

// =============================================================================
// Panel state
// =============================================================================

/// Child list and layout of a panel node.
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    pub(crate) children: Vec<NodeId>,
    pub(crate) layout: Option<Layout>,
    pub(crate) dirty: bool,
}

impl PanelState {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

// =============================================================================
// Node
// =============================================================================

/// A node in the arena.
pub struct Node {
    pub(crate) name: String,
    pub(crate) bounds: Rect,
    pub(crate) z_index: i32,
    pub(crate) flags: NodeFlags,
    pub(crate) parent: Option<NodeId>,
    pub(crate) style: NodeStyle,
    /// Constraint inside the parent's layout.
    pub(crate) layout_props: LayoutProps,
    pub(crate) panel: Option<PanelState>,
    pub(crate) widget: Box<dyn Widget>,
}

impl Node {
    /// A leaf node.
    pub fn new(name: impl Into<String>, widget: Box<dyn Widget>) -> Self {
        Self {
            name: name.into(),
            bounds: Rect::default(),
            z_index: 0,
            flags: NodeFlags::default(),
            parent: None,
            style: NodeStyle::default(),
            layout_props: LayoutProps::default(),
            panel: None,
            widget,
        }
    }

    /// A panel node with an optional layout.
    pub fn panel(name: impl Into<String>, widget: Box<dyn Widget>, layout: Option<Layout>) -> Self {
        let mut node = Self::new(name, widget);
        node.panel = Some(PanelState {
            children: Vec::new(),
            layout,
            dirty: true,
        });
        node
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_z_index(mut self, z: i32) -> Self {
        self.z_index = z;
        self
    }

    pub fn focusable(mut self, focusable: bool) -> Self {
        self.flags.set(NodeFlags::FOCUSABLE, focusable);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.flags.set(NodeFlags::VISIBLE, visible);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    pub fn is_focusable(&self) -> bool {
        self.flags.contains(NodeFlags::FOCUSABLE)
    }

    pub fn is_focused(&self) -> bool {
        self.flags.contains(NodeFlags::FOCUSED)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn style(&self) -> &NodeStyle {
        &self.style
    }

    pub fn layout_props(&self) -> &LayoutProps {
        &self.layout_props
    }

    pub fn panel_state(&self) -> Option<&PanelState> {
        self.panel.as_ref()
    }

    pub fn is_panel(&self) -> bool {
        self.panel.is_some()
    }

    pub fn widget(&self) -> &dyn Widget {
        self.widget.as_ref()
    }

    pub fn widget_mut(&mut self) -> &mut dyn Widget {
        self.widget.as_mut()
    }

    /// Bounds minus margin, border and padding.
    pub fn content_area(&self) -> Rect {
        let border = Insets::all(self.style.border.thickness());
        self.bounds
            .inset(self.style.margin)
            .inset(border)
            .inset(self.style.padding)
    }

    /// Bounds minus margin: where the border is drawn.
    pub fn border_area(&self) -> Rect {
        self.bounds.inset(self.style.margin)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("kind", &self.widget.kind())
            .field("bounds", &self.bounds)
            .field("z_index", &self.z_index)
            .field("flags", &self.flags)
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_area_subtracts_margin_border_padding() {
        let style = NodeStyle {
            border: BorderStyle::Single,
            padding: Insets::xy(1, 0),
            margin: Insets::all(1),
            ..NodeStyle::default()
        };
        let node = Node::panel("p", Box::new(PanelWidget), None)
            .with_bounds(Rect::new(0, 0, 20, 10))
            .with_style(style);
        assert_eq!(node.border_area(), Rect::new(1, 1, 18, 8));
        assert_eq!(node.content_area(), Rect::new(3, 2, 14, 6));
    }

    #[test]
    fn test_bordered_panel_interior() {
        let node = Node::panel("p", Box::new(PanelWidget), None)
            .with_bounds(Rect::new(0, 0, 10, 5))
            .with_style(NodeStyle {
                border: BorderStyle::Rounded,
                ..NodeStyle::default()
            });
        assert_eq!(node.content_area(), Rect::new(1, 1, 8, 3));
    }

    #[test]
    fn test_default_flags_and_downcast() {
        let node = Node::new("n", Box::new(PanelWidget));
        assert!(node.is_visible());
        assert!(!node.is_focusable());
        assert!(node.widget().downcast_ref::<PanelWidget>().is_some());
    }
}

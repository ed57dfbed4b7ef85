//! Dropdown Primitive - pick one option from a list shown as an overlay.
//!
//! Closed, the node shows the current option and a `▼`. Enter, Space or
//! ArrowDown opens it: the node becomes an overlay whose painted extent
//! grows downward to list the options. While open it owns all input:
//! Up/Down move the highlight, Enter picks, Escape closes unchanged.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::engine::{NodeId, RenderFrame, UiTree, Widget};
use crate::error::Result;
use crate::renderer::{fit, string_width};
use crate::state::input::InputContext;
use crate::state::keyboard::KeyboardEvent;
use crate::theme::roles;
use crate::types::{CellStyle, Rect, TextAlign};

use super::types::{DropdownCallback, NodeProps};

const DEFAULT_MAX_VISIBLE: usize = 8;

/// Properties for [`dropdown`].
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DropdownProps {
    #[serde(flatten)]
    pub node: NodeProps,
    pub options: Vec<String>,
    pub selected: usize,
    /// Rows of the open list; 0 uses the default.
    pub max_visible: usize,
    #[serde(skip)]
    pub on_change: Option<DropdownCallback>,
}

impl DropdownProps {
    pub fn new(name: impl Into<String>, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            node: NodeProps::named(name),
            options: options.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn on_change(mut self, f: impl Fn(usize, &str) + 'static) -> Self {
        self.on_change = Some(Rc::new(f));
        self
    }
}

/// Single-choice selector.
pub struct Dropdown {
    options: Vec<String>,
    selected: usize,
    highlighted: usize,
    scroll: usize,
    max_visible: usize,
    open: bool,
    on_change: Option<DropdownCallback>,
}

impl Dropdown {
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.options.get(self.selected).map(String::as_str)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Replace the options, keeping the selection in range.
    pub fn set_options(&mut self, options: Vec<String>) {
        self.options = options;
        self.selected = self.selected.min(self.options.len().saturating_sub(1));
        self.highlighted = self.selected;
        self.scroll = 0;
    }

    fn visible_rows(&self) -> usize {
        self.options.len().min(self.max_visible)
    }

    fn move_highlight(&mut self, delta: isize) {
        if self.options.is_empty() {
            return;
        }
        let last = self.options.len() - 1;
        self.highlighted = self.highlighted.saturating_add_signed(delta).min(last);
        let rows = self.visible_rows().max(1);
        if self.highlighted < self.scroll {
            self.scroll = self.highlighted;
        } else if self.highlighted >= self.scroll + rows {
            self.scroll = self.highlighted + 1 - rows;
        }
    }

    fn open(&mut self, ctx: &mut InputContext) {
        self.open = true;
        self.highlighted = self.selected;
        self.scroll = 0;
        self.move_highlight(0);
        ctx.open_overlay();
    }

    fn close(&mut self, ctx: &mut InputContext) {
        self.open = false;
        ctx.close_overlay();
    }
}

impl Widget for Dropdown {
    fn kind(&self) -> &'static str {
        "dropdown"
    }

    fn render(&mut self, frame: &mut RenderFrame<'_>) -> Result<()> {
        let width = frame.content.width as usize;
        let base = frame.text_style();
        let current = self.selected_text().unwrap_or("");
        let arrow = if self.open { "▲" } else { "▼" };
        let text_width = width.saturating_sub(2);
        frame.write(0, 0, &fit(current, text_width, TextAlign::Left), base);
        frame.write(text_width as u16 + 1, 0, arrow, base);

        if !self.open {
            return Ok(());
        }
        let selection = CellStyle::new(
            frame.color(roles::SELECTION_TEXT, frame.bg),
            frame.color(roles::SELECTION, frame.fg),
        );
        let rows = self.visible_rows();
        for (row, index) in (self.scroll..self.scroll + rows).enumerate() {
            let Some(option) = self.options.get(index) else {
                break;
            };
            let style = if index == self.highlighted { selection } else { base };
            let dy = row as u16 + 1;
            frame.fill_row(dy, style.bg.unwrap_or(frame.bg));
            frame.write(0, dy, &fit(option, width, TextAlign::Left), style);
        }
        Ok(())
    }

    fn handle_input(&mut self, event: &KeyboardEvent, ctx: &mut InputContext) -> Result<bool> {
        if !event.is_press() {
            return Ok(false);
        }
        if !self.open {
            return Ok(match event.key.as_str() {
                "Enter" | " " | "ArrowDown" if !self.options.is_empty() => {
                    self.open(ctx);
                    true
                }
                _ => false,
            });
        }

        match event.key.as_str() {
            "ArrowUp" => self.move_highlight(-1),
            "ArrowDown" => self.move_highlight(1),
            "PageUp" => self.move_highlight(-(self.visible_rows() as isize)),
            "PageDown" => self.move_highlight(self.visible_rows() as isize),
            "Home" => self.move_highlight(-(self.options.len() as isize)),
            "End" => self.move_highlight(self.options.len() as isize),
            "Enter" | " " => {
                let changed = self.highlighted != self.selected;
                self.selected = self.highlighted;
                self.close(ctx);
                if changed {
                    if let (Some(on_change), Some(text)) = (&self.on_change, self.options.get(self.selected)) {
                        on_change(self.selected, text);
                    }
                }
            }
            "Escape" => self.close(ctx),
            // Swallow everything else while open.
            _ => {}
        }
        ctx.redraw();
        Ok(true)
    }

    fn measure(&self, _available: Rect) -> Result<Option<(u16, u16)>> {
        let widest = self.options.iter().map(|o| string_width(o)).max().unwrap_or(0);
        Ok(Some(((widest + 2).min(u16::MAX as usize) as u16, 1)))
    }

    fn overlay_extent(&self, bounds: Rect) -> Rect {
        let extra = self.visible_rows().min(u16::MAX as usize) as u16;
        Rect::new(bounds.x, bounds.y, bounds.width, bounds.height.saturating_add(extra))
    }
}

/// Create a dropdown node.
pub fn dropdown(tree: &mut UiTree, props: DropdownProps) -> NodeId {
    let selected = props.selected.min(props.options.len().saturating_sub(1));
    let widget = Dropdown {
        options: props.options,
        selected,
        highlighted: selected,
        scroll: 0,
        max_visible: if props.max_visible == 0 { DEFAULT_MAX_VISIBLE } else { props.max_visible },
        open: false,
        on_change: props.on_change,
    };
    tree.insert(props.node.leaf(Box::new(widget), true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::engine::{Node, PanelWidget};
    use crate::layout::LayoutProps;
    use crate::pipeline::render;
    use crate::renderer::ScreenBuffer;
    use crate::state::{handle_input, FocusManager};
    use crate::theme::Palette;

    fn setup() -> (UiTree, FocusManager, NodeId, Rc<RefCell<Vec<(usize, String)>>>) {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = changes.clone();
        let mut tree = UiTree::new();
        let root = tree.insert(Node::panel("root", Box::new(PanelWidget), None).with_bounds(Rect::new(0, 0, 10, 5)));
        tree.set_root(root).unwrap();
        let mut props = DropdownProps::new("status", ["todo", "doing", "done"])
            .on_change(move |i, s| sink.borrow_mut().push((i, s.to_string())));
        props.node = props.node.bounds(Rect::new(0, 0, 10, 1));
        let dd = dropdown(&mut tree, props);
        tree.add_child(root, dd, LayoutProps::default()).unwrap();
        let mut focus = FocusManager::new();
        focus.rebuild(&tree);
        focus.focus_first(&mut tree);
        (tree, focus, dd, changes)
    }

    fn press(tree: &mut UiTree, focus: &mut FocusManager, key: &str) -> bool {
        handle_input(tree, focus, &KeyboardEvent::new(key)).is_handled()
    }

    #[test]
    fn test_open_pick_close() {
        let (mut tree, mut focus, dd, changes) = setup();
        assert!(press(&mut tree, &mut focus, "Enter"));
        assert_eq!(tree.top_overlay(), Some(dd));
        assert!(press(&mut tree, &mut focus, "ArrowDown"));
        assert!(press(&mut tree, &mut focus, "ArrowDown"));
        assert!(press(&mut tree, &mut focus, "Enter"));

        assert_eq!(tree.top_overlay(), None);
        assert_eq!(tree.widget::<Dropdown>(dd).unwrap().selected_text(), Some("done"));
        assert_eq!(*changes.borrow(), vec![(2, "done".to_string())]);
        assert_eq!(focus.focused(), Some(dd));
    }

    #[test]
    fn test_pick_keeps_focus_on_dropdown() {
        let (mut tree, mut focus, dd, _) = setup();
        let root = tree.root().unwrap();
        let save = tree.insert(Node::new("save", Box::new(PanelWidget)).focusable(true));
        tree.add_child(root, save, LayoutProps::default()).unwrap();
        focus.rebuild(&tree);
        assert!(focus.request_focus(&mut tree, save));
        assert!(focus.request_focus(&mut tree, dd));

        press(&mut tree, &mut focus, "Enter");
        press(&mut tree, &mut focus, "ArrowDown");
        press(&mut tree, &mut focus, "Enter");

        assert_eq!(tree.top_overlay(), None);
        assert_eq!(tree.widget::<Dropdown>(dd).unwrap().selected_text(), Some("doing"));
        assert_eq!(focus.focused(), Some(dd));
        assert!(!tree.get(save).unwrap().is_focused());
    }

    #[test]
    fn test_escape_closes_without_change() {
        let (mut tree, mut focus, dd, changes) = setup();
        press(&mut tree, &mut focus, "Enter");
        press(&mut tree, &mut focus, "ArrowDown");
        assert!(press(&mut tree, &mut focus, "Escape"));
        assert!(!tree.widget::<Dropdown>(dd).unwrap().is_open());
        assert_eq!(tree.widget::<Dropdown>(dd).unwrap().selected(), 0);
        assert!(changes.borrow().is_empty());
    }

    #[test]
    fn test_open_list_painted_over_tree() {
        let (mut tree, mut focus, _, _) = setup();
        press(&mut tree, &mut focus, "Enter");
        let mut buffer = ScreenBuffer::new(10, 5);
        render(&mut tree, &mut buffer, &Palette::new());
        assert_eq!(buffer.row_text(0), "todo     ▲");
        assert_eq!(buffer.row_text(1), "todo      ");
        assert_eq!(buffer.row_text(3), "done      ");
        assert_eq!(buffer.row_text(4), "          ");
    }

    #[test]
    fn test_closed_ignores_other_keys() {
        let (mut tree, mut focus, _, _) = setup();
        assert!(!press(&mut tree, &mut focus, "x"));
    }
}

//! Tree View - expandable hierarchy flattened into scrollable rows.
//!
//! Items live in an index arena; each entry knows its parent, children and
//! whether it is expanded. The visible rows are a depth-first flattening
//! that includes an entry only when every ancestor is expanded. The root
//! can be hidden, in which case its children form the top level.
//!
//! With a filter active, an entry is shown when it or any descendant
//! matches (case-insensitive substring), so every match keeps its
//! ancestor path visible regardless of expansion.
//!
//! # Keys
//!
//! - ArrowUp / ArrowDown, PageUp / PageDown, Home / End: move
//! - ArrowLeft: collapse, or go to the parent
//! - ArrowRight: expand, or go to the first child
//! - `*` / `-`: expand / collapse the selected subtree
//! - Enter: `on_select`
//! - `/`: filter (Enter keeps, Escape restores); Escape clears a filter

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::{NodeId, RenderFrame, UiTree, Widget};
use crate::error::Result;
use crate::renderer::fit;
use crate::state::input::InputContext;
use crate::state::keyboard::KeyboardEvent;
use crate::theme::roles;
use crate::types::{CellStyle, Rect, TextAlign};

use super::types::NodeProps;

/// Called on Enter with the selected item's label and data.
pub type TreeSelectCallback = Rc<dyn Fn(&str, Option<&Value>)>;

/// Input description of one item and its subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeItem {
    pub label: String,
    pub expanded: bool,
    pub data: Option<Value>,
    pub children: Vec<TreeItem>,
}

impl TreeItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn child(mut self, child: TreeItem) -> Self {
        self.children.push(child);
        self
    }

    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[derive(Debug, Clone)]
struct Entry {
    label: String,
    data: Option<Value>,
    parent: Option<usize>,
    children: Vec<usize>,
    expanded: bool,
    depth: u16,
}

/// Row of the flattened view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRow {
    pub entry: usize,
    pub depth: u16,
}

/// Properties for [`tree_view`].
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeViewProps {
    #[serde(flatten)]
    pub node: NodeProps,
    pub root: TreeItem,
    pub hide_root: bool,
    #[serde(skip)]
    pub on_select: Option<TreeSelectCallback>,
}

impl TreeViewProps {
    pub fn new(name: impl Into<String>, root: TreeItem) -> Self {
        Self {
            node: NodeProps::named(name),
            root,
            ..Self::default()
        }
    }

    pub fn on_select(mut self, f: impl Fn(&str, Option<&Value>) + 'static) -> Self {
        self.on_select = Some(Rc::new(f));
        self
    }
}

/// The tree view widget.
pub struct TreeView {
    entries: Vec<Entry>,
    hide_root: bool,
    visible: Vec<VisibleRow>,
    selected: usize,
    scroll: usize,
    height: usize,
    filter: String,
    saved_filter: String,
    filtering: bool,
    on_select: Option<TreeSelectCallback>,
}

impl TreeView {
    pub fn new(root: TreeItem, hide_root: bool) -> Self {
        let mut view = Self {
            entries: Vec::new(),
            hide_root,
            visible: Vec::new(),
            selected: 0,
            scroll: 0,
            height: 1,
            filter: String::new(),
            saved_filter: String::new(),
            filtering: false,
            on_select: None,
        };
        view.push_item(root, None, 0);
        view.flatten();
        view
    }

    fn push_item(&mut self, item: TreeItem, parent: Option<usize>, depth: u16) -> usize {
        let index = self.entries.len();
        self.entries.push(Entry {
            label: item.label,
            data: item.data,
            parent,
            children: Vec::new(),
            expanded: item.expanded,
            depth,
        });
        for child in item.children {
            let child_index = self.push_item(child, Some(index), depth + 1);
            self.entries[index].children.push(child_index);
        }
        index
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn visible_rows(&self) -> &[VisibleRow] {
        &self.visible
    }

    pub fn visible_labels(&self) -> Vec<&str> {
        self.visible.iter().map(|r| self.entries[r.entry].label.as_str()).collect()
    }

    /// Selection as an index into the visible rows.
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.selected_entry().map(|e| self.entries[e].label.as_str())
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn filter_text(&self) -> &str {
        &self.filter
    }

    pub fn is_filtering(&self) -> bool {
        self.filtering
    }

    fn selected_entry(&self) -> Option<usize> {
        self.visible.get(self.selected).map(|r| r.entry)
    }

    fn has_children(&self, entry: usize) -> bool {
        !self.entries[entry].children.is_empty()
    }

    // =========================================================================
    // Flattening
    // =========================================================================

    fn matches(&self, entry: usize, needle: &str) -> bool {
        self.entries[entry].label.to_lowercase().contains(needle)
    }

    /// Whether `entry` or anything below it matches.
    fn subtree_matches(&self, entry: usize, needle: &str) -> bool {
        self.matches(entry, needle) || self.entries[entry].children.iter().any(|c| self.subtree_matches(*c, needle))
    }

    /// Rebuild the visible rows, keeping the selection on the same entry
    /// or, when that entry disappeared, on its nearest visible ancestor.
    fn flatten(&mut self) {
        let anchor = self.selected_entry();
        let needle = self.filter.to_lowercase();
        let mut rows = Vec::new();

        if !self.entries.is_empty() {
            let top: Vec<usize> = if self.hide_root { self.entries[0].children.clone() } else { vec![0] };
            let base_depth = if self.hide_root { 1 } else { 0 };
            let mut stack: Vec<usize> = top.into_iter().rev().collect();
            while let Some(entry) = stack.pop() {
                if !needle.is_empty() && !self.subtree_matches(entry, &needle) {
                    continue;
                }
                let e = &self.entries[entry];
                rows.push(VisibleRow {
                    entry,
                    depth: e.depth - base_depth,
                });
                if e.expanded || !needle.is_empty() {
                    stack.extend(e.children.iter().rev().copied());
                }
            }
        }
        self.visible = rows;

        let mut target = anchor;
        while let Some(entry) = target {
            if let Some(pos) = self.visible.iter().position(|r| r.entry == entry) {
                self.selected = pos;
                break;
            }
            target = self.entries[entry].parent;
        }
        self.clamp();
    }

    fn clamp(&mut self) {
        let len = self.visible.len();
        self.selected = if len == 0 { 0 } else { self.selected.min(len - 1) };
        let height = self.height.max(1);
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + height {
            self.scroll = self.selected + 1 - height;
        }
        self.scroll = self.scroll.min(len.saturating_sub(height));
    }

    // =========================================================================
    // Operations
    // =========================================================================

    pub fn move_by(&mut self, delta: isize) {
        self.selected = self.selected.saturating_add_signed(delta);
        self.clamp();
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
        self.clamp();
    }

    /// Collapse the selected entry if it is expanded, else select its parent.
    pub fn left(&mut self) {
        let Some(entry) = self.selected_entry() else {
            return;
        };
        if self.entries[entry].expanded && self.has_children(entry) {
            self.entries[entry].expanded = false;
            self.flatten();
        } else if let Some(parent) = self.entries[entry].parent {
            if let Some(pos) = self.visible.iter().position(|r| r.entry == parent) {
                self.selected = pos;
                self.clamp();
            }
        }
    }

    /// Expand the selected entry if it is collapsed, else select its first
    /// child.
    pub fn right(&mut self) {
        let Some(entry) = self.selected_entry() else {
            return;
        };
        if !self.has_children(entry) {
            return;
        }
        // A filter shows matching children regardless of expansion.
        if !self.entries[entry].expanded && self.filter.is_empty() {
            self.entries[entry].expanded = true;
            self.flatten();
            return;
        }
        let depth = self.visible[self.selected].depth;
        if self.visible.get(self.selected + 1).is_some_and(|next| next.depth > depth) {
            self.selected += 1;
            self.clamp();
        }
    }

    fn set_subtree(&mut self, entry: usize, expanded: bool) {
        let mut stack = vec![entry];
        while let Some(e) = stack.pop() {
            self.entries[e].expanded = expanded;
            stack.extend(self.entries[e].children.iter().copied());
        }
    }

    /// Expand every entry.
    pub fn expand_all(&mut self) {
        if !self.entries.is_empty() {
            self.set_subtree(0, true);
            self.flatten();
        }
    }

    /// Collapse every entry.
    pub fn collapse_all(&mut self) {
        if !self.entries.is_empty() {
            self.set_subtree(0, false);
            self.flatten();
        }
    }

    /// Expand or collapse the selected entry and all its descendants.
    pub fn set_selected_subtree(&mut self, expanded: bool) {
        if let Some(entry) = self.selected_entry() {
            self.set_subtree(entry, expanded);
            self.flatten();
        }
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into();
        self.flatten();
    }

    fn activate(&self) {
        if let (Some(entry), Some(callback)) = (self.selected_entry(), &self.on_select) {
            let e = &self.entries[entry];
            callback(&e.label, e.data.as_ref());
        }
    }

    fn browse_key(&mut self, event: &KeyboardEvent) -> bool {
        match event.key.as_str() {
            "ArrowUp" => self.move_by(-1),
            "ArrowDown" => self.move_by(1),
            "PageUp" => self.move_by(-(self.height as isize)),
            "PageDown" => self.move_by(self.height as isize),
            "Home" => self.move_by(isize::MIN),
            "End" => self.move_by(isize::MAX),
            "ArrowLeft" => self.left(),
            "ArrowRight" => self.right(),
            "*" => self.set_selected_subtree(true),
            "-" => self.set_selected_subtree(false),
            "Enter" => self.activate(),
            "/" => {
                self.saved_filter = self.filter.clone();
                self.filtering = true;
            }
            "Escape" if !self.filter.is_empty() => self.set_filter(String::new()),
            _ => return false,
        }
        true
    }

    fn filter_key(&mut self, event: &KeyboardEvent) -> bool {
        match event.key.as_str() {
            "Enter" => self.filtering = false,
            "Escape" => {
                self.filtering = false;
                let saved = std::mem::take(&mut self.saved_filter);
                self.set_filter(saved);
            }
            "Backspace" => {
                let mut text = self.filter.clone();
                text.pop();
                self.set_filter(text);
            }
            "ArrowUp" => self.move_by(-1),
            "ArrowDown" => self.move_by(1),
            _ => {
                if let Some(c) = event.char() {
                    let text = format!("{}{c}", self.filter);
                    self.set_filter(text);
                }
            }
        }
        true
    }

    /// Rows available for items, given the content height.
    fn item_rows(&self, content_height: u16) -> usize {
        let footer = if self.filtering || !self.filter.is_empty() { 1 } else { 0 };
        (content_height as usize).saturating_sub(footer).max(1)
    }
}

impl Widget for TreeView {
    fn kind(&self) -> &'static str {
        "tree_view"
    }

    fn render(&mut self, frame: &mut RenderFrame<'_>) -> Result<()> {
        self.set_height(self.item_rows(frame.content.height));
        let overflow = self.visible.len() > self.height;
        let width = frame.content.width.saturating_sub(overflow as u16) as usize;
        let base = frame.text_style();
        let selection = CellStyle::new(
            frame.color(roles::SELECTION_TEXT, frame.bg),
            frame.color(roles::SELECTION, frame.fg),
        );

        for (dy, row) in self.visible.iter().skip(self.scroll).take(self.height).enumerate() {
            let entry = &self.entries[row.entry];
            let marker = match (entry.children.is_empty(), entry.expanded || !self.filter.is_empty()) {
                (true, _) => "  ",
                (false, true) => "▾ ",
                (false, false) => "▸ ",
            };
            let text = format!("{}{marker}{}", "  ".repeat(row.depth as usize), entry.label);
            let style = if self.scroll + dy == self.selected && frame.focused {
                selection
            } else {
                base
            };
            if let Some(bg) = style.bg {
                frame.fill_row(dy as u16, bg);
            }
            frame.write(0, dy as u16, &fit(&text, width, TextAlign::Left), style);
        }

        if overflow {
            let muted = CellStyle::new(frame.color(roles::TEXT_MUTED, frame.fg), frame.bg);
            let x = frame.content.right().saturating_sub(1);
            let clip = frame.clip;
            frame.buffer.draw_scrollbar_v(
                x,
                frame.content.y,
                self.height as u16,
                self.scroll,
                self.height,
                self.visible.len(),
                muted,
                Some(&clip),
            );
        }

        if self.filtering || !self.filter.is_empty() {
            let cursor = if self.filtering { "▏" } else { "" };
            let line = format!("/{}{cursor}", self.filter);
            let muted = CellStyle::new(frame.color(roles::TEXT_MUTED, frame.fg), frame.bg);
            frame.write(0, frame.content.height.saturating_sub(1), &line, muted);
        }
        Ok(())
    }

    fn handle_input(&mut self, event: &KeyboardEvent, ctx: &mut InputContext) -> Result<bool> {
        if !event.is_press() || event.modifiers.ctrl || event.modifiers.alt {
            return Ok(false);
        }
        let handled = if self.filtering {
            self.filter_key(event)
        } else {
            self.browse_key(event)
        };
        if handled {
            ctx.redraw();
        }
        Ok(handled)
    }

    fn arrange(&mut self, content: Rect) {
        self.set_height(self.item_rows(content.height));
    }
}

/// Create a tree view node.
pub fn tree_view(tree: &mut UiTree, props: TreeViewProps) -> NodeId {
    let mut widget = TreeView::new(props.root, props.hide_root);
    widget.on_select = props.on_select;
    let node = props.node.leaf(Box::new(widget), true);
    let content = node.content_area();
    let id = tree.insert(node);
    if let Some(view) = tree.widget_mut::<TreeView>(id) {
        view.arrange(content);
    }
    id
}

//! Data Table - virtualized, sortable, filterable, paginated rows.
//!
//! Only the current page is drawn. Layout of the content area:
//!
//! ```text
//! Name         Owner   Due ▲      ← header (optional)
//! Write docs   Ada     2024-05-01
//! ...                             ← one page of rows
//! 1/3 · 23 rows · filter: ada     ← status line
//! ```
//!
//! Column widths are grid track tokens distributed over the content width
//! with the grid algorithm, so they always sum to the width.
//!
//! # Keys
//!
//! Browsing: ArrowUp/ArrowDown, PageUp/PageDown, Home/End move; Enter fires
//! `on_row_select`; Space flips the sort direction (or marks the row in
//! multi-select tables); digit N sorts by the Nth sortable column (`0`
//! clears the sort); `/` starts filtering; Escape clears an active filter.
//!
//! Filtering: typed characters narrow the rows live; Backspace edits; Tab
//! cycles the filter column; Enter keeps the filter; Escape restores the
//! previous one.

mod column;
mod export;
mod state;

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{NodeId, RenderFrame, UiTree, Widget};
use crate::error::Result;
use crate::layout::{distribute, Track};
use crate::renderer::fit;
use crate::state::input::InputContext;
use crate::state::keyboard::KeyboardEvent;
use crate::theme::roles;
use crate::types::{Attr, CellStyle, Rect, TextAlign};

use super::types::NodeProps;

pub use column::{compare_values, plain_text, ColumnConfig, ColumnFormat, Row};
pub use export::{escape_html, export, export_to_path, ExportFormat, ExportScope};
pub use state::{SortDirection, SortState, TableMode, TableState};

/// Called on Enter with the activated rows and the cursor's source index.
pub type RowSelectCallback = Rc<dyn Fn(&[Row], usize)>;

/// Where a refreshable table gets its rows.
pub trait DataSource {
    fn fetch(&mut self) -> Result<Vec<Row>>;
}

impl<F> DataSource for F
where
    F: FnMut() -> Result<Vec<Row>>,
{
    fn fetch(&mut self) -> Result<Vec<Row>> {
        self()
    }
}

/// Properties for [`data_table`].
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableProps {
    #[serde(flatten)]
    pub node: NodeProps,
    pub columns: Vec<ColumnConfig>,
    pub rows: Vec<Row>,
    pub multi_select: bool,
    /// Rows per page; 0 derives it from the render height.
    pub page_size: usize,
    pub hide_header: bool,
    #[serde(skip)]
    pub on_row_select: Option<RowSelectCallback>,
    #[serde(skip)]
    pub source: Option<Box<dyn DataSource>>,
}

impl TableProps {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnConfig>) -> Self {
        Self {
            node: NodeProps::named(name),
            columns,
            ..Self::default()
        }
    }

    pub fn rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn on_row_select(mut self, f: impl Fn(&[Row], usize) + 'static) -> Self {
        self.on_row_select = Some(Rc::new(f));
        self
    }

    pub fn source(mut self, source: impl DataSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

/// The table widget.
pub struct DataTable {
    state: TableState,
    tracks: Vec<Track>,
    fixed_page_size: Option<usize>,
    show_header: bool,
    on_row_select: Option<RowSelectCallback>,
    source: Option<Box<dyn DataSource>>,
}

impl DataTable {
    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TableState {
        &mut self.state
    }

    /// Header and status line.
    fn chrome_rows(&self) -> u16 {
        if self.show_header { 2 } else { 1 }
    }

    fn fit_page(&mut self, content: Rect) {
        if self.fixed_page_size.is_none() {
            let rows = content.height.saturating_sub(self.chrome_rows());
            self.state.set_page_size(rows as usize);
        }
    }

    pub fn column_widths(&self, width: u16) -> Vec<u16> {
        distribute(&self.tracks, width)
    }

    fn status_line(&self) -> String {
        let state = &self.state;
        let filter_target = match state.filter_column().and_then(|c| state.columns().get(c)) {
            Some(column) => column.title.as_str(),
            None => "any",
        };
        if state.mode() == TableMode::Filtering {
            return format!("/{}▏ [{}]", state.filter_text(), filter_target);
        }
        let mut line = format!("{}/{} · {} rows", state.page() + 1, state.page_count(), state.view_len());
        if !state.filter_text().is_empty() {
            line.push_str(&format!(" · filter: {}", state.filter_text()));
        }
        if state.is_multi_select() && !state.marked().is_empty() {
            line.push_str(&format!(" · {} marked", state.marked().len()));
        }
        line
    }

    fn activate(&self) {
        let Some(source) = self.state.selected_source() else {
            return;
        };
        let rows = self.state.activation_rows();
        debug!(rows = rows.len(), index = source, "row activated");
        if let Some(callback) = &self.on_row_select {
            callback(&rows, source);
        }
    }

    fn browse_key(&mut self, event: &KeyboardEvent) -> bool {
        if event.key == "Enter" {
            self.activate();
            return true;
        }
        let state = &mut self.state;
        match event.key.as_str() {
            "ArrowUp" => state.move_by(-1),
            "ArrowDown" => state.move_by(1),
            "PageUp" => state.page_up(),
            "PageDown" => state.page_down(),
            "Home" => state.home(),
            "End" => state.end(),
            " " if state.is_multi_select() => {
                state.toggle_mark();
            }
            " " => state.toggle_direction(),
            "/" => state.begin_filter(),
            "Escape" => return state.clear_filter(),
            _ => match event.digit() {
                Some(0) => state.clear_sort(),
                Some(n) => return state.sort_by_nth(n as usize),
                None => return false,
            },
        }
        true
    }

    fn filter_key(&mut self, event: &KeyboardEvent) -> bool {
        let state = &mut self.state;
        match event.key.as_str() {
            "Escape" => state.cancel_filter(),
            "Enter" => state.commit_filter(),
            "Backspace" => state.pop_filter_char(),
            "Tab" => state.cycle_filter_column(),
            _ => {
                if let Some(c) = event.char() {
                    state.push_filter_char(c);
                }
            }
        }
        true
    }
}

impl Widget for DataTable {
    fn kind(&self) -> &'static str {
        "data_table"
    }

    fn render(&mut self, frame: &mut RenderFrame<'_>) -> Result<()> {
        self.fit_page(frame.content);
        let width = frame.content.width;
        let widths = self.column_widths(width);
        let base = frame.text_style();
        let mut dy = 0;

        if self.show_header {
            let header = CellStyle::new(frame.color(roles::HEADER, frame.fg), frame.bg).with_attrs(Attr::BOLD);
            let sort = self.state.sort();
            let mut dx = 0;
            for (i, (column, w)) in self.state.columns().iter().zip(&widths).enumerate() {
                let mut title = column.title.clone();
                if let Some(sort) = sort.filter(|s| s.column == i) {
                    title.push_str(match sort.direction {
                        SortDirection::Ascending => " ▲",
                        SortDirection::Descending => " ▼",
                    });
                }
                frame.write(dx, dy, &cell_text(&title, *w, column.align), header);
                dx += *w;
            }
            dy += 1;
        }

        let selection = CellStyle::new(
            frame.color(roles::SELECTION_TEXT, frame.bg),
            frame.color(roles::SELECTION, frame.fg),
        );
        let marked = CellStyle::new(frame.color(roles::PRIMARY, frame.fg), frame.bg).with_attrs(Attr::BOLD);
        let selected = self.state.selected();
        for (position, row) in self.state.page_rows() {
            let is_marked = self.state.source_of(position).is_some_and(|s| self.state.is_marked(s));
            let style = if position == selected && frame.focused {
                selection
            } else if position == selected {
                base.with_attrs(Attr::INVERSE)
            } else if is_marked {
                marked
            } else {
                base
            };
            if let Some(bg) = style.bg {
                frame.fill_row(dy, bg);
            }
            let mut dx = 0;
            for (column, w) in self.state.columns().iter().zip(&widths) {
                frame.write(dx, dy, &cell_text(&column.cell(row), *w, column.align), style);
                dx += *w;
            }
            dy += 1;
        }

        let status_y = frame.content.height.saturating_sub(1);
        if status_y >= dy {
            let muted = CellStyle::new(frame.color(roles::TEXT_MUTED, frame.fg), frame.bg);
            frame.write(0, status_y, &fit(&self.status_line(), width as usize, TextAlign::Left), muted);
        }
        Ok(())
    }

    fn handle_input(&mut self, event: &KeyboardEvent, ctx: &mut InputContext) -> Result<bool> {
        if !event.is_press() || event.modifiers.ctrl || event.modifiers.alt {
            return Ok(false);
        }
        let handled = match self.state.mode() {
            TableMode::Browsing => self.browse_key(event),
            TableMode::Filtering => self.filter_key(event),
        };
        if handled {
            ctx.redraw();
        }
        Ok(handled)
    }

    fn arrange(&mut self, content: Rect) {
        self.fit_page(content);
    }

    fn refresh(&mut self) -> Result<()> {
        if let Some(source) = self.source.as_mut() {
            let rows = source.fetch()?;
            debug!(rows = rows.len(), "table refreshed");
            self.state.set_rows(rows);
        }
        Ok(())
    }
}

/// Cell text padded to `width` with one column of gutter on the right.
fn cell_text(text: &str, width: u16, align: TextAlign) -> String {
    if width == 0 {
        return String::new();
    }
    let inner = fit(text, width as usize - 1, align);
    format!("{inner} ")
}

/// Create a data table node. Fails on a malformed column width token.
pub fn data_table(tree: &mut UiTree, props: TableProps) -> Result<NodeId> {
    let tracks = props
        .columns
        .iter()
        .map(ColumnConfig::track)
        .collect::<Result<Vec<_>>>()?;
    let mut state = TableState::new(props.columns, props.rows).with_multi_select(props.multi_select);
    let fixed_page_size = (props.page_size > 0).then_some(props.page_size);
    if let Some(size) = fixed_page_size {
        state.set_page_size(size);
    }
    let widget = DataTable {
        state,
        tracks,
        fixed_page_size,
        show_header: !props.hide_header,
        on_row_select: props.on_row_select,
        source: props.source,
    };
    let node = props.node.leaf(Box::new(widget), true);
    let content = node.content_area();
    let id = tree.insert(node);
    if let Some(table) = tree.widget_mut::<DataTable>(id) {
        table.fit_page(content);
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use serde_json::json;

    use crate::error::Error;
    use crate::pipeline::render;
    use crate::renderer::ScreenBuffer;
    use crate::state::{handle_input, FocusManager};
    use crate::theme::Palette;

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| {
                let mut row = Row::new();
                row.insert("id".into(), json!(i));
                row.insert("title".into(), json!(format!("t{i}")));
                row
            })
            .collect()
    }

    fn columns() -> Vec<ColumnConfig> {
        vec![ColumnConfig::new("id", "#").width("4"), ColumnConfig::new("title", "Title")]
    }

    fn setup(props: TableProps) -> (UiTree, FocusManager, NodeId) {
        let mut tree = UiTree::new();
        let id = data_table(&mut tree, props).unwrap();
        tree.set_root(id).unwrap();
        let mut focus = FocusManager::new();
        focus.rebuild(&tree);
        focus.focus_first(&mut tree);
        (tree, focus, id)
    }

    fn press(tree: &mut UiTree, focus: &mut FocusManager, key: &str) -> bool {
        handle_input(tree, focus, &KeyboardEvent::new(key)).is_handled()
    }

    fn sized(mut props: TableProps, w: u16, h: u16) -> TableProps {
        props.node = props.node.bounds(Rect::new(0, 0, w, h));
        props
    }

    #[test]
    fn test_page_size_from_height() {
        // 12 rows: header + 10 data rows + status.
        let (tree, _, id) = setup(sized(TableProps::new("t", columns()).rows(rows(23)), 20, 12));
        let table = tree.widget::<DataTable>(id).unwrap();
        assert_eq!(table.state().page_size(), 10);
        assert_eq!(table.state().page_count(), 3);
    }

    #[test]
    fn test_render_page() {
        let (mut tree, _, _) = setup(sized(TableProps::new("t", columns()).rows(rows(23)), 12, 4));
        let mut buffer = ScreenBuffer::new(12, 4);
        render(&mut tree, &mut buffer, &Palette::new());
        assert_eq!(buffer.row_text(0), "#   Title   ");
        assert_eq!(buffer.row_text(1), "0   t0      ");
        assert_eq!(buffer.row_text(2), "1   t1      ");
        assert_eq!(buffer.row_text(3), "1/12 · 23 r…");
    }

    #[test]
    fn test_enter_reports_rows_and_index() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let props = TableProps::new("t", columns())
            .rows(rows(5))
            .on_row_select(move |rows, index| sink.borrow_mut().push((rows.len(), index)));
        let (mut tree, mut focus, _) = setup(sized(props, 20, 8));
        press(&mut tree, &mut focus, "ArrowDown");
        press(&mut tree, &mut focus, "ArrowDown");
        assert!(press(&mut tree, &mut focus, "Enter"));
        assert_eq!(*seen.borrow(), vec![(1, 2)]);
    }

    #[test]
    fn test_digit_sort_and_space_toggle() {
        let (mut tree, mut focus, id) = setup(sized(TableProps::new("t", columns()).rows(rows(3)), 20, 8));
        assert!(press(&mut tree, &mut focus, "1"));
        assert!(press(&mut tree, &mut focus, " "));
        let state = tree.widget::<DataTable>(id).unwrap().state();
        assert_eq!(state.sort().unwrap().direction, SortDirection::Descending);
        assert_eq!(state.view().next().unwrap()["id"], json!(2));
        assert!(!press(&mut tree, &mut focus, "7"));
    }

    #[test]
    fn test_filter_mode_keeps_tab() {
        let (mut tree, mut focus, id) = setup(sized(TableProps::new("t", columns()).rows(rows(12)), 20, 8));
        press(&mut tree, &mut focus, "/");
        press(&mut tree, &mut focus, "1");
        assert!(press(&mut tree, &mut focus, "Tab"));
        assert_eq!(tree.widget::<DataTable>(id).unwrap().state().filter_column(), Some(0));
        press(&mut tree, &mut focus, "Enter");
        let state = tree.widget::<DataTable>(id).unwrap().state();
        assert_eq!(state.mode(), TableMode::Browsing);
        // ids 1, 10, 11
        assert_eq!(state.view_len(), 3);

        assert!(press(&mut tree, &mut focus, "Escape"));
        assert_eq!(tree.widget::<DataTable>(id).unwrap().state().view_len(), 12);
        assert!(!press(&mut tree, &mut focus, "Escape"));
    }

    #[test]
    fn test_multi_select_space_marks() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut props = TableProps::new("t", columns())
            .rows(rows(4))
            .on_row_select(move |rows, _| {
                sink.borrow_mut().extend(rows.iter().map(|r| r["id"].clone()));
            });
        props.multi_select = true;
        let (mut tree, mut focus, _) = setup(sized(props, 20, 8));
        press(&mut tree, &mut focus, "End");
        press(&mut tree, &mut focus, " ");
        press(&mut tree, &mut focus, "Home");
        press(&mut tree, &mut focus, " ");
        press(&mut tree, &mut focus, "Enter");
        assert_eq!(*seen.borrow(), vec![json!(3), json!(0)]);
    }

    #[test]
    fn test_refresh_pulls_from_source() {
        let mut calls = 0;
        let props = TableProps::new("t", columns()).source(move || {
            calls += 1;
            if calls > 1 {
                return Err(Error::Data("gone".into()));
            }
            Ok(rows(7))
        });
        let mut tree = UiTree::new();
        let id = data_table(&mut tree, props).unwrap();
        let node = tree.get_mut(id).unwrap();
        node.widget_mut().refresh().unwrap();
        assert!(node.widget_mut().refresh().is_err());
        assert_eq!(tree.widget::<DataTable>(id).unwrap().state().view_len(), 7);
    }

    #[test]
    fn test_bad_width_token_is_config_error() {
        let mut tree = UiTree::new();
        let props = TableProps::new("t", vec![ColumnConfig::new("a", "A").width("wide")]);
        assert!(matches!(data_table(&mut tree, props), Err(Error::InvalidTrack { .. })));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_props_from_json() {
        let props: TableProps = serde_json::from_str(
            r##"{"name": "tasks", "height": 12, "page_size": 5,
                "columns": [{"key": "id", "title": "#", "width": "4"}],
                "rows": [{"id": 1}, {"id": 2}]}"##,
        )
        .unwrap();
        let mut tree = UiTree::new();
        let id = data_table(&mut tree, props).unwrap();
        let state = tree.widget::<DataTable>(id).unwrap().state();
        assert_eq!(state.page_size(), 5);
        assert_eq!(state.view_len(), 2);
    }
}

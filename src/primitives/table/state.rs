//! Table state machine.
//!
//! Pure data: no rendering, no key names. Every mutation runs the same
//! pipeline:
//!
//! ```text
//! filter → sort (stable) → clamp page and selection
//! ```
//!
//! The selection is an index into the current view; the current page is
//! always the one containing it.

use tracing::trace;

use super::column::{compare_values, ColumnConfig, Row};

/// Key handling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableMode {
    #[default]
    Browsing,
    Filtering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Active sort: column index into the table's columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FilterState {
    text: String,
    /// `None` matches any filterable column.
    column: Option<usize>,
}

/// Rows, view and cursor of a data table.
#[derive(Debug, Clone)]
pub struct TableState {
    columns: Vec<ColumnConfig>,
    rows: Vec<Row>,
    /// Row indices after filter and sort.
    view: Vec<usize>,
    filter: FilterState,
    /// Filter to restore when filtering is cancelled.
    saved_filter: FilterState,
    sort: Option<SortState>,
    page_size: usize,
    selected: usize,
    multi_select: bool,
    /// Marked row indices in the order they were marked.
    marked: Vec<usize>,
    mode: TableMode,
}

impl TableState {
    pub fn new(columns: Vec<ColumnConfig>, rows: Vec<Row>) -> Self {
        let mut state = Self {
            columns,
            rows,
            view: Vec::new(),
            filter: FilterState::default(),
            saved_filter: FilterState::default(),
            sort: None,
            page_size: 1,
            selected: 0,
            multi_select: false,
            marked: Vec::new(),
            mode: TableMode::Browsing,
        };
        state.recompute();
        state
    }

    pub fn with_multi_select(mut self, multi: bool) -> Self {
        self.multi_select = multi;
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.set_page_size(size);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn columns(&self) -> &[ColumnConfig] {
        &self.columns
    }

    /// All rows, unfiltered.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows that pass the filter, in sort order.
    pub fn view(&self) -> impl Iterator<Item = &Row> {
        self.view.iter().filter_map(|i| self.rows.get(*i))
    }

    pub fn view_len(&self) -> usize {
        self.view.len()
    }

    pub fn mode(&self) -> TableMode {
        self.mode
    }

    pub fn is_multi_select(&self) -> bool {
        self.multi_select
    }

    pub fn sort(&self) -> Option<SortState> {
        self.sort
    }

    pub fn filter_text(&self) -> &str {
        &self.filter.text
    }

    pub fn filter_column(&self) -> Option<usize> {
        self.filter.column
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Selection as an index into the view.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Index into `rows()` of the selected row.
    pub fn selected_source(&self) -> Option<usize> {
        self.view.get(self.selected).copied()
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.selected_source().and_then(|i| self.rows.get(i))
    }

    /// Marked rows in marking order.
    pub fn marked(&self) -> &[usize] {
        &self.marked
    }

    pub fn is_marked(&self, source: usize) -> bool {
        self.marked.contains(&source)
    }

    /// Rows an activation applies to: the marked set in multi-select mode
    /// (or the cursor row when nothing is marked), else the cursor row.
    pub fn activation_rows(&self) -> Vec<Row> {
        if self.multi_select && !self.marked.is_empty() {
            return self.marked.iter().filter_map(|i| self.rows.get(*i)).cloned().collect();
        }
        self.selected_row().cloned().into_iter().collect()
    }

    pub fn page(&self) -> usize {
        self.selected / self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.view.len().div_ceil(self.page_size).max(1)
    }

    /// View positions shown on the current page.
    pub fn page_range(&self) -> std::ops::Range<usize> {
        let start = self.page() * self.page_size;
        start.min(self.view.len())..(start + self.page_size).min(self.view.len())
    }

    /// `(view position, row)` pairs of the current page.
    pub fn page_rows(&self) -> Vec<(usize, &Row)> {
        self.page_range()
            .filter_map(|pos| self.view.get(pos).and_then(|i| self.rows.get(*i)).map(|r| (pos, r)))
            .collect()
    }

    /// Source index of the row at a view position.
    pub fn source_of(&self, position: usize) -> Option<usize> {
        self.view.get(position).copied()
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Replace all rows. Marks pointing past the end are dropped.
    /// Replace the data. Marks refer to source indices, so they only
    /// survive a refresh that returns the same rows.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        if self.rows != rows {
            self.marked.clear();
        }
        self.rows = rows;
        self.recompute();
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.clamp();
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn move_by(&mut self, delta: isize) {
        self.selected = self.selected.saturating_add_signed(delta);
        self.clamp();
    }

    pub fn page_down(&mut self) {
        self.move_by(self.page_size as isize);
    }

    pub fn page_up(&mut self) {
        self.move_by(-(self.page_size as isize));
    }

    pub fn home(&mut self) {
        self.selected = 0;
        self.clamp();
    }

    pub fn end(&mut self) {
        self.selected = self.view.len().saturating_sub(1);
        self.clamp();
    }

    /// Put the cursor on a view position.
    pub fn select(&mut self, position: usize) {
        self.selected = position;
        self.clamp();
    }

    // =========================================================================
    // Sort
    // =========================================================================

    /// Sort by the `n`th sortable column (1-based). Choosing the active
    /// column flips its direction; `0` or an out-of-range `n` is ignored.
    pub fn sort_by_nth(&mut self, n: usize) -> bool {
        let Some(column) = n
            .checked_sub(1)
            .and_then(|k| self.columns.iter().enumerate().filter(|(_, c)| c.sortable).nth(k))
            .map(|(i, _)| i)
        else {
            return false;
        };
        self.sort_by(column);
        true
    }

    /// Sort by a column index, toggling direction if it is already active.
    pub fn sort_by(&mut self, column: usize) {
        self.sort = Some(match self.sort {
            Some(sort) if sort.column == column => SortState {
                column,
                direction: sort.direction.toggled(),
            },
            _ => SortState {
                column,
                direction: SortDirection::Ascending,
            },
        });
        self.recompute();
    }

    /// Flip the sort direction; with no active sort, sort ascending by the
    /// first sortable column.
    pub fn toggle_direction(&mut self) {
        match self.sort {
            Some(sort) => self.sort_by(sort.column),
            None => {
                self.sort_by_nth(1);
            }
        }
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
        self.recompute();
    }

    // =========================================================================
    // Multi-select
    // =========================================================================

    /// Add or remove the cursor row from the marked set.
    pub fn toggle_mark(&mut self) -> bool {
        let Some(source) = self.selected_source() else {
            return false;
        };
        if let Some(pos) = self.marked.iter().position(|m| *m == source) {
            self.marked.remove(pos);
        } else {
            self.marked.push(source);
        }
        true
    }

    pub fn clear_marks(&mut self) {
        self.marked.clear();
    }

    // =========================================================================
    // Filter
    // =========================================================================

    /// Enter filtering mode, remembering the current filter.
    pub fn begin_filter(&mut self) {
        self.saved_filter = self.filter.clone();
        self.mode = TableMode::Filtering;
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter.text.push(c);
        self.recompute();
    }

    pub fn pop_filter_char(&mut self) {
        if self.filter.text.pop().is_some() {
            self.recompute();
        }
    }

    /// Cycle the filter column: any → each filterable column → any.
    pub fn cycle_filter_column(&mut self) {
        let filterable: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.filterable)
            .map(|(i, _)| i)
            .collect();
        self.filter.column = match self.filter.column {
            None => filterable.first().copied(),
            Some(current) => filterable.iter().copied().find(|i| *i > current),
        };
        self.recompute();
    }

    /// Leave filtering mode, keeping the typed filter.
    pub fn commit_filter(&mut self) {
        self.mode = TableMode::Browsing;
    }

    /// Leave filtering mode, restoring the filter active before it began.
    pub fn cancel_filter(&mut self) {
        self.filter = std::mem::take(&mut self.saved_filter);
        self.mode = TableMode::Browsing;
        self.recompute();
    }

    /// Drop the filter text. Returns whether there was one.
    pub fn clear_filter(&mut self) -> bool {
        if self.filter.text.is_empty() {
            return false;
        }
        self.filter.text.clear();
        self.recompute();
        true
    }

    /// Set the filter directly.
    pub fn set_filter(&mut self, text: impl Into<String>, column: Option<usize>) {
        self.filter = FilterState {
            text: text.into(),
            column,
        };
        self.recompute();
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    fn matches(&self, row: &Row, needle: &str) -> bool {
        let hit = |column: &ColumnConfig| {
            // Match what is on screen, not the raw value.
            column.cell(row).to_lowercase().contains(needle)
        };
        match self.filter.column {
            Some(index) => self.columns.get(index).is_some_and(hit),
            None => self.columns.iter().filter(|c| c.filterable).any(hit),
        }
    }

    /// Filter, sort and clamp. The cursor stays on the same row when it
    /// survives the filter.
    fn recompute(&mut self) {
        let anchor = self.selected_source();
        let needle = self.filter.text.to_lowercase();

        let mut view: Vec<usize> = (0..self.rows.len())
            .filter(|i| needle.is_empty() || self.matches(&self.rows[*i], &needle))
            .collect();

        if let Some(sort) = self.sort {
            if let Some(column) = self.columns.get(sort.column) {
                let key = column.key.as_str();
                let rows = &self.rows;
                view.sort_by(|a, b| {
                    let ord = compare_values(rows[*a].get(key), rows[*b].get(key));
                    match sort.direction {
                        SortDirection::Ascending => ord,
                        SortDirection::Descending => ord.reverse(),
                    }
                });
            }
        }

        self.view = view;
        if let Some(pos) = anchor.and_then(|a| self.view.iter().position(|i| *i == a)) {
            self.selected = pos;
        }
        self.clamp();
        trace!(rows = self.rows.len(), visible = self.view.len(), "table recomputed");
    }

    fn clamp(&mut self) {
        self.selected = match self.view.len() {
            0 => 0,
            len => self.selected.min(len - 1),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::primitives::table::ColumnFormat;

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| {
                let mut row = Row::new();
                row.insert("id".into(), json!(i));
                row.insert("name".into(), json!(format!("task {i}")));
                row.insert("owner".into(), json!(if i % 2 == 0 { "Ada" } else { "Linus" }));
                row
            })
            .collect()
    }

    fn table(n: usize) -> TableState {
        let columns = vec![
            ColumnConfig::new("id", "#"),
            ColumnConfig::new("name", "Name"),
            ColumnConfig::new("owner", "Owner").sortable(false),
        ];
        TableState::new(columns, rows(n)).with_page_size(10)
    }

    #[test]
    fn test_paging() {
        let mut t = table(23);
        assert_eq!(t.page_count(), 3);
        t.end();
        assert_eq!(t.page(), 2);
        assert_eq!(t.selected(), 22);
        assert_eq!(t.page_range(), 20..23);
        t.page_up();
        assert_eq!((t.page(), t.selected()), (1, 12));
        t.home();
        t.page_down();
        assert_eq!(t.selected(), 10);
        t.move_by(-100);
        assert_eq!(t.selected(), 0);
    }

    #[test]
    fn test_empty_table_selects_zero() {
        let mut t = table(0);
        t.end();
        assert_eq!(t.selected(), 0);
        assert_eq!(t.page_count(), 1);
        assert!(t.selected_row().is_none());
        assert!(!t.toggle_mark());
    }

    #[test]
    fn test_sort_by_digit_and_toggle() {
        let mut t = table(5);
        assert!(t.sort_by_nth(1));
        assert_eq!(t.sort(), Some(SortState { column: 0, direction: SortDirection::Ascending }));
        assert!(t.sort_by_nth(1));
        assert_eq!(t.sort().unwrap().direction, SortDirection::Descending);
        assert_eq!(t.view().next().unwrap()["id"], json!(4));
        // Only two sortable columns.
        assert!(!t.sort_by_nth(3));
        assert!(!t.sort_by_nth(0));
    }

    #[test]
    fn test_sort_is_stable() {
        let columns = vec![ColumnConfig::new("owner", "Owner"), ColumnConfig::new("id", "#")];
        let mut t = TableState::new(columns, rows(6));
        t.sort_by(0);
        let ids: Vec<_> = t.view().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(0), json!(2), json!(4), json!(1), json!(3), json!(5)]);
    }

    #[test]
    fn test_filter_round_trip() {
        let mut t = table(23);
        t.begin_filter();
        for c in "ADA".chars() {
            t.push_filter_char(c);
        }
        assert_eq!(t.view_len(), 12);
        t.cancel_filter();
        assert_eq!(t.mode(), TableMode::Browsing);
        assert_eq!(t.view_len(), 23);
    }

    #[test]
    fn test_filter_column_cycle() {
        let mut t = table(4);
        t.set_filter("1", None);
        // "task 1" by name and 1 by id.
        assert_eq!(t.view_len(), 1);
        t.cycle_filter_column();
        assert_eq!(t.filter_column(), Some(0));
        t.cycle_filter_column();
        t.cycle_filter_column();
        assert_eq!(t.filter_column(), Some(2));
        assert_eq!(t.view_len(), 0);
        t.cycle_filter_column();
        assert_eq!(t.filter_column(), None);
    }

    #[test]
    fn test_selection_follows_row_through_sort() {
        let mut t = table(5);
        t.select(3);
        t.sort_by(0);
        t.sort_by(0);
        assert_eq!(t.selected_row().unwrap()["id"], json!(3));
        assert_eq!(t.selected(), 1);
    }

    #[test]
    fn test_marks_keep_insertion_order() {
        let mut t = table(5).with_multi_select(true);
        t.select(3);
        t.toggle_mark();
        t.select(1);
        t.toggle_mark();
        t.select(4);
        t.toggle_mark();
        t.select(3);
        t.toggle_mark();
        assert_eq!(t.marked(), &[1, 4]);
        let ids: Vec<_> = t.activation_rows().iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(4)]);

        t.set_rows(rows(5));
        assert_eq!(t.marked(), &[1, 4]);
    }

    #[test]
    fn test_set_rows_with_new_data_clears_marks() {
        let mut t = table(5).with_multi_select(true);
        t.select(1);
        t.toggle_mark();
        let mut reordered = rows(5);
        reordered.reverse();
        t.set_rows(reordered);
        assert!(t.marked().is_empty());
        assert!(!t.is_marked(1));

        t.toggle_mark();
        t.set_rows(rows(3));
        assert!(t.marked().is_empty());
    }

    #[test]
    fn test_filter_matches_formatted_text() {
        let columns = vec![
            ColumnConfig::new("title", "Title"),
            ColumnConfig::new("done", "Done").format(ColumnFormat::Flag {
                yes: "done".into(),
                no: "open".into(),
            }),
            ColumnConfig::new("hours", "Hours").format(ColumnFormat::Number { decimals: 1 }),
        ];
        let data: Vec<Row> = [("write", true, 2), ("review", false, 3)]
            .into_iter()
            .map(|(title, done, hours)| {
                let mut row = Row::new();
                row.insert("title".into(), json!(title));
                row.insert("done".into(), json!(done));
                row.insert("hours".into(), json!(hours));
                row
            })
            .collect();
        let mut t = TableState::new(columns, data);

        t.set_filter("DONE", None);
        assert_eq!(t.view().map(|r| r["title"].clone()).collect::<Vec<_>>(), vec![json!("write")]);
        t.set_filter("true", None);
        assert_eq!(t.view().count(), 0);
        t.set_filter("3.0", Some(2));
        assert_eq!(t.view().map(|r| r["title"].clone()).collect::<Vec<_>>(), vec![json!("review")]);
    }
}

//! End-to-end scenarios through the public API.

use serde_json::json;
use spark_panels::primitives::table::{ColumnConfig, DataTable, Row};
use spark_panels::primitives::TreeView;
use spark_panels::{
    button, data_table, handle_input, label, panel, render, tree_view, BorderStyle, ButtonProps, FocusManager,
    GridLayout, KeyboardEvent, Layout, LayoutProps, LabelProps, Palette, PanelProps, Rect, ScreenBuffer,
    StackLayout, TableProps, Track, TreeItem, TreeViewProps, UiTree, distribute,
};

fn press(tree: &mut UiTree, focus: &mut FocusManager, key: &str) {
    handle_input(tree, focus, &KeyboardEvent::new(key));
}

#[test]
fn grid_columns_fixed_and_star() {
    let grid = GridLayout::parse(&["*"], &["15", "1*", "1*"]).unwrap();
    assert_eq!(grid.columns(), &[Track::Fixed(15), Track::Proportional(1), Track::Proportional(1)]);
    assert_eq!(distribute(grid.columns(), 75), vec![15, 30, 30]);

    let mut tree = UiTree::new();
    let mut props = PanelProps::new("root", Some(Layout::Grid(grid)));
    props.node = props.node.bounds(Rect::new(0, 0, 75, 4));
    let root = panel(&mut tree, props);
    tree.set_root(root).unwrap();
    let cells: Vec<_> = (0..3)
        .map(|c| {
            let id = label(&mut tree, LabelProps::new(format!("c{c}"), "x"));
            tree.add_child(root, id, LayoutProps::cell(0, c)).unwrap();
            id
        })
        .collect();
    tree.layout();

    let rects: Vec<Rect> = cells.iter().map(|id| tree.get(*id).unwrap().bounds()).collect();
    assert_eq!(rects[0], Rect::new(0, 0, 15, 4));
    assert_eq!(rects[1], Rect::new(15, 0, 30, 4));
    assert_eq!(rects[2], Rect::new(45, 0, 30, 4));
}

#[test]
fn table_end_jumps_to_last_page() {
    let rows: Vec<Row> = (0..23)
        .map(|i| {
            let mut row = Row::new();
            row.insert("id".into(), json!(i));
            row
        })
        .collect();
    let mut props = TableProps::new("tasks", vec![ColumnConfig::new("id", "#")]).rows(rows);
    // Header + ten rows + status line.
    props.node = props.node.bounds(Rect::new(0, 0, 30, 12));

    let mut tree = UiTree::new();
    let id = data_table(&mut tree, props).unwrap();
    tree.set_root(id).unwrap();
    let mut focus = FocusManager::new();
    focus.rebuild(&tree);
    focus.focus_first(&mut tree);

    let state = tree.widget::<DataTable>(id).unwrap().state();
    assert_eq!(state.page_size(), 10);
    assert_eq!(state.page_count(), 3);

    press(&mut tree, &mut focus, "End");
    let state = tree.widget::<DataTable>(id).unwrap().state();
    assert_eq!(state.page(), 2);
    assert_eq!(state.selected(), 22);

    let mut buffer = ScreenBuffer::new(30, 12);
    render(&mut tree, &mut buffer, &Palette::new());
    assert!(buffer.row_text(11).starts_with("3/3 · 23 rows"));
}

#[test]
fn bordered_panel_confines_content() {
    let mut tree = UiTree::new();
    let mut props = PanelProps::new("box", None);
    props.node = props.node.bounds(Rect::new(0, 0, 10, 5)).border(BorderStyle::Single);
    let root = panel(&mut tree, props);
    tree.set_root(root).unwrap();
    assert_eq!(tree.get(root).unwrap().content_area(), Rect::new(1, 1, 8, 3));

    // A child far larger than the interior.
    let mut text = LabelProps::new("fill", "#".repeat(200));
    text.wrap = true;
    text.node = text.node.bounds(Rect::new(0, 0, 20, 10));
    let child = label(&mut tree, text);
    tree.add_child(root, child, LayoutProps::default()).unwrap();

    let mut buffer = ScreenBuffer::new(12, 7);
    render(&mut tree, &mut buffer, &Palette::new());
    assert_eq!(buffer.row_text(0), "┌────────┐  ");
    for y in 1..4 {
        assert_eq!(buffer.row_text(y), "│########│  ");
    }
    assert_eq!(buffer.row_text(4), "└────────┘  ");
    assert_eq!(buffer.row_text(5).trim(), "");
    assert_eq!(buffer.row_text(6).trim(), "");
}

#[test]
fn tree_collapse_removes_expanded_descendants() {
    let root = TreeItem::new("project")
        .expanded(true)
        .child(
            TreeItem::new("backlog")
                .expanded(true)
                .child(TreeItem::new("triage").expanded(true).child(TreeItem::new("bug-1"))),
        )
        .child(TreeItem::new("done"));

    let mut tree = UiTree::new();
    let id = tree_view(&mut tree, TreeViewProps::new("tasks", root));
    tree.set_root(id).unwrap();
    let mut focus = FocusManager::new();
    focus.rebuild(&tree);
    focus.focus_first(&mut tree);

    let before = tree.widget::<TreeView>(id).unwrap().visible_rows().len();
    assert_eq!(before, 5);

    press(&mut tree, &mut focus, "ArrowDown");
    press(&mut tree, &mut focus, "ArrowLeft");
    let view = tree.widget::<TreeView>(id).unwrap();
    assert_eq!(view.visible_labels(), vec!["project", "backlog", "done"]);
    assert_eq!(before - view.visible_rows().len(), 2);
    assert_eq!(view.selected_label(), Some("backlog"));
}

#[test]
fn focus_cycle_returns_to_start() {
    let mut tree = UiTree::new();
    let mut props = PanelProps::new("form", Some(Layout::Stack(StackLayout::vertical())));
    props.node = props.node.bounds(Rect::new(0, 0, 20, 6));
    let root = panel(&mut tree, props);
    tree.set_root(root).unwrap();
    for name in ["save", "cancel", "help"] {
        let id = button(&mut tree, ButtonProps::new(name, name));
        tree.add_child(root, id, LayoutProps::default()).unwrap();
    }

    let mut focus = FocusManager::new();
    focus.rebuild(&tree);
    assert!(focus.focus_first(&mut tree));
    let start = tree.find("save").unwrap();
    assert_eq!(focus.focused(), Some(start));
    let ring = focus.ring().len();
    assert_eq!(ring, 3);
    let mut seen = Vec::new();
    for _ in 0..ring {
        seen.extend(focus.next(&mut tree));
    }
    assert_eq!(seen.len(), 3);
    assert_eq!(focus.focused(), Some(start));
    assert!(tree.get(start).unwrap().is_focused());
}

#[test]
fn filter_round_trip_restores_rows() {
    let names = ["Ada", "Grace", "Linus", "adam", "Barbara"];
    let rows: Vec<Row> = names
        .iter()
        .map(|n| {
            let mut row = Row::new();
            row.insert("name".into(), json!(n));
            row
        })
        .collect();
    let mut props = TableProps::new("people", vec![ColumnConfig::new("name", "Name")]).rows(rows);
    props.node = props.node.bounds(Rect::new(0, 0, 20, 8));
    let mut tree = UiTree::new();
    let id = data_table(&mut tree, props).unwrap();
    tree.set_root(id).unwrap();
    let mut focus = FocusManager::new();
    focus.rebuild(&tree);
    focus.focus_first(&mut tree);

    let order = |tree: &UiTree| -> Vec<String> {
        let state = tree.widget::<DataTable>(id).unwrap().state();
        state.view().map(|r| r["name"].as_str().unwrap_or_default().to_string()).collect()
    };
    let original = order(&tree);

    for key in ["/", "a", "d", "a", "Enter"] {
        press(&mut tree, &mut focus, key);
    }
    assert_eq!(order(&tree), vec!["Ada", "adam"]);

    press(&mut tree, &mut focus, "Escape");
    assert_eq!(order(&tree), original);
}

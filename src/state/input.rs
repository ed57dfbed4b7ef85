//! Input Router - delivers one key event to the node that should see it.
//!
//! Routing order:
//!
//! 1. If an overlay is open: the focused node inside it, then the overlay
//!    root. The event never reaches anything underneath.
//! 2. Otherwise: the focused node.
//!
//! Handlers get an [`InputContext`] through which they ask for side effects
//! (open/close an overlay, move focus, redraw). The router applies those
//! after the handler returns, so a handler never needs the tree itself.
//! A failing handler is logged and treated as not handled; its requests are
//! dropped.

use tracing::{debug, warn};

use crate::engine::{NodeId, UiTree};

use super::focus::FocusManager;
use super::keyboard::KeyboardEvent;

/// Outcome of routing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    Handled,
    NotHandled,
}

impl InputResult {
    pub fn is_handled(self) -> bool {
        self == Self::Handled
    }
}

impl From<bool> for InputResult {
    fn from(handled: bool) -> Self {
        if handled { Self::Handled } else { Self::NotHandled }
    }
}

/// Side effect requested by a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRequest {
    OpenOverlay(NodeId),
    CloseOverlay(NodeId),
    Focus(NodeId),
    FocusNext,
    FocusPrevious,
    Redraw,
}

/// Handed to `Widget::handle_input`.
#[derive(Debug)]
pub struct InputContext {
    node: NodeId,
    requests: Vec<InputRequest>,
}

impl InputContext {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            requests: Vec::new(),
        }
    }

    /// The node whose handler is running.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Show this node as an overlay.
    pub fn open_overlay(&mut self) {
        self.requests.push(InputRequest::OpenOverlay(self.node));
    }

    /// Stop showing this node as an overlay.
    pub fn close_overlay(&mut self) {
        self.requests.push(InputRequest::CloseOverlay(self.node));
    }

    pub fn focus(&mut self, id: NodeId) {
        self.requests.push(InputRequest::Focus(id));
    }

    pub fn focus_next(&mut self) {
        self.requests.push(InputRequest::FocusNext);
    }

    pub fn focus_previous(&mut self) {
        self.requests.push(InputRequest::FocusPrevious);
    }

    pub fn redraw(&mut self) {
        self.requests.push(InputRequest::Redraw);
    }

    pub fn requests(&self) -> &[InputRequest] {
        &self.requests
    }

    pub fn into_requests(self) -> Vec<InputRequest> {
        self.requests
    }
}

/// Route `event` through the tree.
pub fn handle_input(tree: &mut UiTree, focus: &mut FocusManager, event: &KeyboardEvent) -> InputResult {
    focus.rebuild(tree);

    if let Some(overlay) = tree.top_overlay() {
        let inner = focus
            .focused()
            .filter(|f| *f != overlay && tree.is_ancestor_or_self(overlay, *f));
        if let Some(target) = inner {
            if dispatch(tree, focus, target, event) {
                return InputResult::Handled;
            }
        }
        return dispatch(tree, focus, overlay, event).into();
    }

    match focus.focused() {
        Some(target) => dispatch(tree, focus, target, event).into(),
        None => InputResult::NotHandled,
    }
}

/// Run one node's handler and apply its requests.
fn dispatch(tree: &mut UiTree, focus: &mut FocusManager, target: NodeId, event: &KeyboardEvent) -> bool {
    let Some(node) = tree.get_mut(target) else {
        return false;
    };
    let mut ctx = InputContext::new(target);
    let handled = match node.widget_mut().handle_input(event, &mut ctx) {
        Ok(handled) => handled,
        Err(err) => {
            warn!(node = %node.name(), op = "handle_input", error = %err, "input handler failed");
            return false;
        }
    };
    if handled {
        debug!(node = %node.name(), key = %event.key, "input handled");
        tree.request_redraw();
    }
    apply_requests(tree, focus, ctx.into_requests());
    handled
}

/// Apply handler requests in order.
pub fn apply_requests(tree: &mut UiTree, focus: &mut FocusManager, requests: Vec<InputRequest>) {
    for request in requests {
        match request {
            InputRequest::OpenOverlay(id) => {
                if tree.open_overlay(id).is_ok() {
                    focus.rebuild(tree);
                    // Keep focus on the opener if it is focusable, else
                    // move into the overlay.
                    if !focus.focused().is_some_and(|f| tree.is_ancestor_or_self(id, f)) {
                        focus.focus_first(tree);
                    }
                }
            }
            InputRequest::CloseOverlay(id) => {
                if tree.close_overlay(id) {
                    focus.restore(tree);
                }
            }
            InputRequest::Focus(id) => {
                focus.request_focus(tree, id);
            }
            InputRequest::FocusNext => {
                focus.next(tree);
            }
            InputRequest::FocusPrevious => {
                focus.previous(tree);
            }
            InputRequest::Redraw => tree.request_redraw(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Node, PanelWidget, Widget};
    use crate::error::{Error, Result};
    use crate::layout::LayoutProps;

    /// Records keys and handles the ones it is told to.
    struct Recorder {
        accept: &'static str,
        seen: Vec<String>,
        fail: bool,
    }

    impl Recorder {
        fn new(accept: &'static str) -> Self {
            Self {
                accept,
                seen: Vec::new(),
                fail: false,
            }
        }
    }

    impl Widget for Recorder {
        fn kind(&self) -> &'static str {
            "recorder"
        }

        fn handle_input(&mut self, event: &KeyboardEvent, ctx: &mut InputContext) -> Result<bool> {
            self.seen.push(event.key.clone());
            if self.fail {
                ctx.redraw();
                return Err(Error::Input("boom".into()));
            }
            if event.key == "o" {
                ctx.open_overlay();
                return Ok(true);
            }
            if event.key == "c" {
                ctx.close_overlay();
                return Ok(true);
            }
            Ok(event.key == self.accept)
        }
    }

    fn setup() -> (UiTree, FocusManager, NodeId, NodeId) {
        let mut tree = UiTree::new();
        let root = tree.insert(Node::panel("root", Box::new(PanelWidget), None));
        tree.set_root(root).unwrap();
        let a = tree.insert(Node::new("a", Box::new(Recorder::new("x"))).focusable(true));
        let b = tree.insert(Node::new("b", Box::new(Recorder::new("y"))).focusable(true));
        tree.add_child(root, a, LayoutProps::default()).unwrap();
        tree.add_child(root, b, LayoutProps::default()).unwrap();
        let mut focus = FocusManager::new();
        focus.rebuild(&tree);
        (tree, focus, a, b)
    }

    fn seen(tree: &UiTree, id: NodeId) -> Vec<String> {
        tree.widget::<Recorder>(id).unwrap().seen.clone()
    }

    #[test]
    fn test_routes_to_focused_node_only() {
        let (mut tree, mut focus, a, b) = setup();
        focus.request_focus(&mut tree, b);

        assert_eq!(handle_input(&mut tree, &mut focus, &KeyboardEvent::new("y")), InputResult::Handled);
        assert_eq!(handle_input(&mut tree, &mut focus, &KeyboardEvent::new("x")), InputResult::NotHandled);
        assert!(seen(&tree, a).is_empty());
        assert_eq!(seen(&tree, b), vec!["y", "x"]);
    }

    #[test]
    fn test_no_focus_is_not_handled() {
        let (mut tree, mut focus, _, _) = setup();
        assert_eq!(handle_input(&mut tree, &mut focus, &KeyboardEvent::new("x")), InputResult::NotHandled);
    }

    #[test]
    fn test_failing_handler_is_not_handled() {
        let (mut tree, mut focus, a, _) = setup();
        tree.widget_mut::<Recorder>(a).unwrap().fail = true;
        focus.request_focus(&mut tree, a);
        tree.take_redraw();

        assert_eq!(handle_input(&mut tree, &mut focus, &KeyboardEvent::new("x")), InputResult::NotHandled);
        assert!(!tree.take_redraw());
    }

    #[test]
    fn test_overlay_captures_input() {
        let (mut tree, mut focus, a, b) = setup();
        focus.request_focus(&mut tree, a);
        // `a` opens itself as an overlay.
        assert!(handle_input(&mut tree, &mut focus, &KeyboardEvent::new("o")).is_handled());
        assert_eq!(tree.top_overlay(), Some(a));

        // `b` would handle "y", but the overlay swallows routing.
        assert_eq!(handle_input(&mut tree, &mut focus, &KeyboardEvent::new("y")), InputResult::NotHandled);
        assert!(seen(&tree, b).is_empty());

        assert!(handle_input(&mut tree, &mut focus, &KeyboardEvent::new("c")).is_handled());
        assert_eq!(tree.top_overlay(), None);
        assert_eq!(focus.focused(), Some(a));
    }

    #[test]
    fn test_overlay_tries_inner_focus_then_root() {
        let mut tree = UiTree::new();
        let root = tree.insert(Node::panel("root", Box::new(PanelWidget), None));
        tree.set_root(root).unwrap();
        let modal = tree.insert(Node::panel("modal", Box::new(Recorder::new("Escape")), None));
        let field = tree.insert(Node::new("field", Box::new(Recorder::new("z"))).focusable(true));
        tree.add_child(root, modal, LayoutProps::default()).unwrap();
        tree.add_child(modal, field, LayoutProps::default()).unwrap();
        let mut focus = FocusManager::new();
        apply_requests(&mut tree, &mut focus, vec![InputRequest::OpenOverlay(modal)]);
        assert_eq!(focus.focused(), Some(field));

        assert!(handle_input(&mut tree, &mut focus, &KeyboardEvent::new("Escape")).is_handled());
        assert_eq!(seen(&tree, field), vec!["Escape"]);
        assert_eq!(seen(&tree, modal), vec!["Escape"]);
    }
}

//! Focus System - keyboard navigation and focus state
//!
//! The focus ring is the depth-first list of visible+focusable nodes. While
//! an overlay is open the ring is restricted to the top overlay's subtree, so
//! focus cannot leave a modal.
//!
//! The `FOCUSED` node flag in the tree is the single source of truth; the
//! manager keeps the ring and a short history for restoring focus when an
//! overlay closes.
//!
//! # Example
//!
//! ```
//! use spark_panels::engine::{Node, PanelWidget, UiTree};
//! use spark_panels::layout::LayoutProps;
//! use spark_panels::state::focus::FocusManager;
//!
//! let mut tree = UiTree::new();
//! let root = tree.insert(Node::panel("root", Box::new(PanelWidget), None));
//! tree.set_root(root).unwrap();
//! let a = tree.insert(Node::new("a", Box::new(PanelWidget)).focusable(true));
//! let b = tree.insert(Node::new("b", Box::new(PanelWidget)).focusable(true));
//! tree.add_child(root, a, LayoutProps::default()).unwrap();
//! tree.add_child(root, b, LayoutProps::default()).unwrap();
//!
//! let mut focus = FocusManager::new();
//! focus.rebuild(&tree);
//! assert_eq!(focus.next(&mut tree), Some(a));
//! assert_eq!(focus.next(&mut tree), Some(b));
//! assert_eq!(focus.next(&mut tree), Some(a));
//! ```

use tracing::{trace, warn};

use crate::engine::{NodeId, UiTree};

const MAX_HISTORY: usize = 10;

/// Ring of focusable nodes plus the current position.
#[derive(Debug, Default, Clone)]
pub struct FocusManager {
    ring: Vec<NodeId>,
    /// Position of the focused node in the ring.
    current: Option<usize>,
    /// Focused node; may lie outside the ring while an overlay is open.
    focused: Option<NodeId>,
    history: Vec<NodeId>,
}

impl FocusManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the ring from the tree.
    ///
    /// Walks the top overlay's subtree if one is open, else the root's.
    pub fn rebuild(&mut self, tree: &UiTree) {
        self.ring.clear();
        self.current = None;
        if let Some(id) = self.focused {
            let still = tree
                .get(id)
                .is_some_and(|n| n.is_focused() && n.is_focusable())
                && tree.is_shown(id);
            if !still {
                self.focused = None;
            }
        }
        let Some(scope) = tree.top_overlay().or(tree.root()) else {
            return;
        };

        let mut stack = vec![scope];
        while let Some(id) = stack.pop() {
            let Some(node) = tree.get(id) else {
                continue;
            };
            if !node.is_visible() {
                continue;
            }
            if node.is_focusable() {
                if node.is_focused() {
                    self.current = Some(self.ring.len());
                    self.focused.get_or_insert(id);
                }
                self.ring.push(id);
            }
            stack.extend(tree.children(id).iter().rev().copied());
        }
    }

    /// Nodes in traversal order.
    pub fn ring(&self) -> &[NodeId] {
        &self.ring
    }

    /// The focused node.
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Move focus to the next node, wrapping at the end.
    pub fn next(&mut self, tree: &mut UiTree) -> Option<NodeId> {
        self.step(tree, 1)
    }

    /// Move focus to the previous node, wrapping at the start.
    pub fn previous(&mut self, tree: &mut UiTree) -> Option<NodeId> {
        self.step(tree, -1)
    }

    fn step(&mut self, tree: &mut UiTree, direction: i64) -> Option<NodeId> {
        if self.ring.is_empty() {
            return None;
        }
        let len = self.ring.len() as i64;
        let next = match self.current {
            None if direction > 0 => 0,
            None => len - 1,
            Some(pos) => ((pos as i64 + direction) % len + len) % len,
        };
        let target = self.ring[next as usize];
        if self.request_focus(tree, target) {
            Some(target)
        } else {
            None
        }
    }

    /// Focus `id` if it is visible, focusable and inside the current scope.
    ///
    /// Invalid targets are logged and ignored; returns whether focus moved
    /// (or was already there).
    pub fn request_focus(&mut self, tree: &mut UiTree, id: NodeId) -> bool {
        let valid = tree.is_shown(id) && tree.get(id).is_some_and(|n| n.is_focusable());
        if !valid {
            warn!(node = ?id, op = "request_focus", "target is not visible and focusable");
            return false;
        }
        if let Some(scope) = tree.top_overlay() {
            if !tree.is_ancestor_or_self(scope, id) {
                warn!(node = ?id, op = "request_focus", "target is outside the open overlay");
                return false;
            }
        }

        let previous = self.focused();
        if previous == Some(id) {
            return true;
        }
        if let Some(prev) = previous {
            tree.set_focused_flag(prev, false);
            self.push_history(prev);
        }
        tree.set_focused_flag(id, true);
        self.focused = Some(id);

        self.current = self.ring.iter().position(|n| *n == id);
        if self.current.is_none() {
            // Became focusable since the last rebuild.
            self.rebuild(tree);
        }
        trace!(node = ?id, op = "focus", "focus moved");
        true
    }

    /// Clear focus.
    pub fn blur(&mut self, tree: &mut UiTree) {
        if let Some(prev) = self.focused.take() {
            tree.set_focused_flag(prev, false);
            self.push_history(prev);
        }
        self.current = None;
    }

    /// Keep the current focus if it is still in the ring, else focus the
    /// most recent history entry that is.
    pub fn restore(&mut self, tree: &mut UiTree) -> bool {
        self.rebuild(tree);
        if self.focused.is_some_and(|id| self.ring.contains(&id)) {
            return true;
        }
        while let Some(id) = self.history.pop() {
            if self.ring.contains(&id) {
                return self.request_focus(tree, id);
            }
        }
        false
    }

    /// Focus the first node of the ring.
    pub fn focus_first(&mut self, tree: &mut UiTree) -> bool {
        match self.ring.first().copied() {
            Some(id) => self.request_focus(tree, id),
            None => false,
        }
    }

    fn push_history(&mut self, id: NodeId) {
        self.history.retain(|h| *h != id);
        self.history.push(id);
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Node, PanelWidget};
    use crate::layout::LayoutProps;

    fn setup(n: usize) -> (UiTree, NodeId, Vec<NodeId>) {
        let mut tree = UiTree::new();
        let root = tree.insert(Node::panel("root", Box::new(PanelWidget), None));
        tree.set_root(root).unwrap();
        let ids = (0..n)
            .map(|i| {
                let id = tree.insert(Node::new(format!("n{i}"), Box::new(PanelWidget)).focusable(true));
                tree.add_child(root, id, LayoutProps::default()).unwrap();
                id
            })
            .collect();
        (tree, root, ids)
    }

    #[test]
    fn test_ring_is_depth_first() {
        let (mut tree, root, ids) = setup(1);
        let sub = tree.insert(Node::panel("sub", Box::new(PanelWidget), None));
        let inner = tree.insert(Node::new("inner", Box::new(PanelWidget)).focusable(true));
        let last = tree.insert(Node::new("last", Box::new(PanelWidget)).focusable(true));
        tree.add_child(root, sub, LayoutProps::default()).unwrap();
        tree.add_child(sub, inner, LayoutProps::default()).unwrap();
        tree.add_child(root, last, LayoutProps::default()).unwrap();

        let mut focus = FocusManager::new();
        focus.rebuild(&tree);
        assert_eq!(focus.ring(), &[ids[0], inner, last]);
    }

    #[test]
    fn test_next_previous_wrap() {
        let (mut tree, _, ids) = setup(3);
        let mut focus = FocusManager::new();
        focus.rebuild(&tree);

        assert_eq!(focus.previous(&mut tree), Some(ids[2]));
        assert_eq!(focus.next(&mut tree), Some(ids[0]));
        assert_eq!(focus.previous(&mut tree), Some(ids[2]));
        assert!(tree.get(ids[2]).unwrap().is_focused());
        assert!(!tree.get(ids[0]).unwrap().is_focused());
    }

    #[test]
    fn test_hidden_and_unfocusable_excluded() {
        let (mut tree, _, ids) = setup(3);
        tree.hide(ids[1]).unwrap();
        tree.set_focusable(ids[2], false).unwrap();
        let mut focus = FocusManager::new();
        focus.rebuild(&tree);
        assert_eq!(focus.ring(), &[ids[0]]);
    }

    #[test]
    fn test_request_focus_rejects_invalid() {
        let (mut tree, root, ids) = setup(2);
        let mut focus = FocusManager::new();
        focus.rebuild(&tree);
        assert!(focus.request_focus(&mut tree, ids[1]));

        assert!(!focus.request_focus(&mut tree, root));
        tree.hide(ids[0]).unwrap();
        assert!(!focus.request_focus(&mut tree, ids[0]));
        assert_eq!(focus.focused(), Some(ids[1]));
    }

    #[test]
    fn test_request_focus_rejects_child_of_hidden_panel() {
        let (mut tree, root, ids) = setup(1);
        let drawer = tree.insert(Node::panel("drawer", Box::new(PanelWidget), None).visible(false));
        let inner = tree.insert(Node::new("inner", Box::new(PanelWidget)).focusable(true));
        tree.add_child(root, drawer, LayoutProps::default()).unwrap();
        tree.add_child(drawer, inner, LayoutProps::default()).unwrap();
        assert!(tree.get(inner).unwrap().is_visible());

        let mut focus = FocusManager::new();
        focus.rebuild(&tree);
        assert_eq!(focus.ring(), &[ids[0]]);
        assert!(!focus.request_focus(&mut tree, inner));
        assert_eq!(focus.focused(), None);
        assert!(!tree.get(inner).unwrap().is_focused());
    }

    #[test]
    fn test_overlay_traps_focus_and_restores() {
        let (mut tree, root, ids) = setup(2);
        let modal = tree.insert(Node::panel("modal", Box::new(PanelWidget), None));
        let ok = tree.insert(Node::new("ok", Box::new(PanelWidget)).focusable(true));
        tree.add_child(root, modal, LayoutProps::default()).unwrap();
        tree.add_child(modal, ok, LayoutProps::default()).unwrap();

        let mut focus = FocusManager::new();
        focus.rebuild(&tree);
        focus.request_focus(&mut tree, ids[1]);

        tree.open_overlay(modal).unwrap();
        focus.rebuild(&tree);
        assert_eq!(focus.ring(), &[ok]);
        assert!(!focus.request_focus(&mut tree, ids[0]));
        assert_eq!(focus.next(&mut tree), Some(ok));

        tree.close_overlay(modal);
        tree.hide(modal).unwrap();
        assert!(focus.restore(&mut tree));
        assert_eq!(focus.focused(), Some(ids[1]));
    }

    #[test]
    fn test_restore_keeps_valid_focus() {
        let (mut tree, _, ids) = setup(2);
        let mut focus = FocusManager::new();
        focus.rebuild(&tree);
        focus.request_focus(&mut tree, ids[0]);
        focus.request_focus(&mut tree, ids[1]);

        assert!(focus.restore(&mut tree));
        assert_eq!(focus.focused(), Some(ids[1]));
        assert!(!tree.get(ids[0]).unwrap().is_focused());
    }

    #[test]
    fn test_blur() {
        let (mut tree, _, ids) = setup(1);
        let mut focus = FocusManager::new();
        focus.rebuild(&tree);
        focus.next(&mut tree);
        focus.blur(&mut tree);
        assert_eq!(focus.focused(), None);
        assert!(!tree.get(ids[0]).unwrap().is_focused());
    }
}

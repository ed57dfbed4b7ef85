//! UiTree - the node arena and its structural operations.
//!
//! Nodes live in a `SlotMap`; children are owned through their panel's
//! child list and parents are plain ids, so there are no reference cycles.
//! Removing a child leaves it in the arena as a detached root; `discard`
//! drops a whole subtree.

use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::layout::{self, Layout, LayoutItem, LayoutProps};
use crate::types::Rect;

use super::node::{Node, NodeFlags};
use super::NodeId;

/// The node arena.
#[derive(Debug, Default)]
pub struct UiTree {
    nodes: SlotMap<NodeId, Node>,
    root: Option<NodeId>,
    /// Open overlays, bottom to top.
    overlays: Vec<NodeId>,
    redraw: bool,
}

impl UiTree {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Arena access
    // =========================================================================

    /// Add a detached node to the arena.
    pub fn insert(&mut self, node: Node) -> NodeId {
        self.redraw = true;
        self.nodes.insert(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(Error::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(Error::UnknownNode(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        self.root = Some(id);
        self.redraw = true;
        Ok(())
    }

    /// First node with this name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|(_, n)| n.name == name).map(|(id, _)| id)
    }

    /// Downcast a node's widget.
    pub fn widget<T: super::Widget>(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id)?.widget().downcast_ref::<T>()
    }

    pub fn widget_mut<T: super::Widget>(&mut self, id: NodeId) -> Option<&mut T> {
        self.redraw = true;
        self.nodes.get_mut(id)?.widget_mut().downcast_mut::<T>()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .and_then(|n| n.panel.as_ref())
            .map(|p| p.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// True when `ancestor` is `node` or lies on its parent chain.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Depth-first pre-order ids of the subtree at `id` (child order).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    // =========================================================================
    // Composition
    // =========================================================================

    /// Add `child` to `parent`'s child list.
    ///
    /// Rejects unknown ids, a node added to itself, and a child that is an
    /// ancestor of `parent`. A child that already has a parent is moved.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId, props: LayoutProps) -> Result<()> {
        let result = self.try_add_child(parent, child, props);
        if let Err(err) = &result {
            warn!(node = ?parent, op = "add_child", error = %err, "child rejected");
        }
        result
    }

    fn try_add_child(&mut self, parent: NodeId, child: NodeId, props: LayoutProps) -> Result<()> {
        if !self.node(parent)?.is_panel() {
            return Err(Error::NotAPanel(parent));
        }
        self.node(child)?;
        if parent == child {
            return Err(Error::SelfChild(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(Error::Cycle { parent, child });
        }

        if let Some(old) = self.parent(child) {
            self.detach(old, child);
        }

        let node = self.node_mut(child)?;
        node.parent = Some(parent);
        node.layout_props = props;

        if let Some(panel) = self.node_mut(parent)?.panel.as_mut() {
            panel.children.push(child);
            panel.dirty = true;
        }
        if self.root == Some(child) {
            self.root = None;
        }
        self.redraw = true;
        Ok(())
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(panel) = self.nodes.get_mut(parent).and_then(|n| n.panel.as_mut()) else {
            return false;
        };
        let before = panel.children.len();
        panel.children.retain(|c| *c != child);
        let removed = panel.children.len() != before;
        if removed {
            panel.dirty = true;
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = None;
            }
            self.redraw = true;
        }
        removed
    }

    /// Remove `child` from `parent`. Returns false when it was not a child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool> {
        self.node(parent)?;
        Ok(self.detach(parent, child))
    }

    /// Detach every child of `parent`, returning them.
    pub fn clear_children(&mut self, parent: NodeId) -> Result<Vec<NodeId>> {
        let children = self.children(parent).to_vec();
        for child in &children {
            self.detach(parent, *child);
        }
        if let Some(panel) = self.node_mut(parent)?.panel.as_mut() {
            panel.dirty = true;
        }
        Ok(children)
    }

    /// Drop `id` and its whole subtree from the arena.
    pub fn discard(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.detach(parent, id);
        }
        let doomed = self.descendants(id);
        for node in &doomed {
            self.nodes.remove(*node);
        }
        self.overlays.retain(|o| !doomed.contains(o));
        if self.root.is_some_and(|r| doomed.contains(&r)) {
            self.root = None;
        }
        self.redraw = true;
        debug!(node = ?id, op = "discard", count = doomed.len(), "subtree discarded");
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.overlays.clear();
        self.root = None;
        self.redraw = true;
    }

    // =========================================================================
    // Visibility, geometry, layout parameters
    // =========================================================================

    /// Make `id` and all its descendants visible.
    pub fn show(&mut self, id: NodeId) -> Result<()> {
        self.set_visible(id, true)
    }

    /// Hide `id` and all its descendants; hidden nodes lose focus.
    pub fn hide(&mut self, id: NodeId) -> Result<()> {
        self.set_visible(id, false)
    }

    fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        self.node(id)?;
        for node in self.descendants(id) {
            if let Some(n) = self.nodes.get_mut(node) {
                n.flags.set(NodeFlags::VISIBLE, visible);
                if !visible {
                    n.flags.remove(NodeFlags::FOCUSED);
                }
            }
        }
        self.mark_parent_dirty(id);
        self.redraw = true;
        Ok(())
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(Node::is_visible)
    }

    /// Whether `id` and every ancestor are visible.
    pub fn is_shown(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.nodes.get(c)) {
            if !node.is_visible() {
                return false;
            }
            current = node.parent();
        }
        self.contains(id)
    }

    pub fn set_focusable(&mut self, id: NodeId, focusable: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        node.flags.set(NodeFlags::FOCUSABLE, focusable);
        if !focusable {
            node.flags.remove(NodeFlags::FOCUSED);
        }
        Ok(())
    }

    pub(crate) fn set_focused_flag(&mut self, id: NodeId, focused: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.flags.set(NodeFlags::FOCUSED, focused);
            self.redraw = true;
        }
    }

    /// Content rectangle: bounds minus margin, border and padding.
    pub fn content_area(&self, id: NodeId) -> Result<Rect> {
        Ok(self.node(id)?.content_area())
    }

    /// Move/resize a node. The node's own layout is invalidated.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.bounds == bounds {
            return Ok(());
        }
        node.bounds = bounds;
        if let Some(panel) = node.panel.as_mut() {
            panel.dirty = true;
        }
        let content = node.content_area();
        node.widget.arrange(content);
        self.redraw = true;
        Ok(())
    }

    /// Replace a panel's layout strategy.
    pub fn set_layout(&mut self, id: NodeId, layout: Option<Layout>) -> Result<()> {
        let panel = self.node_mut(id)?.panel.as_mut().ok_or(Error::NotAPanel(id))?;
        panel.layout = layout;
        panel.dirty = true;
        self.redraw = true;
        Ok(())
    }

    /// Replace a child's constraint inside its parent's layout.
    pub fn set_layout_props(&mut self, id: NodeId, props: LayoutProps) -> Result<()> {
        self.node_mut(id)?.layout_props = props;
        self.mark_parent_dirty(id);
        Ok(())
    }

    /// Change paint priority among siblings.
    pub fn set_z_index(&mut self, id: NodeId, z: i32) -> Result<()> {
        self.node_mut(id)?.z_index = z;
        self.mark_parent_dirty(id);
        self.redraw = true;
        Ok(())
    }

    pub fn mark_dirty(&mut self, id: NodeId) {
        if let Some(panel) = self.nodes.get_mut(id).and_then(|n| n.panel.as_mut()) {
            panel.dirty = true;
        }
    }

    fn mark_parent_dirty(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.mark_dirty(parent);
        }
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.nodes
            .get(id)
            .and_then(|n| n.panel.as_ref())
            .is_some_and(|p| p.dirty)
    }

    /// Children sorted for painting: ascending z, ties in insertion order.
    pub fn paint_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = self.children(id).to_vec();
        children.sort_by_key(|c| self.nodes.get(*c).map_or(0, |n| n.z_index));
        children
    }

    // =========================================================================
    // Layout pass
    // =========================================================================

    /// Recompute child bounds of every dirty panel under the root.
    pub fn layout(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.is_dirty(id) {
                self.layout_panel(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        let overlays = self.overlays.clone();
        for overlay in overlays {
            for id in self.descendants(overlay) {
                if self.is_dirty(id) {
                    self.layout_panel(id);
                }
            }
        }
    }

    fn layout_panel(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let content = node.content_area();
        let Some(panel) = node.panel.as_mut() else {
            return;
        };
        panel.dirty = false;
        let Some(layout) = panel.layout.clone() else {
            return;
        };
        let children = panel.children.clone();
        let visible: Vec<NodeId> = children.into_iter().filter(|c| self.is_visible(*c)).collect();

        match self.measure_children(&visible, content) {
            Ok(items) => {
                let rects = layout::compute(&layout, content, &items);
                for (child, rect) in visible.iter().zip(rects) {
                    let _ = self.set_bounds(*child, rect);
                }
            }
            Err(err) => {
                let name = self.nodes.get(id).map(|n| n.name.clone()).unwrap_or_default();
                warn!(node = %name, op = "layout", error = %err, "layout failed, using empty layout");
                let empty = Rect::new(content.x, content.y, 0, 0);
                for child in &visible {
                    let _ = self.set_bounds(*child, empty);
                }
            }
        }
    }

    fn measure_children(&self, children: &[NodeId], content: Rect) -> Result<Vec<LayoutItem>> {
        children
            .iter()
            .map(|c| {
                let node = self.node(*c)?;
                let preferred = node.widget.measure(content)?;
                Ok(LayoutItem {
                    props: node.layout_props,
                    preferred,
                    current: (node.bounds.width, node.bounds.height),
                })
            })
            .collect()
    }

    // =========================================================================
    // Overlays
    // =========================================================================

    /// Push `id` on the overlay stack (painted last, captures input).
    pub fn open_overlay(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        self.overlays.retain(|o| *o != id);
        self.overlays.push(id);
        self.redraw = true;
        debug!(node = ?id, op = "open_overlay", depth = self.overlays.len(), "overlay opened");
        Ok(())
    }

    /// Remove `id` from the overlay stack. Returns false if it was not open.
    pub fn close_overlay(&mut self, id: NodeId) -> bool {
        let before = self.overlays.len();
        self.overlays.retain(|o| *o != id);
        let closed = self.overlays.len() != before;
        if closed {
            self.redraw = true;
        }
        closed
    }

    pub fn top_overlay(&self) -> Option<NodeId> {
        self.overlays.last().copied()
    }

    pub fn overlays(&self) -> &[NodeId] {
        &self.overlays
    }

    pub fn is_overlay(&self, id: NodeId) -> bool {
        self.overlays.contains(&id)
    }

    // =========================================================================
    // Redraw bookkeeping
    // =========================================================================

    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    /// Return and clear the redraw request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    /// Run `validate` on every widget in the subtree, collecting failures.
    pub fn validate(&self, id: NodeId) -> Vec<(NodeId, Error)> {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| {
                let node = self.nodes.get(n)?;
                node.widget.validate().err().map(|e| (n, e))
            })
            .collect()
    }

    /// Iterate over all nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut Node)> {
        self.nodes.iter_mut()
    }
}

// =============================================================================
// Tests
// =============================================================================

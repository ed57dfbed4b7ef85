//! Render pass - paints the whole tree into a ScreenBuffer.
//!
//! # Order
//!
//! For each visible node, depth-first:
//!
//! 1. Fill the entire bounds with the node background (inherited from the
//!    parent when the node sets none)
//! 2. Border and title
//! 3. The widget's own content, clipped to the content area
//! 4. Children by ascending z-index (ties in insertion order), clipped to
//!    the content area
//!
//! Open overlays are skipped during the main walk and painted afterwards,
//! bottom to top, over everything else.
//!
//! A widget whose `render` fails is logged and replaced by an inline
//! `⚠ render failed` marker; the rest of the frame still completes.

use tracing::error;

use crate::engine::{NodeId, RenderFrame, UiTree};
use crate::renderer::ScreenBuffer;
use crate::theme::{roles, ColorResolver};
use crate::types::{Attr, CellStyle, Rect, Rgba};

/// Text drawn in place of a widget that failed to render.
pub const RENDER_FAILED: &str = "⚠ render failed";

/// Lay out dirty panels and paint the tree.
pub fn render(tree: &mut UiTree, buffer: &mut ScreenBuffer, colors: &dyn ColorResolver) {
    tree.layout();
    buffer.clear();

    let screen = buffer.bounds();
    let base_bg = colors.resolve(roles::BACKGROUND, Rgba::TERMINAL_DEFAULT);
    if let Some(root) = tree.root() {
        paint(tree, root, buffer, colors, screen, base_bg, Pass::Main);
    }

    let overlay_bg = colors.resolve(roles::SURFACE, base_bg);
    for overlay in tree.overlays().to_vec() {
        paint(tree, overlay, buffer, colors, screen, overlay_bg, Pass::Overlay);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Main,
    /// Painting an overlay root: use its overlay extent.
    Overlay,
}

fn paint(
    tree: &mut UiTree,
    id: NodeId,
    buffer: &mut ScreenBuffer,
    colors: &dyn ColorResolver,
    clip: Rect,
    parent_bg: Rgba,
    pass: Pass,
) {
    let Some(node) = tree.get(id) else {
        return;
    };
    if !node.is_visible() {
        return;
    }
    if pass == Pass::Main && tree.is_overlay(id) {
        return;
    }

    let style = node.style().clone();
    let focused = node.is_focused();
    let name = node.name().to_string();
    let (bounds, content) = match pass {
        Pass::Main => (node.bounds(), node.content_area()),
        Pass::Overlay => {
            let extent = node.widget().overlay_extent(node.bounds());
            let content = node.content_area();
            let grown = Rect::new(
                content.x,
                content.y,
                content.width + extent.width.saturating_sub(node.bounds().width),
                content.height + extent.height.saturating_sub(node.bounds().height),
            );
            (extent, grown)
        }
    };

    let Some(visible) = bounds.intersect(&clip) else {
        return;
    };

    let fg = style.fg.resolve(colors, colors.resolve(roles::TEXT, Rgba::TERMINAL_DEFAULT));
    let bg = style.bg.resolve(colors, parent_bg);

    // 1. Background over the full bounds.
    buffer.fill_rect(bounds, bg, Some(&visible));

    // 2. Border and title.
    let border_area = bounds.inset(style.margin);
    let border_color = if focused {
        style
            .focus_color
            .resolve(colors, colors.resolve(roles::BORDER_FOCUS, fg))
    } else {
        style.border_color.resolve(colors, colors.resolve(roles::BORDER, fg))
    };
    let title_style = CellStyle::new(border_color, bg).with_attrs(Attr::BOLD);
    buffer.draw_border(
        border_area,
        style.border,
        style.title.as_deref(),
        CellStyle::new(border_color, bg),
        title_style,
        Some(&visible),
    );

    // 3. Own content.
    let inner_clip = content.intersect(&visible);
    if let Some(inner) = inner_clip {
        let mut frame = RenderFrame {
            buffer: &mut *buffer,
            colors,
            bounds,
            content,
            clip: inner,
            focused,
            fg,
            bg,
        };
        let result = match tree.get_mut(id) {
            Some(node) => node.widget_mut().render(&mut frame),
            None => Ok(()),
        };
        if let Err(err) = result {
            error!(node = %name, op = "render", error = %err, "render failed");
            let marker = CellStyle::new(colors.resolve(roles::ERROR, Rgba::RED), bg);
            buffer.write_str(inner.x, inner.y, RENDER_FAILED, marker, Some(&inner));
        }
    }

    // 4. Children.
    let Some(inner) = inner_clip else {
        return;
    };
    for child in tree.paint_order(id) {
        paint(tree, child, buffer, colors, inner, bg, Pass::Main);
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Label Primitive - static or updatable text.
//!
//! Lines split on `\n`; with `wrap` set, long lines break at the content
//! width, otherwise they are truncated with `…`.

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

use crate::engine::{NodeId, RenderFrame, UiTree, Widget};
use crate::error::Result;
use crate::renderer::{fit, string_width};
use crate::types::{Attr, Rect, TextAlign};

use super::types::NodeProps;

/// Properties for [`label`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelProps {
    #[serde(flatten)]
    pub node: NodeProps,
    pub text: String,
    pub align: TextAlign,
    pub wrap: bool,
    pub bold: bool,
}

impl LabelProps {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            node: NodeProps::named(name),
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Text display widget.
#[derive(Debug, Clone, Default)]
pub struct Label {
    text: String,
    align: TextAlign,
    wrap: bool,
    attrs: Attr,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Lines as they would be drawn at `width` columns.
    pub fn lines(&self, width: u16) -> Vec<String> {
        if self.wrap {
            wrap(&self.text, width)
        } else {
            self.text.split('\n').map(str::to_string).collect()
        }
    }
}

impl Widget for Label {
    fn kind(&self) -> &'static str {
        "label"
    }

    fn render(&mut self, frame: &mut RenderFrame<'_>) -> Result<()> {
        let width = frame.content.width;
        let style = frame.text_style().with_attrs(self.attrs);
        for (dy, line) in self.lines(width).iter().enumerate().take(frame.content.height as usize) {
            frame.write(0, dy as u16, &fit(line, width as usize, self.align), style);
        }
        Ok(())
    }

    fn measure(&self, available: Rect) -> Result<Option<(u16, u16)>> {
        let lines = self.lines(available.width);
        let width = lines.iter().map(|l| string_width(l)).max().unwrap_or(0);
        Ok(Some((width.min(u16::MAX as usize) as u16, lines.len().min(u16::MAX as usize) as u16)))
    }
}

/// Break `text` into lines of at most `width` columns.
///
/// Explicit newlines always break. A character wider than the whole line
/// gets a line of its own.
pub fn wrap(text: &str, width: u16) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0u16;
    for c in text.chars() {
        if c == '\n' {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
            continue;
        }
        let w = c.width().unwrap_or(0) as u16;
        if current_width + w > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(c);
        current_width += w;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Create a label node.
pub fn label(tree: &mut UiTree, props: LabelProps) -> NodeId {
    let widget = Label {
        text: props.text,
        align: props.align,
        wrap: props.wrap,
        attrs: if props.bold { Attr::BOLD } else { Attr::empty() },
    };
    tree.insert(props.node.leaf(Box::new(widget), false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::render;
    use crate::renderer::ScreenBuffer;
    use crate::theme::Palette;

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("hello world", 5), vec!["hello", " worl", "d"]);
        assert_eq!(wrap("ab\ncd", 10), vec!["ab", "cd"]);
        assert_eq!(wrap("日本語", 4), vec!["日本", "語"]);
        assert!(wrap("", 4).is_empty());
    }

    #[test]
    fn test_label_renders_aligned_and_truncated() {
        let mut tree = UiTree::new();
        let mut props = LabelProps {
            align: TextAlign::Right,
            ..LabelProps::new("l", "hi\na long line")
        };
        props.node = props.node.bounds(Rect::new(0, 0, 6, 2));
        let id = label(&mut tree, props);
        tree.set_root(id).unwrap();

        let mut buffer = ScreenBuffer::new(6, 2);
        render(&mut tree, &mut buffer, &Palette::new());
        assert_eq!(buffer.row_text(0), "    hi");
        assert_eq!(buffer.row_text(1), "a lon…");
    }

    #[test]
    fn test_measure_reports_natural_size() {
        let label = Label::new("one\nthree");
        assert_eq!(label.measure(Rect::new(0, 0, 80, 10)).unwrap(), Some((5, 2)));
    }
}

//! Text Input Primitive - single-line editable text.
//!
//! # Keys
//!
//! - printable characters insert at the cursor (up to `max_length`)
//! - Backspace / Delete, Ctrl+Backspace / Ctrl+Delete by word
//! - ArrowLeft / ArrowRight, Ctrl+Arrow by word, Home / End
//! - Enter validates and submits
//!
//! Escape is left unhandled so an enclosing overlay can close.
//!
//! A validator runs after every edit and on submit. A rejected value stays
//! editable; the message is shown on the second content row when there is
//! one, and [`Widget::validate`] reports it.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::engine::{NodeId, RenderFrame, UiTree, Widget};
use crate::error::{Error, Result};
use crate::state::input::InputContext;
use crate::state::keyboard::KeyboardEvent;
use crate::theme::roles;
use crate::types::{Attr, CellStyle, Rect, Rgba};

use super::types::{ChangeCallback, NodeProps, SubmitCallback, Validator};

/// Properties for [`text_input`].
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextInputProps {
    #[serde(flatten)]
    pub node: NodeProps,
    pub value: String,
    pub placeholder: Option<String>,
    /// Maximum length in characters; 0 means unlimited.
    pub max_length: usize,
    /// Draw every character as this one.
    pub mask: Option<char>,
    #[serde(skip)]
    pub validator: Option<Validator>,
    #[serde(skip)]
    pub on_change: Option<ChangeCallback>,
    #[serde(skip)]
    pub on_submit: Option<SubmitCallback>,
}

impl TextInputProps {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            node: NodeProps::named(name),
            ..Self::default()
        }
    }

    pub fn validator(mut self, f: impl Fn(&str) -> std::result::Result<(), String> + 'static) -> Self {
        self.validator = Some(Rc::new(f));
        self
    }

    pub fn on_change(mut self, f: impl Fn(&str) + 'static) -> Self {
        self.on_change = Some(Rc::new(f));
        self
    }

    pub fn on_submit(mut self, f: impl Fn(&str) + 'static) -> Self {
        self.on_submit = Some(Rc::new(f));
        self
    }
}

// =============================================================================
// Word Boundary Helpers
// =============================================================================

/// Start of the word before `pos` (alphanumeric runs are words).
fn word_start(chars: &[char], pos: usize) -> usize {
    let mut i = pos.min(chars.len());
    while i > 0 && !chars[i - 1].is_alphanumeric() {
        i -= 1;
    }
    while i > 0 && chars[i - 1].is_alphanumeric() {
        i -= 1;
    }
    i
}

/// End of the word after `pos`.
fn word_end(chars: &[char], pos: usize) -> usize {
    let len = chars.len();
    let mut i = pos.min(len);
    while i < len && !chars[i].is_alphanumeric() {
        i += 1;
    }
    while i < len && chars[i].is_alphanumeric() {
        i += 1;
    }
    i
}

/// New horizontal scroll offset keeping `cursor` inside `width` columns.
pub fn ensure_cursor_visible(cursor: usize, scroll: usize, width: usize) -> usize {
    let width = width.max(1);
    if cursor < scroll {
        cursor
    } else if cursor >= scroll + width {
        cursor + 1 - width
    } else {
        scroll
    }
}

// =============================================================================
// Widget
// =============================================================================

/// Editable single-line text field.
pub struct TextInput {
    chars: Vec<char>,
    cursor: usize,
    scroll: usize,
    width: u16,
    placeholder: Option<String>,
    max_length: usize,
    mask: Option<char>,
    error: Option<String>,
    validator: Option<Validator>,
    on_change: Option<ChangeCallback>,
    on_submit: Option<SubmitCallback>,
}

impl TextInput {
    pub fn value(&self) -> String {
        self.chars.iter().collect()
    }

    /// Replace the value; the cursor moves to the end.
    pub fn set_value(&mut self, value: &str) {
        self.chars = value.chars().collect();
        self.cursor = self.chars.len();
        self.run_validator();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Message from the last rejected validation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn run_validator(&mut self) {
        self.error = match &self.validator {
            Some(validator) => validator(&self.value()).err(),
            None => None,
        };
    }

    fn changed(&mut self) {
        self.run_validator();
        if let Some(on_change) = &self.on_change {
            on_change(&self.value());
        }
    }

    fn insert(&mut self, c: char) -> bool {
        if self.max_length > 0 && self.chars.len() >= self.max_length {
            return false;
        }
        self.chars.insert(self.cursor, c);
        self.cursor += 1;
        self.changed();
        true
    }

    fn delete_range(&mut self, from: usize, to: usize) {
        if from < to {
            self.chars.drain(from..to);
            self.cursor = from;
            self.changed();
        }
    }

    fn edit(&mut self, event: &KeyboardEvent) -> bool {
        let ctrl = event.modifiers.ctrl;
        let len = self.chars.len();
        match event.key.as_str() {
            "ArrowLeft" if ctrl => self.cursor = word_start(&self.chars, self.cursor),
            "ArrowRight" if ctrl => self.cursor = word_end(&self.chars, self.cursor),
            "ArrowLeft" => self.cursor = self.cursor.saturating_sub(1),
            "ArrowRight" => self.cursor = (self.cursor + 1).min(len),
            "Home" => self.cursor = 0,
            "End" => self.cursor = len,
            "Backspace" if ctrl => {
                let start = word_start(&self.chars, self.cursor);
                self.delete_range(start, self.cursor);
            }
            "Backspace" => {
                if self.cursor > 0 {
                    self.delete_range(self.cursor - 1, self.cursor);
                }
            }
            "Delete" if ctrl => {
                let end = word_end(&self.chars, self.cursor);
                self.delete_range(self.cursor, end);
            }
            "Delete" => {
                if self.cursor < len {
                    self.delete_range(self.cursor, self.cursor + 1);
                }
            }
            "Enter" => {
                self.run_validator();
                if self.error.is_none() {
                    if let Some(on_submit) = &self.on_submit {
                        on_submit(&self.value());
                    }
                }
            }
            _ => match event.char() {
                Some(c) if !c.is_control() => {
                    self.insert(c);
                }
                _ => return false,
            },
        }
        true
    }
}

impl Widget for TextInput {
    fn kind(&self) -> &'static str {
        "text_input"
    }

    fn render(&mut self, frame: &mut RenderFrame<'_>) -> Result<()> {
        let width = frame.content.width as usize;
        self.width = frame.content.width;
        self.scroll = ensure_cursor_visible(self.cursor, self.scroll, width);

        let base = frame.text_style();
        if self.chars.is_empty() && !frame.focused {
            if let Some(placeholder) = &self.placeholder {
                let muted = frame.color(roles::TEXT_MUTED, frame.fg.dim(0.6));
                frame.write(0, 0, placeholder, CellStyle::new(muted, frame.bg).with_attrs(Attr::ITALIC));
            }
        } else {
            let shown: String = self
                .chars
                .iter()
                .skip(self.scroll)
                .take(width)
                .map(|c| self.mask.unwrap_or(*c))
                .collect();
            frame.write(0, 0, &shown, base);
        }

        if frame.focused {
            let at = self.cursor - self.scroll;
            let under = self.chars.get(self.cursor).map_or(' ', |c| self.mask.unwrap_or(*c));
            frame.write(at as u16, 0, &under.to_string(), base.with_attrs(Attr::INVERSE));
        }

        if let Some(error) = &self.error {
            if frame.content.height > 1 {
                let color = frame.color(roles::ERROR, Rgba::RED);
                frame.write(0, 1, error, CellStyle::new(color, frame.bg));
            }
        }
        Ok(())
    }

    fn handle_input(&mut self, event: &KeyboardEvent, ctx: &mut InputContext) -> Result<bool> {
        if !event.is_press() || event.modifiers.alt {
            return Ok(false);
        }
        let handled = self.edit(event);
        if handled {
            self.scroll = ensure_cursor_visible(self.cursor, self.scroll, self.width as usize);
            ctx.redraw();
        }
        Ok(handled)
    }

    fn validate(&self) -> Result<()> {
        match &self.validator {
            Some(validator) => validator(&self.value()).map_err(Error::Input),
            None => Ok(()),
        }
    }

    fn measure(&self, available: Rect) -> Result<Option<(u16, u16)>> {
        let rows = if self.validator.is_some() { 2 } else { 1 };
        Ok(Some((available.width, rows)))
    }

    fn arrange(&mut self, content: Rect) {
        self.width = content.width;
    }
}

/// Create a text input node.
pub fn text_input(tree: &mut UiTree, props: TextInputProps) -> NodeId {
    let mut widget = TextInput {
        chars: Vec::new(),
        cursor: 0,
        scroll: 0,
        width: props.node.width,
        placeholder: props.placeholder,
        max_length: props.max_length,
        mask: props.mask,
        error: None,
        validator: props.validator,
        on_change: props.on_change,
        on_submit: props.on_submit,
    };
    widget.chars = props.value.chars().collect();
    widget.cursor = widget.chars.len();
    tree.insert(props.node.leaf(Box::new(widget), true))
}

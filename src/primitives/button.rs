//! Button Primitive - focusable, fires `on_press` on Enter or Space.

use serde::{Deserialize, Serialize};

use crate::engine::{NodeId, RenderFrame, UiTree, Widget};
use crate::error::Result;
use crate::renderer::string_width;
use crate::state::input::InputContext;
use crate::state::keyboard::{KeyboardEvent, Modifiers};
use crate::theme::roles;
use crate::types::{Attr, CellStyle, Rect};

use super::types::{NodeProps, PressCallback};

/// Properties for [`button`].
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonProps {
    #[serde(flatten)]
    pub node: NodeProps,
    pub label: String,
    #[serde(skip)]
    pub on_press: Option<PressCallback>,
}

impl ButtonProps {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            node: NodeProps::named(name),
            label: label.into(),
            on_press: None,
        }
    }

    pub fn on_press(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_press = Some(std::rc::Rc::new(callback));
        self
    }
}

/// Push button.
pub struct Button {
    label: String,
    on_press: Option<PressCallback>,
    presses: u32,
}

impl Button {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// How many times the button fired.
    pub fn presses(&self) -> u32 {
        self.presses
    }

    fn caption(&self) -> String {
        format!("[ {} ]", self.label)
    }
}

impl Widget for Button {
    fn kind(&self) -> &'static str {
        "button"
    }

    fn render(&mut self, frame: &mut RenderFrame<'_>) -> Result<()> {
        let caption = self.caption();
        let style = if frame.focused {
            let fg = frame.color(roles::SELECTION_TEXT, frame.bg);
            let bg = frame.color(roles::PRIMARY, frame.fg);
            CellStyle::new(fg, bg).with_attrs(Attr::BOLD)
        } else {
            frame.text_style()
        };
        let pad = (frame.content.width as usize).saturating_sub(string_width(&caption)) / 2;
        let dy = frame.content.height.saturating_sub(1) / 2;
        frame.write(pad as u16, dy, &caption, style);
        Ok(())
    }

    fn handle_input(&mut self, event: &KeyboardEvent, ctx: &mut InputContext) -> Result<bool> {
        if !event.is_press() || event.modifiers != Modifiers::none() {
            return Ok(false);
        }
        match event.key.as_str() {
            "Enter" | " " => {
                self.presses += 1;
                if let Some(on_press) = &self.on_press {
                    on_press();
                }
                ctx.redraw();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn measure(&self, _available: Rect) -> Result<Option<(u16, u16)>> {
        Ok(Some((string_width(&self.caption()) as u16, 1)))
    }
}

/// Create a button node.
pub fn button(tree: &mut UiTree, props: ButtonProps) -> NodeId {
    let widget = Button {
        label: props.label,
        on_press: props.on_press,
        presses: 0,
    };
    tree.insert(props.node.leaf(Box::new(widget), true))
}

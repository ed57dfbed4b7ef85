//! Differential renderer for fullscreen mode.
//!
//! The DiffRenderer compares the current frame to the previous frame and only
//! outputs cells that have changed.
//!
//! # Algorithm
//!
//! 1. Wrap output in a synchronized update
//! 2. For each cell in the new frame:
//!    - If previous frame exists and cell is unchanged: skip
//!    - Otherwise: queue cursor move (when not contiguous), colours, text
//! 3. Flush the queued bytes in one write
//! 4. Store current frame as previous for next comparison

use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::{self, Attribute, Color, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal,
};

use super::buffer::ScreenBuffer;
use crate::types::{Attr, Cell, Rgba};

/// Last emitted terminal state, so redundant escape codes are skipped.
#[derive(Debug, Default)]
struct PenState {
    fg: Option<Rgba>,
    bg: Option<Rgba>,
    attrs: Option<Attr>,
    cursor: Option<(u16, u16)>,
}

/// Differential renderer for fullscreen mode.
///
/// Only cells that have changed since the last frame are written.
pub struct DiffRenderer {
    output: Vec<u8>,
    pen: PenState,
    previous: Option<ScreenBuffer>,
}

impl DiffRenderer {
    pub fn new() -> Self {
        Self {
            output: Vec::with_capacity(16384),
            pen: PenState::default(),
            previous: None,
        }
    }

    /// Render a frame to `out`, emitting only changed cells.
    ///
    /// Returns true if any cells were changed.
    pub fn render<W: Write>(&mut self, out: &mut W, buffer: &ScreenBuffer) -> io::Result<bool> {
        let mut has_changes = false;
        queue!(self.output, terminal::BeginSynchronizedUpdate)?;
        self.pen = PenState::default();

        let width = buffer.width();
        let height = buffer.height();
        let same_size = self
            .previous
            .as_ref()
            .is_some_and(|p| p.width() == width && p.height() == height);

        for y in 0..height {
            for x in 0..width {
                let Some(cell) = buffer.get(x, y) else {
                    continue;
                };
                let changed = match (&self.previous, same_size) {
                    (Some(prev), true) => prev.get(x, y) != Some(cell),
                    _ => true,
                };
                if changed {
                    has_changes = true;
                    self.emit_cell(x, y, cell)?;
                }
            }
        }

        queue!(self.output, terminal::EndSynchronizedUpdate)?;
        self.flush_to(out)?;
        self.previous = Some(buffer.clone());
        Ok(has_changes)
    }

    /// Force a full redraw (no diffing). Use after a terminal resize.
    pub fn render_full<W: Write>(&mut self, out: &mut W, buffer: &ScreenBuffer) -> io::Result<()> {
        self.invalidate();
        queue!(self.output, terminal::Clear(terminal::ClearType::All))?;
        self.render(out, buffer).map(|_| ())
    }

    /// Next render will be a full redraw.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Enter raw mode and the alternate screen, hide the cursor.
    pub fn enter_fullscreen<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        queue!(
            self.output,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All)
        )?;
        self.flush_to(out)?;
        self.invalidate();
        Ok(())
    }

    /// Restore the terminal to its pre-fullscreen state.
    pub fn exit_fullscreen<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        queue!(
            self.output,
            SetAttribute(Attribute::Reset),
            style::ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        self.flush_to(out)?;
        terminal::disable_raw_mode()
    }

    fn emit_cell(&mut self, x: u16, y: u16, cell: &Cell) -> io::Result<()> {
        // Trailing half of a wide char: the terminal already advanced.
        if cell.ch == '\0' {
            self.pen.cursor = None;
            return Ok(());
        }

        if self.pen.cursor != Some((x, y)) {
            queue!(self.output, cursor::MoveTo(x, y))?;
        }

        if self.pen.attrs != Some(cell.attrs) {
            queue!(self.output, SetAttribute(Attribute::Reset))?;
            for attr in attributes(cell.attrs) {
                queue!(self.output, SetAttribute(attr))?;
            }
            self.pen.attrs = Some(cell.attrs);
            // Reset clears colours too.
            self.pen.fg = None;
            self.pen.bg = None;
        }
        if self.pen.fg != Some(cell.fg) {
            queue!(self.output, SetForegroundColor(to_color(cell.fg)))?;
            self.pen.fg = Some(cell.fg);
        }
        if self.pen.bg != Some(cell.bg) {
            queue!(self.output, SetBackgroundColor(to_color(cell.bg)))?;
            self.pen.bg = Some(cell.bg);
        }

        queue!(self.output, style::Print(cell.ch))?;
        self.pen.cursor = Some((x.saturating_add(1), y));
        Ok(())
    }

    fn flush_to<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if self.output.is_empty() {
            return Ok(());
        }
        out.write_all(&self.output)?;
        out.flush()?;
        self.output.clear();
        Ok(())
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a colour onto crossterm's representation.
fn to_color(c: Rgba) -> Color {
    if c.is_terminal_default() {
        Color::Reset
    } else if c.is_ansi() {
        Color::AnsiValue(c.ansi_index())
    } else {
        Color::Rgb {
            r: c.r.clamp(0, 255) as u8,
            g: c.g.clamp(0, 255) as u8,
            b: c.b.clamp(0, 255) as u8,
        }
    }
}

fn attributes(attrs: Attr) -> Vec<Attribute> {
    let mut out = Vec::new();
    if attrs.contains(Attr::BOLD) {
        out.push(Attribute::Bold);
    }
    if attrs.contains(Attr::DIM) {
        out.push(Attribute::Dim);
    }
    if attrs.contains(Attr::ITALIC) {
        out.push(Attribute::Italic);
    }
    if attrs.contains(Attr::UNDERLINE) {
        out.push(Attribute::Underlined);
    }
    if attrs.contains(Attr::INVERSE) {
        out.push(Attribute::Reverse);
    }
    if attrs.contains(Attr::STRIKETHROUGH) {
        out.push(Attribute::CrossedOut);
    }
    out
}

// =============================================================================
// Tests
// =============================================================================

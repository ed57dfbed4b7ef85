//! ScreenBuffer and drawing primitives.
//!
//! The ScreenBuffer is a 2D grid of Cells holding one frame. Every write
//! primitive takes a clip rectangle; nothing is ever written outside the
//! buffer or outside the clip.
//!
//! # Design Decisions
//!
//! - **Flat storage**: `Vec<Cell>` with row-major indexing.
//! - **Clipping**: drawing functions accept an optional `Rect` clip.
//! - **Wide characters**: measured with `unicode-width`; the trailing half of a
//!   double-width character holds the continuation marker `'\0'`.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::types::{Attr, BorderStyle, Cell, CellStyle, Rect, Rgba};

// =============================================================================
// ScreenBuffer
// =============================================================================

/// A 2D buffer of terminal cells.
///
/// Uses flat storage with row-major indexing: `index = y * width + x`
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl ScreenBuffer {
    /// Create a new buffer filled with default cells.
    pub fn new(width: u16, height: u16) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::default(); size],
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// The full buffer bounds.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    /// Get a cell reference (returns None if out of bounds).
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// Raw cells, row-major.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Clear the entire buffer to default cells.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Resize the buffer (clears content).
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells
            .resize(width as usize * height as usize, Cell::default());
        self.clear();
    }

    /// Row `y` as a string, continuation cells skipped. Mostly for tests and
    /// snapshot-style assertions.
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = self.index(0, y);
        self.cells[start..start + self.width as usize]
            .iter()
            .filter(|c| c.ch != '\0')
            .map(|c| c.ch)
            .collect()
    }

    // =========================================================================
    // Drawing Primitives
    // =========================================================================

    /// Set a single cell with optional clipping.
    ///
    /// Returns true if the cell was set.
    pub fn set_cell(&mut self, x: u16, y: u16, ch: char, style: CellStyle, clip: Option<&Rect>) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        if let Some(clip) = clip {
            if !clip.contains(x, y) {
                return false;
            }
        }

        let idx = self.index(x, y);
        let cell = &mut self.cells[idx];
        cell.ch = ch;
        cell.fg = style.fg;
        if let Some(bg) = style.bg {
            if !bg.is_transparent() {
                cell.bg = bg;
            }
        }
        cell.attrs = style.attrs;
        true
    }

    /// Fill a rectangle with a background colour, blanking its characters.
    pub fn fill_rect(&mut self, rect: Rect, bg: Rgba, clip: Option<&Rect>) {
        let Some(area) = rect.intersect(&self.bounds()) else {
            return;
        };
        let area = match clip {
            Some(clip) => match area.intersect(clip) {
                Some(area) => area,
                None => return,
            },
            None => area,
        };

        for row in area.y..area.bottom() {
            let start = self.index(area.x, row);
            let end = self.index(area.right(), row);
            for cell in &mut self.cells[start..end] {
                cell.ch = ' ';
                cell.fg = Rgba::TERMINAL_DEFAULT;
                if !bg.is_transparent() {
                    cell.bg = bg;
                }
                cell.attrs = Attr::NONE;
            }
        }
    }

    /// Write text starting at `(x, y)`.
    ///
    /// Characters outside the buffer or the clip are dropped; a wide
    /// character that would straddle the clip edge is dropped whole.
    /// Returns the number of columns advanced.
    pub fn write_str(&mut self, x: u16, y: u16, text: &str, style: CellStyle, clip: Option<&Rect>) -> u16 {
        let limit = match clip {
            Some(clip) => clip.right().min(self.width),
            None => self.width,
        };
        let mut col = x;

        for ch in text.chars() {
            if col >= limit {
                break;
            }
            let w = ch.width().unwrap_or(0) as u16;
            if w == 0 {
                continue;
            }
            if col + w > limit {
                break;
            }
            if self.set_cell(col, y, ch, style, clip) && w == 2 {
                self.set_cell(col + 1, y, '\0', style, clip);
            }
            col += w;
        }

        col.saturating_sub(x)
    }

    /// Write text centred within `width` columns starting at `x`.
    pub fn write_centered(&mut self, x: u16, y: u16, width: u16, text: &str, style: CellStyle, clip: Option<&Rect>) -> u16 {
        let text_width = string_width(text);
        if text_width >= width as usize {
            return self.write_str(x, y, text, style, clip);
        }
        let offset = ((width as usize - text_width) / 2) as u16;
        self.write_str(x + offset, y, text, style, clip)
    }

    /// Write text right-aligned within `width` columns starting at `x`.
    pub fn write_right(&mut self, x: u16, y: u16, width: u16, text: &str, style: CellStyle, clip: Option<&Rect>) -> u16 {
        let text_width = string_width(text);
        if text_width >= width as usize {
            return self.write_str(x, y, text, style, clip);
        }
        let offset = (width as usize - text_width) as u16;
        self.write_str(x + offset, y, text, style, clip)
    }

    /// Draw a border around `rect` with an optional title centred in the top
    /// edge. The title is truncated to fit between the corners.
    pub fn draw_border(
        &mut self,
        rect: Rect,
        border: BorderStyle,
        title: Option<&str>,
        style: CellStyle,
        title_style: CellStyle,
        clip: Option<&Rect>,
    ) {
        let Some(g) = border.glyphs() else {
            return;
        };
        if rect.width < 2 || rect.height < 2 {
            return;
        }

        let x2 = rect.right() - 1;
        let y2 = rect.bottom() - 1;

        self.set_cell(rect.x, rect.y, g.top_left, style, clip);
        self.set_cell(x2, rect.y, g.top_right, style, clip);
        self.set_cell(x2, y2, g.bottom_right, style, clip);
        self.set_cell(rect.x, y2, g.bottom_left, style, clip);

        for col in (rect.x + 1)..x2 {
            self.set_cell(col, rect.y, g.horizontal, style, clip);
            self.set_cell(col, y2, g.horizontal, style, clip);
        }
        for row in (rect.y + 1)..y2 {
            self.set_cell(rect.x, row, g.vertical, style, clip);
            self.set_cell(x2, row, g.vertical, style, clip);
        }

        if let Some(title) = title.filter(|t| !t.is_empty()) {
            // One cell of edge on each side plus a space of padding.
            let inner = rect.width.saturating_sub(4);
            if inner == 0 {
                return;
            }
            let label = truncate(title, inner as usize);
            let decorated = format!(" {label} ");
            self.write_centered(rect.x + 1, rect.y, rect.width - 2, &decorated, title_style, clip);
        }
    }

    /// Draw a horizontal line of `ch`.
    pub fn draw_hline(&mut self, x: u16, y: u16, length: u16, ch: char, style: CellStyle, clip: Option<&Rect>) {
        for col in x..x.saturating_add(length).min(self.width) {
            self.set_cell(col, y, ch, style, clip);
        }
    }

    /// Draw a vertical scrollbar for a viewport showing `visible` of `total`
    /// rows starting at `offset`.
    pub fn draw_scrollbar_v(
        &mut self,
        x: u16,
        y: u16,
        height: u16,
        offset: usize,
        visible: usize,
        total: usize,
        style: CellStyle,
        clip: Option<&Rect>,
    ) {
        if height == 0 || total <= visible || total == 0 {
            return;
        }
        let h = height as usize;
        let thumb = (h * visible / total).max(1);
        let track_space = h - thumb.min(h);
        let max_offset = total - visible;
        let thumb_start = track_space * offset.min(max_offset) / max_offset.max(1);

        for row in 0..h {
            let is_thumb = row >= thumb_start && row < thumb_start + thumb;
            let ch = if is_thumb { '█' } else { '░' };
            self.set_cell(x, y + row as u16, ch, style, clip);
        }
    }
}

// =============================================================================
// Text Width Utilities
// =============================================================================

/// Display width of a string in terminal columns.
pub fn string_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate `s` to at most `max` columns, appending `…` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if string_width(s) <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Pad or truncate `s` to exactly `width` columns with the given alignment.
pub fn fit(s: &str, width: usize, align: crate::types::TextAlign) -> String {
    use crate::types::TextAlign;

    let text = truncate(s, width);
    let pad = width.saturating_sub(string_width(&text));
    match align {
        TextAlign::Left => format!("{text}{}", " ".repeat(pad)),
        TextAlign::Right => format!("{}{text}", " ".repeat(pad)),
        TextAlign::Center => {
            let left = pad / 2;
            format!("{}{text}{}", " ".repeat(left), " ".repeat(pad - left))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextAlign;

    #[test]
    fn test_buffer_creation() {
        let buffer = ScreenBuffer::new(80, 24);
        assert_eq!(buffer.width(), 80);
        assert_eq!(buffer.height(), 24);
        assert_eq!(buffer.cells().len(), 80 * 24);
    }

    #[test]
    fn test_set_cell_respects_clip() {
        let mut buffer = ScreenBuffer::new(10, 10);
        let clip = Rect::new(2, 2, 3, 3);
        assert!(!buffer.set_cell(0, 0, 'X', CellStyle::default(), Some(&clip)));
        assert!(buffer.set_cell(2, 2, 'X', CellStyle::default(), Some(&clip)));
        assert!(!buffer.set_cell(10, 0, 'X', CellStyle::default(), None));
    }

    #[test]
    fn test_fill_rect() {
        let mut buffer = ScreenBuffer::new(20, 20);
        buffer.fill_rect(Rect::new(5, 5, 10, 10), Rgba::BLUE, None);

        assert_eq!(buffer.get(5, 5).unwrap().bg, Rgba::BLUE);
        assert_eq!(buffer.get(14, 14).unwrap().bg, Rgba::BLUE);
        assert_eq!(buffer.get(4, 5).unwrap().bg, Rgba::TERMINAL_DEFAULT);
        assert_eq!(buffer.get(15, 5).unwrap().bg, Rgba::TERMINAL_DEFAULT);
    }

    #[test]
    fn test_fill_rect_clipped_to_buffer() {
        let mut buffer = ScreenBuffer::new(4, 4);
        buffer.fill_rect(Rect::new(2, 2, 100, 100), Rgba::RED, None);
        assert_eq!(buffer.get(3, 3).unwrap().bg, Rgba::RED);
        assert_eq!(buffer.get(1, 1).unwrap().bg, Rgba::TERMINAL_DEFAULT);
    }

    #[test]
    fn test_write_str_clips() {
        let mut buffer = ScreenBuffer::new(20, 2);
        let clip = Rect::new(0, 0, 3, 1);
        let advanced = buffer.write_str(0, 0, "Hello", CellStyle::default(), Some(&clip));
        assert_eq!(advanced, 3);
        assert_eq!(buffer.row_text(0).trim_end(), "Hel");
    }

    #[test]
    fn test_write_str_wide_chars() {
        let mut buffer = ScreenBuffer::new(6, 1);
        let advanced = buffer.write_str(0, 0, "中文x", CellStyle::default(), None);
        assert_eq!(advanced, 5);
        assert_eq!(buffer.get(0, 0).unwrap().ch, '中');
        assert_eq!(buffer.get(1, 0).unwrap().ch, '\0');
        assert_eq!(buffer.get(4, 0).unwrap().ch, 'x');
    }

    #[test]
    fn test_wide_char_not_split_at_edge() {
        let mut narrow = ScreenBuffer::new(2, 1);
        narrow.write_str(1, 0, "中", CellStyle::default(), None);
        assert_eq!(narrow.get(1, 0).unwrap().ch, ' ');
    }

    #[test]
    fn test_draw_border_with_title() {
        let mut buffer = ScreenBuffer::new(12, 3);
        buffer.draw_border(
            buffer.bounds(),
            BorderStyle::Single,
            Some("Hi"),
            CellStyle::default(),
            CellStyle::default(),
            None,
        );
        assert_eq!(buffer.row_text(0), "┌─── Hi ───┐");
        assert_eq!(buffer.row_text(1), "│          │");
        assert_eq!(buffer.row_text(2), "└──────────┘");
    }

    #[test]
    fn test_draw_border_none_is_noop() {
        let mut buffer = ScreenBuffer::new(4, 4);
        buffer.draw_border(buffer.bounds(), BorderStyle::None, None, CellStyle::default(), CellStyle::default(), None);
        assert_eq!(buffer.row_text(0), "    ");
    }

    #[test]
    fn test_truncate_and_fit() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(fit("ab", 4, TextAlign::Right), "  ab");
        assert_eq!(fit("ab", 5, TextAlign::Center), " ab  ");
    }

    #[test]
    fn test_string_width() {
        assert_eq!(string_width("hello"), 5);
        assert_eq!(string_width("中文"), 4);
        assert_eq!(string_width("a中b"), 4);
    }
}

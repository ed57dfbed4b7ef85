//! Keyboard events and the crossterm bridge.
//!
//! Keys are named the way widgets match on them: single characters as
//! themselves (`"a"`, `"/"`, `" "`), everything else by name (`"Enter"`,
//! `"Escape"`, `"ArrowUp"`, `"PageDown"`, `"F5"`...).

use std::time::Duration;

use crossterm::event::{
    poll, read, Event as CrosstermEvent, KeyCode, KeyEvent as CrosstermKeyEvent, KeyEventKind, KeyModifiers,
};

// =============================================================================
// TYPES
// =============================================================================

/// Keyboard modifier state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::default() }
    }

    pub fn alt() -> Self {
        Self { alt: true, ..Self::default() }
    }

    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }
}

/// Key event state (press, repeat, release)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyState {
    #[default]
    Press,
    Repeat,
    Release,
}

/// Keyboard event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyboardEvent {
    /// The key that was pressed (e.g., "a", "Enter", "ArrowUp")
    pub key: String,
    pub modifiers: Modifiers,
    pub state: KeyState,
}

impl KeyboardEvent {
    /// Create a simple key press event
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::default(),
            state: KeyState::Press,
        }
    }

    /// Create a key press with modifiers
    pub fn with_modifiers(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
            state: KeyState::Press,
        }
    }

    pub fn is_press(&self) -> bool {
        self.state == KeyState::Press
    }

    /// The typed character, for single-character keys without ctrl/alt.
    pub fn char(&self) -> Option<char> {
        if self.modifiers.ctrl || self.modifiers.alt {
            return None;
        }
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }

    /// Digit value of a `0`-`9` key.
    pub fn digit(&self) -> Option<u32> {
        self.char().and_then(|c| c.to_digit(10))
    }

    /// Check key name and exact modifier set.
    pub fn is(&self, key: &str, modifiers: Modifiers) -> bool {
        self.key == key && self.modifiers == modifiers
    }
}

/// Everything the host loop can read from the terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyboardEvent),
    Resize(u16, u16),
    None,
}

// =============================================================================
// CROSSTERM CONVERSION
// =============================================================================

/// Convert crossterm KeyEvent to our KeyboardEvent
pub fn convert_key_event(event: CrosstermKeyEvent) -> KeyboardEvent {
    let mut modifiers = convert_modifiers(event.modifiers);
    let key = match event.code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => {
            modifiers.shift = true;
            "Tab".to_string()
        }
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        KeyCode::Insert => "Insert".to_string(),
        _ => String::new(),
    };

    // Shift is already folded into the character itself.
    if key.chars().count() == 1 {
        modifiers.shift = false;
    }

    let state = match event.kind {
        KeyEventKind::Press => KeyState::Press,
        KeyEventKind::Repeat => KeyState::Repeat,
        KeyEventKind::Release => KeyState::Release,
    };

    KeyboardEvent { key, modifiers, state }
}

fn convert_modifiers(mods: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: mods.contains(KeyModifiers::CONTROL),
        alt: mods.contains(KeyModifiers::ALT),
        shift: mods.contains(KeyModifiers::SHIFT),
        meta: mods.contains(KeyModifiers::META) || mods.contains(KeyModifiers::SUPER),
    }
}

// =============================================================================
// EVENT POLLING
// =============================================================================

/// Poll for an event with timeout. Returns None if no event within timeout.
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<InputEvent>> {
    if poll(timeout)? {
        Ok(Some(read_event()?))
    } else {
        Ok(None)
    }
}

/// Read the next event (blocking).
pub fn read_event() -> std::io::Result<InputEvent> {
    match read()? {
        CrosstermEvent::Key(key) => Ok(InputEvent::Key(convert_key_event(key))),
        CrosstermEvent::Resize(w, h) => Ok(InputEvent::Resize(w, h)),
        _ => Ok(InputEvent::None),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn ct(code: KeyCode, modifiers: KeyModifiers) -> CrosstermKeyEvent {
        CrosstermKeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_convert_named_keys() {
        assert_eq!(convert_key_event(ct(KeyCode::Up, KeyModifiers::NONE)).key, "ArrowUp");
        assert_eq!(convert_key_event(ct(KeyCode::Esc, KeyModifiers::NONE)).key, "Escape");
        assert_eq!(convert_key_event(ct(KeyCode::F(5), KeyModifiers::NONE)).key, "F5");
    }

    #[test]
    fn test_backtab_is_shift_tab() {
        let ev = convert_key_event(ct(KeyCode::BackTab, KeyModifiers::SHIFT));
        assert!(ev.is("Tab", Modifiers::shift()));
    }

    #[test]
    fn test_uppercase_char_drops_shift() {
        let ev = convert_key_event(ct(KeyCode::Char('A'), KeyModifiers::SHIFT));
        assert_eq!(ev.char(), Some('A'));
        assert_eq!(ev.modifiers, Modifiers::none());
    }

    #[test]
    fn test_char_and_digit() {
        assert_eq!(KeyboardEvent::new("x").char(), Some('x'));
        assert_eq!(KeyboardEvent::new("Enter").char(), None);
        assert_eq!(KeyboardEvent::with_modifiers("c", Modifiers::ctrl()).char(), None);
        assert_eq!(KeyboardEvent::new("7").digit(), Some(7));
        assert_eq!(KeyboardEvent::new("a").digit(), None);
    }
}

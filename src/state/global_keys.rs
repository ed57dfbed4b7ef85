//! Global Keys - bindings for events no node handled.
//!
//! The router never acts on an unhandled event; the host asks
//! [`GlobalBindings::lookup`] and applies the action itself.
//!
//! Default bindings:
//! - Ctrl+C, Ctrl+Q: quit
//! - F5, Ctrl+R: refresh
//! - Tab: focus next
//! - Shift+Tab: focus previous
//!
//! # Example
//!
//! ```
//! use spark_panels::state::global_keys::{GlobalAction, GlobalBindings};
//! use spark_panels::state::keyboard::{KeyboardEvent, Modifiers};
//!
//! let bindings = GlobalBindings::default();
//! let ctrl_c = KeyboardEvent::with_modifiers("c", Modifiers::ctrl());
//! assert_eq!(bindings.lookup(&ctrl_c), Some(GlobalAction::Quit));
//! assert_eq!(bindings.lookup(&KeyboardEvent::new("c")), None);
//! ```

use super::keyboard::{KeyboardEvent, Modifiers};

/// What the host should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAction {
    Quit,
    Refresh,
    FocusNext,
    FocusPrevious,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    key: String,
    modifiers: Modifiers,
    action: GlobalAction,
}

/// Key → action table, first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalBindings {
    bindings: Vec<Binding>,
}

impl GlobalBindings {
    /// No bindings at all.
    pub fn empty() -> Self {
        Self { bindings: Vec::new() }
    }

    /// Add (or replace) a binding.
    pub fn bind(mut self, key: impl Into<String>, modifiers: Modifiers, action: GlobalAction) -> Self {
        let key = key.into();
        self.bindings.retain(|b| !(b.key == key && b.modifiers == modifiers));
        self.bindings.push(Binding { key, modifiers, action });
        self
    }

    /// Remove every binding for `action`.
    pub fn unbind(mut self, action: GlobalAction) -> Self {
        self.bindings.retain(|b| b.action != action);
        self
    }

    /// Action bound to this press event.
    pub fn lookup(&self, event: &KeyboardEvent) -> Option<GlobalAction> {
        if !event.is_press() {
            return None;
        }
        self.bindings
            .iter()
            .find(|b| event.is(&b.key, b.modifiers))
            .map(|b| b.action)
    }
}

impl Default for GlobalBindings {
    fn default() -> Self {
        Self::empty()
            .bind("c", Modifiers::ctrl(), GlobalAction::Quit)
            .bind("q", Modifiers::ctrl(), GlobalAction::Quit)
            .bind("F5", Modifiers::none(), GlobalAction::Refresh)
            .bind("r", Modifiers::ctrl(), GlobalAction::Refresh)
            .bind("Tab", Modifiers::none(), GlobalAction::FocusNext)
            .bind("Tab", Modifiers::shift(), GlobalAction::FocusPrevious)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::keyboard::KeyState;

    #[test]
    fn test_default_bindings() {
        let b = GlobalBindings::default();
        assert_eq!(b.lookup(&KeyboardEvent::new("Tab")), Some(GlobalAction::FocusNext));
        assert_eq!(
            b.lookup(&KeyboardEvent::with_modifiers("Tab", Modifiers::shift())),
            Some(GlobalAction::FocusPrevious)
        );
        assert_eq!(b.lookup(&KeyboardEvent::new("F5")), Some(GlobalAction::Refresh));
        assert_eq!(b.lookup(&KeyboardEvent::new("q")), None);
    }

    #[test]
    fn test_release_events_ignored() {
        let mut ev = KeyboardEvent::with_modifiers("c", Modifiers::ctrl());
        ev.state = KeyState::Release;
        assert_eq!(GlobalBindings::default().lookup(&ev), None);
    }

    #[test]
    fn test_rebind_and_unbind() {
        let b = GlobalBindings::default()
            .bind("q", Modifiers::none(), GlobalAction::Quit)
            .unbind(GlobalAction::Refresh);
        assert_eq!(b.lookup(&KeyboardEvent::new("q")), Some(GlobalAction::Quit));
        assert_eq!(b.lookup(&KeyboardEvent::new("F5")), None);
    }
}

//! Colour resolution.
//!
//! The toolkit never owns a colour table. Widgets name colours by semantic
//! role ("text", "border_focus", "selection"...) and the host supplies a
//! [`ColorResolver`] that maps names to concrete values.
//!
//! # Color Types
//!
//! - `ThemeColor::Default` - Uses terminal's default color
//! - `ThemeColor::Ansi(n)` - ANSI palette index (0-255)
//! - `ThemeColor::Rgb(rgba)` - Explicit RGB color
//! - `ThemeColor::Named(s)` - Role name looked up through the resolver,
//!   falling back to parsing `s` as a colour literal
//!
//! # Example
//!
//! ```rust
//! use spark_panels::theme::{ColorResolver, Palette, ThemeColor};
//! use spark_panels::types::Rgba;
//!
//! let palette = Palette::default_dark();
//! let text = ThemeColor::from("text").resolve(&palette, Rgba::WHITE);
//! assert!(!text.is_transparent());
//! assert_eq!(palette.resolve("no-such-role", Rgba::RED), Rgba::RED);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Rgba;

// =============================================================================
// ColorResolver - the one call the core makes for colours
// =============================================================================

/// Maps a colour name to a concrete colour.
pub trait ColorResolver {
    /// Resolve `name`, returning `default` when the name is unknown.
    fn resolve(&self, name: &str, default: Rgba) -> Rgba;
}

/// Any `Fn(&str, Rgba) -> Rgba` works as a resolver.
impl<F> ColorResolver for F
where
    F: Fn(&str, Rgba) -> Rgba,
{
    fn resolve(&self, name: &str, default: Rgba) -> Rgba {
        self(name, default)
    }
}

// =============================================================================
// ThemeColor
// =============================================================================

/// A colour as written in widget configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeColor {
    /// Use terminal's default color.
    #[default]
    Default,
    /// ANSI palette index (0-255).
    Ansi(u8),
    /// Explicit RGB color.
    #[serde(skip)]
    Rgb(Rgba),
    /// Role name or colour literal.
    Named(String),
}

impl ThemeColor {
    /// Resolve to a concrete colour.
    ///
    /// Named colours go through `colors` first; a name the resolver does not
    /// know is parsed as a literal (`#ff0000`, `red`, `ansi:4`); failing
    /// both, `default` is used.
    pub fn resolve(&self, colors: &dyn ColorResolver, default: Rgba) -> Rgba {
        match self {
            Self::Default => default,
            Self::Ansi(i) => Rgba::ansi(*i),
            Self::Rgb(c) => *c,
            Self::Named(name) => {
                let fallback = Rgba::parse(name).unwrap_or(default);
                colors.resolve(name, fallback)
            }
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl From<u8> for ThemeColor {
    fn from(index: u8) -> Self {
        Self::Ansi(index)
    }
}

impl From<Rgba> for ThemeColor {
    fn from(color: Rgba) -> Self {
        Self::Rgb(color)
    }
}

impl From<&str> for ThemeColor {
    fn from(s: &str) -> Self {
        Self::Named(s.to_string())
    }
}

impl From<String> for ThemeColor {
    fn from(s: String) -> Self {
        Self::Named(s)
    }
}

// =============================================================================
// Palette - a HashMap-backed resolver
// =============================================================================

/// Role names the built-in widgets ask for.
pub mod roles {
    pub const TEXT: &str = "text";
    pub const TEXT_MUTED: &str = "text_muted";
    pub const BACKGROUND: &str = "background";
    pub const SURFACE: &str = "surface";
    pub const BORDER: &str = "border";
    pub const BORDER_FOCUS: &str = "border_focus";
    pub const PRIMARY: &str = "primary";
    pub const SELECTION: &str = "selection";
    pub const SELECTION_TEXT: &str = "selection_text";
    pub const HEADER: &str = "header";
    pub const ERROR: &str = "error";
}

/// Simple name → colour table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Palette {
    colors: HashMap<String, Rgba>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dark palette covering every role in [`roles`].
    pub fn default_dark() -> Self {
        let mut p = Self::new();
        p.set(roles::TEXT, Rgba::rgb(0xe0, 0xe0, 0xe0));
        p.set(roles::TEXT_MUTED, Rgba::rgb(0x80, 0x80, 0x80));
        p.set(roles::BACKGROUND, Rgba::TERMINAL_DEFAULT);
        p.set(roles::SURFACE, Rgba::rgb(0x1e, 0x1e, 0x2e));
        p.set(roles::BORDER, Rgba::rgb(0x58, 0x5b, 0x70));
        p.set(roles::BORDER_FOCUS, Rgba::rgb(0x89, 0xb4, 0xfa));
        p.set(roles::PRIMARY, Rgba::rgb(0x89, 0xb4, 0xfa));
        p.set(roles::SELECTION, Rgba::rgb(0x45, 0x47, 0x5a));
        p.set(roles::SELECTION_TEXT, Rgba::WHITE);
        p.set(roles::HEADER, Rgba::rgb(0xf9, 0xe2, 0xaf));
        p.set(roles::ERROR, Rgba::rgb(0xf3, 0x8b, 0xa8));
        p
    }

    pub fn set(&mut self, name: impl Into<String>, color: Rgba) {
        self.colors.insert(name.into(), color);
    }

    pub fn get(&self, name: &str) -> Option<Rgba> {
        self.colors.get(name).copied()
    }
}

impl ColorResolver for Palette {
    fn resolve(&self, name: &str, default: Rgba) -> Rgba {
        self.get(name).unwrap_or(default)
    }
}

// =============================================================================
// Tests
// =============================================================================

//! State modules - focus, keyboard, input routing, global keys, refresh.

pub mod focus;
pub mod global_keys;
pub mod input;
pub mod keyboard;
pub mod refresh;

pub use focus::FocusManager;
pub use global_keys::{GlobalAction, GlobalBindings};
pub use input::{handle_input, InputContext, InputRequest, InputResult};
pub use keyboard::{KeyboardEvent, Modifiers};
pub use refresh::RefreshTimer;

//! PDF Smart Editor application layer
//!
//! Keyboard shortcut resolution and dispatch onto the editor, plus the
//! headless command line front end.

pub mod cli;
mod dispatch;
mod shortcuts;

pub use dispatch::{DispatchOutcome, dispatch};
pub use shortcuts::{EditorAction, Modifiers, Shortcut, ShortcutRegistry};

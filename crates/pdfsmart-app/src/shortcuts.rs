//! Keyboard shortcut registry and key resolution.

/// Actions a key press can trigger on the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Save,
    Undo,
    Redo,
    Open,
    PreviousPage,
    NextPage,
    ZoomIn,
    ZoomOut,
    Help,
}

/// Modifier keys held during a key press. Cmd counts as Ctrl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        shift: false,
        meta: false,
    };

    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        shift: true,
        meta: false,
    };

    fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub action: EditorAction,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        action: EditorAction,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+S").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    /// Whether a key press triggers this shortcut.
    ///
    /// Shift is only compared for letters and named keys; symbols like `?`
    /// and `+` need Shift on most layouts anyway.
    fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        if !self.key.eq_ignore_ascii_case(key) || self.ctrl != modifiers.command() {
            return false;
        }
        let is_symbol = key.chars().count() == 1 && key.chars().all(|c| c.is_ascii_punctuation());
        is_symbol || self.shift == modifiers.shift
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        use EditorAction::*;
        vec![
            Shortcut::new("S", true, false, Save, "Save changes"),
            Shortcut::new("Z", true, false, Undo, "Undo"),
            Shortcut::new("Z", true, true, Redo, "Redo"),
            Shortcut::new("Y", true, false, Redo, "Redo"),
            Shortcut::new("O", true, false, Open, "Open PDF..."),
            Shortcut::new("PageUp", false, false, PreviousPage, "Previous page"),
            Shortcut::new("ArrowLeft", false, false, PreviousPage, "Previous page"),
            Shortcut::new("PageDown", false, false, NextPage, "Next page"),
            Shortcut::new("ArrowRight", false, false, NextPage, "Next page"),
            Shortcut::new("=", true, false, ZoomIn, "Zoom in"),
            Shortcut::new("+", true, false, ZoomIn, "Zoom in"),
            Shortcut::new("-", true, false, ZoomOut, "Zoom out"),
            Shortcut::new("?", false, false, Help, "Show keyboard shortcuts"),
        ]
    }

    /// Map a key press to an action.
    ///
    /// Presses made while a text input has focus belong to the input.
    pub fn resolve(key: &str, modifiers: Modifiers, text_input_focused: bool) -> Option<EditorAction> {
        if text_input_focused {
            return None;
        }
        Self::all()
            .into_iter()
            .find(|shortcut| shortcut.matches(key, modifiers))
            .map(|shortcut| shortcut.action)
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}

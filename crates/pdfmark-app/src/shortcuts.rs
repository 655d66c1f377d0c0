//! Keyboard shortcut registry and documentation.

use pdfmark_core::input::{KeyEvent, Modifiers};

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl/Cmd");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    /// The key event this shortcut produces.
    pub fn key_event(&self) -> KeyEvent {
        KeyEvent::new(
            self.key,
            Modifiers {
                ctrl: self.ctrl,
                shift: self.shift,
                ..Default::default()
            },
        )
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, false, "Undo"),
            Shortcut::new("Z", true, true, "Redo"),
            Shortcut::new("Y", true, false, "Redo"),
            Shortcut::new("Escape", false, false, "Cancel the shape being drawn"),
        ]
    }

    /// Shortcut list formatted for help output.
    pub fn help_text() -> String {
        let mut text = String::from("Canvas shortcuts:\n");
        for shortcut in Self::all() {
            text.push_str(&format!("  {:20} {}\n", shortcut.format(), shortcut.description));
        }
        text.push_str(&format!("  {:20} {}\n", "Ctrl/Cmd+Wheel", "Zoom around the pointer"));
        text
    }
}

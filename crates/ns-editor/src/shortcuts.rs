//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Editing actions
//! are executed by the controller; file and run actions need a path from the
//! UI and are handed back to it.

use crate::input::Modifiers;
use ns_core::NodeKind;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Modes ──
    ModeSelect,
    ModeInsertNode(NodeKind),
    ModeInsertLink,
    ModeInsertText,

    // ── Edit ──
    Delete,
    /// Back to select mode with an empty selection.
    Deselect,
    BringToFront,
    SendToBack,
    ClearCanvas,

    // ── File ──
    Save,
    Load,
    Run,
}

/// Resolves key events into shortcut actions.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action. Returns `None` if the combo has no
    /// binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        if modifiers.command() {
            return match key {
                "f" | "F" => Some(ShortcutAction::BringToFront),
                "b" | "B" => Some(ShortcutAction::SendToBack),
                "s" | "S" => Some(ShortcutAction::Save),
                "l" | "L" => Some(ShortcutAction::Load),
                "r" | "R" => Some(ShortcutAction::Run),
                "k" | "K" => Some(ShortcutAction::ClearCanvas),
                _ => None,
            };
        }

        if modifiers.alt {
            return None;
        }

        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            "h" | "H" => Some(ShortcutAction::ModeInsertNode(NodeKind::Host)),
            "s" | "S" => Some(ShortcutAction::ModeInsertNode(NodeKind::Switch)),
            "l" | "L" => Some(ShortcutAction::ModeInsertLink),
            "t" | "T" => Some(ShortcutAction::ModeInsertText),
            "v" | "V" => Some(ShortcutAction::ModeSelect),
            _ => None,
        }
    }
}

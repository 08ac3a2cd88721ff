//! Key events and cell-level editor actions.
//!
//! Platform-agnostic definitions. Hosts convert native key events to
//! [`KeyEvent`]; the router turns those into [`CellAction`]s, which the
//! session executes.

use smol_str::SmolStr;

/// Key values for keyboard input.
///
/// Platform-specific code converts from native key events to this enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key. Letter commands match case-insensitively.
    Character(SmolStr),

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Space,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// True for the single-letter character key `letter`, ignoring case.
    pub fn is_letter(&self, letter: char) -> bool {
        match self {
            Self::Character(s) => {
                let mut chars = s.chars();
                matches!(
                    (chars.next(), chars.next()),
                    (Some(c), None) if c.eq_ignore_ascii_case(&letter)
                )
            }
            _ => false,
        }
    }
}

/// Modifier key state for a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }

    /// Ctrl or Cmd held.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A key press with its modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    pub fn shift(key: Key) -> Self {
        Self::new(key, Modifiers::SHIFT)
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Event should be passed through to the text field (caret movement,
    /// typing).
    PassThrough,
}

/// Cell-level operations the router can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAction {
    /// Move the active cell up. `extend` keeps the current selection.
    ActivatePrev { extend: bool },
    /// Move the active cell down. `extend` keeps the current selection.
    ActivateNext { extend: bool },
    /// Frozen → Editing on the active cell.
    Unfreeze,
    /// Editing → Frozen on the active cell.
    Freeze,
    /// Insert an empty cell after the active one and edit it.
    InsertBelow,
    /// Freeze the active cell, then insert and edit a new cell after it.
    SplitBelow,
    /// Delete the empty editing cell and continue in its predecessor.
    DeleteEmpty,
    /// Remove the selected cells, copying them first when `copy` is set.
    Cut { copy: bool },
    /// Replace the clipboard with the selected cells.
    Copy,
    /// Insert the clipboard after the active cell.
    Paste,
    /// Ask the remote store to write the document.
    SaveDocument,
    /// No state change, but the platform default must not run.
    SuppressDefault,
}

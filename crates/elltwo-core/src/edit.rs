//! Edit mode state machine.
//!
//! Each cell is either frozen (rendered, `text` authoritative) or editing
//! (raw text exposed through an [`EditBuffer`]). The document as a whole is
//! viewing, editing or locked.

use crate::actions::{Key, KeyEvent};
use crate::cell::Cell;

/// Document-level permission mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DocumentMode {
    /// Loaded (or not yet loaded) and unlocked, but keyboard commands are off.
    #[default]
    Viewing,
    /// Keyboard commands are live.
    Editing,
    /// Read-only document. No edits, ever.
    Locked,
}

impl DocumentMode {
    pub fn accepts_edits(self) -> bool {
        matches!(self, Self::Editing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viewing => "viewing",
            Self::Editing => "editing",
            Self::Locked => "locked",
        }
    }
}

/// Live raw-text form of an editing cell.
///
/// The caret is a char offset into `text`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditBuffer {
    text: String,
    caret: usize,
}

/// What [`EditBuffer::apply_default`] did with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultEdit {
    /// Text changed.
    Changed,
    /// Only the caret moved.
    Moved,
    /// Key has no default editing behavior.
    Ignored,
}

impl EditBuffer {
    /// New buffer with the caret at the end.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let caret = text.chars().count();
        Self { text, caret }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn caret_at_start(&self) -> bool {
        self.caret == 0
    }

    pub fn caret_at_end(&self) -> bool {
        self.caret == self.len_chars()
    }

    pub fn set_caret(&mut self, caret: usize) {
        self.caret = caret.min(self.len_chars());
    }

    pub fn caret_to_start(&mut self) {
        self.caret = 0;
    }

    pub fn caret_to_end(&mut self) {
        self.caret = self.len_chars();
    }

    fn byte_offset(&self, char_offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_offset)
            .map(|(byte, _)| byte)
            .unwrap_or(self.text.len())
    }

    /// Insert text at the caret and move the caret past it.
    pub fn insert(&mut self, text: &str) {
        let at = self.byte_offset(self.caret);
        self.text.insert_str(at, text);
        self.caret += text.chars().count();
    }

    pub fn delete_backward(&mut self) -> bool {
        if self.caret == 0 {
            return false;
        }
        let start = self.byte_offset(self.caret - 1);
        let end = self.byte_offset(self.caret);
        self.text.replace_range(start..end, "");
        self.caret -= 1;
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        if self.caret_at_end() {
            return false;
        }
        let start = self.byte_offset(self.caret);
        let end = self.byte_offset(self.caret + 1);
        self.text.replace_range(start..end, "");
        true
    }

    /// Apply the platform's ordinary text-field behavior for a key the
    /// router let through.
    pub fn apply_default(&mut self, event: &KeyEvent) -> DefaultEdit {
        if event.modifiers.ctrl || event.modifiers.meta {
            return DefaultEdit::Ignored;
        }
        match &event.key {
            Key::Character(s) => {
                self.insert(s);
                DefaultEdit::Changed
            }
            Key::Space => {
                self.insert(" ");
                DefaultEdit::Changed
            }
            Key::Enter => {
                self.insert("\n");
                DefaultEdit::Changed
            }
            Key::Tab => {
                self.insert("\t");
                DefaultEdit::Changed
            }
            Key::Backspace => changed_if(self.delete_backward()),
            Key::Delete => changed_if(self.delete_forward()),
            Key::ArrowLeft => {
                self.caret = self.caret.saturating_sub(1);
                DefaultEdit::Moved
            }
            Key::ArrowRight => {
                self.set_caret(self.caret + 1);
                DefaultEdit::Moved
            }
            Key::Home | Key::ArrowUp => {
                self.caret_to_start();
                DefaultEdit::Moved
            }
            Key::End | Key::ArrowDown => {
                self.caret_to_end();
                DefaultEdit::Moved
            }
            _ => DefaultEdit::Ignored,
        }
    }
}

fn changed_if(changed: bool) -> DefaultEdit {
    if changed {
        DefaultEdit::Changed
    } else {
        DefaultEdit::Ignored
    }
}

/// Result of committing an editing cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frozen {
    /// The edit changed the text, so the cell must be saved.
    pub needs_save: bool,
}

/// Frozen → Editing. Snapshots `text` into a fresh buffer with the caret at
/// the end. Returns false if the cell was already editing.
pub fn unfreeze(cell: &mut Cell) -> bool {
    if cell.is_editing() {
        return false;
    }
    cell.edit = Some(EditBuffer::new(cell.text.clone()));
    true
}

/// Editing → Frozen. Commits the buffer into `text`. `modified` stays set
/// until the save goes out.
pub fn freeze(cell: &mut Cell) -> Option<Frozen> {
    let buffer = cell.edit.take()?;
    cell.text = buffer.into_text();
    Some(Frozen {
        needs_save: cell.modified,
    })
}

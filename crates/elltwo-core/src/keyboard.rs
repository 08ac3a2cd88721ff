//! Keyboard router.
//!
//! A pure dispatch table from (key, modifiers, document mode, active cell
//! state, caret position) to a [`Route`]. The session executes the chosen
//! action; hosts apply pass-through keys to the edit buffer themselves.

use crate::actions::{CellAction, Key, KeyEvent};
use crate::edit::DocumentMode;

/// Session state the router needs to pick a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteContext {
    pub mode: DocumentMode,
    /// There is an active cell.
    pub has_active: bool,
    /// The active cell is editing.
    pub editing: bool,
    pub caret_at_start: bool,
    pub caret_at_end: bool,
    /// The active cell's live text is empty.
    pub cell_empty: bool,
}

/// Outcome of routing a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Run this action. Platform default is suppressed unless the action
    /// reports otherwise.
    Action(CellAction),
    /// Ordinary text editing in the active cell's buffer.
    PassThrough,
    /// Not a binding in this state.
    NotHandled,
}

pub fn route(event: &KeyEvent, cx: &RouteContext) -> Route {
    let mods = event.modifiers;
    let key = &event.key;

    // Vertical navigation stays live in every mode.
    if matches!(key, Key::ArrowUp | Key::ArrowDown) {
        if mods.command() || mods.alt {
            return not_editing_or_pass(cx);
        }
        let up = matches!(key, Key::ArrowUp);
        if cx.editing {
            let at_boundary = if up {
                cx.caret_at_start
            } else {
                cx.caret_at_end
            };
            if !at_boundary {
                return Route::PassThrough;
            }
        }
        if !cx.has_active {
            return Route::NotHandled;
        }
        let extend = mods.shift;
        return Route::Action(if up {
            CellAction::ActivatePrev { extend }
        } else {
            CellAction::ActivateNext { extend }
        });
    }

    if !cx.mode.accepts_edits() {
        return Route::NotHandled;
    }

    if mods.command() {
        if key.is_letter('s') {
            return Route::Action(CellAction::SaveDocument);
        }
        return Route::NotHandled;
    }

    if cx.editing {
        return match key {
            Key::Escape => Route::Action(CellAction::Freeze),
            Key::Enter if mods.shift => Route::Action(CellAction::SplitBelow),
            Key::Backspace if cx.cell_empty => Route::Action(CellAction::DeleteEmpty),
            _ => Route::PassThrough,
        };
    }

    match key {
        Key::Character(_) if key.is_letter('w') && cx.has_active => {
            Route::Action(CellAction::Unfreeze)
        }
        Key::Character(_) if key.is_letter('o') => Route::Action(CellAction::InsertBelow),
        Key::Character(_) if mods.shift && cx.has_active && key.is_letter('x') => {
            Route::Action(CellAction::Cut { copy: true })
        }
        Key::Character(_) if mods.shift && cx.has_active && key.is_letter('d') => {
            Route::Action(CellAction::Cut { copy: false })
        }
        Key::Character(_) if mods.shift && cx.has_active && key.is_letter('c') => {
            Route::Action(CellAction::Copy)
        }
        Key::Character(_) if mods.shift && key.is_letter('v') => Route::Action(CellAction::Paste),
        // Outside a text field backspace would navigate the host away.
        Key::Backspace => Route::Action(CellAction::SuppressDefault),
        _ => Route::NotHandled,
    }
}

fn not_editing_or_pass(cx: &RouteContext) -> Route {
    if cx.editing {
        Route::PassThrough
    } else {
        Route::NotHandled
    }
}

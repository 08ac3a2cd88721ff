//! Display collaborator traits.
//!
//! These define the interface between the session state machine and whatever
//! surface shows the document (a browser view, a terminal, a test recorder).
//! The session calls them as side effects; it never reads state back.

use crate::cell::CellId;
use crate::edit::{DocumentMode, EditBuffer};

/// Markup renderer. Total and side-effect free for any input, including "".
pub trait Renderer {
    type Output;

    fn render(&self, text: &str) -> Self::Output;
}

/// Identity renderer, for surfaces that show raw source.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    type Output = String;

    fn render(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Primitive operations on the visual representation of cells.
pub trait Display {
    /// Attach a cell's visual representation after `after`, or at the top
    /// when `after` is `None`.
    fn attach(&mut self, id: CellId, after: Option<CellId>);

    /// Remove a cell's visual representation.
    fn detach(&mut self, id: CellId);

    /// Show the frozen form of a cell from its committed text.
    fn render(&mut self, id: CellId, text: &str);

    /// Show the raw-text editor for a cell, with its caret.
    fn show_editor(&mut self, id: CellId, buffer: &EditBuffer);

    /// Mark which cell is active. `None` clears the marker.
    fn set_active(&mut self, id: Option<CellId>);

    /// Mark the selected set.
    fn set_selected(&mut self, ids: &[CellId]);

    fn scroll_into_view(&mut self, id: CellId);

    fn focus(&mut self, id: CellId);

    /// Drop any text-range selection inside an editor.
    fn clear_text_selection(&mut self) {}

    /// Follow a `serve` redirect.
    fn navigate(&mut self, location: &str);

    /// Reflect the document mode. Surfaces that show no chrome can ignore it.
    fn set_document_mode(&mut self, _mode: DocumentMode) {}

    /// Reflect the document modified flag.
    fn set_modified(&mut self, _modified: bool) {}

    /// Drop every cell's visual representation ahead of a full reload.
    fn clear(&mut self);
}

impl<D: Display + ?Sized> Display for &mut D {
    fn attach(&mut self, id: CellId, after: Option<CellId>) {
        (**self).attach(id, after)
    }

    fn detach(&mut self, id: CellId) {
        (**self).detach(id)
    }

    fn render(&mut self, id: CellId, text: &str) {
        (**self).render(id, text)
    }

    fn show_editor(&mut self, id: CellId, buffer: &EditBuffer) {
        (**self).show_editor(id, buffer)
    }

    fn set_active(&mut self, id: Option<CellId>) {
        (**self).set_active(id)
    }

    fn set_selected(&mut self, ids: &[CellId]) {
        (**self).set_selected(ids)
    }

    fn scroll_into_view(&mut self, id: CellId) {
        (**self).scroll_into_view(id)
    }

    fn focus(&mut self, id: CellId) {
        (**self).focus(id)
    }

    fn clear_text_selection(&mut self) {
        (**self).clear_text_selection()
    }

    fn navigate(&mut self, location: &str) {
        (**self).navigate(location)
    }

    fn set_document_mode(&mut self, mode: DocumentMode) {
        (**self).set_document_mode(mode)
    }

    fn set_modified(&mut self, modified: bool) {
        (**self).set_modified(modified)
    }

    fn clear(&mut self) {
        (**self).clear()
    }
}

/// Display that shows nothing. Useful for headless sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn attach(&mut self, _id: CellId, _after: Option<CellId>) {}
    fn detach(&mut self, _id: CellId) {}
    fn render(&mut self, _id: CellId, _text: &str) {}
    fn show_editor(&mut self, _id: CellId, _buffer: &EditBuffer) {}
    fn set_active(&mut self, _id: Option<CellId>) {}
    fn set_selected(&mut self, _ids: &[CellId]) {}
    fn scroll_into_view(&mut self, _id: CellId) {}
    fn focus(&mut self, _id: CellId) {}
    fn navigate(&mut self, _location: &str) {}
    fn clear(&mut self) {}
}

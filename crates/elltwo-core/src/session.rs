//! The editing session: one context object owning the store, selection,
//! clipboard, document mode and sync client, driven by key events and
//! inbound messages.
//!
//! Every handler leaves the store link-consistent before returning, and emits
//! the outbound message for a mutation in the same call that performs it.

use tracing::{debug, error, info, warn};

use crate::actions::{CellAction, KeyEvent, KeydownResult};
use crate::cell::{Cell, CellId};
use crate::clipboard::Clipboard;
use crate::edit::{self, DefaultEdit, DocumentMode};
use crate::error::{CoreError, ProtocolError, StoreError};
use crate::keyboard::{self, Route, RouteContext};
use crate::platform::Display;
use crate::protocol::{CellRecord, ExportFormat, LoadMode, ServerMessage};
use crate::selection::{Direction, Selection};
use crate::store::{CellStore, Unlinked};
use crate::sync::{MessageSink, SyncClient};

/// Where to put the caret when a cell opens for editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretPlacement {
    Start,
    End,
}

pub struct Session<D, S> {
    store: CellStore,
    selection: Selection,
    clipboard: Clipboard,
    mode: DocumentMode,
    /// Document has changes the remote store has not written.
    modified: bool,
    /// A load has arrived this session.
    opened: bool,
    refetch_on_reconnect: bool,
    sync: SyncClient<S>,
    display: D,
}

impl<D: Display, S: MessageSink> Session<D, S> {
    pub fn new(display: D, sink: S) -> Self {
        Self {
            store: CellStore::new(),
            selection: Selection::new(),
            clipboard: Clipboard::new(),
            mode: DocumentMode::default(),
            modified: false,
            opened: false,
            refetch_on_reconnect: false,
            sync: SyncClient::new(sink),
            display,
        }
    }

    /// Request a full load on every reconnect, not only the first connect.
    pub fn with_refetch_on_reconnect(mut self, refetch: bool) -> Self {
        self.refetch_on_reconnect = refetch;
        self
    }

    pub fn store(&self) -> &CellStore {
        &self.store
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn mode(&self) -> DocumentMode {
        self.mode
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    pub fn active(&self) -> Option<CellId> {
        self.selection.active()
    }

    pub fn active_cell(&self) -> Option<&Cell> {
        self.selection.active().and_then(|id| self.store.get(id))
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn sink(&self) -> &S {
        self.sync.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.sync.sink_mut()
    }

    /// Committed document source in link order, cells joined by blank lines.
    pub fn markdown(&self) -> String {
        self.store
            .iter()
            .map(|cell| cell.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    // ---- connection ----

    /// Called each time the channel opens.
    pub fn on_connected(&mut self) {
        if !self.opened || self.refetch_on_reconnect {
            self.sync.fetch();
        }
    }

    /// Decode and apply one inbound frame. Bad frames and rejected loads
    /// are logged and change nothing.
    pub fn handle_frame(&mut self, raw: &str) {
        match self.try_handle_frame(raw) {
            Ok(()) => {}
            Err(CoreError::Protocol(ProtocolError::UnknownCommand(cmd))) => {
                warn!(cmd = %cmd, "ignoring unknown command");
            }
            Err(CoreError::Protocol(e)) => warn!(error = %e, "dropping malformed message"),
            Err(CoreError::Store(e)) => error!(error = %e, "rejecting document load"),
        }
    }

    /// [`handle_frame`](Self::handle_frame), handing back the reason a frame
    /// was dropped instead of logging it.
    pub fn try_handle_frame(&mut self, raw: &str) -> crate::error::Result<()> {
        let message = ServerMessage::decode(raw)?;
        self.apply(message)?;
        Ok(())
    }

    pub fn handle_message(&mut self, message: ServerMessage) {
        if let Err(e) = self.apply(message) {
            error!(error = %e, "rejecting document load");
        }
    }

    fn apply(&mut self, message: ServerMessage) -> Result<(), StoreError> {
        match message {
            ServerMessage::Load { mode, cells } => self.load(mode, cells),
            ServerMessage::Serve(location) => {
                info!(location = %location, "following redirect");
                self.display.navigate(&location);
                Ok(())
            }
        }
    }

    fn load(&mut self, mode: LoadMode, records: Vec<CellRecord>) -> Result<(), StoreError> {
        let count = records.len();
        self.store.replace_all(records.into_iter().map(Cell::from))?;

        self.selection.reset();
        self.display.clear();
        for cell in self.store.iter() {
            self.display.attach(cell.id, cell.prev);
            self.display.render(cell.id, &cell.text);
        }

        self.opened = true;
        self.set_mode(match mode {
            LoadMode::Full => DocumentMode::Editing,
            LoadMode::ReadOnly => DocumentMode::Locked,
        });
        self.set_modified(false);

        if let Some(head) = self.store.head() {
            self.show_active(head);
            self.select(head, true);
        } else {
            self.display.set_active(None);
            self.display.set_selected(&[]);
        }
        info!(cells = count, mode = self.mode.as_str(), "document loaded");
        Ok(())
    }

    // ---- document-level commands ----

    /// Flip between viewing and editing. Locked documents stay locked.
    pub fn toggle_editing(&mut self) -> bool {
        match self.mode {
            DocumentMode::Locked => false,
            _ if !self.opened => false,
            DocumentMode::Viewing => {
                self.set_mode(DocumentMode::Editing);
                true
            }
            DocumentMode::Editing => {
                if let Some(active) = self.selection.active() {
                    report(self.freeze(active));
                }
                self.set_mode(DocumentMode::Viewing);
                true
            }
        }
    }

    /// Ask the remote store to write the whole document. The modified flag
    /// clears on send.
    pub fn save_document(&mut self) {
        self.sync.write();
        self.set_modified(false);
    }

    pub fn revert(&mut self) {
        self.sync.revert();
        self.set_modified(false);
    }

    pub fn reload(&mut self) {
        self.sync.fetch();
    }

    pub fn export(&mut self, format: ExportFormat, data: String, deps: Option<Vec<String>>) {
        debug!(format = format.as_str(), bytes = data.len(), "exporting");
        self.sync.export(format, data, deps);
    }

    // ---- selection & focus ----

    /// Make `id` the active cell, freezing the previously active one.
    pub fn activate(&mut self, id: CellId) -> Result<(), StoreError> {
        if !self.store.contains(id) {
            return Err(StoreError::UnknownCell(id));
        }
        if let Some(previous) = self.selection.active().filter(|&previous| previous != id) {
            self.freeze(previous)?;
        }
        self.show_active(id);
        Ok(())
    }

    fn show_active(&mut self, id: CellId) {
        self.selection.activate(id);
        self.display.set_active(Some(id));
        self.display.scroll_into_view(id);
        self.display.focus(id);
    }

    pub fn select(&mut self, id: CellId, clear: bool) {
        self.selection.select(id, clear);
        let ids = self.selection.selected_in_order(&self.store);
        self.display.set_selected(&ids);
    }

    /// Pointer activation. Only live while editing the document.
    pub fn click(&mut self, id: CellId) -> Result<bool, StoreError> {
        if !self.mode.accepts_edits() {
            return Ok(false);
        }
        self.activate(id)?;
        self.select(id, true);
        Ok(true)
    }

    /// Move the active cell one step. An editing cell is frozen on the way
    /// out and its neighbor opened for editing.
    pub fn move_active(&mut self, direction: Direction, extend: bool) -> KeydownResult {
        let Some(from) = self.selection.active() else {
            return KeydownResult::NotHandled;
        };
        let moved = match direction {
            Direction::Up => self.selection.activate_prev(&self.store),
            Direction::Down => self.selection.activate_next(&self.store),
        };
        let to = match self.selection.active() {
            Some(to) if moved => to,
            _ => {
                self.select(from, !extend);
                return KeydownResult::NotHandled;
            }
        };

        let was_editing = self.store.get(from).is_some_and(Cell::is_editing);
        if was_editing {
            report(self.freeze(from));
        }
        self.show_active(to);
        if was_editing {
            let caret = match direction {
                Direction::Up => CaretPlacement::End,
                Direction::Down => CaretPlacement::Start,
            };
            report(self.unfreeze_at(to, caret));
        }
        self.select(to, !extend || was_editing);
        KeydownResult::Handled
    }

    // ---- edit mode ----

    /// Frozen → Editing with the caret at the end.
    pub fn unfreeze(&mut self, id: CellId) -> Result<bool, StoreError> {
        self.unfreeze_at(id, CaretPlacement::End)
    }

    pub fn unfreeze_at(&mut self, id: CellId, caret: CaretPlacement) -> Result<bool, StoreError> {
        let cell = self.store.get_mut(id).ok_or(StoreError::UnknownCell(id))?;
        if !edit::unfreeze(cell) {
            return Ok(false);
        }
        if let Some(buffer) = cell.edit.as_mut() {
            if caret == CaretPlacement::Start {
                buffer.caret_to_start();
            }
            self.display.show_editor(id, buffer);
        }
        self.display.focus(id);
        self.select(id, true);
        Ok(true)
    }

    /// Editing → Frozen. Sends exactly one save when the edit changed the
    /// text.
    pub fn freeze(&mut self, id: CellId) -> Result<bool, StoreError> {
        let cell = self.store.get_mut(id).ok_or(StoreError::UnknownCell(id))?;
        let Some(frozen) = edit::freeze(cell) else {
            return Ok(false);
        };
        self.display.clear_text_selection();
        self.display.render(id, &cell.text);
        if frozen.needs_save {
            self.save_cell(id)?;
        }
        Ok(true)
    }

    fn freeze_active(&mut self) -> Result<(), StoreError> {
        match self.selection.active() {
            Some(id) => self.freeze(id).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Send the committed text of a cell.
    pub fn save_cell(&mut self, id: CellId) -> Result<(), StoreError> {
        let cell = self.store.get_mut(id).ok_or(StoreError::UnknownCell(id))?;
        cell.modified = false;
        self.sync.saved(id, cell.text.clone());
        self.set_modified(true);
        Ok(())
    }

    /// Apply ordinary text editing to the active cell's buffer.
    pub fn apply_default(&mut self, event: &KeyEvent) -> DefaultEdit {
        self.with_active_buffer(|buffer| buffer.apply_default(event))
            .unwrap_or(DefaultEdit::Ignored)
    }

    /// Insert typed text at the active cell's caret.
    pub fn type_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.with_active_buffer(|buffer| {
            buffer.insert(text);
            DefaultEdit::Changed
        })
        .is_some()
    }

    fn with_active_buffer(
        &mut self,
        f: impl FnOnce(&mut edit::EditBuffer) -> DefaultEdit,
    ) -> Option<DefaultEdit> {
        let id = self.selection.active()?;
        let cell = self.store.get_mut(id)?;
        let buffer = cell.edit.as_mut()?;
        let outcome = f(buffer);
        if outcome != DefaultEdit::Ignored {
            self.display.show_editor(id, buffer);
        }
        if outcome == DefaultEdit::Changed {
            cell.modified = true;
        }
        Some(outcome)
    }

    // ---- structure ----

    /// Insert an empty cell after `after` (or as the head when `None`),
    /// activate it, and optionally open it for editing. The previously
    /// active cell is frozen first.
    pub fn insert_cell(&mut self, after: Option<CellId>, edit: bool) -> Result<CellId, StoreError> {
        self.freeze_active()?;
        let id = self.splice_in(after, String::new())?;
        self.show_active(id);
        if edit {
            self.unfreeze(id)?;
        } else {
            self.select(id, true);
        }
        Ok(id)
    }

    fn splice_in(&mut self, after: Option<CellId>, text: String) -> Result<CellId, StoreError> {
        let id = match after {
            Some(anchor) => self.store.insert_after(anchor, text)?,
            None => self.store.insert_first(text)?,
        };
        let (prev, next) = (self.store.prev_of(id), self.store.next_of(id));
        self.sync.created(id, prev, next);
        self.set_modified(true);

        self.display.attach(id, prev);
        if let Some(cell) = self.store.get(id) {
            self.display.render(id, &cell.text);
        }
        Ok(id)
    }

    /// Unlink a cell and tell the remote store. The active cell is cleared
    /// if it was the one removed.
    pub fn delete_cell(&mut self, id: CellId) -> Result<Unlinked, StoreError> {
        let unlinked = self.store.remove(id)?;
        self.sync.deleted(id, unlinked.prev, unlinked.next);
        self.set_modified(true);
        self.display.detach(id);
        self.selection.retain_existing(&self.store);
        Ok(unlinked)
    }

    /// Delete the empty editing cell and continue editing at the end of its
    /// predecessor. The first cell is never deleted this way.
    pub fn delete_empty(&mut self) -> Result<(), StoreError> {
        let Some(id) = self.selection.active() else {
            return Ok(());
        };
        let Some(prev) = self.store.prev_of(id) else {
            return Ok(());
        };
        self.delete_cell(id)?;
        self.show_active(prev);
        self.unfreeze_at(prev, CaretPlacement::End)?;
        Ok(())
    }

    /// Selected cells in document order, or the active cell alone when
    /// nothing is selected.
    fn targets(&self) -> Vec<CellId> {
        let ids = self.selection.selected_in_order(&self.store);
        if ids.is_empty() {
            self.selection.active().into_iter().collect()
        } else {
            ids
        }
    }

    /// Replace the clipboard with the selected cells' text.
    pub fn copy_selection(&mut self) -> usize {
        let ids = self.targets();
        let texts = ids
            .iter()
            .filter_map(|id| self.store.get(*id))
            .map(|cell| cell.text.clone());
        self.clipboard.replace(texts);
        debug!(cells = self.clipboard.len(), "copied");
        self.clipboard.len()
    }

    /// Remove the selected cells, then activate the cell after the
    /// selection, else the one before it. Cutting everything leaves no
    /// active cell.
    pub fn cut_selection(&mut self, copy: bool) -> Result<(), StoreError> {
        let ids = self.targets();
        let (Some(&first), Some(&last)) = (ids.first(), ids.last()) else {
            return Ok(());
        };
        if copy {
            self.copy_selection();
        }

        let successor = self
            .store
            .next_of(last)
            .or_else(|| self.store.prev_of(first));

        for id in &ids {
            self.delete_cell(*id)?;
        }
        if let Err(e) = self.store.validate() {
            error!(error = %e, "store inconsistent after cut");
            return Err(e);
        }

        self.selection.reset();
        match successor {
            Some(id) => {
                self.show_active(id);
                self.select(id, true);
            }
            None => {
                self.display.set_active(None);
                self.display.set_selected(&[]);
            }
        }
        Ok(())
    }

    /// Insert the clipboard after the active cell, rendering and saving each
    /// new cell. The last pasted cell ends up active.
    pub fn paste_clipboard(&mut self) -> Result<usize, StoreError> {
        if self.clipboard.is_empty() {
            return Ok(0);
        }
        self.freeze_active()?;
        let entries = self.clipboard.entries().to_vec();
        let mut anchor = self.selection.active();
        for text in entries {
            let id = self.splice_in(anchor, text)?;
            self.show_active(id);
            self.save_cell(id)?;
            anchor = Some(id);
        }
        if let Some(active) = self.selection.active() {
            self.select(active, true);
        }
        Ok(self.clipboard.len())
    }

    // ---- keyboard ----

    pub fn route_context(&self) -> RouteContext {
        let active = self.active_cell();
        let buffer = active.and_then(|cell| cell.edit.as_ref());
        RouteContext {
            mode: self.mode,
            has_active: active.is_some(),
            editing: buffer.is_some(),
            caret_at_start: buffer.is_some_and(|b| b.caret_at_start()),
            caret_at_end: buffer.is_some_and(|b| b.caret_at_end()),
            cell_empty: buffer.is_some_and(|b| b.is_empty()),
        }
    }

    /// Route a key and run whatever it maps to.
    pub fn handle_key(&mut self, event: &KeyEvent) -> KeydownResult {
        match keyboard::route(event, &self.route_context()) {
            Route::Action(action) => self.execute(action),
            Route::PassThrough => KeydownResult::PassThrough,
            Route::NotHandled => KeydownResult::NotHandled,
        }
    }

    /// [`handle_key`](Self::handle_key), then apply pass-through keys to
    /// the edit buffer. For hosts without a native text field.
    pub fn input(&mut self, event: &KeyEvent) -> KeydownResult {
        let result = self.handle_key(event);
        if result == KeydownResult::PassThrough {
            self.apply_default(event);
        }
        result
    }

    pub fn execute(&mut self, action: CellAction) -> KeydownResult {
        debug!(?action, "execute");
        let active = self.selection.active();
        match action {
            CellAction::ActivatePrev { extend } => return self.move_active(Direction::Up, extend),
            CellAction::ActivateNext { extend } => return self.move_active(Direction::Down, extend),
            CellAction::Unfreeze => {
                if let Some(id) = active {
                    report(self.unfreeze(id));
                }
            }
            CellAction::Freeze => {
                if let Some(id) = active {
                    report(self.freeze(id));
                }
            }
            CellAction::InsertBelow | CellAction::SplitBelow => {
                report(self.insert_cell(active, true));
            }
            CellAction::DeleteEmpty => report(self.delete_empty()),
            CellAction::Cut { copy } => report(self.cut_selection(copy)),
            CellAction::Copy => {
                self.copy_selection();
            }
            CellAction::Paste => {
                report(self.paste_clipboard());
            }
            CellAction::SaveDocument => self.save_document(),
            CellAction::SuppressDefault => {}
        }
        KeydownResult::Handled
    }

    // ---- flags ----

    fn set_mode(&mut self, mode: DocumentMode) {
        self.mode = mode;
        self.display.set_document_mode(mode);
    }

    fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
        self.display.set_modified(modified);
    }
}

fn report<T>(result: Result<T, StoreError>) {
    if let Err(e) = result {
        warn!(error = %e, "cell operation failed");
    }
}

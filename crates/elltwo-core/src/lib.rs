//! Cell document model and edit/sync state machine for the elltwo editor.
//!
//! A document is a doubly-linked list of text cells. The [`Session`] owns the
//! store together with selection, clipboard and edit-mode state, routes key
//! events, and emits protocol messages through a [`MessageSink`] so a remote
//! store can replay every change. Nothing here does I/O; hosts provide a
//! [`Display`] and a sink.

pub mod actions;
pub mod cell;
pub mod clipboard;
pub mod edit;
pub mod error;
pub mod keyboard;
pub mod platform;
pub mod protocol;
pub mod selection;
pub mod session;
pub mod store;
pub mod sync;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use actions::{CellAction, Key, KeyEvent, KeydownResult, Modifiers};
pub use cell::{Cell, CellId, SENTINEL};
pub use clipboard::Clipboard;
pub use edit::{DefaultEdit, DocumentMode, EditBuffer};
pub use error::{CoreError, ProtocolError, Result, StoreError};
pub use keyboard::{Route, RouteContext, route};
pub use platform::{Display, NullDisplay, PlainRenderer, Renderer};
pub use protocol::{CellRecord, ClientMessage, ExportFormat, LoadMode, ServerMessage};
pub use selection::{Direction, Selection};
pub use session::{CaretPlacement, Session};
pub use smol_str::SmolStr;
pub use store::CellStore;
pub use sync::{MessageSink, SyncClient};

//! Remote store for elltwo documents.
//!
//! Each WebSocket connection to `/elledit/<path>` gets its own in-memory copy
//! of `<root>/<path>`. Cell edits replay into that copy and `write` puts it
//! back on disk as markdown.

pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod server;

pub use config::ServerConfig;
pub use document::StoredDocument;
pub use error::{DocumentError, ExportError, Result, ServerError};
pub use server::{AppState, DocumentChannel, router, run};

pub use elltwo_core::telemetry::{self, TelemetryConfig};

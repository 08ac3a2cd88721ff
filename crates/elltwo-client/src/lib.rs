//! Terminal-hosted elltwo client.
//!
//! Wires an [`elltwo_core::Session`] to a WebSocket channel kept alive by the
//! [`ConnectionKeeper`], and shows the document on a text terminal.

pub mod config;
pub mod connection;
pub mod error;
pub mod input;
pub mod sink;
pub mod terminal;

pub use config::ClientConfig;
pub use connection::{ChannelEvent, ConnectionHandle, ConnectionKeeper, ConnectionState};
pub use error::{ClientError, ConfigError, InputError};
pub use input::{Command, parse_line};
pub use sink::ChannelSink;
pub use terminal::TerminalDisplay;

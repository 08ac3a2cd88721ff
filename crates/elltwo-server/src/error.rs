use std::path::PathBuf;

use elltwo_core::{CellId, ExportFormat};
use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the remote store
#[derive(Debug, Error, Diagnostic)]
pub enum ServerError {
    #[error("failed to bind to {addr}")]
    #[diagnostic(code(server::bind))]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server terminated unexpectedly")]
    #[diagnostic(code(server::serve))]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

/// Errors reading, editing or writing a stored document
#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    #[error("failed to read {}", path.display())]
    #[diagnostic(code(document::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}", path.display())]
    #[diagnostic(code(document::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no cell with id {0}")]
    #[diagnostic(code(document::unknown_cell))]
    UnknownCell(CellId),

    #[error("cell id {0} already exists")]
    #[diagnostic(code(document::duplicate))]
    Duplicate(CellId),

    #[error("document path {path:?} escapes the document root")]
    #[diagnostic(
        code(document::path),
        help("paths are relative to --path and may not contain `..`")
    )]
    Path { path: String },
}

/// Errors producing an export
#[derive(Debug, Error, Diagnostic)]
pub enum ExportError {
    #[error("failed to write export {}", path.display())]
    #[diagnostic(code(export::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} export needs an external toolchain", format.as_str())]
    #[diagnostic(code(export::unsupported))]
    Unsupported { format: ExportFormat },
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

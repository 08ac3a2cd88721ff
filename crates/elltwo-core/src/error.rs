//! Error types for the editing core.

use miette::Diagnostic;
use thiserror::Error;

use crate::cell::CellId;

/// Top-level error type for core operations.
#[derive(Debug, Error, Diagnostic)]
pub enum CoreError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Structural errors: an operation referenced a cell the store does not
/// hold, or the links handed to the store do not form a single chain.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum StoreError {
    #[error("anchor cell {0} does not exist")]
    #[diagnostic(code(store::invalid_anchor))]
    InvalidAnchor(CellId),

    #[error("cell {0} does not exist")]
    #[diagnostic(code(store::unknown_cell))]
    UnknownCell(CellId),

    #[error("duplicate cell id {0}")]
    #[diagnostic(code(store::duplicate))]
    Duplicate(CellId),

    #[error("cell {from} links to {to}, which does not link back")]
    #[diagnostic(code(store::broken_link))]
    BrokenLink { from: CellId, to: CellId },

    #[error("cell order contains a cycle through {0}")]
    #[diagnostic(code(store::cycle))]
    Cycle(CellId),

    #[error("{count} cell(s) unreachable from the head")]
    #[diagnostic(code(store::orphaned))]
    Orphaned { count: usize },

    #[error("no cell ids left to allocate")]
    #[diagnostic(code(store::ids_exhausted))]
    IdsExhausted,

    #[error("no cell without a predecessor")]
    #[diagnostic(code(store::no_head), help("exactly one cell must have prev = -1"))]
    NoHead,
}

/// Malformed inbound or outbound protocol messages.
#[derive(Debug, Error, Diagnostic)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    #[diagnostic(code(protocol::malformed))]
    Malformed(#[from] serde_json::Error),

    #[error("message is missing `{0}`")]
    #[diagnostic(code(protocol::missing_field))]
    MissingField(&'static str),

    #[error("unknown command {0:?}")]
    #[diagnostic(code(protocol::unknown_command))]
    UnknownCommand(String),
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;

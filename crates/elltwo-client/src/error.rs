use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the editing client
#[derive(Debug, Error, Diagnostic)]
pub enum ClientError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read or write the terminal")]
    #[diagnostic(code(client::io))]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid server url {url}: {message}")]
    #[diagnostic(code(config::url_parse))]
    UrlParse { url: String, message: String },

    #[error("server url must use ws:// or wss://, got {scheme}://")]
    #[diagnostic(code(config::scheme), help("try ws://127.0.0.1:8500"))]
    Scheme { scheme: String },
}

/// Key-script parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum InputError {
    #[error("unknown key {0:?}")]
    #[diagnostic(code(input::unknown_key))]
    UnknownKey(String),

    #[error("unknown modifier {0:?}")]
    #[diagnostic(code(input::unknown_modifier), help("modifiers are shift, ctrl, alt, cmd, mod"))]
    UnknownModifier(String),

    #[error("unknown export format {0:?}")]
    #[diagnostic(code(input::unknown_format), help("formats are md, mdplus, html, latex, pdf"))]
    UnknownFormat(String),

    #[error("{0:?} is not a cell id")]
    #[diagnostic(code(input::bad_cell_id))]
    BadCellId(String),

    #[error("`{0}` needs an argument")]
    #[diagnostic(code(input::missing_argument))]
    MissingArgument(&'static str),
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

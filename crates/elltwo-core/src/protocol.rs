//! Duplex channel protocol.
//!
//! Every message is a JSON object `{"cmd": ..., "content": ...}`. Links use
//! `-1` for "none". Commands without a payload carry `""` as content.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellId, link};
use crate::error::ProtocolError;

/// Content of a `create` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCell {
    pub newid: CellId,
    #[serde(with = "link")]
    pub prev: Option<CellId>,
    #[serde(with = "link")]
    pub next: Option<CellId>,
}

/// Content of a `delete` message. `prev`/`next` are the neighbors after the
/// cell was unlinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCell {
    pub cid: CellId,
    #[serde(with = "link")]
    pub prev: Option<CellId>,
    #[serde(with = "link")]
    pub next: Option<CellId>,
}

/// Content of a `save` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveCell {
    pub cid: CellId,
    pub body: String,
}

/// Target formats for `export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Md,
    Mdplus,
    Html,
    Latex,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Md => "md",
            ExportFormat::Mdplus => "mdplus",
            ExportFormat::Html => "html",
            ExportFormat::Latex => "latex",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// File extension of the exported document.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Md | ExportFormat::Mdplus => "md",
            ExportFormat::Html => "html",
            ExportFormat::Latex => "tex",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "md" => Some(Self::Md),
            "mdplus" => Some(Self::Mdplus),
            "html" => Some(Self::Html),
            "latex" => Some(Self::Latex),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Content of an `export` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<Vec<String>>,
}

/// Messages sent from the editing client to the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Create(CreateCell),
    Delete(DeleteCell),
    Save(SaveCell),
    /// Persist the whole document.
    Write,
    /// Discard unsaved remote state and reload.
    Revert,
    /// Request a full load.
    Fetch,
    Export(ExportRequest),
}

impl ClientMessage {
    pub fn cmd(&self) -> &'static str {
        match self {
            ClientMessage::Create(_) => "create",
            ClientMessage::Delete(_) => "delete",
            ClientMessage::Save(_) => "save",
            ClientMessage::Write => "write",
            ClientMessage::Revert => "revert",
            ClientMessage::Fetch => "fetch",
            ClientMessage::Export(_) => "export",
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        let cmd = self.cmd();
        Ok(match self {
            ClientMessage::Create(content) => envelope(cmd, content)?,
            ClientMessage::Delete(content) => envelope(cmd, content)?,
            ClientMessage::Save(content) => envelope(cmd, content)?,
            ClientMessage::Export(content) => envelope(cmd, content)?,
            ClientMessage::Write | ClientMessage::Revert | ClientMessage::Fetch => envelope(cmd, "")?,
        })
    }

    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let (cmd, content) = split_envelope(raw)?;
        Ok(match cmd.as_str() {
            "create" => ClientMessage::Create(content_as(content)?),
            "delete" => ClientMessage::Delete(content_as(content)?),
            "save" => ClientMessage::Save(content_as(content)?),
            "write" => ClientMessage::Write,
            "revert" => ClientMessage::Revert,
            "fetch" => ClientMessage::Fetch,
            "export" => ClientMessage::Export(content_as(content)?),
            _ => return Err(ProtocolError::UnknownCommand(cmd)),
        })
    }
}

/// One cell as delivered by a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    pub cid: CellId,
    #[serde(alias = "text")]
    pub body: String,
    #[serde(with = "link")]
    pub prev: Option<CellId>,
    #[serde(with = "link")]
    pub next: Option<CellId>,
}

impl From<CellRecord> for Cell {
    fn from(record: CellRecord) -> Self {
        Cell::linked(record.cid, record.prev, record.next, record.body)
    }
}

impl From<&Cell> for CellRecord {
    fn from(cell: &Cell) -> Self {
        Self {
            cid: cell.id,
            body: cell.text.clone(),
            prev: cell.prev,
            next: cell.next,
        }
    }
}

/// Which document mode a load puts the client in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadMode {
    /// `fetch`: editable.
    Full,
    /// `readonly`: locked.
    ReadOnly,
}

/// Messages sent from the remote store to the editing client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Full document load. Records may arrive in any order.
    Load { mode: LoadMode, cells: Vec<CellRecord> },
    /// Navigate to a served location, relative to the export root.
    Serve(String),
}

impl ServerMessage {
    pub fn cmd(&self) -> &'static str {
        match self {
            ServerMessage::Load {
                mode: LoadMode::Full,
                ..
            } => "fetch",
            ServerMessage::Load {
                mode: LoadMode::ReadOnly,
                ..
            } => "readonly",
            ServerMessage::Serve(_) => "serve",
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        let cmd = self.cmd();
        match self {
            ServerMessage::Load { cells, .. } => envelope(cmd, cells),
            ServerMessage::Serve(location) => envelope(cmd, location),
        }
    }

    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let (cmd, content) = split_envelope(raw)?;
        Ok(match cmd.as_str() {
            "fetch" => ServerMessage::Load {
                mode: LoadMode::Full,
                cells: content_as(content)?,
            },
            "readonly" => ServerMessage::Load {
                mode: LoadMode::ReadOnly,
                cells: content_as(content)?,
            },
            "serve" => ServerMessage::Serve(content_as(content)?),
            _ => return Err(ProtocolError::UnknownCommand(cmd)),
        })
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize + ?Sized> {
    cmd: &'a str,
    content: &'a T,
}

#[derive(Deserialize)]
struct RawEnvelope {
    cmd: Option<String>,
    content: Option<serde_json::Value>,
}

fn envelope<T: Serialize + ?Sized>(cmd: &str, content: &T) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(&Envelope { cmd, content })?)
}

fn split_envelope(raw: &str) -> Result<(String, serde_json::Value), ProtocolError> {
    let envelope: RawEnvelope = serde_json::from_str(raw)?;
    let cmd = envelope.cmd.ok_or(ProtocolError::MissingField("cmd"))?;
    let content = envelope.content.ok_or(ProtocolError::MissingField("content"))?;
    Ok((cmd, content))
}

fn content_as<T: DeserializeOwned>(content: serde_json::Value) -> Result<T, ProtocolError> {
    Ok(serde_json::from_value(content)?)
}

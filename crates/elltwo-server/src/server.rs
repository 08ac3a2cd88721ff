use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use elltwo_core::{ClientMessage, LoadMode, ServerMessage};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::document::StoredDocument;
use crate::error::{DocumentError, ExportError, Result, ServerError};
use crate::export::write_export;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Build the router: one WebSocket edit channel per document.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/elledit/{*path}", get(elledit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until it fails.
pub async fn run(config: ServerConfig) -> Result<()> {
    let addr = config.addr();
    let app = router(AppState::new(config));

    info!("Starting elltwo server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind { addr, source: e })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Serve { source: e })?;

    Ok(())
}

async fn elledit(
    ws: WebSocketUpgrade,
    Path(path): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let full_path = match state.config.document_path(&path) {
        Ok(full_path) => full_path,
        Err(e) => {
            warn!(error = %e, "rejecting edit channel");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };
    ws.on_upgrade(move |socket| serve_channel(socket, state.config, full_path))
}

async fn serve_channel(mut socket: WebSocket, config: Arc<ServerConfig>, path: PathBuf) {
    let mut channel = match DocumentChannel::open(config, path).await {
        Ok(channel) => channel,
        Err(e) => {
            error!(error = %e, "failed to open document");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    info!(
        path = %channel.document().path().display(),
        cells = channel.document().len(),
        "connection received"
    );

    while let Some(frame) = socket.recv().await {
        let raw = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(error = %e, "socket error");
                break;
            }
        };

        let Some(reply) = channel.handle_frame(raw.as_str()).await else {
            continue;
        };
        let json = match reply.encode() {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, cmd = reply.cmd(), "failed to encode reply");
                continue;
            }
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }

    info!(path = %channel.document().path().display(), "connection closing");
}

/// Server side of one edit channel: the document it serves and how to
/// answer each client command.
#[derive(Debug)]
pub struct DocumentChannel {
    config: Arc<ServerConfig>,
    document: StoredDocument,
}

impl DocumentChannel {
    pub async fn open(config: Arc<ServerConfig>, path: PathBuf) -> Result<Self, DocumentError> {
        let document = StoredDocument::open(path).await?;
        Ok(Self { config, document })
    }

    pub fn document(&self) -> &StoredDocument {
        &self.document
    }

    /// Decode and handle one text frame. Undecodable frames are dropped.
    pub async fn handle_frame(&mut self, raw: &str) -> Option<ServerMessage> {
        match ClientMessage::decode(raw) {
            Ok(message) => self.handle(message).await,
            Err(e) => {
                warn!(error = %e, "dropping malformed frame");
                None
            }
        }
    }

    /// Apply one command, returning the reply to send, if any.
    pub async fn handle(&mut self, message: ClientMessage) -> Option<ServerMessage> {
        let cmd = message.cmd();
        debug!(cmd, "received");

        match message {
            ClientMessage::Fetch => Some(self.load()),
            ClientMessage::Revert => match self.document.reload().await {
                Ok(()) => Some(self.load()),
                Err(e) => {
                    error!(error = %e, "revert failed");
                    None
                }
            },
            ClientMessage::Export(request) => {
                match write_export(&self.config.export_dir, self.document.path(), &request).await {
                    Ok(location) => Some(ServerMessage::Serve(location)),
                    Err(ExportError::Unsupported { format }) => {
                        warn!(format = format.as_str(), "export format not supported");
                        None
                    }
                    Err(e) => {
                        error!(error = %e, "export failed");
                        None
                    }
                }
            }
            _ if self.config.readonly => {
                warn!(cmd, "ignoring change to a readonly document");
                None
            }
            ClientMessage::Create(create) => {
                report(cmd, self.document.create(&create));
                None
            }
            ClientMessage::Delete(delete) => {
                report(cmd, self.document.delete(&delete));
                None
            }
            ClientMessage::Save(save) => {
                report(cmd, self.document.save(&save));
                None
            }
            ClientMessage::Write => {
                if let Err(e) = self.document.write().await {
                    error!(error = %e, "write failed");
                }
                None
            }
        }
    }

    fn load(&self) -> ServerMessage {
        let mode = if self.config.readonly {
            LoadMode::ReadOnly
        } else {
            LoadMode::Full
        };
        ServerMessage::Load {
            mode,
            cells: self.document.records(),
        }
    }
}

fn report(cmd: &str, result: Result<(), DocumentError>) {
    if let Err(e) = result {
        warn!(cmd, error = %e, "ignoring command");
    }
}

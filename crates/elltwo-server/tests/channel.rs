use std::path::Path;
use std::sync::Arc;

use elltwo_core::protocol::{CreateCell, ExportRequest, SaveCell};
use elltwo_core::{CellId, ClientMessage, ExportFormat, LoadMode, ServerMessage};
use elltwo_server::{AppState, DocumentChannel, ServerConfig, router};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

fn config(root: &Path) -> ServerConfig {
    ServerConfig::default()
        .with_root(root)
        .with_export_dir(root.join("export"))
}

async fn channel(config: ServerConfig, name: &str) -> DocumentChannel {
    let path = config.document_path(name).unwrap();
    DocumentChannel::open(Arc::new(config), path).await.unwrap()
}

fn bodies(reply: Option<ServerMessage>) -> (LoadMode, Vec<String>) {
    match reply {
        Some(ServerMessage::Load { mode, cells }) => {
            (mode, cells.into_iter().map(|cell| cell.body).collect())
        }
        other => panic!("expected a load, got {other:?}"),
    }
}

#[tokio::test]
async fn edits_replay_and_write_back() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("doc.md"), "# Title\n\nBody.").unwrap();
    let mut channel = channel(config(dir.path()), "doc.md").await;

    let (mode, cells) = bodies(channel.handle(ClientMessage::Fetch).await);
    assert_eq!(mode, LoadMode::Full);
    assert_eq!(cells, ["# Title", "Body."]);

    let create = ClientMessage::Create(CreateCell {
        newid: CellId(2),
        prev: Some(CellId(0)),
        next: Some(CellId(1)),
    });
    let save = ClientMessage::Save(SaveCell {
        cid: CellId(2),
        body: "Inserted.".into(),
    });
    assert_eq!(channel.handle(create).await, None);
    assert_eq!(channel.handle(save).await, None);
    assert_eq!(channel.handle(ClientMessage::Write).await, None);

    assert_eq!(
        std::fs::read_to_string(dir.path().join("doc.md")).unwrap(),
        "# Title\n\nInserted.\n\nBody."
    );
}

#[tokio::test]
async fn string_ids_from_browsers_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let mut channel = channel(config(dir.path()), "new.md").await;

    let reply = channel
        .handle_frame(r#"{"cmd": "save", "content": {"cid": "1", "body": "typed"}}"#)
        .await;
    assert_eq!(reply, None);
    assert_eq!(channel.document().body(CellId(1)), Some("typed"));
}

#[tokio::test]
async fn revert_discards_unwritten_changes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("doc.md"), "one\n\ntwo").unwrap();
    let mut channel = channel(config(dir.path()), "doc.md").await;

    channel
        .handle(ClientMessage::Save(SaveCell {
            cid: CellId(0),
            body: "edited".into(),
        }))
        .await;
    let (_, cells) = bodies(channel.handle(ClientMessage::Revert).await);
    assert_eq!(cells, ["one", "two"]);
}

#[tokio::test]
async fn readonly_serves_locked_and_ignores_edits() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("doc.md"), "fixed").unwrap();
    let mut channel = channel(config(dir.path()).with_readonly(true), "doc.md").await;

    channel
        .handle(ClientMessage::Save(SaveCell {
            cid: CellId(0),
            body: "changed".into(),
        }))
        .await;
    channel.handle(ClientMessage::Write).await;

    let (mode, cells) = bodies(channel.handle(ClientMessage::Fetch).await);
    assert_eq!(mode, LoadMode::ReadOnly);
    assert_eq!(cells, ["fixed"]);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("doc.md")).unwrap(),
        "fixed"
    );
}

#[tokio::test]
async fn export_writes_and_serves_location() {
    let dir = tempfile::tempdir().unwrap();
    let mut channel = channel(config(dir.path()), "paper.md").await;

    let export = |format| {
        ClientMessage::Export(ExportRequest {
            format,
            data: "<p>hi</p>".into(),
            deps: None,
        })
    };

    let reply = channel.handle(export(ExportFormat::Html)).await;
    assert_eq!(reply, Some(ServerMessage::Serve("paper.html".into())));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("export/paper.html")).unwrap(),
        "<p>hi</p>"
    );

    assert_eq!(channel.handle(export(ExportFormat::Pdf)).await, None);
}

#[tokio::test]
async fn malformed_frames_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let mut channel = channel(config(dir.path()), "doc.md").await;
    let before = channel.document().records();

    assert_eq!(channel.handle_frame("not json").await, None);
    assert_eq!(channel.handle_frame(r#"{"cmd": "launch", "content": ""}"#).await, None);
    assert_eq!(channel.handle_frame(r#"{"content": ""}"#).await, None);
    assert_eq!(channel.document().records(), before);
}

#[tokio::test]
async fn websocket_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("doc.md"), "alpha\n\nbeta").unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AppState::new(config(dir.path())));
    tokio::spawn(async move { axum::serve(listener, app).await });

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/elledit/doc.md"))
        .await
        .unwrap();
    let fetch = ClientMessage::Fetch.encode().unwrap();
    ws.send(Message::text(fetch)).await.unwrap();

    let reply = loop {
        match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => break text.to_string(),
            _ => continue,
        }
    };
    let (mode, cells) = bodies(ServerMessage::decode(&reply).ok());
    assert_eq!(mode, LoadMode::Full);
    assert_eq!(cells, ["alpha", "beta"]);
}

#[tokio::test]
async fn escaping_paths_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AppState::new(config(dir.path())));
    tokio::spawn(async move { axum::serve(listener, app).await });

    let result =
        tokio_tungstenite::connect_async(format!("ws://{addr}/elledit/a/%2E%2E/%2E%2E/secret.md"))
            .await;
    assert!(result.is_err());
}

//! Connection keeper: owns the duplex channel to the remote store and
//! reconnects on a fixed liveness interval.

use std::time::Duration;

use elltwo_core::ClientMessage;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::config::ClientConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Channel lifecycle and inbound traffic, delivered to the session's event
/// loop in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Frame(String),
    Closed,
}

/// The session's side of a running keeper.
pub struct ConnectionHandle {
    pub outbound: mpsc::Sender<ClientMessage>,
    pub events: mpsc::Receiver<ChannelEvent>,
    pub state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

impl ConnectionHandle {
    /// Stop the keeper after everything already queued on `outbound` has
    /// been written and the channel closed. Waits for every other clone of
    /// `outbound` to be dropped.
    pub async fn shutdown(self) {
        let Self {
            outbound,
            events,
            state: _,
            task,
        } = self;
        drop(outbound);
        if let Err(e) = task.await {
            warn!(error = %e, "connection keeper failed");
        }
        drop(events);
    }
}

pub struct ConnectionKeeper {
    endpoint: Url,
    interval: Duration,
}

impl ConnectionKeeper {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            endpoint: config.endpoint(),
            interval: config.reconnect_interval,
        }
    }

    /// Start the keeper on the current runtime.
    pub fn spawn(self) -> ConnectionHandle {
        let (outbound_tx, outbound_rx) = mpsc::channel(1024);
        let (event_tx, event_rx) = mpsc::channel(1024);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let task = tokio::spawn(async move {
            self.run(state_tx, outbound_rx, event_tx).await;
        });

        ConnectionHandle {
            outbound: outbound_tx,
            events: event_rx,
            state: state_rx,
            task,
        }
    }

    async fn run(
        self,
        state_tx: watch::Sender<ConnectionState>,
        mut outbound_rx: mpsc::Receiver<ClientMessage>,
        event_tx: mpsc::Sender<ChannelEvent>,
    ) {
        let mut liveness = tokio::time::interval(self.interval);
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        liveness.tick().await;

        loop {
            state_tx.send_replace(ConnectionState::Connecting);
            info!(url = %self.endpoint, "connecting");

            match connect_async(self.endpoint.as_str()).await {
                Ok((ws_stream, _response)) => {
                    // Anything queued for the previous channel is stale.
                    let mut stale = 0usize;
                    while outbound_rx.try_recv().is_ok() {
                        stale += 1;
                    }
                    if stale > 0 {
                        warn!(count = stale, "dropping messages queued before reconnect");
                    }

                    state_tx.send_replace(ConnectionState::Connected);
                    info!("connected");
                    if event_tx.send(ChannelEvent::Opened).await.is_err() {
                        return;
                    }

                    let outcome = pump(ws_stream, &mut outbound_rx, &event_tx, &mut liveness).await;
                    state_tx.send_replace(ConnectionState::Disconnected);

                    match outcome {
                        PumpResult::Closed => info!("connection closed"),
                        PumpResult::Error(e) => warn!(error = %e, "connection error"),
                        PumpResult::SessionGone => {
                            debug!("session ended, stopping keeper");
                            return;
                        }
                    }
                    if event_tx.send(ChannelEvent::Closed).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    state_tx.send_replace(ConnectionState::Disconnected);
                    warn!(error = %e, "failed to connect");
                }
            }

            // Liveness check: the channel is closed, so reconnect on the next tick.
            liveness.tick().await;
            if event_tx.is_closed() || outbound_rx.is_closed() {
                debug!("session ended, stopping keeper");
                return;
            }
        }
    }
}

enum PumpResult {
    Closed,
    Error(String),
    SessionGone,
}

async fn pump(
    ws_stream: WsStream,
    outbound_rx: &mut mpsc::Receiver<ClientMessage>,
    event_tx: &mpsc::Sender<ChannelEvent>,
    liveness: &mut Interval,
) -> PumpResult {
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    trace!(bytes = text.len(), "frame received");
                    if event_tx.send(ChannelEvent::Frame(text.as_str().to_owned())).await.is_err() {
                        return PumpResult::SessionGone;
                    }
                }
                Some(Ok(Message::Close(_))) | None => return PumpResult::Closed,
                Some(Ok(_)) => {
                    // Pings are answered by tungstenite; binary frames are not part of the protocol.
                }
                Some(Err(e)) => return PumpResult::Error(e.to_string()),
            },
            message = outbound_rx.recv() => match message {
                Some(message) => match message.encode() {
                    Ok(json) => {
                        if let Err(e) = write.send(Message::Text(json.into())).await {
                            return PumpResult::Error(e.to_string());
                        }
                    }
                    Err(e) => warn!(error = %e, cmd = message.cmd(), "failed to encode message"),
                },
                None => {
                    let _ = write.close().await;
                    return PumpResult::SessionGone;
                }
            },
            _ = liveness.tick() => trace!("liveness check: open"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    fn config_for(addr: std::net::SocketAddr) -> ClientConfig {
        let server = ClientConfig::parse_server(&format!("ws://{addr}")).unwrap();
        ClientConfig::new(server, "doc.md").with_reconnect_interval(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn relays_frames_and_reconnects_after_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            // First connection: read one message, answer, then hang up.
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let first = loop {
                match ws.next().await.unwrap().unwrap() {
                    Message::Text(text) => break text.as_str().to_owned(),
                    _ => continue,
                }
            };
            ws.send(Message::text(r#"{"cmd":"serve","content":"doc.html"}"#.to_string()))
                .await
                .unwrap();
            let _ = ws.close(None).await;

            // Second connection proves the keeper came back.
            let (stream, _) = listener.accept().await.unwrap();
            let _ws = accept_async(stream).await.unwrap();
            first
        });

        let mut handle = ConnectionKeeper::new(&config_for(addr)).spawn();
        assert_eq!(handle.events.recv().await, Some(ChannelEvent::Opened));
        assert_eq!(*handle.state.borrow(), ConnectionState::Connected);

        handle.outbound.send(ClientMessage::Fetch).await.unwrap();
        assert_eq!(
            handle.events.recv().await,
            Some(ChannelEvent::Frame(r#"{"cmd":"serve","content":"doc.html"}"#.into()))
        );
        assert_eq!(handle.events.recv().await, Some(ChannelEvent::Closed));
        assert_eq!(handle.events.recv().await, Some(ChannelEvent::Opened));

        assert_eq!(server.await.unwrap(), r#"{"cmd":"fetch","content":""}"#);
    }

    #[tokio::test]
    async fn flushes_queued_messages_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let mut received = Vec::new();
            while let Some(Ok(message)) = ws.next().await {
                match message {
                    Message::Text(text) => received.push(text.as_str().to_owned()),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            received
        });

        let mut handle = ConnectionKeeper::new(&config_for(addr)).spawn();
        assert_eq!(handle.events.recv().await, Some(ChannelEvent::Opened));

        // A second sender, like the one a session's sink holds.
        let sink = handle.outbound.clone();
        sink.send(ClientMessage::Write).await.unwrap();
        handle.outbound.send(ClientMessage::Fetch).await.unwrap();
        drop(sink);
        handle.shutdown().await;

        assert_eq!(
            server.await.unwrap(),
            [r#"{"cmd":"write","content":""}"#, r#"{"cmd":"fetch","content":""}"#]
        );
    }

    #[tokio::test]
    async fn keeps_retrying_while_server_is_down() {
        // Reserve a port, then release it so the first attempts are refused.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut handle = ConnectionKeeper::new(&config_for(addr)).spawn();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_ne!(*handle.state.borrow(), ConnectionState::Connected);

        let listener = TcpListener::bind(addr).await.unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            while ws.next().await.is_some() {}
        });
        assert_eq!(handle.events.recv().await, Some(ChannelEvent::Opened));
    }
}

use elltwo_core::{ClientMessage, MessageSink};
use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::connection::ConnectionState;

/// Hands session messages to the connection keeper.
///
/// There is no outbound queue: a message sent while the channel is down is
/// logged and lost. The next full load re-synchronizes.
pub struct ChannelSink {
    tx: mpsc::Sender<ClientMessage>,
    state: watch::Receiver<ConnectionState>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ClientMessage>, state: watch::Receiver<ConnectionState>) -> Self {
        Self { tx, state }
    }
}

impl MessageSink for ChannelSink {
    fn send(&mut self, message: ClientMessage) {
        let state = *self.state.borrow();
        if state != ConnectionState::Connected {
            warn!(cmd = message.cmd(), ?state, "not connected, dropping message");
            return;
        }
        if let Err(e) = self.tx.try_send(message) {
            let message = match &e {
                mpsc::error::TrySendError::Full(m) | mpsc::error::TrySendError::Closed(m) => m,
            };
            warn!(cmd = message.cmd(), error = %e, "channel unavailable, dropping message");
        }
    }
}

//! Sync client: turns local mutations into outbound protocol messages.
//!
//! Sends are fire-and-forget. Nothing is acknowledged, queued, or retried;
//! a later full load is the only repair path.

use tracing::debug;

use crate::cell::CellId;
use crate::protocol::{ClientMessage, CreateCell, DeleteCell, ExportFormat, ExportRequest, SaveCell};

/// Outbound half of the duplex channel.
pub trait MessageSink {
    /// Hand a message to the channel. Delivery is best effort.
    fn send(&mut self, message: ClientMessage);
}

impl MessageSink for Vec<ClientMessage> {
    fn send(&mut self, message: ClientMessage) {
        self.push(message);
    }
}

impl<S: MessageSink + ?Sized> MessageSink for &mut S {
    fn send(&mut self, message: ClientMessage) {
        (**self).send(message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncClient<S> {
    sink: S,
}

impl<S: MessageSink> SyncClient<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn emit(&mut self, message: ClientMessage) {
        debug!(cmd = message.cmd(), "sending");
        self.sink.send(message);
    }

    /// A cell was spliced in between `prev` and `next`.
    pub fn created(&mut self, newid: CellId, prev: Option<CellId>, next: Option<CellId>) {
        self.emit(ClientMessage::Create(CreateCell { newid, prev, next }));
    }

    /// A cell was unlinked. `prev`/`next` are its neighbors after the splice.
    pub fn deleted(&mut self, cid: CellId, prev: Option<CellId>, next: Option<CellId>) {
        self.emit(ClientMessage::Delete(DeleteCell { cid, prev, next }));
    }

    pub fn saved(&mut self, cid: CellId, body: impl Into<String>) {
        self.emit(ClientMessage::Save(SaveCell {
            cid,
            body: body.into(),
        }));
    }

    pub fn write(&mut self) {
        self.emit(ClientMessage::Write);
    }

    pub fn revert(&mut self) {
        self.emit(ClientMessage::Revert);
    }

    pub fn fetch(&mut self) {
        self.emit(ClientMessage::Fetch);
    }

    pub fn export(&mut self, format: ExportFormat, data: String, deps: Option<Vec<String>>) {
        self.emit(ClientMessage::Export(ExportRequest { format, data, deps }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_reach_the_sink_in_order() {
        let mut sync = SyncClient::new(Vec::new());
        sync.created(CellId(3), Some(CellId(1)), Some(CellId(2)));
        sync.saved(CellId(3), "body");
        sync.write();

        let cmds: Vec<_> = sync.sink().iter().map(|m| m.cmd()).collect();
        assert_eq!(cmds, ["create", "save", "write"]);
    }
}

use std::net::SocketAddr;

use serde_json::Value;

use crate::{
    common::{ConnectionId, Result},
    protocol::events::OutgoingEvent,
};

/// What the session core needs from a transport connection.
pub trait Connection: Send + Sync {
    fn id(&self) -> &ConnectionId;

    /// Peer address, when the transport knows it.
    fn remote(&self) -> Option<SocketAddr> {
        None
    }

    /// Emits a named event with a JSON payload. Must not block.
    fn emit(&self, event: &str, payload: Value) -> Result<()>;

    fn send(&self, event: &OutgoingEvent) -> Result<()> {
        self.emit(event.name(), event.payload())
    }
}

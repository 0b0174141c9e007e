use std::net::SocketAddr;

use axum::extract::ws::Message;
use serde_json::Value;

use crate::{
    common::{ConnectionId, FlixyError, Result},
    protocol::{Connection, Envelope},
};

/// A websocket client. Emitted events are queued on `sender` and written
/// to the socket by the connection's own task.
pub struct WsConnection {
    id: ConnectionId,
    remote: Option<SocketAddr>,
    sender: flume::Sender<Message>,
}

impl WsConnection {
    pub fn new(remote: Option<SocketAddr>, sender: flume::Sender<Message>) -> Self {
        Self {
            id: ConnectionId::generate(),
            remote,
            sender,
        }
    }
}

impl Connection for WsConnection {
    fn id(&self) -> &ConnectionId {
        &self.id
    }

    fn remote(&self) -> Option<SocketAddr> {
        self.remote
    }

    fn emit(&self, event: &str, payload: Value) -> Result<()> {
        let envelope = Envelope {
            event: event.to_string(),
            data: payload,
        };
        let json = serde_json::to_string(&envelope).map_err(|source| FlixyError::Decode {
            event: event.to_string(),
            source,
        })?;

        self.sender
            .send(Message::Text(json.into()))
            .map_err(|_| FlixyError::ConnectionClosed(self.id.clone()))
    }
}

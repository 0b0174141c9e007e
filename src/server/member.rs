use std::sync::Arc;

use crate::{
    common::{ConnectionId, Result, SessionId},
    protocol::{Connection, OutgoingEvent, WireMember, WireSession},
};

/// A participant of a session.
///
/// Owned by its [`Session`](super::Session); the session id is only a key
/// back into the registry.
#[derive(Clone)]
pub struct Member {
    connection: Arc<dyn Connection>,
    nickname: String,
    session_id: SessionId,
}

impl Member {
    pub fn new(connection: Arc<dyn Connection>, nickname: String, session_id: SessionId) -> Self {
        Self {
            connection,
            nickname,
            session_id,
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        self.connection.id()
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn send(&self, event: &OutgoingEvent) -> Result<()> {
        self.connection.send(event)
    }

    /// Tells this member where its session is.
    pub fn sync(&self, wire: &WireSession) -> Result<()> {
        self.send(&OutgoingEvent::Sync(wire.clone()))
    }

    pub fn to_wire_member(&self) -> WireMember {
        WireMember {
            nick: self.nickname.clone(),
        }
    }
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Member")
            .field("connection_id", self.connection_id())
            .field("nickname", &self.nickname)
            .field("session_id", &self.session_id)
            .finish()
    }
}

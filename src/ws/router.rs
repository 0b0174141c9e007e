use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    common::{ConnectionId, FlixyError, Result, SessionId},
    protocol::{
        Connection, IncomingMessage, JoinMessage, NewMessage, OutgoingEvent, SeekMessage,
        SessionMessage, messages,
    },
    server::{Session, SessionRegistry},
};

/// Turns inbound client events into session operations.
pub struct EventRouter {
    registry: Arc<SessionRegistry>,
}

impl EventRouter {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Handles one named event from `conn`. Failures are reported back to
    /// `conn` only and never mutate any session.
    pub fn dispatch(&self, conn: &Arc<dyn Connection>, event: &str, data: Value) {
        let message = match IncomingMessage::decode(event, &data) {
            Ok(message) => message,
            Err(e) => {
                self.reject(conn, event, e, data);
                return;
            }
        };

        let verb = message.event();
        if let Err(e) = self.handle(conn, message) {
            self.reject(conn, verb, e, data);
        }
    }

    /// Cleans up after a closed connection.
    pub fn disconnect(&self, connection_id: &ConnectionId) {
        match self.leave_current(connection_id) {
            Ok(session_id) => {
                info!(
                    connection = %connection_id,
                    session = %session_id,
                    "member disconnected"
                );
            }
            Err(_) => {
                warn!(
                    connection = %connection_id,
                    "disconnect from a connection that never joined a session"
                );
            }
        }
    }

    fn handle(&self, conn: &Arc<dyn Connection>, message: IncomingMessage) -> Result<()> {
        match message {
            IncomingMessage::New(m) => self.new_session(conn, m),
            IncomingMessage::Join(m) => self.join(conn, m),
            IncomingMessage::GetSync(m) => self.get_sync(conn, m),
            IncomingMessage::Play(m) => {
                let session = self.resolve(&m.session_id)?;
                session.play();
                debug!(verb = messages::PLAY, connection = %conn.id(), session = %session.id(), "playing");
                Ok(())
            }
            IncomingMessage::Pause(m) => {
                let session = self.resolve(&m.session_id)?;
                session.pause();
                debug!(verb = messages::PAUSE, connection = %conn.id(), session = %session.id(), "pausing");
                Ok(())
            }
            IncomingMessage::Seek(m) => self.seek(conn, m),
            IncomingMessage::Leave => {
                let session_id = self.leave_current(conn.id())?;
                debug!(verb = messages::LEAVE, connection = %conn.id(), session = %session_id, "left session");
                Ok(())
            }
        }
    }

    fn new_session(&self, conn: &Arc<dyn Connection>, m: NewMessage) -> Result<()> {
        self.leave_previous(conn.id());

        let session = self.registry.create(m.video_id, m.time);
        self.enter(conn, &session, &m.nick)?;

        if let Err(e) = conn.send(&OutgoingEvent::NewSession(session.wire_session())) {
            debug!("new session delivery failed: connection={} err={}", conn.id(), e);
        }

        info!(
            verb = messages::NEW,
            connection = %conn.id(),
            remote = ?conn.remote(),
            session = %session.id(),
            video_id = m.video_id,
            "new session created"
        );
        Ok(())
    }

    fn join(&self, conn: &Arc<dyn Connection>, m: JoinMessage) -> Result<()> {
        let session = self.resolve(&m.session_id)?;

        if self.registry.member_session(conn.id()).as_ref() != Some(session.id()) {
            self.leave_previous(conn.id());
        }
        self.enter(conn, &session, &m.nick)?;

        debug!(
            verb = messages::JOIN,
            connection = %conn.id(),
            remote = ?conn.remote(),
            session = %session.id(),
            "joined session"
        );
        Ok(())
    }

    fn get_sync(&self, conn: &Arc<dyn Connection>, m: SessionMessage) -> Result<()> {
        let session = self.resolve(&m.session_id)?;
        debug!(verb = messages::GET_SYNC, connection = %conn.id(), session = %session.id(), "getting sync state");
        conn.send(&OutgoingEvent::Sync(session.wire_session()))
    }

    fn seek(&self, conn: &Arc<dyn Connection>, m: SeekMessage) -> Result<()> {
        let session = self.resolve(&m.session_id)?;
        let ts = m.time.unwrap_or_default();
        session.set_time(ts);
        debug!(verb = messages::SEEK, connection = %conn.id(), session = %session.id(), time = ts, "setting time");
        Ok(())
    }

    fn resolve(&self, session_id: &str) -> Result<Arc<Session>> {
        self.registry.get(&SessionId::from(session_id))
    }

    fn enter(&self, conn: &Arc<dyn Connection>, session: &Arc<Session>, nick: &str) -> Result<()> {
        session.add_member(conn.clone(), nick)?;
        self.registry
            .bind_member(conn.id().clone(), session.id().clone());
        Ok(())
    }

    /// Removes the connection from its current session, destroying the
    /// session if it is left empty.
    fn leave_current(&self, connection_id: &ConnectionId) -> Result<SessionId> {
        let unbound = self.registry.unbind_member(connection_id)?;
        if unbound.emptied() {
            self.registry.destroy_if_empty(&unbound.session_id);
        }
        Ok(unbound.session_id)
    }

    /// Leaves whatever session the connection is in before it moves to
    /// another one. Not being in a session is the common case.
    fn leave_previous(&self, connection_id: &ConnectionId) {
        match self.leave_current(connection_id) {
            Ok(session_id) => {
                debug!(connection = %connection_id, session = %session_id, "left previous session");
            }
            Err(FlixyError::MemberNotFound(_)) => {}
            Err(e) => {
                debug!(connection = %connection_id, "leaving previous session failed: {}", e);
            }
        }
    }

    fn reject(&self, conn: &Arc<dyn Connection>, verb: &str, err: FlixyError, data: Value) {
        let reply = match &err {
            FlixyError::Decode { .. } | FlixyError::UnknownEvent(_) => {
                error!(verb, connection = %conn.id(), remote = ?conn.remote(), "{}", err);
                OutgoingEvent::InvalidData(data)
            }
            FlixyError::InvalidData { .. } if verb == messages::NEW => {
                warn!(verb, connection = %conn.id(), "{}", err);
                OutgoingEvent::InvalidNewData(data)
            }
            FlixyError::InvalidData { .. } => {
                warn!(verb, connection = %conn.id(), "{}", err);
                OutgoingEvent::InvalidData(data)
            }
            FlixyError::SessionNotFound(sid) | FlixyError::SessionClosed(sid) => {
                warn!(verb, connection = %conn.id(), invalid_sid = %sid, "invalid session id");
                OutgoingEvent::InvalidSessionId(sid.to_string())
            }
            FlixyError::MemberNotFound(_) => {
                warn!(verb, connection = %conn.id(), "member does not exist");
                OutgoingEvent::MemberNotFound
            }
            _ => {
                debug!(verb, connection = %conn.id(), "reply failed: {}", err);
                return;
            }
        };

        if let Err(e) = conn.send(&reply) {
            debug!("error reply delivery failed: connection={} err={}", conn.id(), e);
        }
    }
}

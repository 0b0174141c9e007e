use std::{collections::BTreeMap, sync::Arc};

use dashmap::DashMap;
use tracing::{info, warn};

use crate::{
    common::{ConnectionId, FlixyError, Result, SessionId},
    configs::SessionConfig,
    protocol::WireSession,
    server::{member::Member, session::Session},
};

/// Outcome of unbinding a connection from its session.
#[derive(Debug)]
pub struct Unbound {
    pub session_id: SessionId,
    /// The member removed from the session, if the session still had it.
    pub member: Option<Member>,
    /// Members left in the session afterwards.
    pub remaining: usize,
}

impl Unbound {
    pub fn emptied(&self) -> bool {
        self.remaining == 0
    }
}

/// Every live session, plus which session each connection belongs to.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<Session>>,
    members: DashMap<ConnectionId, SessionId>,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            members: DashMap::new(),
            config,
        }
    }

    /// Creates a paused session under a freshly generated id.
    pub fn create(&self, video_id: u64, initial_time: u64) -> Arc<Session> {
        let session = Session::new(SessionId::generate(), video_id, initial_time, &self.config);
        self.insert(session.clone());
        session
    }

    /// Registers `session`, replacing any session with the same id.
    pub fn insert(&self, session: Arc<Session>) {
        let id = session.id().clone();
        if let Some(displaced) = self.sessions.insert(id.clone(), session) {
            warn!(
                "Shutdown session with id {} because a new session was created with the same id.",
                id
            );
            for connection_id in displaced.member_ids() {
                self.members.remove(&connection_id);
            }
            displaced.shutdown();
        }
    }

    pub fn get(&self, session_id: &SessionId) -> Result<Arc<Session>> {
        self.sessions
            .get(session_id)
            .map(|s| Arc::clone(s.value()))
            .ok_or_else(|| FlixyError::SessionNotFound(session_id.clone()))
    }

    /// Removes a session regardless of its members and stops its clock.
    pub fn destroy(&self, session_id: &SessionId) -> Option<Arc<Session>> {
        let (_, session) = self.sessions.remove(session_id)?;
        self.members.retain(|_, bound| *bound != *session_id);
        session.shutdown();
        Some(session)
    }

    /// Destroys the session only if it has no members, atomically with
    /// respect to concurrent joins.
    pub fn destroy_if_empty(&self, session_id: &SessionId) -> bool {
        match self
            .sessions
            .remove_if(session_id, |_, session| session.close_if_empty())
        {
            Some((_, session)) => {
                session.shutdown();
                info!("Session {} destroyed: no members left", session_id);
                true
            }
            None => false,
        }
    }

    /// Records that `connection_id` belongs to `session_id`. Returns the
    /// session it was bound to before, if any.
    pub fn bind_member(&self, connection_id: ConnectionId, session_id: SessionId) -> Option<SessionId> {
        self.members.insert(connection_id, session_id)
    }

    pub fn member_session(&self, connection_id: &ConnectionId) -> Option<SessionId> {
        self.members.get(connection_id).map(|s| s.value().clone())
    }

    /// Drops the binding of `connection_id` and removes its member from the
    /// owning session. The caller decides whether to destroy an emptied
    /// session.
    pub fn unbind_member(&self, connection_id: &ConnectionId) -> Result<Unbound> {
        let (_, session_id) = self
            .members
            .remove(connection_id)
            .ok_or_else(|| FlixyError::MemberNotFound(connection_id.clone()))?;

        let session = self
            .sessions
            .get(&session_id)
            .map(|s| Arc::clone(s.value()));

        let (member, remaining) = match session {
            Some(session) => session.remove_member(connection_id),
            None => (None, 0),
        };

        Ok(Unbound {
            session_id,
            member,
            remaining,
        })
    }

    /// Wire view of every session, keyed by session id.
    pub fn snapshot(&self) -> BTreeMap<String, WireSession> {
        let sessions: Vec<Arc<Session>> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        sessions
            .into_iter()
            .map(|s| (s.id().to_string(), s.wire_session()))
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        for entry in self.sessions.iter() {
            entry.value().shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::protocol::connection::testing::RecordingConnection;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(SessionConfig::default())
    }

    #[tokio::test]
    async fn create_then_get() {
        let registry = registry();
        let session = registry.create(42, 1000);

        let found = registry.get(session.id()).unwrap();
        assert!(Arc::ptr_eq(&session, &found));
        assert_eq!(found.video_id(), 42);
        assert_eq!(found.time(), 1000);
        assert_eq!(registry.session_count(), 1);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let registry = registry();
        let missing = SessionId::from("0000-0000-0000-0000");
        assert!(matches!(
            registry.get(&missing),
            Err(FlixyError::SessionNotFound(id)) if id == missing
        ));
        assert!(registry.destroy(&missing).is_none());
        assert!(!registry.destroy_if_empty(&missing));
    }

    #[tokio::test]
    async fn unbind_reports_an_emptied_session() {
        let registry = registry();
        let session = registry.create(1, 0);
        let conn = RecordingConnection::new("a");
        session.add_member(conn.clone(), "a").unwrap();
        registry.bind_member(ConnectionId::from("a"), session.id().clone());

        let unbound = registry.unbind_member(&ConnectionId::from("a")).unwrap();
        assert_eq!(&unbound.session_id, session.id());
        assert!(unbound.member.is_some());
        assert!(unbound.emptied());

        assert!(registry.destroy_if_empty(session.id()));
        assert!(registry.get(session.id()).is_err());
        assert!(session.is_closed());
    }

    #[tokio::test]
    async fn unbind_unknown_connection_is_member_not_found() {
        let registry = registry();
        assert!(matches!(
            registry.unbind_member(&ConnectionId::from("ghost")),
            Err(FlixyError::MemberNotFound(_))
        ));
    }

    #[tokio::test]
    async fn destroy_if_empty_keeps_occupied_sessions() {
        let registry = registry();
        let session = registry.create(1, 0);
        session.add_member(RecordingConnection::new("a"), "a").unwrap();

        assert!(!registry.destroy_if_empty(session.id()));
        assert!(registry.get(session.id()).is_ok());
        assert!(!session.is_closed());
    }

    #[tokio::test]
    async fn destroy_stops_the_clock_and_drops_bindings() {
        let registry = registry();
        let session = registry.create(1, 0);
        session.add_member(RecordingConnection::new("a"), "a").unwrap();
        registry.bind_member(ConnectionId::from("a"), session.id().clone());
        session.play();

        registry.destroy(session.id());
        let frozen = session.time();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(session.time(), frozen);
        assert!(session.clock_finished());
        assert!(registry.member_session(&ConnectionId::from("a")).is_none());
        assert_eq!(registry.member_count(), 0);
    }

    #[tokio::test]
    async fn colliding_ids_are_last_write_wins() {
        let registry = registry();
        let config = SessionConfig::default();
        let id = SessionId::from("1111-2222-3333-4444");

        let first = Session::new(id.clone(), 1, 0, &config);
        first.add_member(RecordingConnection::new("a"), "a").unwrap();
        registry.insert(first.clone());
        registry.bind_member(ConnectionId::from("a"), id.clone());

        let second = Session::new(id.clone(), 2, 0, &config);
        registry.insert(second.clone());

        assert!(Arc::ptr_eq(&registry.get(&id).unwrap(), &second));
        assert!(first.is_closed());
        assert!(registry.member_session(&ConnectionId::from("a")).is_none());
        assert_eq!(registry.session_count(), 1);
    }

    #[tokio::test]
    async fn snapshot_lists_every_session() {
        let registry = registry();
        let a = registry.create(1, 10);
        let b = registry.create(2, 20);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[&a.id().to_string()].status.video_id, 1);
        assert_eq!(snapshot[&b.id().to_string()].status.time, 20);
    }

    #[tokio::test]
    async fn concurrent_creates_are_all_registered() {
        let registry = Arc::new(registry());
        let mut handles = Vec::new();
        for i in 0..16u64 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.create(i + 1, 0).id().clone()
            }));
        }

        for handle in handles {
            let id = handle.await.unwrap();
            assert!(registry.get(&id).is_ok());
        }
        assert_eq!(registry.session_count(), 16);
    }
}

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::{
    common::{ConnectionId, FlixyError, Result, SessionId},
    configs::SessionConfig,
    protocol::{Connection, OutgoingEvent, WireSession, WireStatus},
    server::{clock::Clock, member::Member},
};

const WATCH_URL_BASE: &str = "https://www.netflix.com/watch";

/// Mutable part of a session. Every read and write goes through one lock so
/// that a mutation and the broadcast of its result are never interleaved
/// with another mutation or a clock tick.
struct SessionState {
    time: u64,
    paused: bool,
    closed: bool,
    members: HashMap<ConnectionId, Member>,
}

/// A shared, server-authoritative playback position for a group of members.
pub struct Session {
    id: SessionId,
    video_id: u64,
    default_nick: String,
    state: Arc<Mutex<SessionState>>,
    clock: Clock,
}

impl Session {
    /// Creates a paused session and spawns its (dormant) clock.
    pub fn new(id: SessionId, video_id: u64, time: u64, config: &SessionConfig) -> Arc<Self> {
        let state = Arc::new(Mutex::new(SessionState {
            time,
            paused: true,
            closed: false,
            members: HashMap::new(),
        }));

        let step = config.tick_ms.max(1);
        let ticking = state.clone();
        let clock = Clock::spawn(Duration::from_millis(step), move || {
            let mut state = ticking.lock();
            if !state.paused && !state.closed {
                state.time = state.time.saturating_add(step);
            }
        });

        Arc::new(Self {
            id,
            video_id,
            default_nick: config.default_nick.clone(),
            state,
            clock,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn video_id(&self) -> u64 {
        self.video_id
    }

    pub fn time(&self) -> u64 {
        self.state.lock().time
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn member_count(&self) -> usize {
        self.state.lock().members.len()
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.state.lock().members.keys().cloned().collect()
    }

    /// Resumes the clock from the current time and syncs every member.
    /// A closed session stays paused.
    pub fn play(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.paused = false;
        self.clock.resume();
        self.sync_locked(&state);
    }

    /// Freezes the clock and syncs every member. Pausing twice is fine.
    pub fn pause(&self) {
        let mut state = self.state.lock();
        state.paused = true;
        self.clock.stop();
        self.sync_locked(&state);
    }

    /// Seeks to the absolute position `ts`, keeping the paused flag.
    pub fn set_time(&self, ts: u64) {
        let mut state = self.state.lock();
        state.time = ts;
        self.sync_locked(&state);
    }

    /// Adds a member, hands it the full session, then syncs everyone.
    ///
    /// An empty nickname is replaced with the configured default.
    pub fn add_member(&self, connection: Arc<dyn Connection>, nickname: &str) -> Result<Member> {
        let nickname = match nickname.trim() {
            "" => self.default_nick.clone(),
            nick => nick.to_string(),
        };

        let mut state = self.state.lock();
        if state.closed {
            return Err(FlixyError::SessionClosed(self.id.clone()));
        }

        let member = Member::new(connection, nickname, self.id.clone());
        state
            .members
            .insert(member.connection_id().clone(), member.clone());

        let wire = self.wire(&state);
        if let Err(e) = member.send(&OutgoingEvent::JoinSession(wire.clone())) {
            debug!("join delivery failed: session={} err={}", self.id, e);
        }
        self.send_to_members(&state, &OutgoingEvent::Sync(wire));

        Ok(member)
    }

    /// Removes a member and returns it along with how many remain.
    pub fn remove_member(&self, connection_id: &ConnectionId) -> (Option<Member>, usize) {
        let mut state = self.state.lock();
        let removed = state.members.remove(connection_id);
        let remaining = state.members.len();

        if removed.is_some() && remaining > 0 {
            self.sync_locked(&state);
        }

        (removed, remaining)
    }

    /// Sends every member the current state of the session.
    pub fn sync(&self) {
        let state = self.state.lock();
        self.sync_locked(&state);
    }

    /// Emits `event` to every member. A failed send only affects its member.
    pub fn send_to_all(&self, event: &OutgoingEvent) {
        let state = self.state.lock();
        self.send_to_members(&state, event);
    }

    pub fn wire_session(&self) -> WireSession {
        let state = self.state.lock();
        self.wire(&state)
    }

    pub fn wire_status(&self) -> WireStatus {
        let state = self.state.lock();
        self.status(&state)
    }

    /// Marks the session closed if it has no members left.
    ///
    /// Once closed, joins are refused, so a `true` here is final.
    pub fn close_if_empty(&self) -> bool {
        let mut state = self.state.lock();
        if state.members.is_empty() {
            state.closed = true;
        }
        state.closed
    }

    /// Closes the session and cancels its clock. Safe to call repeatedly.
    pub fn shutdown(&self) {
        {
            let mut state = self.state.lock();
            state.closed = true;
            state.paused = true;
        }
        if !self.clock.is_cancelled() {
            info!("Shutting down session: {}", self.id);
            self.clock.cancel();
        }
    }

    pub fn clock_finished(&self) -> bool {
        self.clock.is_finished()
    }

    /// External watch URL that drops a viewer into this session.
    pub fn watch_url(&self) -> String {
        format!(
            "{}/{}?flixySessionId={}",
            WATCH_URL_BASE,
            self.video_id,
            urlencoding::encode(&self.id)
        )
    }

    fn status(&self, state: &SessionState) -> WireStatus {
        WireStatus {
            video_id: self.video_id,
            time: state.time,
            paused: state.paused,
        }
    }

    fn wire(&self, state: &SessionState) -> WireSession {
        WireSession {
            session_id: self.id.clone(),
            status: self.status(state),
            members: state
                .members
                .iter()
                .map(|(id, member)| (id.to_string(), member.to_wire_member()))
                .collect(),
        }
    }

    fn sync_locked(&self, state: &SessionState) {
        let wire = self.wire(state);
        for member in state.members.values() {
            if let Err(e) = member.sync(&wire) {
                debug!("sync delivery failed: session={} err={}", self.id, e);
            }
        }
    }

    fn send_to_members(&self, state: &SessionState, event: &OutgoingEvent) {
        for member in state.members.values() {
            if let Err(e) = member.send(event) {
                debug!(
                    "{} delivery failed: session={} err={}",
                    event.name(),
                    self.id,
                    e
                );
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("Dropping session: {}", self.id);
        self.clock.cancel();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("video_id", &self.video_id)
            .finish_non_exhaustive()
    }
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::SessionId;

pub const NEW_SESSION: &str = "flixy new session";
pub const JOIN_SESSION: &str = "flixy join session";
pub const SYNC: &str = "flixy sync";
pub const INVALID_SESSION_ID: &str = "flixy invalid session id";
pub const INVALID_NEW_DATA: &str = "flixy invalid new data";
pub const INVALID_DATA: &str = "flixy invalid data";
pub const MEMBER_NOT_FOUND: &str = "flixy member does not exist";

/// Where a session is, without its identity or members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireStatus {
    pub video_id: u64,
    pub time: u64,
    pub paused: bool,
}

/// External view of a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMember {
    pub nick: String,
}

/// External view of a session, safe to send to any client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSession {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub status: WireStatus,
    pub members: HashMap<String, WireMember>,
}

/// Events sent from the server to a client.
#[derive(Debug, Clone)]
pub enum OutgoingEvent {
    NewSession(WireSession),
    JoinSession(WireSession),
    Sync(WireSession),
    InvalidSessionId(String),
    /// Echo of a `flixy new` payload that failed validation.
    InvalidNewData(Value),
    InvalidData(Value),
    MemberNotFound,
}

impl OutgoingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewSession(_) => NEW_SESSION,
            Self::JoinSession(_) => JOIN_SESSION,
            Self::Sync(_) => SYNC,
            Self::InvalidSessionId(_) => INVALID_SESSION_ID,
            Self::InvalidNewData(_) => INVALID_NEW_DATA,
            Self::InvalidData(_) => INVALID_DATA,
            Self::MemberNotFound => MEMBER_NOT_FOUND,
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            Self::NewSession(s) | Self::JoinSession(s) | Self::Sync(s) => {
                serde_json::to_value(s).unwrap_or(Value::Null)
            }
            Self::InvalidSessionId(sid) => Value::String(sid.clone()),
            Self::InvalidNewData(raw) | Self::InvalidData(raw) => raw.clone(),
            Self::MemberNotFound => Value::Null,
        }
    }
}

/// Envelope carried by every websocket text frame, in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

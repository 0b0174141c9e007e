use serde::Serialize;
use thiserror::Error;

use crate::common::types::{ConnectionId, SessionId};

/// Errors raised by the session core and its transport bindings.
#[derive(Debug, Error)]
pub enum FlixyError {
    #[error("undecodable payload for `{event}`: {source}")]
    Decode {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown event `{0}`")]
    UnknownEvent(String),

    #[error("invalid data for `{event}`: {reason}")]
    InvalidData { event: String, reason: &'static str },

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("session is closed: {0}")]
    SessionClosed(SessionId),

    #[error("member not found: {0}")]
    MemberNotFound(ConnectionId),

    #[error("connection closed: {0}")]
    ConnectionClosed(ConnectionId),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlixyError>;

/// JSON error body returned by the HTTP endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    /// HTTP status code.
    pub status: u16,
    /// HTTP status reason phrase (e.g. "Not Found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// The request path that caused the error.
    pub path: String,
}

impl ErrorResponse {
    pub fn not_found(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            timestamp: crate::common::now_ms(),
            status: 404,
            error: "Not Found".into(),
            message: message.into(),
            path: path.into(),
        }
    }
}

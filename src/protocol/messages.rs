//! Inbound client events.
//!
//! Every event name maps to exactly one [`IncomingMessage`] variant. Payloads
//! are decoded and validated through [`IncomingMessage::decode`] only.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;

use crate::common::{FlixyError, Result, SessionId};

pub const NEW: &str = "flixy new";
pub const JOIN: &str = "flixy join";
pub const GET_SYNC: &str = "flixy get sync";
pub const PLAY: &str = "flixy play";
pub const PAUSE: &str = "flixy pause";
pub const SEEK: &str = "flixy seek";
pub const LEAVE: &str = "flixy leave";

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct NewMessage {
    #[serde(deserialize_with = "null_as_default")]
    pub video_id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub time: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub nick: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct JoinMessage {
    #[serde(deserialize_with = "null_as_default")]
    pub session_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub nick: String,
}

/// Payload of the events that only name a session.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SessionMessage {
    #[serde(deserialize_with = "null_as_default")]
    pub session_id: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SeekMessage {
    #[serde(deserialize_with = "null_as_default")]
    pub session_id: String,
    pub time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingMessage {
    New(NewMessage),
    Join(JoinMessage),
    GetSync(SessionMessage),
    Play(SessionMessage),
    Pause(SessionMessage),
    Seek(SeekMessage),
    Leave,
}

impl IncomingMessage {
    /// Decodes and validates the payload of `event`.
    ///
    /// `data` may be an object or a string holding a JSON object, as
    /// socket.io style clients send it. `null` counts as an empty object.
    pub fn decode(event: &str, data: &Value) -> Result<Self> {
        let data = normalize(event, data)?;

        let message = match event {
            NEW => Self::New(parse(event, data)?),
            JOIN => Self::Join(parse(event, data)?),
            GET_SYNC => Self::GetSync(parse(event, data)?),
            PLAY => Self::Play(parse(event, data)?),
            PAUSE => Self::Pause(parse(event, data)?),
            SEEK => Self::Seek(parse(event, data)?),
            LEAVE => Self::Leave,
            other => return Err(FlixyError::UnknownEvent(other.to_string())),
        };

        message.validate()?;
        Ok(message)
    }

    pub fn event(&self) -> &'static str {
        match self {
            Self::New(_) => NEW,
            Self::Join(_) => JOIN,
            Self::GetSync(_) => GET_SYNC,
            Self::Play(_) => PLAY,
            Self::Pause(_) => PAUSE,
            Self::Seek(_) => SEEK,
            Self::Leave => LEAVE,
        }
    }

    /// The session this message targets, if it names one.
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            Self::Join(m) => Some(SessionId::from(m.session_id.as_str())),
            Self::GetSync(m) | Self::Play(m) | Self::Pause(m) => {
                Some(SessionId::from(m.session_id.as_str()))
            }
            Self::Seek(m) => Some(SessionId::from(m.session_id.as_str())),
            Self::New(_) | Self::Leave => None,
        }
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: &'static str| -> Result<()> {
            Err(FlixyError::InvalidData {
                event: self.event().to_string(),
                reason,
            })
        };

        match self {
            Self::New(m) if m.video_id == 0 => invalid("video_id must be non-zero"),
            Self::Seek(m) if m.time.is_none() => invalid("time is required"),
            Self::New(_) | Self::Leave => Ok(()),
            _ => match self.session_id() {
                Some(sid) if sid.trim().is_empty() => invalid("session_id is required"),
                _ => Ok(()),
            },
        }
    }
}

/// `null` decodes like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn normalize(event: &str, data: &Value) -> Result<Value> {
    match data {
        Value::Null => Ok(Value::Object(Default::default())),
        Value::String(raw) => serde_json::from_str(raw).map_err(|source| FlixyError::Decode {
            event: event.to_string(),
            source,
        }),
        other => Ok(other.clone()),
    }
}

fn parse<T: DeserializeOwned>(event: &str, data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|source| FlixyError::Decode {
        event: event.to_string(),
        source,
    })
}

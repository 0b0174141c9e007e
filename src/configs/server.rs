use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub filters: Option<String>,
}

/// Tunables for every watch session.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// Clock tick interval in milliseconds. Each tick advances playback
    /// time by the same amount.
    pub tick_ms: u64,
    /// Nickname given to members that join without one.
    pub default_nick: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1,
            default_nick: "(no nick)".to_string(),
        }
    }
}

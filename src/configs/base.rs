use serde::{Deserialize, Serialize};

use crate::{common::Result, configs::*};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Loads `config.toml`, then `config.default.toml`, then built-in defaults.
    pub fn load() -> Result<Self> {
        let config_path = if std::path::Path::new("config.toml").exists() {
            "config.toml"
        } else if std::path::Path::new("config.default.toml").exists() {
            "config.default.toml"
        } else {
            return Ok(Self::default());
        };

        let config_str = std::fs::read_to_string(config_path)?;
        Self::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        Ok(config)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.tick_ms, 1);
        assert_eq!(config.session.default_nick, "(no nick)");
        assert!(config.logging.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [server]
            port = 8080

            [logging]
            level = "debug"

            [session]
            default_nick = "anon"
            "#,
        )
        .unwrap();
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.session.tick_ms, 1);
        assert_eq!(config.session.default_nick, "anon");
        assert_eq!(
            config.logging.and_then(|l| l.level).as_deref(),
            Some("debug")
        );
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(matches!(
            Config::parse("[server]\nport = \"nope\""),
            Err(crate::common::FlixyError::Config(_))
        ));
    }
}

use anyhow::{Context, Result};
use pollroom_core::AppConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Comma separated origins appended to `gateway.allowed_origins`.
pub const ALLOWED_ORIGINS_ENV: &str = "POLLROOM_ALLOWED_ORIGINS";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:1999".to_string(),
            public_url: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub allowed_origins: Vec<String>,
    pub max_message_size: usize,
    pub broadcast_capacity: usize,
    pub commands_per_second: u32,
    pub command_burst: u32,
    /// Seconds an empty room keeps its state; 0 discards it at once.
    pub room_idle_ttl_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let app = AppConfig::default();
        Self {
            allowed_origins: app.allowed_origins,
            max_message_size: app.max_message_size,
            broadcast_capacity: 64,
            commands_per_second: app.commands_per_second,
            command_burst: app.command_burst,
            room_idle_ttl_secs: pollroom_core::DEFAULT_ROOM_IDLE_TTL.as_secs(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Poll catalog file; the builtin catalog is used when unset.
    pub path: Option<String>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn add_allowed_origins(&mut self, raw: &str) {
        self.gateway.allowed_origins.extend(
            raw.split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string),
        );
    }

    pub fn room_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.gateway.room_idle_ttl_secs)
    }

    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            public_url: self.server.public_url.clone(),
            allowed_origins: self.gateway.allowed_origins.clone(),
            max_message_size: self.gateway.max_message_size,
            commands_per_second: self.gateway.commands_per_second,
            command_burst: self.gateway.command_burst,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:1999");
        assert_eq!(config.gateway.max_message_size, 32 * 1024);
        assert_eq!(config.gateway.broadcast_capacity, 64);
        assert_eq!(config.room_idle_ttl(), Duration::from_secs(300));
        assert!(config.catalog.path.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
[server]
public_url = "https://polls.example.com"

[gateway]
allowed_origins = ["https://slides.example.org"]
commands_per_second = 5

[catalog]
path = "polls.toml"
"#,
        )
        .unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:1999");
        assert_eq!(config.gateway.commands_per_second, 5);
        assert_eq!(config.gateway.command_burst, 40);
        assert_eq!(config.catalog.path.as_deref(), Some("polls.toml"));

        let app = config.app_config();
        assert_eq!(app.public_url.as_deref(), Some("https://polls.example.com"));
        assert_eq!(app.allowed_origins, vec!["https://slides.example.org"]);
        assert_eq!(app.commands_per_second, 5);
    }

    #[test]
    fn example_config_parses() {
        let config = Config::parse(include_str!("../../../config/pollroom.example.toml")).unwrap();
        assert_eq!(
            config.catalog.path.as_deref(),
            Some("config/polls.example.toml")
        );
        assert_eq!(config.gateway.allowed_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.room_idle_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn zero_idle_ttl_is_accepted() {
        let config = Config::parse("[gateway]\nroom_idle_ttl_secs = 0").unwrap();
        assert!(config.room_idle_ttl().is_zero());
    }

    #[test]
    fn env_origins_are_appended() {
        let mut config = Config::parse("[gateway]\nallowed_origins = [\"https://a.example\"]").unwrap();
        config.add_allowed_origins(" https://b.example, ,https://c.example ");
        assert_eq!(
            config.app_config().allowed_origins,
            vec!["https://a.example", "https://b.example", "https://c.example"]
        );
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(Config::parse("[gateway]\nmax_message_size = \"big\"").is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:1999");
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind_address = \"127.0.0.1:4000\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:4000");
    }
}

//! Server configuration loading.
//!
//! TOML is the sole config source; no environment variable overrides.
//! Default config path: `/etc/compound-pi/server.toml`. Every field has a
//! documented default, so an empty file is valid.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub udp_bind: String,
    pub udp_port: u16,
    pub repeater_interval_max: Duration,
    pub repeater_deadline: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            udp_bind: "0.0.0.0".to_owned(),
            udp_port: 5647,
            repeater_interval_max: Duration::from_millis(200),
            repeater_deadline: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    udp_bind: Option<String>,
    udp_port: Option<u16>,
    repeater_interval_max_ms: Option<u64>,
    repeater_deadline_ms: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config file '{path}': {source}")]
    Io { path: String, source: std::io::Error },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_config_from_path(path: &Path) -> Result<ServerConfig, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
    load_config_from_str(&text)
}

pub fn load_config() -> Result<ServerConfig, ConfigError> {
    load_config_from_path(Path::new("/etc/compound-pi/server.toml"))
}

pub fn load_config_from_str(text: &str) -> Result<ServerConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(text)?;
    let defaults = ServerConfig::default();
    Ok(ServerConfig {
        udp_bind: raw.udp_bind.unwrap_or(defaults.udp_bind),
        udp_port: raw.udp_port.unwrap_or(defaults.udp_port),
        repeater_interval_max: raw
            .repeater_interval_max_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.repeater_interval_max),
        repeater_deadline: raw
            .repeater_deadline_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.repeater_deadline),
    })
}

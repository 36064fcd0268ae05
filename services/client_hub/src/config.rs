//! Client engine configuration.
//!
//! Unlike the server, `client` is a library consumed by an out-of-scope
//! shell/GUI, so there is no default config *path* — callers load TOML
//! themselves and hand the engine a parsed [`EngineConfig`]. The
//! [`load_config_from_str`] helper exists for parity with the server's
//! loader and so a future CLI can reuse the same format.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Network address of the client's subnet (e.g. `192.168.0.0`).
    pub udp_network: Ipv4Addr,
    /// CIDR prefix length for `udp_network` (e.g. `24`).
    pub udp_prefix_len: u8,
    pub udp_port: u16,
    pub tcp_bind_addr: String,
    pub tcp_port: u16,
    pub request_timeout: Duration,
    pub retry_interval: Duration,
    pub capture_delay: f64,
    pub capture_count: i64,
    pub video_port_default: bool,
    pub time_delta_warning_threshold: f64,
    pub download_output_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            udp_network: Ipv4Addr::new(192, 168, 0, 0),
            udp_prefix_len: 24,
            udp_port: 5647,
            tcp_bind_addr: "0.0.0.0".to_owned(),
            tcp_port: 5647,
            request_timeout: Duration::from_secs(5),
            retry_interval: Duration::from_millis(200),
            capture_delay: 3.0,
            capture_count: 1,
            video_port_default: false,
            time_delta_warning_threshold: 1.0,
            download_output_dir: PathBuf::from("."),
        }
    }
}

impl EngineConfig {
    /// The subnet's broadcast address, reserved for fan-out and never
    /// stored in the registry (spec.md §3).
    pub fn broadcast_address(&self) -> Ipv4Addr {
        let mask: u32 = if self.udp_prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - self.udp_prefix_len)
        };
        let network = u32::from(self.udp_network) & mask;
        Ipv4Addr::from(network | !mask)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    udp_network: Option<Ipv4Addr>,
    udp_prefix_len: Option<u8>,
    udp_port: Option<u16>,
    tcp_bind_addr: Option<String>,
    tcp_port: Option<u16>,
    request_timeout_ms: Option<u64>,
    retry_interval_ms: Option<u64>,
    capture_delay: Option<f64>,
    capture_count: Option<i64>,
    video_port_default: Option<bool>,
    time_delta_warning_threshold: Option<f64>,
    download_output_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_config_from_str(text: &str) -> Result<EngineConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(text)?;
    let defaults = EngineConfig::default();
    Ok(EngineConfig {
        udp_network: raw.udp_network.unwrap_or(defaults.udp_network),
        udp_prefix_len: raw.udp_prefix_len.unwrap_or(defaults.udp_prefix_len),
        udp_port: raw.udp_port.unwrap_or(defaults.udp_port),
        tcp_bind_addr: raw.tcp_bind_addr.unwrap_or(defaults.tcp_bind_addr),
        tcp_port: raw.tcp_port.unwrap_or(defaults.tcp_port),
        request_timeout: raw.request_timeout_ms.map(Duration::from_millis).unwrap_or(defaults.request_timeout),
        retry_interval: raw.retry_interval_ms.map(Duration::from_millis).unwrap_or(defaults.retry_interval),
        capture_delay: raw.capture_delay.unwrap_or(defaults.capture_delay),
        capture_count: raw.capture_count.unwrap_or(defaults.capture_count),
        video_port_default: raw.video_port_default.unwrap_or(defaults.video_port_default),
        time_delta_warning_threshold: raw
            .time_delta_warning_threshold
            .unwrap_or(defaults.time_delta_warning_threshold),
        download_output_dir: raw.download_output_dir.unwrap_or(defaults.download_output_dir),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_documented_defaults() {
        let cfg = load_config_from_str("").unwrap();
        assert_eq!(cfg.udp_port, 5647);
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn broadcast_address_for_slash_24() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.broadcast_address(), Ipv4Addr::new(192, 168, 0, 255));
    }

    #[test]
    fn overrides_apply() {
        let cfg = load_config_from_str("udp_port = 6000\ncapture_count = 5\n").unwrap();
        assert_eq!(cfg.udp_port, 6000);
        assert_eq!(cfg.capture_count, 5);
    }
}

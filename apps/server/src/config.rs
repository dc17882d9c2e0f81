//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::net::IpAddr;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use slimproto_core::ProtocolServerConfig;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the slimproto listener to.
    /// Override: `SLIMPROTO_BIND_HOST`
    pub bind_host: IpAddr,

    /// Port to bind the slimproto listener to.
    /// Override: `SLIMPROTO_BIND_PORT`
    pub bind_port: u16,

    /// Port advertised in `strm` frames for clients to connect back to for
    /// audio streaming.
    /// Override: `SLIMPROTO_STREAMING_PORT`
    pub streaming_port: u16,

    /// IP address to advertise to players in `strm` frames. This should be
    /// the address players can reach. If not specified, auto-detection is
    /// attempted per connection.
    /// Override: `SLIMPROTO_ADVERTISE_IP`
    pub advertise_ip: Option<IpAddr>,

    /// Inactivity threshold (seconds) past which a session is evicted.
    /// Override: `SLIMPROTO_CLIENT_TIMEOUT_SECS`
    pub client_timeout_secs: u64,

    /// Interval (seconds) on which the heartbeat/timeout supervisor sweeps
    /// the registry.
    /// Override: `SLIMPROTO_CLIENT_CHECK_INTERVAL_SECS`
    pub client_check_interval_secs: u64,

    /// Deadline (seconds) for receiving the first (HELO) frame on a new
    /// connection.
    /// Override: `SLIMPROTO_HELO_DEADLINE_SECS`
    pub helo_deadline_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let core = ProtocolServerConfig::default();
        Self {
            bind_host: core.bind_host,
            bind_port: core.bind_port,
            streaming_port: core.streaming_port,
            advertise_ip: core.advertise_ip,
            client_timeout_secs: core.client_timeout_secs,
            client_check_interval_secs: core.client_check_interval_secs,
            helo_deadline_secs: core.helo_deadline_secs,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SLIMPROTO_BIND_HOST") {
            if let Ok(host) = val.parse() {
                self.bind_host = host;
            }
        }

        if let Ok(val) = std::env::var("SLIMPROTO_BIND_PORT") {
            if let Ok(port) = val.parse() {
                self.bind_port = port;
            }
        }

        if let Ok(val) = std::env::var("SLIMPROTO_STREAMING_PORT") {
            if let Ok(port) = val.parse() {
                self.streaming_port = port;
            }
        }

        if let Ok(val) = std::env::var("SLIMPROTO_ADVERTISE_IP") {
            if let Ok(ip) = val.parse() {
                self.advertise_ip = Some(ip);
            }
        }

        if let Ok(val) = std::env::var("SLIMPROTO_CLIENT_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.client_timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("SLIMPROTO_CLIENT_CHECK_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                self.client_check_interval_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("SLIMPROTO_HELO_DEADLINE_SECS") {
            if let Ok(secs) = val.parse() {
                self.helo_deadline_secs = secs;
            }
        }
    }

    /// Converts to slimproto-core's `ProtocolServerConfig` type.
    pub fn to_core_config(&self) -> ProtocolServerConfig {
        ProtocolServerConfig {
            bind_host: self.bind_host,
            bind_port: self.bind_port,
            streaming_port: self.streaming_port,
            advertise_ip: self.advertise_ip,
            client_timeout_secs: self.client_timeout_secs,
            client_check_interval_secs: self.client_check_interval_secs,
            helo_deadline_secs: self.helo_deadline_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_core_default() {
        let config = ServerConfig::default();
        let core = config.to_core_config();
        assert_eq!(core.bind_port, 3483);
        assert_eq!(core.streaming_port, 9000);
    }
}

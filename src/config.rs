// Configuration management module
// This file handles loading and parsing of configuration settings
// from SPEEDGUARD_* environment variables
//
// Numan Thabit 2025 Nov

use crate::engine::UnknownClassPolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP API binds to, e.g. 0.0.0.0:8080
    pub listen_addr: String,
    /// Seconds between merit recovery sweeps (one week by default)
    pub recovery_interval_secs: u64,
    /// How unrecognised vehicle classes are handled at registration (reject/fallback)
    pub unknown_vehicle_class: UnknownClassPolicy,
    /// Optional YAML file with sensitive locations to seed the geofence
    pub zones_file: Option<String>,
    /// Default page size for pending violation listings
    pub pending_page_limit: usize,
    /// Seconds between heartbeat log lines
    pub heartbeat_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            recovery_interval_secs: 7 * 24 * 60 * 60,
            unknown_vehicle_class: UnknownClassPolicy::Reject,
            zones_file: None,
            pending_page_limit: 50,
            heartbeat_secs: 30,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        let cfg = config::Config::builder()
            .set_default("listen_addr", defaults.listen_addr)?
            .set_default("recovery_interval_secs", defaults.recovery_interval_secs)?
            .set_default("unknown_vehicle_class", "reject")?
            .set_default("pending_page_limit", defaults.pending_page_limit as u64)?
            .set_default("heartbeat_secs", defaults.heartbeat_secs)?
            .add_source(
                config::Environment::with_prefix("SPEEDGUARD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .with_context(|| format!("invalid listen address: {}", self.listen_addr))
    }

    pub fn recovery_interval(&self) -> Duration {
        Duration::from_secs(self.recovery_interval_secs.max(1))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.socket_addr().unwrap().port(), 8080);
        assert_eq!(cfg.recovery_interval(), Duration::from_secs(604_800));
        assert_eq!(cfg.unknown_vehicle_class, UnknownClassPolicy::Reject);
    }

    #[test]
    fn rejects_bad_listen_addr() {
        let cfg = AppConfig {
            listen_addr: "nowhere".into(),
            ..AppConfig::default()
        };
        assert!(cfg.socket_addr().is_err());
    }
}

//! Runtime configuration for mediahub-server
//!
//! Built from the TOML bootstrap file with command-line overrides applied
//! on top.

use crate::player::SessionSettings;
use mediahub_common::config::{SecurityConfig, TomlConfig};
use mediahub_common::time;
use std::time::Duration;

/// Resolved daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub log_level: String,
    pub release_delay: Duration,
    pub system_lock_name: String,
    pub event_capacity: usize,
    pub security: SecurityConfig,
}

impl Config {
    pub fn from_toml(toml: TomlConfig) -> Self {
        Self {
            port: toml.port,
            bind_address: toml.bind_address,
            log_level: toml.logging.level,
            release_delay: time::millis_to_duration(toml.wakelock.release_delay_ms),
            system_lock_name: toml.wakelock.system_lock_name,
            event_capacity: toml.events.capacity,
            security: toml.security,
        }
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, port: Option<u16>, log_level: Option<String>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(level) = log_level {
            self.log_level = level;
        }
        self
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            release_delay: self.release_delay,
            system_lock_name: self.system_lock_name.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

//! Configuration loading
//!
//! Bootstrap configuration is resolved in priority order:
//! 1. Command-line argument (highest priority, applied by the binary)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not an error: a warning is logged and the
//! compiled defaults are used.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MEDIAHUB_CONFIG";

/// Default delay before a wakelock is released after playback stops
pub const DEFAULT_WAKELOCK_RELEASE_DELAY_MS: u64 = 4000;

/// Default name under which the system wakelock is requested
pub const DEFAULT_SYSTEM_LOCK_NAME: &str = "media-hub-music-playback";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP control port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the control transport binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Wakelock behaviour (optional)
    #[serde(default)]
    pub wakelock: WakelockConfig,

    /// Event bus sizing (optional)
    #[serde(default)]
    pub events: EventsConfig,

    /// Security context resolution (optional)
    #[serde(default)]
    pub security: SecurityConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            logging: LoggingConfig::default(),
            wakelock: WakelockConfig::default(),
            events: EventsConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Wakelock configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WakelockConfig {
    /// Delay between leaving the playing state and releasing the lease
    #[serde(default = "default_release_delay_ms")]
    pub release_delay_ms: u64,

    /// Name used when requesting the system wakelock
    #[serde(default = "default_system_lock_name")]
    pub system_lock_name: String,
}

impl Default for WakelockConfig {
    fn default() -> Self {
        Self {
            release_delay_ms: default_release_delay_ms(),
            system_lock_name: default_system_lock_name(),
        }
    }
}

/// Event bus configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Broadcast channel capacity
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

/// Security context configuration
///
/// Maps client identities to the security profile the access policy
/// evaluates. Clients without an entry get `default_profile`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    /// Profile for clients without an explicit entry (empty denies everything)
    #[serde(default)]
    pub default_profile: String,

    /// Client id → security profile
    #[serde(default)]
    pub profiles: HashMap<String, String>,
}

fn default_port() -> u16 {
    5750
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_release_delay_ms() -> u64 {
    DEFAULT_WAKELOCK_RELEASE_DELAY_MS
}

fn default_system_lock_name() -> String {
    DEFAULT_SYSTEM_LOCK_NAME.to_string()
}

fn default_event_capacity() -> usize {
    1000
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve and load configuration, falling back to defaults
    ///
    /// An explicitly named file (CLI argument or `MEDIAHUB_CONFIG`) that
    /// cannot be read is an error; a missing default file is not.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_path {
            info!("Loading configuration from {}", path.display());
            return Self::load(path);
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            info!("Loading configuration from {} ({})", path.display(), CONFIG_ENV_VAR);
            return Self::load(&path);
        }

        // Priority 3: TOML config file at the default location
        match default_config_path() {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            // Priority 4: compiled defaults
            None => {
                warn!("Could not determine config directory, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.events.capacity == 0 {
            return Err(Error::Config("events.capacity must be > 0".to_string()));
        }
        if self.wakelock.system_lock_name.trim().is_empty() {
            return Err(Error::Config(
                "wakelock.system_lock_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default configuration file path for the platform
///
/// `~/.config/media-hub/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("media-hub").join("config.toml"))
}

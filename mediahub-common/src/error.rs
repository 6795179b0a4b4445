//! Common error types for media-hub

use thiserror::Error;

/// Common result type for media-hub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the media-hub crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse error in a configuration file
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

//! Error types for mediahub-server
//!
//! Playback faults never show up here: they travel as `Error` events.
//! These errors cover the broker and transport layers.

use mediahub_common::events::PlayerKey;
use thiserror::Error;

/// Main error type for mediahub-server
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(#[from] mediahub_common::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// No session exists for the given key
    #[error("Session not found: {0}")]
    SessionNotFound(PlayerKey),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using mediahub-server Error
pub type Result<T> = std::result::Result<T, Error>;

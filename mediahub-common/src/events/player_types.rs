//! Player-related type definitions
//!
//! Value types for the per-session player properties exposed over the
//! control surface.

use serde::{Deserialize, Serialize};

/// Opaque per-session key handed out by the broker
pub type PlayerKey = u32;

/// Playback status as reported to clients
///
/// Mirrors the engine state one-to-one once a session has seen its first
/// engine transition; `Null` is the value before that.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    #[default]
    Null,
    Ready,
    Playing,
    Paused,
    Stopped,
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Null => write!(f, "null"),
            PlaybackStatus::Ready => write!(f, "ready"),
            PlaybackStatus::Playing => write!(f, "playing"),
            PlaybackStatus::Paused => write!(f, "paused"),
            PlaybackStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// Loop behaviour requested by the client
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoopStatus {
    #[default]
    None,
    Track,
    Playlist,
}

/// Audio stream role used by the engine for routing and policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioStreamRole {
    Alarm,
    Alert,
    #[default]
    Multimedia,
    Phone,
}

impl std::fmt::Display for AudioStreamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioStreamRole::Alarm => write!(f, "alarm"),
            AudioStreamRole::Alert => write!(f, "alert"),
            AudioStreamRole::Multimedia => write!(f, "multimedia"),
            AudioStreamRole::Phone => write!(f, "phone"),
        }
    }
}

/// Video orientation reported by the engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

/// Session lifetime
///
/// `Resumable` sessions survive the disconnection of their client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    #[default]
    Normal,
    Resumable,
}

/// Error kinds surfaced to clients through the `Error` event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayerError {
    #[default]
    NoError,
    /// Unsupported format or missing codec
    FormatError,
    /// I/O, negotiation or not-found failures
    ResourceError,
    /// Permission-restricted resource
    AccessDeniedError,
}

impl std::fmt::Display for PlayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerError::NoError => write!(f, "no_error"),
            PlayerError::FormatError => write!(f, "format_error"),
            PlayerError::ResourceError => write!(f, "resource_error"),
            PlayerError::AccessDeniedError => write!(f, "access_denied_error"),
        }
    }
}

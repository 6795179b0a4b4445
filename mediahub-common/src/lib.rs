//! # media-hub Common Library
//!
//! Shared code for the media-hub session broker and its clients:
//! - Player property types (playback status, loop status, stream role, ...)
//! - Track identifiers and metadata
//! - Event types (MediaHubEvent enum) and the EventBus
//! - Configuration loading
//! - Error types

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
pub use events::{EventBus, MediaHubEvent};

//! # media-hub session broker
//!
//! One player session per client over a decode/render engine, with wakelock
//! leases tied to playback, a track queue and locator access checks.
//!
//! - `engine`: engine and metadata-extractor interfaces, fault classification
//! - `power`: power-resource service interface
//! - `player`: sessions, wakelocks, track queue, properties
//! - `security`: context resolution and access policy
//! - `broker`: session registry
//! - `api`: HTTP/SSE control transport

pub mod api;
pub mod broker;
pub mod config;
pub mod engine;
pub mod error;
pub mod player;
pub mod power;
pub mod security;

pub use broker::SessionBroker;
pub use config::Config;
pub use error::{Error, Result};

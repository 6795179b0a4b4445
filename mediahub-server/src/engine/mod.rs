//! Decode/render engine interface
//!
//! The engine is an external collaborator. A session talks to it through the
//! [`Engine`] trait and receives its asynchronous notifications as
//! [`EngineEvent`]s on an unbounded channel. Engines may send from any thread.

pub mod fault;
pub mod headless;

use mediahub_common::events::{
    AudioStreamRole, Lifetime, Orientation, PlaybackStatus, PlayerKey, TrackMetadata,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub use fault::{EngineFault, FaultDomain};

/// Extra request headers passed along with a locator
pub type Headers = HashMap<String, String>;

/// Transport state reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Ready,
    Playing,
    Paused,
    Stopped,
}

impl EngineState {
    /// Client-visible status for this engine state
    pub fn playback_status(self) -> PlaybackStatus {
        match self {
            EngineState::Ready => PlaybackStatus::Ready,
            EngineState::Playing => PlaybackStatus::Playing,
            EngineState::Paused => PlaybackStatus::Paused,
            EngineState::Stopped => PlaybackStatus::Stopped,
        }
    }
}

/// Asynchronous notifications from the engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Transport state changed
    StateChanged(EngineState),
    /// The active track is about to finish; a follow-up may be opened now
    AboutToFinish,
    /// The client that owns the engine instance went away
    ClientDisconnected,
    /// A seek completed, position in microseconds
    SeekedTo(u64),
    EndOfStream,
    PlaybackStatusChanged(PlaybackStatus),
    VideoDimensionChanged { height: u32, width: u32 },
    /// Low-level fault, classified by the session before surfacing
    Fault(EngineFault),
    /// New tags were extracted for the playing locator
    TagAvailable { uri: String, metadata: TrackMetadata },
    OrientationChanged(Orientation),
}

/// Synchronous metadata lookup for a locator
pub trait MetadataExtractor: Send + Sync {
    fn meta_data_for_track_with_uri(&self, uri: &str) -> TrackMetadata;
}

/// Decode/render backend used by one session
pub trait Engine: Send + Sync {
    fn metadata_extractor(&self) -> Arc<dyn MetadataExtractor>;

    fn state(&self) -> EngineState;

    fn open_resource_for_uri(&self, uri: &str) -> bool;
    fn open_resource_for_uri_with_headers(&self, uri: &str, headers: &Headers) -> bool;
    fn create_video_sink(&self, texture_id: u32);

    fn play(&self) -> bool;
    fn pause(&self) -> bool;
    fn stop(&self) -> bool;
    fn seek_to(&self, offset: Duration) -> bool;

    /// Current position in microseconds
    fn position(&self) -> u64;
    /// Duration of the open resource in microseconds
    fn duration(&self) -> u64;

    fn is_video_source(&self) -> bool;
    fn is_audio_source(&self) -> bool;

    fn volume(&self) -> f64;
    fn set_volume(&self, volume: f64);

    fn audio_stream_role(&self) -> AudioStreamRole;
    fn set_audio_stream_role(&self, role: AudioStreamRole);

    fn orientation(&self) -> Orientation;

    fn lifetime(&self) -> Lifetime;
    fn set_lifetime(&self, lifetime: Lifetime);

    /// Latest extracted (locator, metadata) pair for the open resource
    fn track_metadata(&self) -> (String, TrackMetadata);

    /// Release backend resources and return to the initial state
    fn reset(&self);
}

/// An engine instance together with its notification channel
pub struct EngineHandle {
    pub engine: Arc<dyn Engine>,
    pub events: mpsc::UnboundedReceiver<EngineEvent>,
}

/// Creates one engine per session
pub trait EngineFactory: Send + Sync {
    fn create_engine(&self, key: PlayerKey) -> EngineHandle;
}

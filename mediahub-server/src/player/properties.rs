//! Player properties
//!
//! Stored property values for one session, the serializable snapshot served
//! to clients and the partial update accepted from them.

use mediahub_common::events::{
    AudioStreamRole, Lifetime, LoopStatus, Orientation, PlaybackStatus, PlayerKey, TrackMetadata,
};
use serde::{Deserialize, Serialize};

/// Only normal speed is supported
pub const MINIMUM_RATE: f64 = 1.0;
pub const MAXIMUM_RATE: f64 = 1.0;

/// Stored session properties
///
/// Position, duration and content kind are deliberately absent: those are
/// read from the engine on every access.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProperties {
    pub playback_status: PlaybackStatus,
    pub loop_status: LoopStatus,
    pub shuffle: bool,
    pub volume: f64,
    pub playback_rate: f64,
    pub minimum_rate: f64,
    pub maximum_rate: f64,
    pub can_play: bool,
    pub can_pause: bool,
    pub can_seek: bool,
    pub can_go_next: bool,
    pub can_go_previous: bool,
    pub audio_stream_role: AudioStreamRole,
    pub orientation: Orientation,
    pub lifetime: Lifetime,
    pub metadata_for_current_track: TrackMetadata,
}

impl Default for PlayerProperties {
    fn default() -> Self {
        Self {
            playback_status: PlaybackStatus::Null,
            loop_status: LoopStatus::None,
            shuffle: true,
            volume: 1.0,
            playback_rate: 1.0,
            minimum_rate: MINIMUM_RATE,
            maximum_rate: MAXIMUM_RATE,
            can_play: true,
            can_pause: true,
            can_seek: true,
            can_go_next: true,
            can_go_previous: true,
            audio_stream_role: AudioStreamRole::Multimedia,
            orientation: Orientation::Rotate0,
            lifetime: Lifetime::Normal,
            metadata_for_current_track: TrackMetadata::new(),
        }
    }
}

/// Everything a client can read about a session at one instant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertiesSnapshot {
    pub key: PlayerKey,
    pub playback_status: PlaybackStatus,
    pub loop_status: LoopStatus,
    pub shuffle: bool,
    pub volume: f64,
    pub playback_rate: f64,
    pub minimum_rate: f64,
    pub maximum_rate: f64,
    pub can_play: bool,
    pub can_pause: bool,
    pub can_seek: bool,
    pub can_go_next: bool,
    pub can_go_previous: bool,
    pub audio_stream_role: AudioStreamRole,
    pub orientation: Orientation,
    pub lifetime: Lifetime,
    pub metadata_for_current_track: TrackMetadata,
    /// Microseconds, read from the engine
    pub position: u64,
    /// Microseconds, read from the engine
    pub duration: u64,
    pub is_video_source: bool,
    pub is_audio_source: bool,
}

impl PropertiesSnapshot {
    pub(crate) fn new(
        key: PlayerKey,
        props: PlayerProperties,
        position: u64,
        duration: u64,
        is_video_source: bool,
        is_audio_source: bool,
    ) -> Self {
        Self {
            key,
            playback_status: props.playback_status,
            loop_status: props.loop_status,
            shuffle: props.shuffle,
            volume: props.volume,
            playback_rate: props.playback_rate,
            minimum_rate: props.minimum_rate,
            maximum_rate: props.maximum_rate,
            can_play: props.can_play,
            can_pause: props.can_pause,
            can_seek: props.can_seek,
            can_go_next: props.can_go_next,
            can_go_previous: props.can_go_previous,
            audio_stream_role: props.audio_stream_role,
            orientation: props.orientation,
            lifetime: props.lifetime,
            metadata_for_current_track: props.metadata_for_current_track,
            position,
            duration,
            is_video_source,
            is_audio_source,
        }
    }
}

/// Writable properties; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertiesUpdate {
    #[serde(default)]
    pub loop_status: Option<LoopStatus>,
    #[serde(default)]
    pub shuffle: Option<bool>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub playback_rate: Option<f64>,
    #[serde(default)]
    pub audio_stream_role: Option<AudioStreamRole>,
    #[serde(default)]
    pub lifetime: Option<Lifetime>,
}

impl PropertiesUpdate {
    pub fn is_empty(&self) -> bool {
        self.loop_status.is_none()
            && self.shuffle.is_none()
            && self.volume.is_none()
            && self.playback_rate.is_none()
            && self.audio_stream_role.is_none()
            && self.lifetime.is_none()
    }
}

//! Event types for the media-hub event system
//!
//! Provides shared event definitions and the EventBus used by the broker,
//! the player sessions and the SSE transport.

// Sub-modules (supporting types)
mod player_types;
mod track_types;

pub use player_types::{
    AudioStreamRole, Lifetime, LoopStatus, Orientation, PlaybackStatus, PlayerError, PlayerKey,
};
pub use track_types::{keys, TrackId, TrackMetadata};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A single player property value, carried by `PropertyChanged`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value")]
pub enum PlayerProperty {
    PlaybackStatus(PlaybackStatus),
    LoopStatus(LoopStatus),
    Shuffle(bool),
    Volume(f64),
    PlaybackRate(f64),
    AudioStreamRole(AudioStreamRole),
    Orientation(Orientation),
    Lifetime(Lifetime),
    MetadataForCurrentTrack(TrackMetadata),
}

impl PlayerProperty {
    /// Logical property name as seen by clients
    pub fn name(&self) -> &'static str {
        match self {
            PlayerProperty::PlaybackStatus(_) => "PlaybackStatus",
            PlayerProperty::LoopStatus(_) => "LoopStatus",
            PlayerProperty::Shuffle(_) => "Shuffle",
            PlayerProperty::Volume(_) => "Volume",
            PlayerProperty::PlaybackRate(_) => "PlaybackRate",
            PlayerProperty::AudioStreamRole(_) => "AudioStreamRole",
            PlayerProperty::Orientation(_) => "Orientation",
            PlayerProperty::Lifetime(_) => "Lifetime",
            PlayerProperty::MetadataForCurrentTrack(_) => "MetadataForCurrentTrack",
        }
    }
}

/// media-hub event types
///
/// Every event names the session it belongs to so subscribers can filter.
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MediaHubEvent {
    /// A session was created for a client
    SessionCreated {
        key: PlayerKey,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A session was torn down
    SessionDestroyed {
        key: PlayerKey,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A player property changed value
    PropertyChanged {
        key: PlayerKey,
        property: PlayerProperty,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Engine finished a seek
    SeekedTo {
        key: PlayerKey,
        /// Position in microseconds
        position: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Engine reached the end of the current stream
    EndOfStream {
        key: PlayerKey,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Engine-originated playback status notification
    ///
    /// Distinct from `PropertyChanged(PlaybackStatus)`, which follows the
    /// engine state machine.
    PlaybackStatusChanged {
        key: PlayerKey,
        status: PlaybackStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Video frame dimension changed
    VideoDimensionChanged {
        key: PlayerKey,
        /// Height in the upper 32 bits, width in the lower 32 bits
        dimensions: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A classified playback error
    Error {
        key: PlayerKey,
        error: PlayerError,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Track added to the session's queue
    TrackAdded {
        key: PlayerKey,
        track_id: TrackId,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Track removed from the session's queue
    TrackRemoved {
        key: PlayerKey,
        track_id: TrackId,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The client owning the session went away
    ClientDisconnected {
        key: PlayerKey,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl MediaHubEvent {
    /// Session the event belongs to
    pub fn key(&self) -> PlayerKey {
        match self {
            MediaHubEvent::SessionCreated { key, .. }
            | MediaHubEvent::SessionDestroyed { key, .. }
            | MediaHubEvent::PropertyChanged { key, .. }
            | MediaHubEvent::SeekedTo { key, .. }
            | MediaHubEvent::EndOfStream { key, .. }
            | MediaHubEvent::PlaybackStatusChanged { key, .. }
            | MediaHubEvent::VideoDimensionChanged { key, .. }
            | MediaHubEvent::Error { key, .. }
            | MediaHubEvent::TrackAdded { key, .. }
            | MediaHubEvent::TrackRemoved { key, .. }
            | MediaHubEvent::ClientDisconnected { key, .. } => *key,
        }
    }

    /// Event type name, used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            MediaHubEvent::SessionCreated { .. } => "SessionCreated",
            MediaHubEvent::SessionDestroyed { .. } => "SessionDestroyed",
            MediaHubEvent::PropertyChanged { .. } => "PropertyChanged",
            MediaHubEvent::SeekedTo { .. } => "SeekedTo",
            MediaHubEvent::EndOfStream { .. } => "EndOfStream",
            MediaHubEvent::PlaybackStatusChanged { .. } => "PlaybackStatusChanged",
            MediaHubEvent::VideoDimensionChanged { .. } => "VideoDimensionChanged",
            MediaHubEvent::Error { .. } => "Error",
            MediaHubEvent::TrackAdded { .. } => "TrackAdded",
            MediaHubEvent::TrackRemoved { .. } => "TrackRemoved",
            MediaHubEvent::ClientDisconnected { .. } => "ClientDisconnected",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use mediahub_common::events::{EventBus, MediaHubEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(MediaHubEvent::EndOfStream {
///     key: 1,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(MediaHubEvent::EndOfStream { key: 1, .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MediaHubEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<MediaHubEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: MediaHubEvent,
    ) -> Result<usize, broadcast::error::SendError<MediaHubEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: MediaHubEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

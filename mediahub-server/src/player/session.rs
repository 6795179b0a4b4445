//! Player session
//!
//! One `PlayerSession` per client. It forwards transport calls to its engine,
//! folds engine events into its own properties, advances the track queue and
//! decides when wakelocks are taken and dropped.
//!
//! # Engine state handling
//!
//! - **playing**: publish the engine's latest metadata, then the status, then
//!   acquire a lease for the current content kind.
//! - **ready / paused / stopped**: publish the status; when leaving playing,
//!   schedule a delayed release for the content kind at scheduling time.
//!
//! Delayed releases are never cancelled. They hold a `Weak` reference and do
//! nothing once the session is gone or torn down; the floored release in
//! [`WakelockManager`] absorbs any surplus.
//!
//! # Teardown
//!
//! Wakelocks are force-released, then the engine event task is stopped and the
//! engine reset, then the queue is cleared.

use super::properties::{PlayerProperties, PropertiesSnapshot, PropertiesUpdate};
use super::track_queue::TrackQueue;
use super::wakelock::{WakelockCounts, WakelockKind, WakelockManager};
use crate::engine::{Engine, EngineEvent, EngineHandle, EngineState, Headers};
use crate::power::PowerResourceClient;
use mediahub_common::config::{DEFAULT_SYSTEM_LOCK_NAME, DEFAULT_WAKELOCK_RELEASE_DELAY_MS};
use mediahub_common::events::{
    AudioStreamRole, EventBus, Lifetime, LoopStatus, MediaHubEvent, Orientation, PlaybackStatus,
    PlayerError, PlayerKey, PlayerProperty, TrackId, TrackMetadata,
};
use mediahub_common::time;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Per-session tunables
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Delay between leaving playing and releasing the lease
    pub release_delay: Duration,
    /// Name under which system wakelocks are requested
    pub system_lock_name: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            release_delay: time::millis_to_duration(DEFAULT_WAKELOCK_RELEASE_DELAY_MS),
            system_lock_name: DEFAULT_SYSTEM_LOCK_NAME.to_string(),
        }
    }
}

pub struct PlayerSession {
    key: PlayerKey,
    engine: Arc<dyn Engine>,
    wakelocks: WakelockManager,
    queue: Mutex<TrackQueue>,
    properties: RwLock<PlayerProperties>,
    /// Last engine state seen; only drives wakelock transitions
    previous_state: Mutex<EngineState>,
    bus: EventBus,
    release_delay: Duration,
    /// Tells the broker this session's client went away
    disconnect_tx: Option<mpsc::UnboundedSender<PlayerKey>>,
    event_task: Mutex<Option<JoinHandle<()>>>,
    torn_down: AtomicBool,
    /// One-shot per session: never reset, so a Resumable session that loses
    /// a second client reports nothing further
    disconnected: AtomicBool,
}

impl PlayerSession {
    /// Build a session around an engine without wiring its events
    ///
    /// Use [`PlayerSession::start`] unless the caller feeds events itself.
    pub fn new(
        key: PlayerKey,
        engine: Arc<dyn Engine>,
        power: Arc<dyn PowerResourceClient>,
        settings: SessionSettings,
        bus: EventBus,
        disconnect_tx: Option<mpsc::UnboundedSender<PlayerKey>>,
    ) -> Arc<Self> {
        let properties = PlayerProperties::default();
        engine.set_audio_stream_role(properties.audio_stream_role);
        engine.set_lifetime(properties.lifetime);

        let queue = TrackQueue::new(key, engine.metadata_extractor(), bus.clone());

        Arc::new(Self {
            key,
            wakelocks: WakelockManager::new(power, settings.system_lock_name),
            queue: Mutex::new(queue),
            properties: RwLock::new(properties),
            previous_state: Mutex::new(EngineState::Stopped),
            bus,
            release_delay: settings.release_delay,
            disconnect_tx,
            event_task: Mutex::new(None),
            torn_down: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
            engine,
        })
    }

    /// Build a session and spawn the task draining the engine's events
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        key: PlayerKey,
        handle: EngineHandle,
        power: Arc<dyn PowerResourceClient>,
        settings: SessionSettings,
        bus: EventBus,
        disconnect_tx: Option<mpsc::UnboundedSender<PlayerKey>>,
    ) -> Arc<Self> {
        let EngineHandle { engine, mut events } = handle;
        let session = Self::new(key, engine, power, settings, bus, disconnect_tx);

        let weak = Arc::downgrade(&session);
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(session) = weak.upgrade() else {
                    break;
                };
                session.handle_engine_event(event);
            }
            debug!("Engine event loop for session {} finished", key);
        });
        *session.lock_event_task() = Some(task);

        info!("Player session {} started", key);
        session
    }

    pub fn key(&self) -> PlayerKey {
        self.key
    }

    // ------------------------------------------------------------------
    // Engine events
    // ------------------------------------------------------------------

    /// Fold one engine notification into session state
    pub fn handle_engine_event(self: &Arc<Self>, event: EngineEvent) {
        if self.torn_down.load(Ordering::SeqCst) {
            debug!("Session {} ignoring {:?} after teardown", self.key, event);
            return;
        }

        match event {
            EngineEvent::StateChanged(state) => self.on_state_changed(state),
            EngineEvent::AboutToFinish => self.on_about_to_finish(),
            EngineEvent::ClientDisconnected => self.on_client_disconnected(),
            EngineEvent::SeekedTo(position) => self.emit(MediaHubEvent::SeekedTo {
                key: self.key,
                position,
                timestamp: time::now(),
            }),
            EngineEvent::EndOfStream => self.emit(MediaHubEvent::EndOfStream {
                key: self.key,
                timestamp: time::now(),
            }),
            EngineEvent::PlaybackStatusChanged(status) => {
                self.emit(MediaHubEvent::PlaybackStatusChanged {
                    key: self.key,
                    status,
                    timestamp: time::now(),
                })
            }
            EngineEvent::VideoDimensionChanged { height, width } => {
                self.emit(MediaHubEvent::VideoDimensionChanged {
                    key: self.key,
                    dimensions: pack_dimensions(height, width),
                    timestamp: time::now(),
                })
            }
            EngineEvent::Fault(fault) => {
                let error = fault.classify();
                if error == PlayerError::NoError {
                    return;
                }
                warn!("Session {}: engine fault {:?} -> {}", self.key, fault, error);
                self.emit(MediaHubEvent::Error {
                    key: self.key,
                    error,
                    timestamp: time::now(),
                });
            }
            EngineEvent::TagAvailable { uri, .. } => {
                // Picked up through engine.track_metadata() on the next play
                debug!("Session {}: tags available for {}", self.key, uri);
            }
            EngineEvent::OrientationChanged(orientation) => self.update(
                |p| &mut p.orientation,
                orientation,
                PlayerProperty::Orientation,
            ),
        }
    }

    fn on_state_changed(self: &Arc<Self>, state: EngineState) {
        let previous = {
            let mut previous = self.lock_previous_state();
            std::mem::replace(&mut *previous, state)
        };
        debug!("Session {}: engine {:?} -> {:?}", self.key, previous, state);

        match state {
            EngineState::Playing => {
                let (_, metadata) = self.engine.track_metadata();
                self.update(
                    |p| &mut p.metadata_for_current_track,
                    metadata,
                    PlayerProperty::MetadataForCurrentTrack,
                );
                self.update(
                    |p| &mut p.playback_status,
                    PlaybackStatus::Playing,
                    PlayerProperty::PlaybackStatus,
                );
                // One lease per playing run; a repeated report is not a new run
                if previous != EngineState::Playing {
                    self.wakelocks
                        .acquire(WakelockKind::for_content(self.engine.is_video_source()));
                }
            }
            EngineState::Ready | EngineState::Paused | EngineState::Stopped => {
                self.update(
                    |p| &mut p.playback_status,
                    state.playback_status(),
                    PlayerProperty::PlaybackStatus,
                );
                if previous == EngineState::Playing {
                    let kind = WakelockKind::for_content(self.engine.is_video_source());
                    self.schedule_release(kind);
                }
            }
        }
    }

    fn schedule_release(self: &Arc<Self>, kind: WakelockKind) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let delay = self.release_delay;
        debug!("Session {}: releasing {:?} wakelock in {:?}", self.key, kind, delay);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match weak.upgrade() {
                Some(session) if !session.torn_down.load(Ordering::SeqCst) => {
                    session.wakelocks.release(kind);
                }
                _ => debug!("Delayed {:?} release skipped, session gone", kind),
            }
        });
    }

    fn on_about_to_finish(&self) {
        let next = {
            let queue = self.lock_queue();
            queue.next().map(|id| {
                let uri = queue.locator_for(&id);
                (id, uri)
            })
        };

        let Some((id, uri)) = next else {
            debug!("Session {}: about to finish, nothing queued", self.key);
            return;
        };
        if uri.is_empty() {
            return;
        }

        info!("Session {}: advancing to {} ({})", self.key, id, uri);
        if !self.open(&uri) {
            warn!("Session {}: failed to open next track {}", self.key, uri);
        }
        self.lock_queue().advance_to(&id);
    }

    fn on_client_disconnected(&self) {
        info!("Session {}: client disconnected", self.key);
        self.wakelocks.force_release_all();

        if self.disconnected.swap(true, Ordering::SeqCst) {
            return;
        }
        self.emit(MediaHubEvent::ClientDisconnected {
            key: self.key,
            timestamp: time::now(),
        });
        if let Some(tx) = &self.disconnect_tx {
            // Broker gone during shutdown
            let _ = tx.send(self.key);
        }
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Open a locator; no authorization happens at this layer
    pub fn open(&self, uri: &str) -> bool {
        if uri.is_empty() {
            return false;
        }
        self.engine.open_resource_for_uri(uri)
    }

    pub fn open_with_headers(&self, uri: &str, headers: &Headers) -> bool {
        if uri.is_empty() {
            return false;
        }
        self.engine.open_resource_for_uri_with_headers(uri, headers)
    }

    pub fn play(&self) -> bool {
        self.engine.play()
    }

    pub fn pause(&self) -> bool {
        self.engine.pause()
    }

    pub fn stop(&self) -> bool {
        if self.playback_status() == PlaybackStatus::Stopped {
            return true;
        }
        self.engine.stop()
    }

    /// Seek to an absolute offset in microseconds
    pub fn seek(&self, offset_us: u64) -> bool {
        self.engine.seek_to(time::ticks_to_duration(offset_us))
    }

    pub fn create_video_sink(&self, texture_id: u32) {
        self.engine.create_video_sink(texture_id);
    }

    /// Accepted and ignored
    pub fn next(&self) -> bool {
        debug!("Session {}: next requested (no-op)", self.key);
        true
    }

    /// Accepted and ignored
    pub fn previous(&self) -> bool {
        debug!("Session {}: previous requested (no-op)", self.key);
        true
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    pub fn properties(&self) -> PropertiesSnapshot {
        PropertiesSnapshot::new(
            self.key,
            self.read_properties().clone(),
            self.engine.position(),
            self.engine.duration(),
            self.engine.is_video_source(),
            self.engine.is_audio_source(),
        )
    }

    pub fn playback_status(&self) -> PlaybackStatus {
        self.read_properties().playback_status
    }

    pub fn metadata_for_current_track(&self) -> TrackMetadata {
        self.read_properties().metadata_for_current_track.clone()
    }

    pub fn lifetime(&self) -> Lifetime {
        self.read_properties().lifetime
    }

    pub fn orientation(&self) -> Orientation {
        self.read_properties().orientation
    }

    /// Microseconds
    pub fn position(&self) -> u64 {
        self.engine.position()
    }

    /// Microseconds
    pub fn duration(&self) -> u64 {
        self.engine.duration()
    }

    pub fn is_video_source(&self) -> bool {
        self.engine.is_video_source()
    }

    pub fn is_audio_source(&self) -> bool {
        self.engine.is_audio_source()
    }

    pub fn set_loop_status(&self, status: LoopStatus) {
        self.update(|p| &mut p.loop_status, status, PlayerProperty::LoopStatus);
    }

    pub fn set_shuffle(&self, shuffle: bool) {
        self.update(|p| &mut p.shuffle, shuffle, PlayerProperty::Shuffle);
    }

    /// Clamped to 0.0..=1.0 and mirrored to the engine
    pub fn set_volume(&self, volume: f64) {
        let volume = volume.clamp(0.0, 1.0);
        self.engine.set_volume(volume);
        self.update(|p| &mut p.volume, volume, PlayerProperty::Volume);
    }

    /// Clamped to the supported rate range
    pub fn set_playback_rate(&self, rate: f64) {
        let rate = {
            let props = self.read_properties();
            rate.clamp(props.minimum_rate, props.maximum_rate)
        };
        self.update(|p| &mut p.playback_rate, rate, PlayerProperty::PlaybackRate);
    }

    pub fn set_audio_stream_role(&self, role: AudioStreamRole) {
        self.engine.set_audio_stream_role(role);
        self.update(
            |p| &mut p.audio_stream_role,
            role,
            PlayerProperty::AudioStreamRole,
        );
    }

    pub fn set_lifetime(&self, lifetime: Lifetime) {
        self.engine.set_lifetime(lifetime);
        self.update(|p| &mut p.lifetime, lifetime, PlayerProperty::Lifetime);
    }

    /// Apply every field present in `update`
    pub fn apply_update(&self, update: &PropertiesUpdate) {
        if let Some(status) = update.loop_status {
            self.set_loop_status(status);
        }
        if let Some(shuffle) = update.shuffle {
            self.set_shuffle(shuffle);
        }
        if let Some(volume) = update.volume {
            self.set_volume(volume);
        }
        if let Some(rate) = update.playback_rate {
            self.set_playback_rate(rate);
        }
        if let Some(role) = update.audio_stream_role {
            self.set_audio_stream_role(role);
        }
        if let Some(lifetime) = update.lifetime {
            self.set_lifetime(lifetime);
        }
    }

    // ------------------------------------------------------------------
    // Track queue
    // ------------------------------------------------------------------

    pub fn add_track(&self, uri: &str, anchor: Option<&TrackId>, make_current: bool) -> TrackId {
        self.lock_queue().add(uri, anchor, make_current)
    }

    pub fn remove_track(&self, id: &TrackId) -> bool {
        self.lock_queue().remove(id)
    }

    pub fn go_to_track(&self, id: &TrackId) {
        self.lock_queue().go_to(id);
    }

    pub fn tracks(&self) -> Vec<TrackId> {
        self.lock_queue().tracks().to_vec()
    }

    pub fn can_edit_tracks(&self) -> bool {
        self.lock_queue().can_edit()
    }

    pub fn current_track(&self) -> Option<TrackId> {
        self.lock_queue().current().cloned()
    }

    pub fn locator_for(&self, id: &TrackId) -> String {
        self.lock_queue().locator_for(id)
    }

    pub fn metadata_for(&self, id: &TrackId) -> TrackMetadata {
        self.lock_queue().metadata_for(id)
    }

    // ------------------------------------------------------------------
    // Diagnostics and teardown
    // ------------------------------------------------------------------

    pub fn wakelock_counts(&self) -> WakelockCounts {
        self.wakelocks.counts()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Tear the session down; later calls do nothing
    pub fn shutdown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }

        self.wakelocks.force_release_all();
        if let Some(task) = self.lock_event_task().take() {
            task.abort();
        }
        self.engine.reset();
        self.lock_queue().clear();

        info!("Player session {} torn down", self.key);
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Store `value` and emit `PropertyChanged` if it differs
    fn update<T: PartialEq + Clone>(
        &self,
        select: impl FnOnce(&mut PlayerProperties) -> &mut T,
        value: T,
        wrap: impl FnOnce(T) -> PlayerProperty,
    ) {
        let changed = {
            let mut props = self.write_properties();
            let slot = select(&mut props);
            if *slot == value {
                false
            } else {
                *slot = value.clone();
                true
            }
        };

        if changed {
            self.emit(MediaHubEvent::PropertyChanged {
                key: self.key,
                property: wrap(value),
                timestamp: time::now(),
            });
        }
    }

    fn emit(&self, event: MediaHubEvent) {
        self.bus.emit_lossy(event);
    }

    fn read_properties(&self) -> RwLockReadGuard<'_, PlayerProperties> {
        self.properties.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_properties(&self) -> RwLockWriteGuard<'_, PlayerProperties> {
        self.properties.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_queue(&self) -> MutexGuard<'_, TrackQueue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_previous_state(&self) -> MutexGuard<'_, EngineState> {
        self.previous_state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_event_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.event_task.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Height in the upper 32 bits, width in the lower 32 bits
pub fn pack_dimensions(height: u32, width: u32) -> u64 {
    ((height as u64) << 32) | width as u64
}

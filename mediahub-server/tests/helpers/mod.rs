//! Shared test fixtures
//!
//! - `FakeEngine`: scriptable engine that records calls and never emits
//!   events on its own; tests feed events explicitly
//! - `RecordingPower`: power client counting acquires and releases
//! - `FakeEngineFactory`: hands out fake engines and keeps their event
//!   senders so tests can inject notifications
//!
//! Calls that matter for ordering are appended to a shared `Journal`.

#![allow(dead_code)]

use mediahub_common::events::{
    keys, AudioStreamRole, EventBus, Lifetime, MediaHubEvent, Orientation, PlayerKey,
    TrackMetadata,
};
use mediahub_server::engine::{
    Engine, EngineEvent, EngineFactory, EngineHandle, EngineState, Headers, MetadataExtractor,
};
use mediahub_server::player::{PlayerSession, SessionSettings};
use mediahub_server::power::{DisplayCookie, PowerError, PowerResourceClient, SystemCookie};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

pub const TEST_RELEASE_DELAY: Duration = Duration::from_millis(4000);

/// Ordered log of interesting calls across fakes
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

// ============================================================================
// Power
// ============================================================================

#[derive(Default)]
pub struct RecordingPower {
    pub display_acquires: AtomicUsize,
    pub display_releases: AtomicUsize,
    pub system_acquires: AtomicUsize,
    pub system_releases: AtomicUsize,
    pub fail_acquire: AtomicBool,
    journal: Journal,
}

impl RecordingPower {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    pub fn system_acquires(&self) -> usize {
        self.system_acquires.load(Ordering::SeqCst)
    }

    pub fn system_releases(&self) -> usize {
        self.system_releases.load(Ordering::SeqCst)
    }

    pub fn display_acquires(&self) -> usize {
        self.display_acquires.load(Ordering::SeqCst)
    }

    pub fn display_releases(&self) -> usize {
        self.display_releases.load(Ordering::SeqCst)
    }
}

impl PowerResourceClient for RecordingPower {
    fn acquire_display(&self) -> Result<DisplayCookie, PowerError> {
        if self.fail_acquire.load(Ordering::SeqCst) {
            return Err(PowerError::Unavailable("test".into()));
        }
        self.journal.record("power.acquire_display");
        Ok(self.display_acquires.fetch_add(1, Ordering::SeqCst) as i32)
    }

    fn release_display(&self, _cookie: DisplayCookie) -> Result<(), PowerError> {
        self.journal.record("power.release_display");
        self.display_releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn acquire_system(&self, name: &str) -> Result<SystemCookie, PowerError> {
        if self.fail_acquire.load(Ordering::SeqCst) {
            return Err(PowerError::Unavailable("test".into()));
        }
        self.journal.record("power.acquire_system");
        let n = self.system_acquires.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}-{}", name, n))
    }

    fn release_system(&self, _cookie: &SystemCookie) -> Result<(), PowerError> {
        self.journal.record("power.release_system");
        self.system_releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Engine
// ============================================================================

pub struct UrlExtractor;

impl MetadataExtractor for UrlExtractor {
    fn meta_data_for_track_with_uri(&self, uri: &str) -> TrackMetadata {
        [(keys::URL, uri)].into_iter().collect()
    }
}

struct FakeState {
    state: EngineState,
    opened: Vec<String>,
    opened_headers: Vec<Headers>,
    metadata: TrackMetadata,
    volume: f64,
    role: AudioStreamRole,
    lifetime: Lifetime,
    orientation: Orientation,
    position: u64,
    seeks: Vec<Duration>,
    video_sinks: Vec<u32>,
    stop_calls: usize,
    play_calls: usize,
    pause_calls: usize,
    resets: usize,
}

pub struct FakeEngine {
    inner: Mutex<FakeState>,
    video: AtomicBool,
    journal: Journal,
}

impl FakeEngine {
    pub fn new(journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(FakeState {
                state: EngineState::Ready,
                opened: Vec::new(),
                opened_headers: Vec::new(),
                metadata: TrackMetadata::new(),
                volume: 1.0,
                role: AudioStreamRole::Alarm,
                lifetime: Lifetime::Resumable,
                orientation: Orientation::Rotate0,
                position: 0,
                seeks: Vec::new(),
                video_sinks: Vec::new(),
                stop_calls: 0,
                play_calls: 0,
                pause_calls: 0,
                resets: 0,
            }),
            video: AtomicBool::new(false),
            journal,
        })
    }

    pub fn set_video(&self, video: bool) {
        self.video.store(video, Ordering::SeqCst);
    }

    pub fn set_track_metadata(&self, metadata: TrackMetadata) {
        self.inner.lock().unwrap().metadata = metadata;
    }

    pub fn set_position(&self, position: u64) {
        self.inner.lock().unwrap().position = position;
    }

    pub fn opened(&self) -> Vec<String> {
        self.inner.lock().unwrap().opened.clone()
    }

    pub fn opened_headers(&self) -> Vec<Headers> {
        self.inner.lock().unwrap().opened_headers.clone()
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.inner.lock().unwrap().seeks.clone()
    }

    pub fn video_sinks(&self) -> Vec<u32> {
        self.inner.lock().unwrap().video_sinks.clone()
    }

    pub fn stop_calls(&self) -> usize {
        self.inner.lock().unwrap().stop_calls
    }

    pub fn play_calls(&self) -> usize {
        self.inner.lock().unwrap().play_calls
    }

    pub fn pause_calls(&self) -> usize {
        self.inner.lock().unwrap().pause_calls
    }

    pub fn resets(&self) -> usize {
        self.inner.lock().unwrap().resets
    }
}

impl Engine for FakeEngine {
    fn metadata_extractor(&self) -> Arc<dyn MetadataExtractor> {
        Arc::new(UrlExtractor)
    }

    fn state(&self) -> EngineState {
        self.inner.lock().unwrap().state
    }

    fn open_resource_for_uri(&self, uri: &str) -> bool {
        self.journal.record("engine.open");
        self.inner.lock().unwrap().opened.push(uri.to_string());
        true
    }

    fn open_resource_for_uri_with_headers(&self, uri: &str, headers: &Headers) -> bool {
        self.journal.record("engine.open_with_headers");
        let mut inner = self.inner.lock().unwrap();
        inner.opened.push(uri.to_string());
        inner.opened_headers.push(headers.clone());
        true
    }

    fn create_video_sink(&self, texture_id: u32) {
        self.inner.lock().unwrap().video_sinks.push(texture_id);
    }

    fn play(&self) -> bool {
        self.inner.lock().unwrap().play_calls += 1;
        true
    }

    fn pause(&self) -> bool {
        self.inner.lock().unwrap().pause_calls += 1;
        true
    }

    fn stop(&self) -> bool {
        self.inner.lock().unwrap().stop_calls += 1;
        true
    }

    fn seek_to(&self, offset: Duration) -> bool {
        self.inner.lock().unwrap().seeks.push(offset);
        true
    }

    fn position(&self) -> u64 {
        self.inner.lock().unwrap().position
    }

    fn duration(&self) -> u64 {
        180_000_000
    }

    fn is_video_source(&self) -> bool {
        self.video.load(Ordering::SeqCst)
    }

    fn is_audio_source(&self) -> bool {
        !self.video.load(Ordering::SeqCst)
    }

    fn volume(&self) -> f64 {
        self.inner.lock().unwrap().volume
    }

    fn set_volume(&self, volume: f64) {
        self.inner.lock().unwrap().volume = volume;
    }

    fn audio_stream_role(&self) -> AudioStreamRole {
        self.inner.lock().unwrap().role
    }

    fn set_audio_stream_role(&self, role: AudioStreamRole) {
        self.inner.lock().unwrap().role = role;
    }

    fn orientation(&self) -> Orientation {
        self.inner.lock().unwrap().orientation
    }

    fn lifetime(&self) -> Lifetime {
        self.inner.lock().unwrap().lifetime
    }

    fn set_lifetime(&self, lifetime: Lifetime) {
        self.inner.lock().unwrap().lifetime = lifetime;
    }

    fn track_metadata(&self) -> (String, TrackMetadata) {
        let inner = self.inner.lock().unwrap();
        (
            inner.opened.last().cloned().unwrap_or_default(),
            inner.metadata.clone(),
        )
    }

    fn reset(&self) {
        self.journal.record("engine.reset");
        self.inner.lock().unwrap().resets += 1;
    }
}

/// Factory keeping every engine it created plus the engine's event sender
#[derive(Default)]
pub struct FakeEngineFactory {
    pub journal: Journal,
    engines: Mutex<HashMap<PlayerKey, (Arc<FakeEngine>, mpsc::UnboundedSender<EngineEvent>)>>,
}

impl FakeEngineFactory {
    pub fn engine(&self, key: PlayerKey) -> Arc<FakeEngine> {
        self.engines.lock().unwrap()[&key].0.clone()
    }

    /// Deliver an event as if the engine had raised it
    pub fn send(&self, key: PlayerKey, event: EngineEvent) {
        let tx = self.engines.lock().unwrap()[&key].1.clone();
        // Session may already be gone
        let _ = tx.send(event);
    }
}

impl EngineFactory for FakeEngineFactory {
    fn create_engine(&self, key: PlayerKey) -> EngineHandle {
        let engine = FakeEngine::new(self.journal.clone());
        let (tx, events) = mpsc::unbounded_channel();
        self.engines
            .lock()
            .unwrap()
            .insert(key, (engine.clone(), tx));
        EngineHandle { engine, events }
    }
}

// ============================================================================
// Session fixtures
// ============================================================================

pub struct SessionFixture {
    pub session: Arc<PlayerSession>,
    pub engine: Arc<FakeEngine>,
    pub power: Arc<RecordingPower>,
    pub bus: EventBus,
    pub journal: Journal,
    pub disconnects: mpsc::UnboundedReceiver<PlayerKey>,
}

/// Session without an event task; tests call `handle_engine_event` directly
pub fn session_fixture() -> SessionFixture {
    let journal = Journal::default();
    let engine = FakeEngine::new(journal.clone());
    let power = Arc::new(RecordingPower::with_journal(journal.clone()));
    let bus = EventBus::new(256);
    let (tx, disconnects) = mpsc::unbounded_channel();

    let session = PlayerSession::new(
        7,
        engine.clone(),
        power.clone(),
        SessionSettings {
            release_delay: TEST_RELEASE_DELAY,
            system_lock_name: "test-playback".to_string(),
        },
        bus.clone(),
        Some(tx),
    );

    SessionFixture {
        session,
        engine,
        power,
        bus,
        journal,
        disconnects,
    }
}

/// Drain everything currently buffered on a bus receiver
pub fn drain(rx: &mut broadcast::Receiver<MediaHubEvent>) -> Vec<MediaHubEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Let spawned tasks run; with a paused clock this also advances time
pub async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Poll `condition` until it holds or roughly a second passes
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

//! Headless engine
//!
//! A backend that performs no decoding. It keeps transport state, derives
//! the content kind from the locator's extension and reports the same event
//! sequence a real backend would. The daemon uses it when no media backend
//! is linked in.

use super::{
    Engine, EngineEvent, EngineFactory, EngineHandle, EngineState, Headers, MetadataExtractor,
};
use mediahub_common::events::{
    keys, AudioStreamRole, Lifetime, Orientation, PlaybackStatus, PlayerKey, TrackMetadata,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mkv", "avi", "webm", "mov", "ogv", "3gp"];

/// Classification of a locator by extension
fn is_video_locator(uri: &str) -> bool {
    extension(uri)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn extension(uri: &str) -> Option<String> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Extracts what can be known from the locator alone
#[derive(Debug, Default)]
pub struct LocatorMetadataExtractor;

impl MetadataExtractor for LocatorMetadataExtractor {
    fn meta_data_for_track_with_uri(&self, uri: &str) -> TrackMetadata {
        let mut md = TrackMetadata::new();
        if uri.is_empty() {
            return md;
        }
        md.set(keys::URL, uri);

        let path = uri.split(['?', '#']).next().unwrap_or(uri);
        if let Some(file) = path.rsplit('/').next().filter(|f| !f.is_empty()) {
            let title = file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file);
            md.set(keys::TITLE, title);
        }
        md
    }
}

struct HeadlessState {
    uri: String,
    state: EngineState,
    /// Position accumulated before the current playing run
    base_position: Duration,
    playing_since: Option<Instant>,
    volume: f64,
    role: AudioStreamRole,
    lifetime: Lifetime,
    orientation: Orientation,
    track_metadata: (String, TrackMetadata),
}

impl HeadlessState {
    fn position(&self) -> Duration {
        match self.playing_since {
            Some(since) => self.base_position + since.elapsed(),
            None => self.base_position,
        }
    }
}

/// Engine without a media pipeline
pub struct HeadlessEngine {
    key: PlayerKey,
    extractor: Arc<LocatorMetadataExtractor>,
    inner: Mutex<HeadlessState>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl HeadlessEngine {
    /// Create an engine and the receiving end of its event channel
    pub fn new(key: PlayerKey) -> (Arc<Self>, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Arc::new(Self {
            key,
            extractor: Arc::new(LocatorMetadataExtractor),
            inner: Mutex::new(HeadlessState {
                uri: String::new(),
                state: EngineState::Ready,
                base_position: Duration::ZERO,
                playing_since: None,
                volume: 1.0,
                role: AudioStreamRole::default(),
                lifetime: Lifetime::default(),
                orientation: Orientation::default(),
                track_metadata: (String::new(), TrackMetadata::new()),
            }),
            events: tx,
        });
        (engine, rx)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HeadlessState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn send(&self, event: EngineEvent) {
        // Receiver gone means the session was torn down
        let _ = self.events.send(event);
    }

    fn transition(&self, next: EngineState, status: PlaybackStatus) {
        {
            let mut inner = self.lock();
            // State reports fire on change only
            if inner.state == next {
                return;
            }
            if next == EngineState::Playing {
                inner.playing_since.get_or_insert_with(Instant::now);
            } else if let Some(since) = inner.playing_since.take() {
                inner.base_position += since.elapsed();
            }
            if next == EngineState::Stopped {
                inner.base_position = Duration::ZERO;
            }
            inner.state = next;
        }
        debug!("Headless engine {} -> {:?}", self.key, next);
        self.send(EngineEvent::StateChanged(next));
        self.send(EngineEvent::PlaybackStatusChanged(status));
    }

    fn open(&self, uri: &str) -> bool {
        let metadata = self.extractor.meta_data_for_track_with_uri(uri);
        {
            let mut inner = self.lock();
            inner.uri = uri.to_string();
            inner.base_position = Duration::ZERO;
            inner.playing_since = inner.playing_since.map(|_| Instant::now());
            inner.track_metadata = (uri.to_string(), metadata.clone());
        }
        info!("Headless engine {} opened {}", self.key, uri);
        self.send(EngineEvent::TagAvailable {
            uri: uri.to_string(),
            metadata,
        });
        true
    }
}

impl Engine for HeadlessEngine {
    fn metadata_extractor(&self) -> Arc<dyn MetadataExtractor> {
        self.extractor.clone()
    }

    fn state(&self) -> EngineState {
        self.lock().state
    }

    fn open_resource_for_uri(&self, uri: &str) -> bool {
        self.open(uri)
    }

    fn open_resource_for_uri_with_headers(&self, uri: &str, headers: &Headers) -> bool {
        debug!("Headless engine ignoring {} request headers", headers.len());
        self.open(uri)
    }

    fn create_video_sink(&self, texture_id: u32) {
        debug!("Headless engine {} has no video sink (texture {})", self.key, texture_id);
    }

    fn play(&self) -> bool {
        if self.lock().uri.is_empty() {
            return false;
        }
        self.transition(EngineState::Playing, PlaybackStatus::Playing);
        true
    }

    fn pause(&self) -> bool {
        self.transition(EngineState::Paused, PlaybackStatus::Paused);
        true
    }

    fn stop(&self) -> bool {
        if self.lock().state == EngineState::Stopped {
            return true;
        }
        self.transition(EngineState::Stopped, PlaybackStatus::Stopped);
        true
    }

    fn seek_to(&self, offset: Duration) -> bool {
        {
            let mut inner = self.lock();
            inner.base_position = offset;
            inner.playing_since = inner.playing_since.map(|_| Instant::now());
        }
        self.send(EngineEvent::SeekedTo(offset.as_micros() as u64));
        true
    }

    fn position(&self) -> u64 {
        self.lock().position().as_micros() as u64
    }

    fn duration(&self) -> u64 {
        // Unknown without a demuxer
        0
    }

    fn is_video_source(&self) -> bool {
        is_video_locator(&self.lock().uri)
    }

    fn is_audio_source(&self) -> bool {
        let inner = self.lock();
        !inner.uri.is_empty() && !is_video_locator(&inner.uri)
    }

    fn volume(&self) -> f64 {
        self.lock().volume
    }

    fn set_volume(&self, volume: f64) {
        self.lock().volume = volume;
    }

    fn audio_stream_role(&self) -> AudioStreamRole {
        self.lock().role
    }

    fn set_audio_stream_role(&self, role: AudioStreamRole) {
        self.lock().role = role;
    }

    fn orientation(&self) -> Orientation {
        self.lock().orientation
    }

    fn lifetime(&self) -> Lifetime {
        self.lock().lifetime
    }

    fn set_lifetime(&self, lifetime: Lifetime) {
        self.lock().lifetime = lifetime;
    }

    fn track_metadata(&self) -> (String, TrackMetadata) {
        self.lock().track_metadata.clone()
    }

    fn reset(&self) {
        let mut inner = self.lock();
        inner.uri.clear();
        inner.state = EngineState::Ready;
        inner.base_position = Duration::ZERO;
        inner.playing_since = None;
        inner.track_metadata = (String::new(), TrackMetadata::new());
    }
}

/// Factory handing out one headless engine per session
#[derive(Debug, Default)]
pub struct HeadlessEngineFactory;

impl EngineFactory for HeadlessEngineFactory {
    fn create_engine(&self, key: PlayerKey) -> EngineHandle {
        let (engine, events) = HeadlessEngine::new(key);
        EngineHandle { engine, events }
    }
}

//! Track queue
//!
//! Ordered list of unique track ids with a per-id (locator, metadata) cache.
//! Metadata is extracted synchronously when a track is added. Lookups for
//! unknown ids return empty values rather than errors.

use crate::engine::MetadataExtractor;
use mediahub_common::events::{EventBus, MediaHubEvent, PlayerKey, TrackId, TrackMetadata};
use mediahub_common::time;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Ordered track list owned by one session
pub struct TrackQueue {
    key: PlayerKey,
    /// Prefix for generated ids
    id_prefix: String,
    /// Monotonic counter scoped to this queue
    next_track: u64,
    tracks: Vec<TrackId>,
    metadata_cache: HashMap<TrackId, (String, TrackMetadata)>,
    current: Option<TrackId>,
    can_edit: bool,
    extractor: Arc<dyn MetadataExtractor>,
    bus: EventBus,
}

impl TrackQueue {
    pub fn new(key: PlayerKey, extractor: Arc<dyn MetadataExtractor>, bus: EventBus) -> Self {
        Self {
            key,
            id_prefix: format!("/sessions/{}/TrackList", key),
            next_track: 0,
            tracks: Vec::new(),
            metadata_cache: HashMap::new(),
            current: None,
            can_edit: true,
            extractor,
            bus,
        }
    }

    /// Add a track before `anchor`, or at the end when the anchor is absent
    /// or not in the queue
    pub fn add(&mut self, uri: &str, anchor: Option<&TrackId>, make_current: bool) -> TrackId {
        let id = TrackId::new(format!("{}/{}", self.id_prefix, self.next_track));
        self.next_track += 1;

        let index = anchor
            .and_then(|a| self.tracks.iter().position(|t| t == a))
            .unwrap_or(self.tracks.len());
        self.tracks.insert(index, id.clone());

        match self.metadata_cache.get_mut(&id) {
            Some(entry) => entry.0 = uri.to_string(),
            None => {
                let metadata = self.extractor.meta_data_for_track_with_uri(uri);
                self.metadata_cache.insert(id.clone(), (uri.to_string(), metadata));
            }
        }

        if make_current {
            self.current = Some(id.clone());
            self.go_to(&id);
        }

        debug!("Session {}: added track {} at index {}", self.key, id, index);
        self.bus.emit_lossy(MediaHubEvent::TrackAdded {
            key: self.key,
            track_id: id.clone(),
            timestamp: time::now(),
        });

        id
    }

    /// Remove a track; returns whether anything was removed
    pub fn remove(&mut self, id: &TrackId) -> bool {
        let Some(index) = self.tracks.iter().position(|t| t == id) else {
            return false;
        };
        self.tracks.remove(index);
        self.metadata_cache.remove(id);
        if self.current.as_ref() == Some(id) {
            self.current = None;
        }

        debug!("Session {}: removed track {}", self.key, id);
        self.bus.emit_lossy(MediaHubEvent::TrackRemoved {
            key: self.key,
            track_id: id.clone(),
            timestamp: time::now(),
        });
        true
    }

    /// Client navigation request
    ///
    /// Extension point: navigation is not acted upon at this layer.
    pub fn go_to(&mut self, id: &TrackId) {
        debug!("Session {}: go_to {} (no-op)", self.key, id);
    }

    pub fn locator_for(&self, id: &TrackId) -> String {
        self.metadata_cache
            .get(id)
            .map(|(uri, _)| uri.clone())
            .unwrap_or_default()
    }

    pub fn metadata_for(&self, id: &TrackId) -> TrackMetadata {
        self.metadata_cache
            .get(id)
            .map(|(_, md)| md.clone())
            .unwrap_or_default()
    }

    /// Ids in queue order
    pub fn tracks(&self) -> &[TrackId] {
        &self.tracks
    }

    pub fn can_edit(&self) -> bool {
        self.can_edit
    }

    pub fn current(&self) -> Option<&TrackId> {
        self.current.as_ref()
    }

    /// Track following the current one, or the first track when nothing is
    /// current yet
    pub fn next(&self) -> Option<TrackId> {
        match &self.current {
            Some(current) => {
                let index = self.tracks.iter().position(|t| t == current)?;
                self.tracks.get(index + 1).cloned()
            }
            None => self.tracks.first().cloned(),
        }
    }

    pub fn has_next(&self) -> bool {
        self.next().is_some()
    }

    /// Mark `id` as current after the session advanced playback to it
    pub fn advance_to(&mut self, id: &TrackId) {
        if self.tracks.contains(id) {
            self.current = Some(id.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Drop every track; only used on session teardown
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.metadata_cache.clear();
        self.current = None;
    }
}

//! Client-facing control surface of one session
//!
//! Adds what the transport needs on top of [`PlayerSession`]: the
//! security-context lookup and access check in front of `open`, and
//! PlayPause.

use super::session::PlayerSession;
use crate::engine::Headers;
use crate::security::{access_policy, ContextResolver};
use mediahub_common::events::PlaybackStatus;
use std::sync::Arc;
use tracing::{debug, info};

pub struct PlayerControl {
    session: Arc<PlayerSession>,
    resolver: Arc<dyn ContextResolver>,
}

impl PlayerControl {
    pub fn new(session: Arc<PlayerSession>, resolver: Arc<dyn ContextResolver>) -> Self {
        Self { session, resolver }
    }

    pub fn session(&self) -> &Arc<PlayerSession> {
        &self.session
    }

    /// Open `uri` on behalf of `client_id`
    ///
    /// Returns false when the client may not open the locator; the engine is
    /// not touched in that case.
    pub async fn open_uri(&self, client_id: &str, uri: &str, headers: Option<&Headers>) -> bool {
        let context = self.resolver.resolve(client_id).await;
        if !access_policy::decide(&context, uri) {
            info!(
                "Session {}: client '{}' denied access to {}",
                self.session.key(),
                client_id,
                uri
            );
            return false;
        }

        match headers {
            Some(headers) => self.session.open_with_headers(uri, headers),
            None => self.session.open(uri),
        }
    }

    /// Play when not playing, pause when playing
    pub fn play_pause(&self) -> bool {
        match self.session.playback_status() {
            PlaybackStatus::Playing => self.session.pause(),
            PlaybackStatus::Ready | PlaybackStatus::Paused | PlaybackStatus::Stopped => {
                self.session.play()
            }
            PlaybackStatus::Null => {
                debug!("Session {}: play_pause with nothing loaded", self.session.key());
                false
            }
        }
    }
}

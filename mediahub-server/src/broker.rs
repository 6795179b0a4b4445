//! Session broker
//!
//! Owns every live session keyed by `PlayerKey`. Sessions are created through
//! an [`EngineFactory`] and destroyed on request or when their client goes
//! away. Resumable sessions outlive their client; normal ones do not.

use crate::engine::EngineFactory;
use crate::error::{Error, Result};
use crate::player::{PlayerControl, PlayerSession, SessionSettings};
use crate::power::PowerResourceClient;
use crate::security::ContextResolver;
use mediahub_common::events::{EventBus, Lifetime, MediaHubEvent, PlayerKey};
use mediahub_common::time;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub struct SessionBroker {
    factory: Arc<dyn EngineFactory>,
    power: Arc<dyn PowerResourceClient>,
    resolver: Arc<dyn ContextResolver>,
    bus: EventBus,
    settings: SessionSettings,
    sessions: RwLock<HashMap<PlayerKey, Arc<PlayerSession>>>,
    next_key: AtomicU32,
    disconnect_tx: mpsc::UnboundedSender<PlayerKey>,
}

impl SessionBroker {
    /// Create the broker and spawn its disconnect reaper
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        power: Arc<dyn PowerResourceClient>,
        resolver: Arc<dyn ContextResolver>,
        settings: SessionSettings,
        bus: EventBus,
    ) -> Arc<Self> {
        let (disconnect_tx, mut disconnect_rx) = mpsc::unbounded_channel();

        let broker = Arc::new(Self {
            factory,
            power,
            resolver,
            bus,
            settings,
            sessions: RwLock::new(HashMap::new()),
            next_key: AtomicU32::new(0),
            disconnect_tx,
        });

        let weak: Weak<Self> = Arc::downgrade(&broker);
        tokio::spawn(async move {
            while let Some(key) = disconnect_rx.recv().await {
                let Some(broker) = weak.upgrade() else {
                    break;
                };
                broker.on_client_disconnected(key);
            }
        });

        broker
    }

    /// Create a session with a fresh key
    pub fn create_session(&self) -> Arc<PlayerSession> {
        let key = self.next_key.fetch_add(1, Ordering::SeqCst);
        let handle = self.factory.create_engine(key);
        let session = PlayerSession::start(
            key,
            handle,
            self.power.clone(),
            self.settings.clone(),
            self.bus.clone(),
            Some(self.disconnect_tx.clone()),
        );

        self.write_sessions().insert(key, session.clone());
        info!("Created session {}", key);
        self.bus.emit_lossy(MediaHubEvent::SessionCreated {
            key,
            timestamp: time::now(),
        });
        session
    }

    pub fn session(&self, key: PlayerKey) -> Result<Arc<PlayerSession>> {
        self.read_sessions()
            .get(&key)
            .cloned()
            .ok_or(Error::SessionNotFound(key))
    }

    /// Access-checked control surface for a session
    pub fn control(&self, key: PlayerKey) -> Result<PlayerControl> {
        Ok(PlayerControl::new(self.session(key)?, self.resolver.clone()))
    }

    /// Tear a session down and forget it
    pub fn destroy_session(&self, key: PlayerKey) -> Result<()> {
        let session = self
            .write_sessions()
            .remove(&key)
            .ok_or(Error::SessionNotFound(key))?;

        // Handlers may still hold clones; tear down now rather than on drop
        session.shutdown();

        info!("Destroyed session {}", key);
        self.bus.emit_lossy(MediaHubEvent::SessionDestroyed {
            key,
            timestamp: time::now(),
        });
        Ok(())
    }

    /// Keys of all live sessions, ascending
    pub fn session_keys(&self) -> Vec<PlayerKey> {
        let mut keys: Vec<PlayerKey> = self.read_sessions().keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn session_count(&self) -> usize {
        self.read_sessions().len()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Tear down every session; used on daemon shutdown
    pub fn shutdown_all(&self) {
        for key in self.session_keys() {
            // Concurrent destroy already removed it
            let _ = self.destroy_session(key);
        }
    }

    fn on_client_disconnected(&self, key: PlayerKey) {
        let lifetime = match self.session(key) {
            Ok(session) => session.lifetime(),
            Err(_) => {
                debug!("Disconnect for unknown session {}", key);
                return;
            }
        };

        match lifetime {
            Lifetime::Normal => {
                if self.destroy_session(key).is_ok() {
                    info!("Session {} destroyed after client disconnect", key);
                }
            }
            Lifetime::Resumable => {
                info!("Session {} kept for resumption after client disconnect", key);
            }
        }
    }

    fn read_sessions(&self) -> RwLockReadGuard<'_, HashMap<PlayerKey, Arc<PlayerSession>>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_sessions(&self) -> RwLockWriteGuard<'_, HashMap<PlayerKey, Arc<PlayerSession>>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for SessionBroker {
    fn drop(&mut self) {
        self.shutdown_all();
    }
}

//! Wakelock lease tracking
//!
//! Each session owns one `WakelockManager`. Display and system leases are
//! reference counted independently; the power service is only called on the
//! 0→1 and 1→0 transitions. Releases below zero are absorbed so late or
//! duplicate delayed releases are harmless.

use crate::power::{DisplayCookie, PowerResourceClient, SystemCookie};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Lease type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakelockKind {
    /// Keeps the screen on (video playback)
    Display,
    /// Keeps the system awake (audio playback)
    System,
}

impl WakelockKind {
    /// Lease type for the current content kind
    pub fn for_content(is_video_source: bool) -> Self {
        if is_video_source {
            WakelockKind::Display
        } else {
            WakelockKind::System
        }
    }
}

/// Snapshot of both lease counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WakelockCounts {
    pub display: u32,
    pub system: u32,
}

#[derive(Default)]
struct Leases {
    display_count: u32,
    system_count: u32,
    display_cookie: Option<DisplayCookie>,
    system_cookie: Option<SystemCookie>,
}

/// Refcounted lease tracker over a power-resource client
///
/// Counters, handles and the external call are guarded by one mutex so the
/// 0/1 transitions cannot interleave.
pub struct WakelockManager {
    power: Arc<dyn PowerResourceClient>,
    system_lock_name: String,
    leases: Mutex<Leases>,
}

impl WakelockManager {
    pub fn new(power: Arc<dyn PowerResourceClient>, system_lock_name: impl Into<String>) -> Self {
        Self {
            power,
            system_lock_name: system_lock_name.into(),
            leases: Mutex::new(Leases::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Leases> {
        self.leases.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Take one reference on a lease, acquiring it on the first reference
    ///
    /// A failed acquire keeps the counter incremented with no handle held;
    /// playback is not affected.
    pub fn acquire(&self, kind: WakelockKind) {
        let mut leases = self.lock();
        match kind {
            WakelockKind::Display => {
                leases.display_count += 1;
                if leases.display_count == 1 {
                    match self.power.acquire_display() {
                        Ok(cookie) => {
                            info!("Requested new display wakelock");
                            leases.display_cookie = Some(cookie);
                        }
                        Err(e) => warn!("Failed to request display wakelock: {}", e),
                    }
                }
            }
            WakelockKind::System => {
                leases.system_count += 1;
                if leases.system_count == 1 {
                    match self.power.acquire_system(&self.system_lock_name) {
                        Ok(cookie) => {
                            info!("Requested new system wakelock");
                            leases.system_cookie = Some(cookie);
                        }
                        Err(e) => warn!("Failed to request system wakelock: {}", e),
                    }
                }
            }
        }
    }

    /// Drop one reference on a lease, releasing it on the last reference
    pub fn release(&self, kind: WakelockKind) {
        let mut leases = self.lock();
        match kind {
            WakelockKind::Display => {
                if leases.display_count == 0 {
                    debug!("Display wakelock already released");
                    return;
                }
                leases.display_count -= 1;
                if leases.display_count == 0 {
                    self.release_display(&mut leases);
                }
            }
            WakelockKind::System => {
                if leases.system_count == 0 {
                    debug!("System wakelock already released");
                    return;
                }
                leases.system_count -= 1;
                if leases.system_count == 0 {
                    self.release_system(&mut leases);
                }
            }
        }
    }

    /// Zero both counters and release any held lease
    pub fn force_release_all(&self) {
        let mut leases = self.lock();
        leases.display_count = 0;
        leases.system_count = 0;
        self.release_display(&mut leases);
        self.release_system(&mut leases);
    }

    pub fn counts(&self) -> WakelockCounts {
        let leases = self.lock();
        WakelockCounts {
            display: leases.display_count,
            system: leases.system_count,
        }
    }

    /// Whether a lease handle is currently held for `kind`
    pub fn is_held(&self, kind: WakelockKind) -> bool {
        let leases = self.lock();
        match kind {
            WakelockKind::Display => leases.display_cookie.is_some(),
            WakelockKind::System => leases.system_cookie.is_some(),
        }
    }

    fn release_display(&self, leases: &mut Leases) {
        if let Some(cookie) = leases.display_cookie.take() {
            info!("Clearing display wakelock");
            if let Err(e) = self.power.release_display(cookie) {
                warn!("Failed to clear display wakelock: {}", e);
            }
        }
    }

    fn release_system(&self, leases: &mut Leases) {
        if let Some(cookie) = leases.system_cookie.take() {
            info!("Clearing system wakelock");
            if let Err(e) = self.power.release_system(&cookie) {
                warn!("Failed to clear system wakelock: {}", e);
            }
        }
    }
}

impl Drop for WakelockManager {
    fn drop(&mut self) {
        self.force_release_all();
    }
}

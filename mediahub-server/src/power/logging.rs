//! Power client that only logs
//!
//! Used when the daemon runs without a power-management service. Cookies
//! are synthesized so lease bookkeeping behaves the same way.

use super::{DisplayCookie, PowerError, PowerResourceClient, SystemCookie};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use tracing::info;

#[derive(Debug, Default)]
pub struct LoggingPowerClient {
    next_display: AtomicI32,
    next_system: AtomicU64,
}

impl LoggingPowerClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PowerResourceClient for LoggingPowerClient {
    fn acquire_display(&self) -> Result<DisplayCookie, PowerError> {
        let cookie = self.next_display.fetch_add(1, Ordering::Relaxed);
        info!("Requested new display wakelock (cookie {})", cookie);
        Ok(cookie)
    }

    fn release_display(&self, cookie: DisplayCookie) -> Result<(), PowerError> {
        info!("Clearing display wakelock (cookie {})", cookie);
        Ok(())
    }

    fn acquire_system(&self, name: &str) -> Result<SystemCookie, PowerError> {
        let n = self.next_system.fetch_add(1, Ordering::Relaxed);
        let cookie = format!("{}-{}", name, n);
        info!("Requested new system wakelock ({})", cookie);
        Ok(cookie)
    }

    fn release_system(&self, cookie: &SystemCookie) -> Result<(), PowerError> {
        info!("Clearing system wakelock ({})", cookie);
        Ok(())
    }
}

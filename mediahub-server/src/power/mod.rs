//! Power-resource service interface
//!
//! Display and system wakelocks are granted by an external service. Every
//! call is fallible; callers log failures and carry on.

pub mod logging;

use thiserror::Error;

/// Lease handle returned for a display wakelock
pub type DisplayCookie = i32;

/// Lease handle returned for a system wakelock
pub type SystemCookie = String;

/// Power-resource service failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PowerError {
    /// The service could not be reached
    #[error("power service unavailable: {0}")]
    Unavailable(String),

    /// The service refused the request
    #[error("power request rejected: {0}")]
    Rejected(String),
}

/// Client for the external power-resource service
pub trait PowerResourceClient: Send + Sync {
    /// Keep the display on
    fn acquire_display(&self) -> Result<DisplayCookie, PowerError>;

    fn release_display(&self, cookie: DisplayCookie) -> Result<(), PowerError>;

    /// Keep the system out of suspend, requested under `name`
    fn acquire_system(&self, name: &str) -> Result<SystemCookie, PowerError>;

    fn release_system(&self, cookie: &SystemCookie) -> Result<(), PowerError>;
}

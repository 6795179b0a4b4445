//! Engine fault classification
//!
//! Maps low-level engine faults onto the client error taxonomy. Faults that
//! match no known case are logged and mapped to `PlayerError::NoError`, which
//! callers treat as "do not surface".

use mediahub_common::events::PlayerError;
use tracing::warn;

/// Fault domain reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultDomain {
    Core,
    Resource,
    Stream,
    Other,
}

/// Core-domain fault codes
pub mod core_codes {
    pub const NEGOTIATION: i32 = 7;
    pub const MISSING_PLUGIN: i32 = 12;
}

/// Resource-domain fault codes
pub mod resource_codes {
    pub const NOT_FOUND: i32 = 3;
    pub const OPEN_READ: i32 = 5;
    pub const OPEN_WRITE: i32 = 6;
    pub const READ: i32 = 9;
    pub const WRITE: i32 = 10;
    pub const NOT_AUTHORIZED: i32 = 15;
}

/// Stream-domain fault codes
pub mod stream_codes {
    pub const CODEC_NOT_FOUND: i32 = 6;
}

/// A fault (error or warning) raised by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFault {
    pub domain: FaultDomain,
    pub code: i32,
    /// Free-form diagnostic text from the backend
    pub debug: String,
}

impl EngineFault {
    pub fn new(domain: FaultDomain, code: i32, debug: impl Into<String>) -> Self {
        Self {
            domain,
            code,
            debug: debug.into(),
        }
    }

    /// Classify into the client error taxonomy
    pub fn classify(&self) -> PlayerError {
        match self.domain {
            FaultDomain::Core => match self.code {
                core_codes::NEGOTIATION => PlayerError::ResourceError,
                core_codes::MISSING_PLUGIN => PlayerError::FormatError,
                _ => self.unhandled("core"),
            },
            FaultDomain::Resource => match self.code {
                resource_codes::NOT_FOUND
                | resource_codes::OPEN_READ
                | resource_codes::OPEN_WRITE
                | resource_codes::READ
                | resource_codes::WRITE => PlayerError::ResourceError,
                resource_codes::NOT_AUTHORIZED => PlayerError::AccessDeniedError,
                _ => self.unhandled("resource"),
            },
            FaultDomain::Stream => match self.code {
                stream_codes::CODEC_NOT_FOUND => PlayerError::FormatError,
                _ => self.unhandled("stream"),
            },
            FaultDomain::Other => self.unhandled("unknown-domain"),
        }
    }

    fn unhandled(&self, domain: &str) -> PlayerError {
        warn!(
            "Got an unhandled {} error: '{}' (code: {})",
            domain, self.debug, self.code
        );
        PlayerError::NoError
    }
}

//! Security-context resolution
//!
//! Maps the identity a client presents to the security context the access
//! policy evaluates. Resolution is asynchronous so implementations may ask
//! an external service.

use async_trait::async_trait;
use mediahub_common::config::SecurityConfig;
use std::collections::HashMap;
use tracing::debug;

/// Resolves a client identity to its security context
#[async_trait]
pub trait ContextResolver: Send + Sync {
    /// Context for `client_id`; an empty string means "unknown"
    async fn resolve(&self, client_id: &str) -> String;
}

/// Resolver backed by a static table from configuration
#[derive(Debug, Clone, Default)]
pub struct ConfiguredContextResolver {
    default_profile: String,
    profiles: HashMap<String, String>,
}

impl ConfiguredContextResolver {
    pub fn new(default_profile: impl Into<String>, profiles: HashMap<String, String>) -> Self {
        Self {
            default_profile: default_profile.into(),
            profiles,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.default_profile.clone(), config.profiles.clone())
    }
}

#[async_trait]
impl ContextResolver for ConfiguredContextResolver {
    async fn resolve(&self, client_id: &str) -> String {
        let context = self
            .profiles
            .get(client_id)
            .cloned()
            .unwrap_or_else(|| self.default_profile.clone());
        debug!("Client '{}' resolved to context '{}'", client_id, context);
        context
    }
}

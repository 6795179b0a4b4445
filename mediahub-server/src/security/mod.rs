//! Client authorization
//!
//! - `resolver`: client identity → security context (async)
//! - `access_policy`: (security context, locator) → allow/deny

pub mod access_policy;
pub mod resolver;

pub use access_policy::decide;
pub use resolver::{ConfiguredContextResolver, ContextResolver};

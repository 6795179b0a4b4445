//! HTTP control transport
//!
//! JSON routes under `/api/v1` mapping the player control surface, plus an
//! SSE stream of `MediaHubEvent`s.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};

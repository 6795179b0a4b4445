//! Player sessions
//!
//! - `session`: per-client state machine over an engine
//! - `control`: access-checked control surface used by the transport
//! - `wakelock`: refcounted power leases
//! - `track_queue`: ordered tracks with cached metadata
//! - `properties`: stored values, snapshots and partial updates

pub mod control;
pub mod properties;
pub mod session;
pub mod track_queue;
pub mod wakelock;

pub use control::PlayerControl;
pub use properties::{PlayerProperties, PropertiesSnapshot, PropertiesUpdate};
pub use session::{PlayerSession, SessionSettings};
pub use track_queue::TrackQueue;
pub use wakelock::{WakelockCounts, WakelockKind, WakelockManager};

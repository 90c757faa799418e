//! Presence subsystem: the shared store abstraction and the tracker state
//! machine that drives online/offline transitions.

pub mod store;
pub mod tracker;

pub use store::{MemoryPresenceStore, PresenceStore, RedisPresenceStore};
pub use tracker::{PresenceTracker, Transition};

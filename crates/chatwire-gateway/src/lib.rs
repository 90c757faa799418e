//! chatwire gateway library entry.
//!
//! This crate wires the transport, realtime core, presence tracker, and
//! message router into a cohesive chat server. It is intended to be consumed
//! by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod chat;
pub mod config;
pub mod directory;
pub mod presence;
pub mod realtime;
pub mod router;
pub mod transport;

//! Realtime runtime (egress engine) for the chatwire gateway.
//!
//! Connection registry + room index + QoS-based publish helpers. The presence
//! tracker and message router ride on this layer; neither depends on how
//! rooms are physically implemented.

pub mod hub;
pub mod registry;
pub mod rooms;
pub mod types;

pub use hub::Hub;
pub use registry::{Connection, ConnectionRegistry};
pub use rooms::Rooms;
pub use types::{PreparedEvent, QoS};

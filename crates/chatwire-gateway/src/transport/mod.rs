//! Transport layer: WebSocket sessions and the inbound frame codec.

pub mod codec;
pub mod ws;

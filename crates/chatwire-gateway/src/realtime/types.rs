use axum::extract::ws::Message;

use chatwire_core::error::{ChatWireError, Result};
use chatwire_core::protocol::ServerEvent;

/// Quality-of-Service strategy for outgoing delivery.
#[derive(Debug, Clone)]
pub enum QoS {
    /// Latency-critical: do not await; if the connection's queue is full, drop.
    /// Presence transitions use this (a missed one is corrected by the next
    /// explicit query).
    Lossy,
    /// Reliability-critical: attempt delivery and optionally time out.
    /// Message delivery uses this.
    Reliable { timeout_ms: u64 },
}

impl Default for QoS {
    fn default() -> Self {
        QoS::Lossy
    }
}

/// Server event serialized once for broadcasting (send N times).
#[derive(Debug, Clone)]
pub struct PreparedEvent(String);

impl PreparedEvent {
    pub fn prepare(ev: &ServerEvent) -> Result<Self> {
        let s = serde_json::to_string(ev)
            .map_err(|e| ChatWireError::Internal(format!("event encode failed: {e}")))?;
        Ok(PreparedEvent(s))
    }

    /// Convert to an axum ws message for transport.
    pub fn to_ws_message(&self) -> Message {
        Message::Text(self.0.clone())
    }
}

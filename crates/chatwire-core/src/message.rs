//! Direct-message model shared by the router, storage, and wire events.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A persisted direct message, as delivered on the wire.
///
/// `id` and `timestamp` are server-assigned by the storage collaborator;
/// clients never supply them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    /// Symmetric room key of the participant pair, see [`protocol::room`](crate::protocol::room).
    pub room_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Milliseconds since UNIX epoch, assigned at persist time.
    pub timestamp: u64,
}

/// A message as submitted by a client, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    pub room_id: String,
    pub reply_to: Option<String>,
}

/// Wall-clock time in milliseconds since UNIX epoch.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

//! JSON event envelopes for the bidirectional channel.
//!
//! Every frame is `{"event": <name>, "data": <payload>}`. Event names are
//! kebab-case, payload fields camelCase, matching what web clients send.

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Client -> server events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Announce the user identity for this connection.
    Join(JoinPayload),
    /// Ask which of the requester's contacts are currently online.
    GetOnlineUsers(GetOnlineUsersPayload),
    /// Fast-path message send (same router path as `POST /chat/message`).
    SendMessage(SendMessagePayload),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    /// Empty or missing ids are ignored by the tracker, never an error.
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOnlineUsersPayload {
    #[serde(default)]
    pub requesting_user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    /// Accepted for compatibility; the server recomputes the room key.
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
}

/// Server -> client events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Broadcast: a user's first live connection opened.
    UserOnline(PresenceChange),
    /// Broadcast: a user's last live connection closed.
    UserOffline(PresenceChange),
    /// Reply to `get-online-users`.
    OnlineUsers(Vec<String>),
    /// A persisted message delivered to the conversation room.
    ReceiveMessage(Message),
    /// Failure surfaced to the originating connection.
    Error(ErrorNotice),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceChange {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub code: String,
    pub msg: String,
}

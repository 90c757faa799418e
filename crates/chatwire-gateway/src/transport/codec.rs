//! Decode-once codec for the transport layer.
//!
//! - Text frames => `ClientEvent` envelope
//! - Ping/Pong/Close are surfaced for lifecycle management
//! - Binary frames are not part of this protocol

use axum::extract::ws::Message;

use chatwire_core::error::{ChatWireError, Result};
use chatwire_core::protocol::ClientEvent;

#[derive(Debug)]
pub enum Inbound {
    Event(ClientEvent),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => {
            let ev: ClientEvent = serde_json::from_str(&s)
                .map_err(|e| ChatWireError::BadRequest(format!("invalid event json: {e}")))?;
            Ok(Inbound::Event(ev))
        }
        Message::Binary(_) => Err(ChatWireError::BadRequest(
            "binary frames are not supported".into(),
        )),
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(v) => Ok(Inbound::Pong(v)),
        Message::Close(_) => Ok(Inbound::Close),
    }
}

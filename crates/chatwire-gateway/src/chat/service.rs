//! Message router: validate, persist, deliver.

use std::sync::Arc;

use chatwire_core::error::{ChatWireError, Result};
use chatwire_core::message::{Message, NewMessage};
use chatwire_core::protocol::{direct_room_id, SendMessagePayload, ServerEvent};

use crate::chat::store::MessageStore;
use crate::realtime::{Hub, QoS};

const DELIVERY_TIMEOUT_MS: u64 = 1500;

pub struct MessageRouter {
    hub: Arc<Hub>,
    store: Arc<dyn MessageStore>,
}

impl MessageRouter {
    pub fn new(hub: Arc<Hub>, store: Arc<dyn MessageStore>) -> Self {
        Self { hub, store }
    }

    /// Persist and deliver a direct message.
    ///
    /// Persistence must succeed before any delivery is attempted; on failure
    /// the whole operation fails and nothing is broadcast. Delivery goes to
    /// the conversation room covering both participants' live connections.
    /// The sender sees the message through the same room broadcast (no
    /// separate echo), and an offline receiver picks it up on the next
    /// history fetch.
    pub async fn send_message(&self, req: SendMessagePayload) -> Result<Message> {
        if req.sender_id.is_empty() || req.receiver_id.is_empty() {
            return Err(ChatWireError::BadRequest(
                "senderId and receiverId are required".into(),
            ));
        }
        if req.text.is_empty() {
            return Err(ChatWireError::BadRequest("text must not be empty".into()));
        }

        // Canonical key; any client-supplied roomId is ignored.
        let room_id = direct_room_id(&req.sender_id, &req.receiver_id);

        let stored = self
            .store
            .append(NewMessage {
                sender_id: req.sender_id.clone(),
                receiver_id: req.receiver_id.clone(),
                text: req.text,
                room_id,
                reply_to: req.reply_to,
            })
            .await
            .map_err(|e| ChatWireError::PersistFailed(e.to_string()))?;

        let ev = ServerEvent::ReceiveMessage(stored.clone());
        let qos = QoS::Reliable {
            timeout_ms: DELIVERY_TIMEOUT_MS,
        };
        // Per-user rooms: each joined connection sits in the room named by its
        // own user id, so this reaches every live device of both sides.
        self.hub.publish_room(&req.sender_id, &ev, qos.clone()).await?;
        if req.receiver_id != req.sender_id {
            self.hub.publish_room(&req.receiver_id, &ev, qos).await?;
        }

        Ok(stored)
    }

    /// Persisted history for the pair's room, timestamp order.
    pub async fn history(&self, a: &str, b: &str) -> Result<Vec<Message>> {
        self.store.history(&direct_room_id(a, b)).await
    }
}

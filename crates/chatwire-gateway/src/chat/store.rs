//! Message storage collaborator.
//!
//! Durable message storage is external to this system; the gateway only
//! depends on this interface. The in-memory implementation backs tests and
//! single-process development runs.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use chatwire_core::error::Result;
use chatwire_core::message::{epoch_ms, Message, NewMessage};

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message, assigning its server-side id and timestamp.
    /// Failure here means the message was not durably recorded and must not
    /// be delivered.
    async fn append(&self, msg: NewMessage) -> Result<Message>;

    /// All persisted messages for a room, in timestamp order.
    async fn history(&self, room_id: &str) -> Result<Vec<Message>>;
}

#[derive(Default)]
pub struct InMemoryMessageStore {
    rooms: DashMap<String, Vec<Message>>,
    seq: AtomicU64,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, msg: NewMessage) -> Result<Message> {
        let id = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let stored = Message {
            id: format!("m-{id}"),
            sender_id: msg.sender_id,
            receiver_id: msg.receiver_id,
            text: msg.text,
            room_id: msg.room_id.clone(),
            reply_to: msg.reply_to,
            timestamp: epoch_ms(),
        };
        self.rooms
            .entry(msg.room_id)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn history(&self, room_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .rooms
            .get(room_id)
            .map(|v| v.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_assigns_id_and_timestamp() {
        let store = InMemoryMessageStore::new();
        let stored = store
            .append(NewMessage {
                sender_id: "a".into(),
                receiver_id: "b".into(),
                text: "hi".into(),
                room_id: "a_b".into(),
                reply_to: None,
            })
            .await
            .unwrap();
        assert_eq!(stored.id, "m-1");
        assert!(stored.timestamp > 0);

        let hist = store.history("a_b").await.unwrap();
        assert_eq!(hist, vec![stored]);
    }

    #[tokio::test]
    async fn history_of_unknown_room_is_empty() {
        let store = InMemoryMessageStore::new();
        assert!(store.history("nope").await.unwrap().is_empty());
    }
}

use std::sync::Arc;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::time::{timeout, Duration};

use chatwire_core::error::Result;
use chatwire_core::protocol::ServerEvent;

use crate::realtime::registry::ConnectionRegistry;
use crate::realtime::rooms::Rooms;
use crate::realtime::types::{PreparedEvent, QoS};

/// Hub: egress engine (room publish, broadcast-except-origin).
pub struct Hub {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<Rooms>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            rooms: Arc::new(Rooms::new()),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn rooms(&self) -> &Arc<Rooms> {
        &self.rooms
    }

    /// Deliver to all connections subscribed to a room.
    pub async fn publish_room(&self, room: &str, ev: &ServerEvent, qos: QoS) -> Result<()> {
        let prepared = PreparedEvent::prepare(ev)?;
        let conn_ids = self.rooms.conns_in(room);

        match qos {
            QoS::Lossy => {
                for cid in conn_ids {
                    if let Some(conn) = self.registry.get(&cid) {
                        let _ = conn.tx.try_send(prepared.to_ws_message());
                    }
                }
            }
            QoS::Reliable { timeout_ms } => {
                let mut futs = FuturesUnordered::new();
                for cid in conn_ids {
                    if let Some(conn) = self.registry.get(&cid) {
                        let msg = prepared.to_ws_message();
                        futs.push(async move {
                            if timeout_ms > 0 {
                                let _ =
                                    timeout(Duration::from_millis(timeout_ms), conn.tx.send(msg))
                                        .await;
                            } else {
                                let _ = conn.tx.send(msg).await;
                            }
                        });
                    }
                }
                while futs.next().await.is_some() {}
            }
        }
        Ok(())
    }

    /// Lossy broadcast to every registered connection except the origin.
    /// Used for presence transitions: any client may be displaying the
    /// affected user's status.
    pub fn broadcast_except(&self, origin_conn_id: &str, ev: &ServerEvent) -> Result<()> {
        let prepared = PreparedEvent::prepare(ev)?;
        for (cid, conn) in self.registry.snapshot() {
            if cid == origin_conn_id {
                continue;
            }
            let _ = conn.tx.try_send(prepared.to_ws_message());
        }
        Ok(())
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

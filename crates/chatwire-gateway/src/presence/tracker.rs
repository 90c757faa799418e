//! Presence tracker: the per-user OFFLINE -> ONLINE -> OFFLINE state machine.
//!
//! The in-process connection registry owns the connection lifecycle; the
//! external store owns the transition decision. Each register/deregister does
//! one atomic counter update and, on the 0<->1 edge, one atomic set update,
//! and the store's read-backs alone decide whether there was a transition.
//! Coupling the decision to the local connection count as well would race:
//! two tabs connecting at once can each see the other's half-finished state
//! and both conclude "not mine to announce". A transient store outage
//! degrades only cross-process visibility, never the local connection
//! lifecycle: the decision then falls back to the local count and the
//! broadcast still goes out.
//!
//! Ordering: registry and store mutations complete before the transition
//! broadcast is emitted, so a concurrent presence query cannot observe
//! "online" in the broadcast but "offline" in the store.

use std::sync::Arc;

use tracing::{debug, warn};

use chatwire_core::protocol::{PresenceChange, ServerEvent};

use crate::presence::store::PresenceStore;
use crate::realtime::registry::Connection;
use crate::realtime::Hub;

/// Presence transition caused by a register/deregister call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentOnline,
    WentOffline,
}

pub struct PresenceTracker {
    hub: Arc<Hub>,
    store: Arc<dyn PresenceStore>,
}

impl PresenceTracker {
    pub fn new(hub: Arc<Hub>, store: Arc<dyn PresenceStore>) -> Self {
        Self { hub, store }
    }

    /// Startup reset: presence keys must not survive a crashed predecessor.
    pub async fn init(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "presence store reset failed; stale entries may linger");
        }
    }

    /// Mirror of the startup reset, for graceful shutdown.
    pub async fn shutdown(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "presence store clear on shutdown failed");
        }
    }

    /// Associate a live connection with a user and count it.
    ///
    /// Empty user ids and repeated joins are silent no-ops. Returns
    /// `Some(WentOnline)` only when this was the user's first live connection,
    /// in which case a `user-online` broadcast has already been emitted to all
    /// other connections.
    pub async fn register_connection(
        &self,
        conn_id: &str,
        user_id: &str,
        conn: Connection,
    ) -> Option<Transition> {
        if user_id.is_empty() {
            debug!(conn = %conn_id, "join without user id ignored");
            return None;
        }
        match self.hub.registry().user_of(conn_id) {
            // idempotent re-join with the same identity
            Some(existing) if existing == user_id => return None,
            Some(existing) => {
                warn!(conn = %conn_id, user = %existing, "join on already-associated connection ignored");
                return None;
            }
            None => {}
        }

        let local_count = self.hub.registry().insert(user_id, conn_id, conn);

        // Exactly one of any set of racing registrations reads the counter at
        // 1, regardless of how their registry and store steps interleave, and
        // the set add confirms the edge. The local count only matters when
        // the store is unreachable.
        let went_online = match self.store.incr(user_id).await {
            Ok(1) => match self.store.set_add(user_id).await {
                Ok(added) => added,
                Err(e) => {
                    warn!(error = %e, user = %user_id, "online set add failed; cross-process view is stale");
                    true
                }
            },
            Ok(_) => false,
            Err(e) => {
                warn!(error = %e, user = %user_id, "presence store incr failed; using local count");
                local_count == 1
            }
        };
        if !went_online {
            return None;
        }

        debug!(user = %user_id, conn = %conn_id, "user went online");
        if let Err(e) = self.hub.broadcast_except(
            conn_id,
            &ServerEvent::UserOnline(PresenceChange {
                user_id: user_id.to_string(),
            }),
        ) {
            warn!(error = %e, user = %user_id, "online transition broadcast failed");
        }
        Some(Transition::WentOnline)
    }

    /// Drop a connection's registration (transport disconnect, graceful or
    /// timeout-detected). Safe to call repeatedly for the same connection id;
    /// a connection that never joined produces no state change.
    pub async fn deregister_connection(&self, conn_id: &str) -> Option<Transition> {
        let (user_id, local_remaining) = self.hub.registry().remove(conn_id)?;

        // Mirror of registration: whichever racing disconnect reads the
        // counter at 0 owns the transition, and the set remove confirms it.
        let went_offline = match self.store.decr(&user_id).await {
            Ok(0) => match self.store.set_remove(&user_id).await {
                Ok(removed) => removed,
                Err(e) => {
                    warn!(error = %e, user = %user_id, "online set remove failed; cross-process view is stale");
                    true
                }
            },
            Ok(_) => false,
            Err(e) => {
                warn!(error = %e, user = %user_id, "presence store decr failed; using local count");
                local_remaining == 0
            }
        };
        if !went_offline {
            return None;
        }

        debug!(user = %user_id, conn = %conn_id, "user went offline");
        if let Err(e) = self.hub.broadcast_except(
            conn_id,
            &ServerEvent::UserOffline(PresenceChange {
                user_id: user_id.clone(),
            }),
        ) {
            warn!(error = %e, user = %user_id, "offline transition broadcast failed");
        }
        Some(Transition::WentOffline)
    }

    /// Subset of `candidates` currently online. Pure read, no mutation, no
    /// broadcast. Falls back to the local registry when the store is out.
    pub async fn query_online_subset(
        &self,
        _requesting_user_id: &str,
        candidates: &[String],
    ) -> Vec<String> {
        if candidates.is_empty() {
            return vec![];
        }
        match self.store.filter_online(candidates).await {
            Ok(subset) => subset,
            Err(e) => {
                warn!(error = %e, "presence store query failed; answering from local registry");
                candidates
                    .iter()
                    .filter(|c| self.hub.registry().count(c) > 0)
                    .cloned()
                    .collect()
            }
        }
    }

    /// Point-in-time OnlineSet membership test.
    pub async fn is_online(&self, user_id: &str) -> bool {
        match self.store.is_online(user_id).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(error = %e, user = %user_id, "presence store lookup failed; answering from local registry");
                self.hub.registry().count(user_id) > 0
            }
        }
    }
}

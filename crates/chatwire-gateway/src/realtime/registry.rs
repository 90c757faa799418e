use axum::extract::ws::Message;
use dashmap::{DashMap, DashSet};
use tokio::sync::mpsc;

/// One connection's outbound queue sender.
#[derive(Clone)]
pub struct Connection {
    pub tx: mpsc::Sender<Message>,
}

/// Connection registry:
/// - `conn_id -> Connection`
/// - `conn_id -> user_id` (set at join, never rebound)
/// - `user_id -> {conn_id...}`
///
/// Only connections that have announced a user via `join` are registered.
/// Count read-backs happen under the owning entry guard, so concurrent
/// add/remove for the same user cannot produce a lost update.
#[derive(Default)]
pub struct ConnectionRegistry {
    conns: DashMap<String, Connection>,
    conn_user: DashMap<String, String>,
    user_index: DashMap<String, DashSet<String>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            conns: DashMap::new(),
            conn_user: DashMap::new(),
            user_index: DashMap::new(),
        }
    }

    /// Register a connection under a user. Returns the user's live connection
    /// count after the insert.
    pub fn insert(&self, user_id: &str, conn_id: &str, conn: Connection) -> usize {
        self.conns.insert(conn_id.to_string(), conn);
        self.conn_user
            .insert(conn_id.to_string(), user_id.to_string());

        let set = self
            .user_index
            .entry(user_id.to_string())
            .or_insert_with(DashSet::new);
        set.insert(conn_id.to_string());
        set.len()
    }

    /// Remove a connection. Returns the owning user and the user's remaining
    /// live connection count, or `None` if the connection never joined.
    pub fn remove(&self, conn_id: &str) -> Option<(String, usize)> {
        let (_, user_id) = self.conn_user.remove(conn_id)?;
        self.conns.remove(conn_id);

        let remaining = match self.user_index.get(&user_id) {
            Some(set) => {
                set.remove(conn_id);
                let n = set.len();
                if n == 0 {
                    drop(set);
                    self.user_index.remove_if(&user_id, |_, s| s.is_empty());
                }
                n
            }
            None => 0,
        };
        Some((user_id, remaining))
    }

    /// User announced on this connection, if any.
    pub fn user_of(&self, conn_id: &str) -> Option<String> {
        self.conn_user.get(conn_id).map(|r| r.value().clone())
    }

    pub fn get(&self, conn_id: &str) -> Option<Connection> {
        self.conns.get(conn_id).map(|r| r.value().clone())
    }

    /// Live connection count for a user in this process.
    pub fn count(&self, user_id: &str) -> usize {
        self.user_index.get(user_id).map(|s| s.len()).unwrap_or(0)
    }

    /// Snapshot of all registered connections (for transition broadcasts).
    pub fn snapshot(&self) -> Vec<(String, Connection)> {
        self.conns
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }
}

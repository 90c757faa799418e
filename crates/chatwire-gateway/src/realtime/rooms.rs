use dashmap::{DashMap, DashSet};

/// Two-sided room membership index: the forward side answers "who is in this
/// room" for publishing, the reverse side answers "which rooms does this
/// connection hold" for teardown on disconnect.
#[derive(Default)]
pub struct Rooms {
    by_room: DashMap<String, DashSet<String>>,
    by_conn: DashMap<String, DashSet<String>>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, room_key: &str, conn_id: &str) {
        self.by_room
            .entry(room_key.to_string())
            .or_default()
            .insert(conn_id.to_string());
        self.by_conn
            .entry(conn_id.to_string())
            .or_default()
            .insert(room_key.to_string());
    }

    pub fn leave(&self, room_key: &str, conn_id: &str) {
        self.detach(room_key, conn_id);
        if let Some(rooms) = self.by_conn.get(conn_id) {
            rooms.remove(room_key);
        }
        self.by_conn.remove_if(conn_id, |_, rooms| rooms.is_empty());
    }

    pub fn conns_in(&self, room_key: &str) -> Vec<String> {
        self.by_room
            .get(room_key)
            .map(|conns| conns.iter().map(|c| c.key().clone()).collect())
            .unwrap_or_default()
    }

    /// Drop every membership held by a closing connection.
    pub fn cleanup_conn(&self, conn_id: &str) {
        let Some((_, rooms)) = self.by_conn.remove(conn_id) else {
            return;
        };
        for room_key in rooms {
            self.detach(&room_key, conn_id);
        }
    }

    // Remove a connection from a room's forward entry. The entry is pruned
    // only if it is still empty at removal time, so a join racing with the
    // last leave is never silently dropped.
    fn detach(&self, room_key: &str, conn_id: &str) {
        if let Some(conns) = self.by_room.get(room_key) {
            conns.remove(conn_id);
        }
        self.by_room.remove_if(room_key, |_, conns| conns.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_leave() {
        let rooms = Rooms::new();
        rooms.join("alice", "c1");
        rooms.join("alice", "c2");
        assert_eq!(rooms.conns_in("alice").len(), 2);

        rooms.leave("alice", "c1");
        assert_eq!(rooms.conns_in("alice"), vec!["c2".to_string()]);
    }

    #[test]
    fn leave_prunes_only_empty_rooms() {
        let rooms = Rooms::new();
        rooms.join("alice", "c1");
        rooms.join("alice_bob", "c1");
        rooms.join("alice_bob", "c2");

        rooms.leave("alice", "c1");
        rooms.leave("alice_bob", "c1");
        assert!(rooms.conns_in("alice").is_empty());
        assert_eq!(rooms.conns_in("alice_bob"), vec!["c2".to_string()]);
    }

    #[test]
    fn rejoin_after_room_emptied() {
        let rooms = Rooms::new();
        rooms.join("alice", "c1");
        rooms.leave("alice", "c1");

        rooms.join("alice", "c2");
        assert_eq!(rooms.conns_in("alice"), vec!["c2".to_string()]);
    }

    #[test]
    fn cleanup_removes_all_memberships() {
        let rooms = Rooms::new();
        rooms.join("alice", "c1");
        rooms.join("alice_bob", "c1");
        rooms.cleanup_conn("c1");
        assert!(rooms.conns_in("alice").is_empty());
        assert!(rooms.conns_in("alice_bob").is_empty());

        // repeated cleanup for the same connection is a no-op
        rooms.cleanup_conn("c1");
    }
}

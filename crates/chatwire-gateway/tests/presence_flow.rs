#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

//! Presence tracker behavior observed through fake connections.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::Message;
use tokio::sync::mpsc;

use chatwire_core::error::{ChatWireError, Result};
use chatwire_gateway::directory::{ContactDirectory, InMemoryContactDirectory};
use chatwire_gateway::presence::{
    MemoryPresenceStore, PresenceStore, PresenceTracker, Transition,
};
use chatwire_gateway::realtime::{Connection, Hub};

fn setup() -> (Arc<Hub>, Arc<MemoryPresenceStore>, PresenceTracker) {
    let hub = Arc::new(Hub::new());
    let store = Arc::new(MemoryPresenceStore::new());
    let tracker = PresenceTracker::new(
        Arc::clone(&hub),
        Arc::clone(&store) as Arc<dyn PresenceStore>,
    );
    (hub, store, tracker)
}

fn fake_conn() -> (Connection, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(16);
    (Connection { tx }, rx)
}

/// Drain everything queued on a fake connection into parsed JSON events.
fn drain(rx: &mut mpsc::Receiver<Message>) -> Vec<serde_json::Value> {
    let mut out = vec![];
    while let Ok(msg) = rx.try_recv() {
        if let Message::Text(s) = msg {
            out.push(serde_json::from_str(&s).unwrap());
        }
    }
    out
}

fn events_named(evs: &[serde_json::Value], name: &str) -> usize {
    evs.iter().filter(|e| e["event"] == name).count()
}

#[tokio::test]
async fn first_connection_goes_online_and_broadcasts_once() {
    let (_hub, store, tracker) = setup();

    // an observer must already be connected to see the broadcast
    let (obs_conn, mut obs_rx) = fake_conn();
    tracker.register_connection("c-obs", "observer", obs_conn).await;
    drain(&mut obs_rx);

    let (conn, mut own_rx) = fake_conn();
    let t = tracker.register_connection("c-1", "alice", conn).await;
    assert_eq!(t, Some(Transition::WentOnline));
    assert!(store.is_online("alice").await.unwrap());

    let seen = drain(&mut obs_rx);
    assert_eq!(events_named(&seen, "user-online"), 1);
    assert_eq!(seen[0]["data"]["userId"], "alice");

    // the transition is broadcast, not echoed to the origin
    assert!(drain(&mut own_rx).is_empty());
}

#[tokio::test]
async fn online_set_tracks_connection_count() {
    let (hub, store, tracker) = setup();

    let (c1, _rx1) = fake_conn();
    let (c2, _rx2) = fake_conn();
    tracker.register_connection("c-1", "alice", c1).await;
    tracker.register_connection("c-2", "alice", c2).await;
    assert_eq!(hub.registry().count("alice"), 2);
    assert!(store.is_online("alice").await.unwrap());

    tracker.deregister_connection("c-1").await;
    assert!(store.is_online("alice").await.unwrap());
    assert_eq!(hub.registry().count("alice"), 1);

    tracker.deregister_connection("c-2").await;
    assert!(!store.is_online("alice").await.unwrap());
    assert_eq!(hub.registry().count("alice"), 0);
}

#[tokio::test]
async fn two_tabs_emit_one_online_and_one_offline() {
    let (_hub, _store, tracker) = setup();

    let (obs_conn, mut obs_rx) = fake_conn();
    tracker.register_connection("c-obs", "observer", obs_conn).await;

    let (tab1, _rx1) = fake_conn();
    let (tab2, _rx2) = fake_conn();
    let t1 = tracker.register_connection("c-1", "alice", tab1).await;
    let t2 = tracker.register_connection("c-2", "alice", tab2).await;
    assert_eq!(t1, Some(Transition::WentOnline));
    assert_eq!(t2, None, "second tab must not re-announce");

    let seen = drain(&mut obs_rx);
    assert_eq!(events_named(&seen, "user-online"), 1);

    // closing tab 1: still online, no event
    assert_eq!(tracker.deregister_connection("c-1").await, None);
    assert_eq!(drain(&mut obs_rx).len(), 0);

    // closing tab 2: exactly one offline event
    assert_eq!(
        tracker.deregister_connection("c-2").await,
        Some(Transition::WentOffline)
    );
    let seen = drain(&mut obs_rx);
    assert_eq!(events_named(&seen, "user-offline"), 1);
    assert_eq!(seen[0]["data"]["userId"], "alice");
}

// Two tabs connecting at once can reach the store in the opposite order of
// their registry inserts. The handler whose registry insert came second may
// be the one whose store read-back sees the counter at 1; the transition must
// follow the store, not the local count.
#[tokio::test]
async fn interleaved_tab_connects_still_mark_online() {
    let (hub, store, tracker) = setup();

    let (obs_conn, mut obs_rx) = fake_conn();
    tracker.register_connection("c-obs", "observer", obs_conn).await;
    drain(&mut obs_rx);

    // tab 1's handler has inserted into the registry but is still suspended
    // short of its store increment
    let (tab1, _rx1) = fake_conn();
    hub.registry().insert("alice", "c-1", tab1);

    // tab 2's handler runs to completion first
    let (tab2, _rx2) = fake_conn();
    assert_eq!(
        tracker.register_connection("c-2", "alice", tab2).await,
        Some(Transition::WentOnline)
    );
    assert!(store.is_online("alice").await.unwrap());
    assert_eq!(events_named(&drain(&mut obs_rx), "user-online"), 1);

    // tab 1's handler resumes at the store; no second announcement edge
    assert_eq!(store.incr("alice").await.unwrap(), 2);
    assert!(!store.set_add("alice").await.unwrap());
}

// Mirror image for disconnects: the handler that reads the counter at 0 owns
// the offline transition even while the other tab's registry entry lingers.
#[tokio::test]
async fn interleaved_tab_disconnects_still_mark_offline() {
    let (hub, store, tracker) = setup();

    let (obs_conn, mut obs_rx) = fake_conn();
    tracker.register_connection("c-obs", "observer", obs_conn).await;

    let (tab1, _rx1) = fake_conn();
    let (tab2, _rx2) = fake_conn();
    tracker.register_connection("c-1", "alice", tab1).await;
    tracker.register_connection("c-2", "alice", tab2).await;
    drain(&mut obs_rx);

    // tab 2's disconnect handler has already decremented the store but not
    // yet cleared its registry entry
    assert_eq!(store.decr("alice").await.unwrap(), 1);

    assert_eq!(
        tracker.deregister_connection("c-1").await,
        Some(Transition::WentOffline)
    );
    assert!(!store.is_online("alice").await.unwrap());
    assert_eq!(events_named(&drain(&mut obs_rx), "user-offline"), 1);

    // tab 2's handler finishes its registry step; nothing left to announce
    hub.registry().remove("c-2");
    assert_eq!(tracker.deregister_connection("c-2").await, None);
}

// Presence keys left behind by a crashed predecessor must not suppress the
// first online transition after a restart.
#[tokio::test]
async fn startup_reset_drops_stale_counters() {
    let (_hub, store, tracker) = setup();

    store.incr("alice").await.unwrap();
    store.incr("alice").await.unwrap();
    store.set_add("alice").await.unwrap();

    tracker.init().await;

    let (obs_conn, mut obs_rx) = fake_conn();
    tracker.register_connection("c-obs", "observer", obs_conn).await;
    drain(&mut obs_rx);

    let (conn, _rx) = fake_conn();
    assert_eq!(
        tracker.register_connection("c-1", "alice", conn).await,
        Some(Transition::WentOnline)
    );
    assert!(store.is_online("alice").await.unwrap());
    assert_eq!(events_named(&drain(&mut obs_rx), "user-online"), 1);
}

#[tokio::test]
async fn deregister_is_idempotent() {
    let (_hub, store, tracker) = setup();

    let (obs_conn, mut obs_rx) = fake_conn();
    tracker.register_connection("c-obs", "observer", obs_conn).await;

    let (conn, _rx) = fake_conn();
    tracker.register_connection("c-1", "alice", conn).await;
    drain(&mut obs_rx);

    assert_eq!(
        tracker.deregister_connection("c-1").await,
        Some(Transition::WentOffline)
    );
    // repeated for the same connection id: same end state, no second event
    assert_eq!(tracker.deregister_connection("c-1").await, None);

    assert_eq!(events_named(&drain(&mut obs_rx), "user-offline"), 1);
    assert!(!store.is_online("alice").await.unwrap());
}

#[tokio::test]
async fn deregister_of_never_joined_connection_is_noop() {
    let (_hub, _store, tracker) = setup();
    assert_eq!(tracker.deregister_connection("c-ghost").await, None);
}

#[tokio::test]
async fn empty_user_id_join_is_ignored() {
    let (hub, store, tracker) = setup();

    let (obs_conn, mut obs_rx) = fake_conn();
    tracker.register_connection("c-obs", "observer", obs_conn).await;
    drain(&mut obs_rx);

    let (conn, _rx) = fake_conn();
    assert_eq!(tracker.register_connection("c-1", "", conn).await, None);
    assert!(hub.registry().user_of("c-1").is_none());
    assert!(drain(&mut obs_rx).is_empty());
    assert!(!store.is_online("").await.unwrap());
}

#[tokio::test]
async fn repeated_join_with_same_id_is_idempotent() {
    let (hub, _store, tracker) = setup();

    let (conn, _rx) = fake_conn();
    tracker.register_connection("c-1", "alice", conn).await;
    let (dup, _rx2) = fake_conn();
    assert_eq!(tracker.register_connection("c-1", "alice", dup).await, None);
    assert_eq!(hub.registry().count("alice"), 1);
}

#[tokio::test]
async fn query_online_subset() {
    let (_hub, _store, tracker) = setup();

    let (conn, _rx) = fake_conn();
    tracker.register_connection("c-1", "b", conn).await;

    assert!(tracker.query_online_subset("me", &[]).await.is_empty());

    let candidates: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
    assert_eq!(
        tracker.query_online_subset("me", &candidates).await,
        vec!["b".to_string()]
    );
}

#[tokio::test]
async fn contacts_scope_the_online_answer() {
    let (_hub, _store, tracker) = setup();
    let dir = InMemoryContactDirectory::new();
    dir.set_contacts("me", vec!["bob".into(), "carol".into()]);

    let (c1, _rx1) = fake_conn();
    let (c2, _rx2) = fake_conn();
    tracker.register_connection("c-1", "bob", c1).await;
    // online but not a contact of "me"
    tracker.register_connection("c-2", "mallory", c2).await;

    let contacts = dir.contacts_of("me");
    assert_eq!(
        tracker.query_online_subset("me", &contacts).await,
        vec!["bob".to_string()]
    );
    // unknown requester has no contacts, hence an empty answer
    assert!(tracker
        .query_online_subset("stranger", &dir.contacts_of("stranger"))
        .await
        .is_empty());
}

/// Store that fails every operation, simulating an unreachable fast store.
struct DownStore;

#[async_trait]
impl PresenceStore for DownStore {
    async fn incr(&self, _: &str) -> Result<i64> {
        Err(ChatWireError::StoreUnavailable("down".into()))
    }
    async fn decr(&self, _: &str) -> Result<i64> {
        Err(ChatWireError::StoreUnavailable("down".into()))
    }
    async fn set_add(&self, _: &str) -> Result<bool> {
        Err(ChatWireError::StoreUnavailable("down".into()))
    }
    async fn set_remove(&self, _: &str) -> Result<bool> {
        Err(ChatWireError::StoreUnavailable("down".into()))
    }
    async fn is_online(&self, _: &str) -> Result<bool> {
        Err(ChatWireError::StoreUnavailable("down".into()))
    }
    async fn filter_online(&self, _: &[String]) -> Result<Vec<String>> {
        Err(ChatWireError::StoreUnavailable("down".into()))
    }
    async fn clear(&self) -> Result<()> {
        Err(ChatWireError::StoreUnavailable("down".into()))
    }
}

#[tokio::test]
async fn store_outage_does_not_break_connection_lifecycle() {
    let hub = Arc::new(Hub::new());
    let tracker = PresenceTracker::new(Arc::clone(&hub), Arc::new(DownStore));

    let (obs_conn, mut obs_rx) = fake_conn();
    tracker.register_connection("c-obs", "observer", obs_conn).await;

    // transitions still fire off the local registry count
    let (conn, _rx) = fake_conn();
    assert_eq!(
        tracker.register_connection("c-1", "alice", conn).await,
        Some(Transition::WentOnline)
    );
    assert_eq!(events_named(&drain(&mut obs_rx), "user-online"), 1);

    // queries fall back to the local registry
    let candidates: Vec<String> = vec!["alice".into(), "bob".into()];
    assert_eq!(
        tracker.query_online_subset("me", &candidates).await,
        vec!["alice".to_string()]
    );
    assert!(tracker.is_online("alice").await);
    assert!(!tracker.is_online("bob").await);

    assert_eq!(
        tracker.deregister_connection("c-1").await,
        Some(Transition::WentOffline)
    );
    assert_eq!(events_named(&drain(&mut obs_rx), "user-offline"), 1);
}

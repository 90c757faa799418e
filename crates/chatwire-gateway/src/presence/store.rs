//! Presence store backends.
//!
//! The store holds the cross-process view: a set of online user ids plus a
//! per-user live-connection counter. Every mutation is an atomic primitive
//! with a read-back (no separate read-then-write), so concurrent connect and
//! disconnect handlers, possibly in different processes, cannot lose updates.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use redis::{aio::ConnectionManager, AsyncCommands};

use chatwire_core::error::{ChatWireError, Result};

use crate::config::StoreSection;

/// Process-external set + counter store for presence.
///
/// Unavailability is reported as `StoreUnavailable` and must never take down
/// connection handling; callers degrade to their in-process view.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// Atomically increment a user's connection counter; returns the new value.
    async fn incr(&self, user_id: &str) -> Result<i64>;

    /// Atomically decrement a user's connection counter, clamped at zero;
    /// returns the clamped new value.
    async fn decr(&self, user_id: &str) -> Result<i64>;

    /// Add a user to the online set. Returns true only if the user was newly
    /// added — the caller treats that edge as the online transition.
    async fn set_add(&self, user_id: &str) -> Result<bool>;

    /// Remove a user from the online set. Returns true only if the user was
    /// actually a member — the caller treats that edge as the offline
    /// transition.
    async fn set_remove(&self, user_id: &str) -> Result<bool>;

    /// Online-set membership test.
    async fn is_online(&self, user_id: &str) -> Result<bool>;

    /// Subset of `candidates` present in the online set. Order follows the
    /// candidate list.
    async fn filter_online(&self, candidates: &[String]) -> Result<Vec<String>>;

    /// Drop all presence keys, counters included (startup reset against
    /// stale crash state).
    async fn clear(&self) -> Result<()>;
}

/// Single-process store backed by dashmap. The default backend; exactly
/// mirrors what the local registry already knows, which makes it the right
/// choice for single-instance deployments and tests.
#[derive(Default)]
pub struct MemoryPresenceStore {
    counters: DashMap<String, i64>,
    online: DashSet<String>,
}

impl MemoryPresenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceStore for MemoryPresenceStore {
    async fn incr(&self, user_id: &str) -> Result<i64> {
        let mut e = self.counters.entry(user_id.to_string()).or_insert(0);
        *e += 1;
        Ok(*e)
    }

    async fn decr(&self, user_id: &str) -> Result<i64> {
        let n = match self.counters.get_mut(user_id) {
            Some(mut e) => {
                *e -= 1;
                if *e < 0 {
                    *e = 0;
                }
                *e
            }
            None => 0,
        };
        if n == 0 {
            self.counters.remove_if(user_id, |_, v| *v == 0);
        }
        Ok(n)
    }

    async fn set_add(&self, user_id: &str) -> Result<bool> {
        Ok(self.online.insert(user_id.to_string()))
    }

    async fn set_remove(&self, user_id: &str) -> Result<bool> {
        Ok(self.online.remove(user_id).is_some())
    }

    async fn is_online(&self, user_id: &str) -> Result<bool> {
        Ok(self.online.contains(user_id))
    }

    async fn filter_online(&self, candidates: &[String]) -> Result<Vec<String>> {
        Ok(candidates
            .iter()
            .filter(|c| self.online.contains(c.as_str()))
            .cloned()
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        self.counters.clear();
        self.online.clear();
        Ok(())
    }
}

/// Shared fast store for multi-process deployments.
///
/// Layout: one set under `online_set_key`, counters under
/// `<counter_prefix><user_id>` with a TTL refreshed on every increment as a
/// safety net against counters stuck by lost decrements.
pub struct RedisPresenceStore {
    conn: ConnectionManager,
    set_key: String,
    counter_prefix: String,
    counter_ttl_secs: i64,
}

impl RedisPresenceStore {
    pub async fn connect(cfg: &StoreSection) -> Result<Self> {
        let redis_cfg = cfg.redis.as_ref().ok_or_else(|| {
            ChatWireError::BadRequest("store.redis section missing for redis backend".into())
        })?;
        let client = redis::Client::open(redis_cfg.url()).map_err(store_err)?;
        let conn = ConnectionManager::new(client).await.map_err(store_err)?;
        Ok(Self {
            conn,
            set_key: cfg.online_set_key.clone(),
            counter_prefix: cfg.counter_prefix.clone(),
            counter_ttl_secs: cfg.counter_ttl_secs as i64,
        })
    }

    fn counter_key(&self, user_id: &str) -> String {
        format!("{}{}", self.counter_prefix, user_id)
    }
}

fn store_err(e: redis::RedisError) -> ChatWireError {
    ChatWireError::StoreUnavailable(e.to_string())
}

#[async_trait]
impl PresenceStore for RedisPresenceStore {
    async fn incr(&self, user_id: &str) -> Result<i64> {
        let key = self.counter_key(user_id);
        let mut conn = self.conn.clone();
        let n: i64 = conn.incr(&key, 1).await.map_err(store_err)?;
        let _: bool = conn
            .expire(&key, self.counter_ttl_secs)
            .await
            .map_err(store_err)?;
        Ok(n)
    }

    async fn decr(&self, user_id: &str) -> Result<i64> {
        let key = self.counter_key(user_id);
        let mut conn = self.conn.clone();
        let n: i64 = conn.decr(&key, 1).await.map_err(store_err)?;
        if n <= 0 {
            // clamp: a lost increment must not leave a negative counter behind
            let _: i64 = conn.del(&key).await.map_err(store_err)?;
            return Ok(0);
        }
        Ok(n)
    }

    async fn set_add(&self, user_id: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let added: i64 = conn
            .sadd(&self.set_key, user_id)
            .await
            .map_err(store_err)?;
        Ok(added == 1)
    }

    async fn set_remove(&self, user_id: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn
            .srem(&self.set_key, user_id)
            .await
            .map_err(store_err)?;
        Ok(removed == 1)
    }

    async fn is_online(&self, user_id: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.sismember(&self.set_key, user_id)
            .await
            .map_err(store_err)
    }

    async fn filter_online(&self, candidates: &[String]) -> Result<Vec<String>> {
        if candidates.is_empty() {
            return Ok(vec![]);
        }
        let mut conn = self.conn.clone();
        let flags: Vec<bool> = conn
            .smismember(&self.set_key, candidates)
            .await
            .map_err(store_err)?;
        Ok(candidates
            .iter()
            .zip(flags)
            .filter_map(|(c, hit)| hit.then(|| c.clone()))
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        // A counter surviving a crash would suppress the next online
        // transition for up to its TTL, so the reset must take the counters
        // with the set.
        let mut conn = self.conn.clone();
        let mut keys: Vec<String> = Vec::new();
        {
            let pattern = format!("{}*", self.counter_prefix);
            let mut iter: redis::AsyncIter<String> =
                conn.scan_match(&pattern).await.map_err(store_err)?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }
        keys.push(self.set_key.clone());
        let _: i64 = conn.del(keys).await.map_err(store_err)?;
        Ok(())
    }
}

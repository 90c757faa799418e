//! Shared application state for the chatwire gateway.
//!
//! Owns the realtime hub, the presence tracker, the message router, and the
//! external-collaborator handles. The tracker is an explicitly owned instance
//! injected into connection handlers, never ambient global state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chatwire_core::error::Result;

use crate::chat::{InMemoryMessageStore, MessageRouter};
use crate::config::{GatewayConfig, StoreBackend};
use crate::directory::{ContactDirectory, InMemoryContactDirectory};
use crate::presence::{MemoryPresenceStore, PresenceStore, PresenceTracker, RedisPresenceStore};
use crate::realtime::Hub;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    hub: Arc<Hub>,
    tracker: Arc<PresenceTracker>,
    messages: Arc<MessageRouter>,
    directory: Arc<dyn ContactDirectory>,
    conn_seq: AtomicU64,
}

impl AppState {
    /// Build application state from config: select the presence store
    /// backend, reset it, and wire the tracker and router.
    pub async fn new(cfg: GatewayConfig) -> Result<Self> {
        let store: Arc<dyn PresenceStore> = match cfg.store.backend {
            StoreBackend::Memory => Arc::new(MemoryPresenceStore::new()),
            StoreBackend::Redis => Arc::new(RedisPresenceStore::connect(&cfg.store).await?),
        };
        Ok(Self::with_parts(
            cfg,
            store,
            Arc::new(InMemoryContactDirectory::new()),
        )
        .await)
    }

    /// Assemble state from explicit collaborators (used by tests to inject
    /// fakes without touching config parsing).
    pub async fn with_parts(
        cfg: GatewayConfig,
        store: Arc<dyn PresenceStore>,
        directory: Arc<dyn ContactDirectory>,
    ) -> Self {
        let hub = Arc::new(Hub::new());
        let tracker = Arc::new(PresenceTracker::new(Arc::clone(&hub), store));
        tracker.init().await;

        let messages = Arc::new(MessageRouter::new(
            Arc::clone(&hub),
            Arc::new(InMemoryMessageStore::new()),
        ));

        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                hub,
                tracker,
                messages,
                directory,
                conn_seq: AtomicU64::new(1),
            }),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.inner.hub
    }

    pub fn tracker(&self) -> &Arc<PresenceTracker> {
        &self.inner.tracker
    }

    pub fn messages(&self) -> &Arc<MessageRouter> {
        &self.inner.messages
    }

    pub fn directory(&self) -> &Arc<dyn ContactDirectory> {
        &self.inner.directory
    }

    /// Process-unique id for a freshly accepted transport connection.
    pub fn next_conn_id(&self) -> String {
        let n = self.inner.conn_seq.fetch_add(1, Ordering::Relaxed);
        format!("c-{n}")
    }
}

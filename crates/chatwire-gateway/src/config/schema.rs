use serde::Deserialize;

use chatwire_core::error::{ChatWireError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub store: StoreSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ChatWireError::UnsupportedVersion);
        }
        self.gateway.validate()?;
        self.store.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(ChatWireError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(ChatWireError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(ChatWireError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}

/// Presence store selection. `memory` is single-process only; `redis` is the
/// shared fast store for multi-process deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_online_set_key")]
    pub online_set_key: String,

    #[serde(default = "default_counter_prefix")]
    pub counter_prefix: String,

    /// Safety net against permanently-stuck counters if decrements are lost.
    #[serde(default = "default_counter_ttl_secs")]
    pub counter_ttl_secs: u64,

    #[serde(default)]
    pub redis: Option<RedisSection>,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            online_set_key: default_online_set_key(),
            counter_prefix: default_counter_prefix(),
            counter_ttl_secs: default_counter_ttl_secs(),
            redis: None,
        }
    }
}

impl StoreSection {
    pub fn validate(&self) -> Result<()> {
        if self.online_set_key.is_empty() {
            return Err(ChatWireError::BadRequest(
                "store.online_set_key must not be empty".into(),
            ));
        }
        if self.counter_prefix.is_empty() {
            return Err(ChatWireError::BadRequest(
                "store.counter_prefix must not be empty".into(),
            ));
        }
        if self.counter_ttl_secs == 0 {
            return Err(ChatWireError::BadRequest(
                "store.counter_ttl_secs must be greater than 0".into(),
            ));
        }
        if self.backend == StoreBackend::Redis && self.redis.is_none() {
            return Err(ChatWireError::BadRequest(
                "store.redis section is required when store.backend is redis".into(),
            ));
        }
        Ok(())
    }
}

fn default_online_set_key() -> String {
    "online_users".into()
}
fn default_counter_prefix() -> String {
    "conn_count:".into()
}
fn default_counter_ttl_secs() -> u64 {
    86400
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedisSection {
    pub host: String,

    #[serde(default = "default_redis_port")]
    pub port: u16,

    #[serde(default = "default_redis_username")]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

impl RedisSection {
    /// Connection URL in the form the redis client accepts.
    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}/", self.host, self.port)
        } else {
            format!(
                "redis://{}:{}@{}:{}/",
                self.username, self.password, self.host, self.port
            )
        }
    }
}

fn default_redis_port() -> u16 {
    6379
}
fn default_redis_username() -> String {
    "default".into()
}

//! Redis counter store.
//!
//! Each counter is a hash `{prefix}:{scope}:{id}` with the fields `count` and
//! `reset_at` (unix millis). Every operation runs as a single Lua script, so it
//! is atomic for all bot processes sharing the Redis instance.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{Client, RedisError, Script};

use dolle_core::domain::{Counter, CounterKey};
use dolle_core::ports::CounterStore;
use dolle_core::StoreError;

const GET_OR_CREATE: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    redis.call('HSET', KEYS[1], 'count', 0, 'reset_at', ARGV[1])
end
return redis.call('HMGET', KEYS[1], 'count', 'reset_at')
"#;

const INCREMENT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return false
end
redis.call('HINCRBY', KEYS[1], 'count', 1)
return redis.call('HMGET', KEYS[1], 'count', 'reset_at')
"#;

const ROLL_OVER: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return false
end
local reset_at = tonumber(redis.call('HGET', KEYS[1], 'reset_at'))
if reset_at <= tonumber(ARGV[1]) then
    redis.call('HSET', KEYS[1], 'count', 0, 'reset_at', ARGV[2])
end
return redis.call('HMGET', KEYS[1], 'count', 'reset_at')
"#;

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Prefix for counter keys
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            key_prefix: "dolle".to_string(),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            key_prefix: std::env::var("RATE_LIMIT_KEY_PREFIX")
                .unwrap_or_else(|_| "dolle".to_string()),
        }
    }
}

/// Redis-backed counter store.
///
/// Uses connection manager for automatic reconnection.
pub struct RedisCounterStore {
    conn: ConnectionManager,
    config: RedisConfig,
    get_or_create: Script,
    increment: Script,
    roll_over: Script,
}

impl RedisCounterStore {
    pub async fn new(config: RedisConfig) -> Result<Self, StoreError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| StoreError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Connection("Connection timed out".to_string()))?
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, prefix = %config.key_prefix, "Connected to Redis counter store");

        Ok(Self {
            conn,
            config,
            get_or_create: Script::new(GET_OR_CREATE),
            increment: Script::new(INCREMENT),
            roll_over: Script::new(ROLL_OVER),
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, StoreError> {
        Self::new(RedisConfig::from_env()).await
    }

    fn make_key(&self, key: &CounterKey) -> String {
        format!("{}:{}", self.config.key_prefix, key.storage_key())
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get_or_create(
        &self,
        key: &CounterKey,
        reset_at: DateTime<Utc>,
    ) -> Result<Counter, StoreError> {
        let mut conn = self.conn.clone();
        let fields: (Option<u64>, Option<i64>) = self
            .get_or_create
            .key(self.make_key(key))
            .arg(reset_at.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)?;

        decode(key, fields)?.ok_or_else(|| StoreError::Missing(key.storage_key()))
    }

    async fn increment(&self, key: &CounterKey) -> Result<Counter, StoreError> {
        let mut conn = self.conn.clone();
        let fields: Option<(Option<u64>, Option<i64>)> = self
            .increment
            .key(self.make_key(key))
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)?;

        let fields = fields.ok_or_else(|| StoreError::Missing(key.storage_key()))?;
        decode(key, fields)?.ok_or_else(|| StoreError::Missing(key.storage_key()))
    }

    async fn get(&self, key: &CounterKey) -> Result<Option<Counter>, StoreError> {
        let mut conn = self.conn.clone();
        let fields: (Option<u64>, Option<i64>) = redis::cmd("HMGET")
            .arg(self.make_key(key))
            .arg("count")
            .arg("reset_at")
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;

        decode(key, fields)
    }

    async fn roll_over(
        &self,
        key: &CounterKey,
        now: DateTime<Utc>,
        next_reset_at: DateTime<Utc>,
    ) -> Result<Counter, StoreError> {
        let mut conn = self.conn.clone();
        let fields: Option<(Option<u64>, Option<i64>)> = self
            .roll_over
            .key(self.make_key(key))
            .arg(now.timestamp_millis())
            .arg(next_reset_at.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)?;

        let fields = fields.ok_or_else(|| StoreError::Missing(key.storage_key()))?;
        decode(key, fields)?.ok_or_else(|| StoreError::Missing(key.storage_key()))
    }
}

/// Turn an `HMGET count reset_at` reply into a counter. Both fields absent
/// means the hash does not exist; one absent means the document is damaged.
fn decode(
    key: &CounterKey,
    fields: (Option<u64>, Option<i64>),
) -> Result<Option<Counter>, StoreError> {
    match fields {
        (None, None) => Ok(None),
        (Some(count), Some(reset_ms)) => {
            let reset_at = DateTime::from_timestamp_millis(reset_ms).ok_or_else(|| {
                StoreError::Serialization(format!("{key}: reset_at {reset_ms} out of range"))
            })?;
            Ok(Some(Counter {
                key: key.clone(),
                count,
                reset_at,
            }))
        }
        _ => Err(StoreError::Serialization(format!(
            "{key}: counter hash is missing a field"
        ))),
    }
}

fn store_error(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout()
    {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Operation(e.to_string())
    }
}

//! Redis implementation of the mapping store.
//!
//! # Key layout
//!
//! - `{prefix}map:{code}`  - JSON body of the mapping
//! - `{prefix}hits:{code}` - hit counter
//! - `{prefix}url:{url}`   - longest-lived code for a URL (dedup lookups)
//!
//! All keys of a mapping share its expiry via `PEXPIREAT`, so Redis removes
//! expired mappings itself and [`MappingStore::sweep_expired`] has nothing to
//! do. Scripts touch several keys, which assumes a single Redis node.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client, Script, aio::ConnectionManager};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::entities::{NewMapping, UrlMapping};
use crate::domain::repositories::{MappingStore, StoreError, StoreResult};
use crate::infrastructure::persistence::timeout::bounded;

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Sets the body and counter only if the body key is unused.
///
/// The URL index moves to the new code only when the indexed mapping is gone
/// or the new one outlives it, so a short-lived mapping never hides a
/// longer-lived one for the same URL.
const INSERT_IF_ABSENT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return 0
end
local expire_at = tonumber(ARGV[2])
redis.call('SET', KEYS[1], ARGV[1])
redis.call('SET', KEYS[2], 0)
if expire_at > 0 then
    redis.call('PEXPIREAT', KEYS[1], expire_at)
    redis.call('PEXPIREAT', KEYS[2], expire_at)
end

local current = redis.call('GET', KEYS[3])
local claim = (not current) or redis.call('EXISTS', ARGV[4] .. current) == 0
if not claim then
    local remaining = redis.call('PTTL', KEYS[3])
    if remaining >= 0 then
        claim = expire_at == 0 or expire_at > tonumber(ARGV[5]) + remaining
    end
end
if claim then
    redis.call('SET', KEYS[3], ARGV[3])
    if expire_at > 0 then
        redis.call('PEXPIREAT', KEYS[3], expire_at)
    end
end
return 1
"#;

/// Increments the counter only while the body key exists.
const INCREMENT_IF_PRESENT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return 0
end
redis.call('INCR', KEYS[2])
return 1
"#;

#[derive(Serialize, Deserialize)]
struct StoredMapping {
    original_url: String,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

/// Redis-backed mapping store.
pub struct RedisMappingStore {
    conn: ConnectionManager,
    prefix: String,
    timeout: Duration,
    insert_script: Script,
    increment_script: Script,
}

impl RedisMappingStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the URL is invalid or the
    /// server cannot be reached within `timeout`.
    pub async fn connect(redis_url: &str, timeout: Duration) -> StoreResult<Self> {
        let client = Client::open(redis_url)?;
        let mut conn = bounded(timeout, ConnectionManager::new(client)).await?;
        bounded(timeout, conn.ping::<()>()).await?;

        info!("✓ Connected to Redis mapping store");

        Ok(Self {
            conn,
            prefix: "shortener:".to_string(),
            timeout,
            insert_script: Script::new(INSERT_IF_ABSENT),
            increment_script: Script::new(INCREMENT_IF_PRESENT),
        })
    }

    fn map_key(&self, code: &str) -> String {
        format!("{}map:{}", self.prefix, code)
    }

    fn hits_key(&self, code: &str) -> String {
        format!("{}hits:{}", self.prefix, code)
    }

    fn url_key(&self, url: &str) -> String {
        format!("{}url:{}", self.prefix, url)
    }
}

#[async_trait]
impl MappingStore for RedisMappingStore {
    async fn insert_if_absent(&self, mapping: NewMapping) -> StoreResult<bool> {
        let body = serde_json::to_string(&StoredMapping {
            original_url: mapping.original_url.clone(),
            created_at: mapping.created_at,
            expires_at: mapping.expires_at,
        })
        .map_err(|e| StoreError::Unavailable(format!("failed to encode mapping: {e}")))?;
        let expire_at_ms = mapping.expires_at.map_or(0, |e| e.timestamp_millis().max(1));

        let mut conn = self.conn.clone();
        let inserted: i64 = bounded(
            self.timeout,
            self.insert_script
                .key(self.map_key(&mapping.code))
                .key(self.hits_key(&mapping.code))
                .key(self.url_key(&mapping.original_url))
                .arg(body)
                .arg(expire_at_ms)
                .arg(&mapping.code)
                .arg(self.map_key(""))
                .arg(Utc::now().timestamp_millis())
                .invoke_async(&mut conn),
        )
        .await?;

        Ok(inserted == 1)
    }

    async fn get(&self, code: &str) -> StoreResult<Option<UrlMapping>> {
        let mut conn = self.conn.clone();
        let (body, hits): (Option<String>, Option<i64>) = bounded(
            self.timeout,
            conn.mget(&[self.map_key(code), self.hits_key(code)]),
        )
        .await?;

        let Some(body) = body else {
            return Ok(None);
        };
        let stored: StoredMapping = serde_json::from_str(&body)
            .map_err(|e| StoreError::Unavailable(format!("corrupt mapping for {code}: {e}")))?;

        Ok(Some(UrlMapping::new(
            code.to_string(),
            stored.original_url,
            stored.created_at,
            hits.unwrap_or(0),
            stored.expires_at,
        )))
    }

    async fn increment_hit(&self, code: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let incremented: i64 = bounded(
            self.timeout,
            self.increment_script
                .key(self.map_key(code))
                .key(self.hits_key(code))
                .invoke_async(&mut conn),
        )
        .await?;

        Ok(incremented == 1)
    }

    async fn delete(&self, code: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = bounded(
            self.timeout,
            conn.del(&[self.map_key(code), self.hits_key(code)]),
        )
        .await?;

        Ok(removed > 0)
    }

    async fn sweep_expired(&self, _now: DateTime<Utc>) -> StoreResult<u64> {
        Ok(0)
    }

    async fn find_live_by_url(
        &self,
        original_url: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UrlMapping>> {
        let mut conn = self.conn.clone();
        let code: Option<String> =
            bounded(self.timeout, conn.get(self.url_key(original_url))).await?;

        let Some(code) = code else {
            return Ok(None);
        };

        // The index may point at a deleted code.
        Ok(self
            .get(&code)
            .await?
            .filter(|m| m.original_url == original_url && m.is_live_at(now)))
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        bounded(self.timeout, conn.ping::<()>()).await.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

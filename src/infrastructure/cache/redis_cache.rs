//! Redis-backed redirect cache.
//!
//! Deleting a mapping leaves a tombstone under its key instead of removing
//! it, and fills use `SET NX`. A fill computed before the delete but written
//! after it therefore lands on the tombstone and is discarded.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info, warn};

/// Value stored in place of a deleted mapping. No valid URL is empty.
const TOMBSTONE: &str = "";

/// Redis cache for fast code lookups.
///
/// Uses `ConnectionManager` for automatic reconnection. Read and write
/// errors are logged and reported as misses / successes so the redirect
/// path falls back to the mapping store.
pub struct RedisCache {
    client: ConnectionManager,
    key_prefix: String,
    /// How long a tombstone blocks fills; at least the longest entry TTL.
    tombstone_ttl_seconds: u64,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// `tombstone_ttl_seconds` should be the configured cache TTL, so no
    /// fill racing a delete can outlive its tombstone.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the
    /// connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str, tombstone_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis cache");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis cache");

        Ok(Self {
            client: manager,
            key_prefix: "shortener:cache:".to_string(),
            tombstone_ttl_seconds: tombstone_ttl_seconds.max(1),
        })
    }

    fn build_key(&self, code: &str) -> String {
        format!("{}{}", self.key_prefix, code)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, code: &str) -> CacheResult<Option<String>> {
        let key = self.build_key(code);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(url)) if url != TOMBSTONE => {
                debug!("Cache HIT: {}", code);
                Ok(Some(url))
            }
            Ok(_) => {
                debug!("Cache MISS: {}", code);
                Ok(None)
            }
            Err(e) => {
                warn!("Redis GET error for {}: {}", code, e);
                Ok(None)
            }
        }
    }

    async fn set_url(&self, code: &str, original_url: &str, ttl_seconds: u64) -> CacheResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let key = self.build_key(code);
        let mut conn = self.client.clone();

        // NX: never replace a tombstone or a live entry.
        let stored = redis::cmd("SET")
            .arg(&key)
            .arg(original_url)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async::<redis::Value>(&mut conn)
            .await;

        match stored {
            Ok(redis::Value::Nil) => {
                debug!("Cache SET skipped, key occupied: {}", code);
                Ok(())
            }
            Ok(_) => {
                debug!("Cache SET: {} (TTL: {}s)", code, ttl_seconds);
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", code, e);
                Ok(())
            }
        }
    }

    async fn invalidate(&self, code: &str) -> CacheResult<()> {
        let key = self.build_key(code);
        let mut conn = self.client.clone();

        match conn
            .set_ex::<_, _, ()>(&key, TOMBSTONE, self.tombstone_ttl_seconds)
            .await
        {
            Ok(()) => {
                debug!("Cache INVALIDATE: {}", code);
                Ok(())
            }
            Err(e) => Err(CacheError::OperationError(format!(
                "Redis tombstone SET failed for {}: {}",
                code, e
            ))),
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

//! Cache service trait and error types.

use async_trait::async_trait;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Read-through cache of code to URL for the redirect path.
///
/// Mappings are immutable, so a cached URL is always correct as long as the
/// entry does not outlive the mapping. Callers cap `ttl_seconds` at the
/// mapping's remaining lifetime and invalidate on delete.
///
/// Cache failures must degrade to store reads, never fail a resolution.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns the cached URL for `code`, `Ok(None)` on a miss.
    async fn get_url(&self, code: &str) -> CacheResult<Option<String>>;

    /// Stores `original_url` under `code` for `ttl_seconds`.
    ///
    /// Must not overwrite an invalidated entry: a fill issued before a delete
    /// may arrive after it.
    async fn set_url(&self, code: &str, original_url: &str, ttl_seconds: u64) -> CacheResult<()>;

    /// Drops a cached entry and blocks later fills for it. Used when a
    /// mapping is deleted.
    async fn invalidate(&self, code: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

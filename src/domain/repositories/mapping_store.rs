//! Storage contract for code to URL mappings.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{NewMapping, UrlMapping};

/// Failures of the persistence layer itself.
///
/// An absent code is never an error: lookups return `Ok(None)` and
/// conditional writes return `Ok(false)`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage operation exceeded its {0:?} budget")]
    Timeout(Duration),
}

/// Result type for store primitives.
pub type StoreResult<T> = Result<T, StoreError>;

/// The shared mutable state of the engine.
///
/// All mutation goes through the atomic primitives [`Self::insert_if_absent`],
/// [`Self::increment_hit`], [`Self::delete`] and [`Self::sweep_expired`].
/// Callers never read-modify-write a mapping themselves.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::InMemoryMappingStore`] - process-local map
/// - [`crate::infrastructure::persistence::PgMappingStore`] - PostgreSQL
/// - [`crate::infrastructure::persistence::RedisMappingStore`] - Redis
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Commits `mapping` only if its code is unused.
    ///
    /// Returns `Ok(false)` without touching state when the code is taken. A
    /// mapping that expired but has not been swept still holds its code.
    /// The check and the write are indivisible even across concurrent callers.
    async fn insert_if_absent(&self, mapping: NewMapping) -> StoreResult<bool>;

    /// Reads a committed mapping.
    ///
    /// Expired mappings that are still physically present are returned as-is;
    /// callers decide liveness with [`UrlMapping::is_live_at`].
    async fn get(&self, code: &str) -> StoreResult<Option<UrlMapping>>;

    /// Atomically bumps `hit_count` of a live mapping.
    ///
    /// Returns `Ok(false)` if the mapping is absent or expired.
    async fn increment_hit(&self, code: &str) -> StoreResult<bool>;

    /// Removes a mapping. Returns `Ok(false)` if there was nothing to remove.
    async fn delete(&self, code: &str) -> StoreResult<bool>;

    /// Removes every mapping whose `expires_at` is before `now`.
    ///
    /// Returns how many mappings were removed.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Finds a live mapping pointing at exactly `original_url`.
    ///
    /// Only used by the reuse dedup policy.
    async fn find_live_by_url(
        &self,
        original_url: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UrlMapping>>;

    /// Checks whether the backend is reachable.
    async fn health_check(&self) -> bool;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

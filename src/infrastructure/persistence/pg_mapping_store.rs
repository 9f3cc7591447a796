//! PostgreSQL implementation of the mapping store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entities::{NewMapping, UrlMapping};
use crate::domain::repositories::{MappingStore, StoreError, StoreResult};
use crate::infrastructure::persistence::timeout::bounded;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => StoreError::Unavailable("connection pool timed out".into()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

#[derive(sqlx::FromRow)]
struct MappingRow {
    code: String,
    original_url: String,
    created_at: DateTime<Utc>,
    hit_count: i64,
    expires_at: Option<DateTime<Utc>>,
}

impl From<MappingRow> for UrlMapping {
    fn from(r: MappingRow) -> Self {
        UrlMapping::new(r.code, r.original_url, r.created_at, r.hit_count, r.expires_at)
    }
}

/// PostgreSQL repository for url mappings.
///
/// Uniqueness comes from the primary key on `code`: the conditional insert is
/// a single `INSERT ... ON CONFLICT DO NOTHING` statement, and hit counting is
/// a single conditional `UPDATE`. Every statement runs inside the store's
/// time budget.
pub struct PgMappingStore {
    pool: Arc<PgPool>,
    timeout: Duration,
}

impl PgMappingStore {
    /// Creates a new store over a connection pool.
    pub fn new(pool: Arc<PgPool>, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl MappingStore for PgMappingStore {
    async fn insert_if_absent(&self, mapping: NewMapping) -> StoreResult<bool> {
        let result = bounded(
            self.timeout,
            sqlx::query(
                r#"
                INSERT INTO url_mappings (code, original_url, created_at, expires_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (code) DO NOTHING
                "#,
            )
            .bind(&mapping.code)
            .bind(&mapping.original_url)
            .bind(mapping.created_at)
            .bind(mapping.expires_at)
            .execute(self.pool.as_ref()),
        )
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, code: &str) -> StoreResult<Option<UrlMapping>> {
        let row = bounded(
            self.timeout,
            sqlx::query_as::<_, MappingRow>(
                r#"
                SELECT code, original_url, created_at, hit_count, expires_at
                FROM url_mappings
                WHERE code = $1
                "#,
            )
            .bind(code)
            .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        Ok(row.map(UrlMapping::from))
    }

    async fn increment_hit(&self, code: &str) -> StoreResult<bool> {
        let result = bounded(
            self.timeout,
            sqlx::query(
                r#"
                UPDATE url_mappings
                SET hit_count = hit_count + 1
                WHERE code = $1 AND (expires_at IS NULL OR expires_at >= $2)
                "#,
            )
            .bind(code)
            .bind(Utc::now())
            .execute(self.pool.as_ref()),
        )
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, code: &str) -> StoreResult<bool> {
        let result = bounded(
            self.timeout,
            sqlx::query("DELETE FROM url_mappings WHERE code = $1")
                .bind(code)
                .execute(self.pool.as_ref()),
        )
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = bounded(
            self.timeout,
            sqlx::query("DELETE FROM url_mappings WHERE expires_at IS NOT NULL AND expires_at < $1")
                .bind(now)
                .execute(self.pool.as_ref()),
        )
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_live_by_url(
        &self,
        original_url: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UrlMapping>> {
        let row = bounded(
            self.timeout,
            sqlx::query_as::<_, MappingRow>(
                r#"
                SELECT code, original_url, created_at, hit_count, expires_at
                FROM url_mappings
                WHERE original_url = $1 AND (expires_at IS NULL OR expires_at >= $2)
                ORDER BY created_at DESC
                LIMIT 1
                "#,
            )
            .bind(original_url)
            .bind(now)
            .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        Ok(row.map(UrlMapping::from))
    }

    async fn health_check(&self) -> bool {
        bounded(
            self.timeout,
            sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(self.pool.as_ref()),
        )
        .await
        .is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

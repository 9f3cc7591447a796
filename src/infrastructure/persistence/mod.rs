//! Mapping store backends.
//!
//! Every backend implements [`MappingStore`] with the same atomicity contract:
//! `insert_if_absent` never overwrites, and `increment_hit` never creates.
//!
//! # Backends
//!
//! - [`InMemoryMappingStore`] - Process-local, for development and tests
//! - [`PgMappingStore`] - PostgreSQL via SQLx, schema managed by `./migrations`
//! - [`RedisMappingStore`] - Redis with Lua scripts for the conditional writes

pub mod memory_mapping_store;
pub mod pg_mapping_store;
pub mod redis_mapping_store;
pub(crate) mod timeout;

pub use memory_mapping_store::InMemoryMappingStore;
pub use pg_mapping_store::PgMappingStore;
pub use redis_mapping_store::RedisMappingStore;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::{Config, StorageBackend, mask_connection_string};
use crate::domain::repositories::MappingStore;

/// Opens the PostgreSQL pool described by `config` and applies pending migrations.
pub async fn connect_pg_pool(database_url: &str, config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database {}",
                mask_connection_string(database_url)
            )
        })?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply database migrations")?;

    Ok(pool)
}

/// Builds the mapping store selected by `STORAGE_BACKEND`.
///
/// # Errors
///
/// Returns an error if the selected backend cannot be reached. A misconfigured
/// backend is a startup failure; there is no silent fallback to memory.
pub async fn connect(config: &Config) -> Result<Arc<dyn MappingStore>> {
    let store: Arc<dyn MappingStore> = match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; mappings are lost on restart");
            Arc::new(InMemoryMappingStore::new())
        }
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;
            let pool = connect_pg_pool(url, config).await?;
            Arc::new(PgMappingStore::new(Arc::new(pool), config.store_timeout()))
        }
        StorageBackend::Redis => {
            let url = config
                .storage_redis_url
                .as_deref()
                .context("STORAGE_REDIS_URL is required for the redis backend")?;
            let store = RedisMappingStore::connect(url, config.store_timeout())
                .await
                .with_context(|| {
                    format!(
                        "Failed to connect to storage Redis {}",
                        mask_connection_string(url)
                    )
                })?;
            Arc::new(store)
        }
    };

    tracing::info!(backend = store.backend_name(), "Mapping store ready");
    Ok(store)
}

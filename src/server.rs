//! HTTP server initialization and runtime setup.
//!
//! Handles store and cache connections, background worker spawning, and the
//! Axum server lifecycle.

use crate::config::Config;
use crate::domain::expiry_sweeper::run_expiry_sweeper;
use crate::domain::hit_worker::run_hit_worker;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// How long shutdown waits for queued hit events to be written.
const HIT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level; `LOG_FORMAT=json`
/// switches to one JSON object per line.
pub fn init_tracing(log_level: &str, log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Connects the redirect cache, or falls back to [`NullCache`].
///
/// A cache outage at startup is not fatal; redirects are served from the store.
pub async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                Arc::new(NullCache::new())
            }
        }
    } else {
        tracing::info!("Cache disabled (NullCache)");
        Arc::new(NullCache::new())
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Mapping store selected by `STORAGE_BACKEND` (migrations applied for PostgreSQL)
/// - Redis cache (or NullCache fallback)
/// - Background hit worker and expiry sweeper
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - The store cannot be reached
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let store = persistence::connect(&config).await?;
    let cache = connect_cache(&config).await;

    let (hit_tx, hit_rx) = mpsc::channel(config.hit_queue_capacity);
    let hit_worker = tokio::spawn(run_hit_worker(
        hit_rx,
        store.clone(),
        config.hit_worker_concurrency,
    ));
    tracing::info!("Hit worker started");

    let sweeper = config.sweep_interval().map(|period| {
        tracing::info!(period_secs = period.as_secs(), "Expiry sweeper started");
        tokio::spawn(run_expiry_sweeper(store.clone(), period))
    });

    let state = AppState::new(
        store,
        cache,
        hit_tx,
        config.engine_settings(),
        config.base_url.clone(),
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the last hit sender, so the worker now drains and exits.
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    match tokio::time::timeout(HIT_DRAIN_TIMEOUT, hit_worker).await {
        Ok(_) => tracing::info!("Shutdown complete"),
        Err(_) => tracing::warn!("Hit worker did not drain in time; pending hits dropped"),
    }

    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

//! Periodic removal of expired mappings.
//!
//! Resolution already treats expired mappings as absent, so the sweeper only
//! reclaims space and frees their codes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::domain::repositories::{MappingStore, StoreResult};

/// Runs one sweep and logs the outcome.
pub async fn sweep_once(store: &dyn MappingStore) -> StoreResult<u64> {
    let removed = store.sweep_expired(Utc::now()).await?;

    if removed > 0 {
        info!(removed, "Swept expired mappings");
        metrics::counter!("shortener_mappings_swept_total").increment(removed);
    } else {
        debug!("Expiry sweep found nothing to remove");
    }

    Ok(removed)
}

/// Sweeps forever, once per `period`.
///
/// A failed sweep is logged and retried on the next tick.
pub async fn run_expiry_sweeper(store: Arc<dyn MappingStore>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; skip it so startup is not a sweep.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(e) = sweep_once(store.as_ref()).await {
            warn!(error = %e, "Expiry sweep failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockMappingStore, StoreError};

    #[tokio::test]
    async fn test_sweep_once_reports_removed_count() {
        let mut store = MockMappingStore::new();
        store
            .expect_sweep_expired()
            .times(1)
            .returning(|_| Ok(4));

        assert_eq!(sweep_once(&store).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_sweep_once_propagates_store_failure() {
        let mut store = MockMappingStore::new();
        store
            .expect_sweep_expired()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("down".to_string())));

        assert!(matches!(
            sweep_once(&store).await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_each_period() {
        let mut store = MockMappingStore::new();
        store
            .expect_sweep_expired()
            .times(2..)
            .returning(|_| Ok(0));

        let handle = tokio::spawn(run_expiry_sweeper(
            Arc::new(store),
            Duration::from_secs(60),
        ));

        tokio::time::sleep(Duration::from_secs(125)).await;
        handle.abort();
        let _ = handle.await;
    }
}

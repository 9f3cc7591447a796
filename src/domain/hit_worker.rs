//! Background worker that applies hit events to the store.
//!
//! Hit counting is advisory: a failed increment is retried a few times with
//! backoff and then dropped. It never feeds back into a resolution.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

use crate::domain::hit_event::HitEvent;
use crate::domain::repositories::MappingStore;

/// Retries after the first failed increment.
const MAX_RETRIES: usize = 3;

/// What happened to a single hit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Recorded,
    /// The mapping was deleted or expired before the increment ran.
    Gone,
    Failed,
}

/// Drains `rx` until every sender is dropped.
///
/// At most `concurrency` increments are in flight at once. In-flight
/// increments are awaited before returning.
pub async fn run_hit_worker(
    mut rx: mpsc::Receiver<HitEvent>,
    store: Arc<dyn MappingStore>,
    concurrency: usize,
) {
    let concurrency = concurrency.max(1);
    let permits = Arc::new(Semaphore::new(concurrency));

    while let Some(event) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let store = store.clone();

        tokio::spawn(async move {
            record_hit(store.as_ref(), &event).await;
            drop(permit);
        });
    }

    let _ = permits.acquire_many(concurrency as u32).await;
    info!("Hit worker stopped");
}

/// Applies one hit event, retrying transient store failures.
pub async fn record_hit(store: &dyn MappingStore, event: &HitEvent) -> HitOutcome {
    let strategy = ExponentialBackoff::from_millis(10)
        .max_delay(Duration::from_millis(500))
        .map(jitter)
        .take(MAX_RETRIES);

    match Retry::spawn(strategy, || store.increment_hit(&event.code)).await {
        Ok(true) => {
            metrics::counter!("shortener_hits_recorded_total").increment(1);
            HitOutcome::Recorded
        }
        Ok(false) => {
            debug!(code = %event.code, "Hit dropped, mapping no longer live");
            HitOutcome::Gone
        }
        Err(e) => {
            warn!(code = %event.code, error = %e, "Hit dropped after retries");
            metrics::counter!("shortener_hits_failed_total").increment(1);
            HitOutcome::Failed
        }
    }
}

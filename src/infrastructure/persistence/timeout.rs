//! Time budget for store primitives.

use std::future::Future;
use std::time::Duration;

use crate::domain::repositories::{StoreError, StoreResult};

/// Runs `fut` within `budget`, converting its error into [`StoreError`].
///
/// A primitive that does not finish in time yields [`StoreError::Timeout`].
/// Dropping the future cancels the client-side wait only; a write the
/// backend already received may still commit.
pub(crate) async fn bounded<T, E, F>(budget: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<StoreError>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(StoreError::Timeout(budget)),
    }
}

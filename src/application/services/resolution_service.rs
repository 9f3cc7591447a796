//! Code resolution service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, warn};

use crate::domain::entities::UrlMapping;
use crate::domain::hit_event::HitEvent;
use crate::domain::repositories::MappingStore;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::CodePolicy;

/// Service behind the `Resolve` entry point.
///
/// # Request Flow
///
/// 1. Reject codes outside the [`CodePolicy`] without touching the store
/// 2. Check the redirect cache
/// 3. On a miss, read the store and drop expired mappings
/// 4. Populate the cache in the background
/// 5. Offer a [`HitEvent`] to the hit worker
///
/// Hit counting never affects the outcome: a full or closed hit queue just
/// drops the event.
pub struct ResolutionService {
    store: Arc<dyn MappingStore>,
    cache: Arc<dyn CacheService>,
    hit_sender: mpsc::Sender<HitEvent>,
    policy: CodePolicy,
    cache_ttl_seconds: u64,
}

impl ResolutionService {
    pub fn new(
        store: Arc<dyn MappingStore>,
        cache: Arc<dyn CacheService>,
        hit_sender: mpsc::Sender<HitEvent>,
        policy: CodePolicy,
        cache_ttl_seconds: u64,
    ) -> Self {
        Self {
            store,
            cache,
            hit_sender,
            policy,
            cache_ttl_seconds,
        }
    }

    /// Resolves `code` to its original URL.
    ///
    /// Returns `Ok(None)` for malformed, absent and expired codes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] if the store could not be read.
    pub async fn resolve(&self, code: &str) -> Result<Option<String>, AppError> {
        if !self.policy.is_valid(code) {
            debug!(code, "Malformed code, skipping lookup");
            return Ok(None);
        }

        match self.cache.get_url(code).await {
            Ok(Some(url)) => {
                self.record_hit(code);
                return Ok(Some(url));
            }
            Ok(None) => {}
            Err(e) => warn!(code, error = %e, "Cache read failed, falling back to store"),
        }

        let mapping = self.store.get(code).await.inspect_err(|e| {
            error!(code, error = %e, "Mapping store unavailable during resolve");
        })?;

        let now = Utc::now();
        let Some(mapping) = mapping.filter(|m| m.is_live_at(now)) else {
            debug!(code, "Code not found or expired");
            return Ok(None);
        };

        self.populate_cache(&mapping, now);
        self.record_hit(code);

        Ok(Some(mapping.original_url))
    }

    /// Seconds a resolved mapping may stay cached: never past its expiry.
    fn cache_ttl_for(&self, mapping: &UrlMapping, now: DateTime<Utc>) -> u64 {
        match mapping.expires_at {
            Some(expires_at) => {
                let remaining = (expires_at - now).num_seconds().max(0) as u64;
                remaining.min(self.cache_ttl_seconds)
            }
            None => self.cache_ttl_seconds,
        }
    }

    fn populate_cache(&self, mapping: &UrlMapping, now: DateTime<Utc>) {
        let ttl = self.cache_ttl_for(mapping, now);
        if ttl == 0 {
            return;
        }

        let cache = self.cache.clone();
        let code = mapping.code.clone();
        let url = mapping.original_url.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.set_url(&code, &url, ttl).await {
                warn!(code, error = %e, "Failed to cache URL");
            }
        });
    }

    fn record_hit(&self, code: &str) {
        match self.hit_sender.try_send(HitEvent::new(code)) {
            Ok(()) => metrics::counter!("shortener_hits_enqueued_total").increment(1),
            Err(TrySendError::Full(_)) => {
                debug!(code, "Hit queue full, dropping hit");
                metrics::counter!("shortener_hits_dropped_total").increment(1);
            }
            Err(TrySendError::Closed(_)) => {
                warn!(code, "Hit queue closed, dropping hit");
                metrics::counter!("shortener_hits_dropped_total").increment(1);
            }
        }
    }
}

//! Link creation and management service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{error, info, warn};

use crate::application::services::allocator::CodeAllocator;
use crate::application::settings::{DedupPolicy, EngineSettings};
use crate::domain::entities::{NewMapping, UrlMapping};
use crate::domain::expiry_sweeper::sweep_once;
use crate::domain::repositories::MappingStore;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::{CodeGenerator, CodePolicy};
use crate::utils::url_validator::validate_url;

/// Optional knobs for [`LinkService::shorten_with`].
#[derive(Debug, Clone, Default)]
pub struct ShortenOptions {
    /// Use this code instead of allocating one.
    pub custom_code: Option<String>,
    /// `None` applies the configured default, `Some(None)` never expires,
    /// `Some(Some(d))` expires `d` from now.
    pub expires_in: Option<Option<Duration>>,
}

/// A committed (or reused) mapping together with its public short URL.
#[derive(Debug, Clone)]
pub struct ShortenedLink {
    pub mapping: UrlMapping,
    pub short_url: String,
    /// True when an existing mapping was returned under the reuse policy.
    pub reused: bool,
}

/// Service behind the `Shorten` entry point.
///
/// Validates input, applies the expiry and dedup policies and delegates
/// code allocation to [`CodeAllocator`].
pub struct LinkService {
    store: Arc<dyn MappingStore>,
    cache: Arc<dyn CacheService>,
    allocator: CodeAllocator,
    policy: CodePolicy,
    settings: EngineSettings,
    base_url: String,
}

impl LinkService {
    pub fn new(
        store: Arc<dyn MappingStore>,
        generator: Arc<dyn CodeGenerator>,
        cache: Arc<dyn CacheService>,
        settings: EngineSettings,
        base_url: impl Into<String>,
    ) -> Self {
        let policy = CodePolicy::new(settings.code_length);
        let allocator = CodeAllocator::new(
            store.clone(),
            generator,
            policy,
            settings.max_attempts,
        );

        Self {
            store,
            cache,
            allocator,
            policy,
            settings,
            base_url: base_url.into(),
        }
    }

    /// Shortens `long_url` with the configured defaults.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the URL is malformed
    /// - [`AppError::AllocationExhausted`] if no unique code was found in time
    /// - [`AppError::StoreUnavailable`] if the store failed
    pub async fn shorten(&self, long_url: &str) -> Result<ShortenedLink, AppError> {
        self.shorten_with(long_url, ShortenOptions::default()).await
    }

    /// Shortens `long_url` with an optional custom code and expiry.
    ///
    /// # Custom codes
    ///
    /// A custom code is committed with a single conditional insert. If it is
    /// taken the call fails with [`AppError::Conflict`]; it is never retried
    /// or replaced.
    ///
    /// # Dedup
    ///
    /// Under [`DedupPolicy::ReuseExisting`], a request without a custom code
    /// or explicit expiry returns an existing live mapping for the identical
    /// URL when there is one.
    ///
    /// # Errors
    ///
    /// See [`Self::shorten`]; additionally [`AppError::Conflict`] for a taken
    /// custom code and [`AppError::Validation`] for a malformed one or an
    /// expiry that is not positive or lands past the representable range.
    pub async fn shorten_with(
        &self,
        long_url: &str,
        options: ShortenOptions,
    ) -> Result<ShortenedLink, AppError> {
        validate_url(long_url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        let now = Utc::now();
        let explicit_expiry = options.expires_in.is_some();
        let expires_at = self.resolve_expiry(options.expires_in, now)?;

        let result = if let Some(custom) = options.custom_code {
            self.create_custom(custom, long_url, expires_at).await
        } else {
            if self.settings.dedup_policy == DedupPolicy::ReuseExisting
                && !explicit_expiry
                && let Some(existing) = self
                    .store
                    .find_live_by_url(long_url, now)
                    .await
                    .inspect_err(|e| error!(error = %e, "Dedup lookup failed"))?
            {
                info!(code = %existing.code, "Reusing existing short link");
                return Ok(self.to_link(existing, true));
            }

            self.allocator.allocate(long_url, expires_at).await
        };

        let mapping = result.inspect_err(|e| log_store_failure("shorten", e))?;
        info!(code = %mapping.code, expires_at = ?mapping.expires_at, "Short link created");

        Ok(self.to_link(mapping, false))
    }

    /// Returns the live mapping for `code`, including its hit count.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for malformed, absent or expired codes.
    pub async fn link_info(&self, code: &str) -> Result<UrlMapping, AppError> {
        if self.policy.is_valid(code) {
            let found = self
                .store
                .get(code)
                .await
                .inspect_err(|e| error!(code, error = %e, "Link lookup failed"))?;

            if let Some(mapping) = found.filter(|m| m.is_live_at(Utc::now())) {
                return Ok(mapping);
            }
        }

        Err(AppError::not_found(
            "Short link not found",
            json!({ "code": code }),
        ))
    }

    /// Deletes the mapping for `code` and drops it from the redirect cache.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if nothing was stored under `code`.
    pub async fn delete_link(&self, code: &str) -> Result<(), AppError> {
        let deleted = self
            .store
            .delete(code)
            .await
            .inspect_err(|e| error!(code, error = %e, "Link delete failed"))?;

        if !deleted {
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "code": code }),
            ));
        }

        if let Err(e) = self.cache.invalidate(code).await {
            warn!(code, error = %e, "Failed to invalidate cached link");
        }

        info!(code, "Short link deleted");
        Ok(())
    }

    /// Removes every expired mapping now. Returns how many were removed.
    pub async fn sweep_expired(&self) -> Result<u64, AppError> {
        sweep_once(self.store.as_ref())
            .await
            .map_err(AppError::from)
            .inspect_err(|e| log_store_failure("sweep", e))
    }

    /// Builds the public short URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), code)
    }

    async fn create_custom(
        &self,
        code: String,
        long_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<UrlMapping, AppError> {
        self.policy.validate_custom(&code)?;

        let new_mapping = NewMapping::new(code, long_url.to_string(), expires_at);
        if !self.store.insert_if_absent(new_mapping.clone()).await? {
            return Err(AppError::conflict(
                "Custom code already exists",
                json!({ "code": new_mapping.code }),
            ));
        }

        Ok(new_mapping.into_mapping())
    }

    fn resolve_expiry(
        &self,
        expires_in: Option<Option<Duration>>,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let lifetime = match expires_in {
            None => self.settings.default_expiry,
            Some(None) => None,
            Some(Some(d)) if d > Duration::zero() => Some(d),
            Some(Some(d)) => {
                return Err(AppError::bad_request(
                    "Expiry must be positive",
                    json!({ "expires_in_seconds": d.num_seconds() }),
                ));
            }
        };

        lifetime
            .map(|d| {
                now.checked_add_signed(d).ok_or_else(|| {
                    AppError::bad_request(
                        "Expiry is too far in the future",
                        json!({ "expires_in_seconds": d.num_seconds() }),
                    )
                })
            })
            .transpose()
    }

    fn to_link(&self, mapping: UrlMapping, reused: bool) -> ShortenedLink {
        ShortenedLink {
            short_url: self.short_url(&mapping.code),
            mapping,
            reused,
        }
    }
}

/// Logs store outages at the service boundary; other errors are the caller's.
pub(crate) fn log_store_failure(operation: &str, err: &AppError) {
    if let AppError::StoreUnavailable(inner) = err {
        error!(operation, error = %inner, "Mapping store unavailable");
    }
}

//! Collision-resolving code allocation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::entities::{NewMapping, UrlMapping};
use crate::domain::repositories::MappingStore;
use crate::error::AppError;
use crate::utils::code_generator::{CodeGenerator, CodePolicy};

/// Secures a unique code for a URL and commits the mapping.
///
/// Uniqueness rests entirely on [`MappingStore::insert_if_absent`]: two
/// concurrent allocations that draw the same candidate get exactly one
/// winner, and the loser moves on to its next attempt.
pub struct CodeAllocator {
    store: Arc<dyn MappingStore>,
    generator: Arc<dyn CodeGenerator>,
    policy: CodePolicy,
    max_attempts: u32,
}

impl CodeAllocator {
    /// Creates an allocator. `max_attempts` is raised to at least one.
    pub fn new(
        store: Arc<dyn MappingStore>,
        generator: Arc<dyn CodeGenerator>,
        policy: CodePolicy,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            generator,
            policy,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Allocates a code for `long_url` and commits the mapping.
    ///
    /// Collisions are retried with a fresh candidate, up to `max_attempts`
    /// candidates in total. Candidates that break the code policy use up an
    /// attempt without reaching the store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AllocationExhausted`] when every attempt collided.
    /// Returns [`AppError::StoreUnavailable`] as soon as the store fails; a
    /// store failure is not retried here.
    pub async fn allocate(
        &self,
        long_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<UrlMapping, AppError> {
        for attempt in 0..self.max_attempts {
            let code = self.generator.generate(long_url, attempt);

            if !self.policy.is_valid(&code) || self.policy.is_reserved(&code) {
                warn!(%code, attempt, "Generator produced an unusable code");
                continue;
            }

            let candidate = NewMapping::new(code, long_url.to_string(), expires_at);

            if self.store.insert_if_absent(candidate.clone()).await? {
                debug!(code = %candidate.code, attempt, "Allocated short code");
                metrics::counter!("shortener_allocations_total").increment(1);
                return Ok(candidate.into_mapping());
            }

            debug!(code = %candidate.code, attempt, "Short code collision, retrying");
            metrics::counter!("shortener_code_collisions_total").increment(1);
        }

        warn!(attempts = self.max_attempts, "Short code allocation exhausted");
        metrics::counter!("shortener_allocations_exhausted_total").increment(1);

        Err(AppError::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockMappingStore, StoreError};
    use crate::utils::code_generator::MockCodeGenerator;
    use mockall::Sequence;

    fn allocator(store: MockMappingStore, generator: MockCodeGenerator, max: u32) -> CodeAllocator {
        CodeAllocator::new(
            Arc::new(store),
            Arc::new(generator),
            CodePolicy::default(),
            max,
        )
    }

    #[tokio::test]
    async fn test_allocate_first_attempt() {
        let mut generator = MockCodeGenerator::new();
        generator
            .expect_generate()
            .withf(|url, attempt| url == "https://example.com" && *attempt == 0)
            .times(1)
            .returning(|_, _| "aZ3kT1x".to_string());

        let mut store = MockMappingStore::new();
        store
            .expect_insert_if_absent()
            .withf(|m| m.code == "aZ3kT1x" && m.original_url == "https://example.com")
            .times(1)
            .returning(|_| Ok(true));

        let mapping = allocator(store, generator, 8)
            .allocate("https://example.com", None)
            .await
            .unwrap();

        assert_eq!(mapping.code, "aZ3kT1x");
        assert_eq!(mapping.original_url, "https://example.com");
        assert_eq!(mapping.hit_count, 0);
    }

    #[tokio::test]
    async fn test_allocate_retries_after_collision_with_next_attempt() {
        let mut seq = Sequence::new();
        let mut generator = MockCodeGenerator::new();
        generator
            .expect_generate()
            .withf(|_, attempt| *attempt == 0)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| "takenAA".to_string());
        generator
            .expect_generate()
            .withf(|_, attempt| *attempt == 1)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| "freshBB".to_string());

        let mut store = MockMappingStore::new();
        store
            .expect_insert_if_absent()
            .withf(|m| m.code == "takenAA")
            .times(1)
            .returning(|_| Ok(false));
        store
            .expect_insert_if_absent()
            .withf(|m| m.code == "freshBB")
            .times(1)
            .returning(|_| Ok(true));

        let mapping = allocator(store, generator, 8)
            .allocate("https://example.com/x", None)
            .await
            .unwrap();

        assert_eq!(mapping.code, "freshBB");
    }

    #[tokio::test]
    async fn test_allocate_exhausts_within_bound() {
        let mut generator = MockCodeGenerator::new();
        generator
            .expect_generate()
            .times(5)
            .returning(|_, _| "sameOne".to_string());

        let mut store = MockMappingStore::new();
        store
            .expect_insert_if_absent()
            .times(5)
            .returning(|_| Ok(false));

        let err = allocator(store, generator, 5)
            .allocate("https://example.com", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AllocationExhausted { attempts: 5 }));
    }

    #[tokio::test]
    async fn test_allocate_does_not_retry_store_failure() {
        let mut generator = MockCodeGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_, _| "aZ3kT1x".to_string());

        let mut store = MockMappingStore::new();
        store
            .expect_insert_if_absent()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("connection refused".to_string())));

        let err = allocator(store, generator, 8)
            .allocate("https://example.com", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_allocate_skips_unusable_candidates() {
        let mut seq = Sequence::new();
        let mut generator = MockCodeGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| "bad-code".to_string());
        generator
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| "health".to_string());
        generator
            .expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| "goodOne".to_string());

        let mut store = MockMappingStore::new();
        store
            .expect_insert_if_absent()
            .withf(|m| m.code == "goodOne")
            .times(1)
            .returning(|_| Ok(true));

        let mapping = allocator(store, generator, 3)
            .allocate("https://example.com", None)
            .await
            .unwrap();

        assert_eq!(mapping.code, "goodOne");
    }

    #[tokio::test]
    async fn test_allocate_carries_expiry() {
        let expires_at = Utc::now() + chrono::Duration::hours(24);

        let mut generator = MockCodeGenerator::new();
        generator
            .expect_generate()
            .returning(|_, _| "expiry1".to_string());

        let mut store = MockMappingStore::new();
        store
            .expect_insert_if_absent()
            .withf(move |m| m.expires_at == Some(expires_at))
            .times(1)
            .returning(|_| Ok(true));

        let mapping = allocator(store, generator, 8)
            .allocate("https://example.com", Some(expires_at))
            .await
            .unwrap();

        assert_eq!(mapping.expires_at, Some(expires_at));
    }

    #[tokio::test]
    async fn test_max_attempts_at_least_one() {
        let mut generator = MockCodeGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_, _| "taken12".to_string());

        let mut store = MockMappingStore::new();
        store
            .expect_insert_if_absent()
            .times(1)
            .returning(|_| Ok(false));

        let err = allocator(store, generator, 0)
            .allocate("https://example.com", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AllocationExhausted { attempts: 1 }));
    }
}

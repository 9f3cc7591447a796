//! Requires a disposable Redis instance in `TEST_REDIS_URL`:
//! `TEST_REDIS_URL=redis://localhost:6379/15 cargo test --test repository_redis -- --ignored`

use chrono::{Duration, Utc};
use rand::Rng;
use shortener::domain::entities::NewMapping;
use shortener::domain::repositories::MappingStore;
use shortener::infrastructure::cache::{CacheService, RedisCache};
use shortener::infrastructure::persistence::RedisMappingStore;

async fn store() -> RedisMappingStore {
    let url = std::env::var("TEST_REDIS_URL").expect("TEST_REDIS_URL must be set");
    RedisMappingStore::connect(&url, std::time::Duration::from_secs(2))
        .await
        .unwrap()
}

async fn cache() -> RedisCache {
    let url = std::env::var("TEST_REDIS_URL").expect("TEST_REDIS_URL must be set");
    RedisCache::connect(&url, 60).await.unwrap()
}

/// Keys are shared across runs, so every test uses fresh codes.
fn unique_code() -> String {
    let n: u64 = rand::rng().random_range(0..u64::MAX);
    format!("t{n:015}").chars().take(12).collect()
}

#[tokio::test]
#[ignore = "needs TEST_REDIS_URL"]
async fn test_insert_if_absent() {
    let repo = store().await;
    let code = unique_code();

    let first = NewMapping::new(code.clone(), "https://a.example".to_string(), None);
    let second = NewMapping::new(code.clone(), "https://b.example".to_string(), None);

    assert!(repo.insert_if_absent(first).await.unwrap());
    assert!(!repo.insert_if_absent(second).await.unwrap());

    let stored = repo.get(&code).await.unwrap().unwrap();
    assert_eq!(stored.original_url, "https://a.example");
    assert_eq!(stored.hit_count, 0);

    repo.delete(&code).await.unwrap();
}

#[tokio::test]
#[ignore = "needs TEST_REDIS_URL"]
async fn test_increment_hit_only_when_present() {
    let repo = store().await;
    let code = unique_code();

    assert!(!repo.increment_hit(&code).await.unwrap());

    repo.insert_if_absent(NewMapping::new(
        code.clone(),
        "https://a.example".to_string(),
        None,
    ))
    .await
    .unwrap();

    assert!(repo.increment_hit(&code).await.unwrap());
    assert!(repo.increment_hit(&code).await.unwrap());
    assert_eq!(repo.get(&code).await.unwrap().unwrap().hit_count, 2);

    assert!(repo.delete(&code).await.unwrap());
    assert!(!repo.increment_hit(&code).await.unwrap());
}

#[tokio::test]
#[ignore = "needs TEST_REDIS_URL"]
async fn test_expiry_is_physical() {
    let repo = store().await;
    let code = unique_code();
    let expires_at = Utc::now() + Duration::milliseconds(200);

    repo.insert_if_absent(NewMapping::new(
        code.clone(),
        "https://a.example".to_string(),
        Some(expires_at),
    ))
    .await
    .unwrap();
    assert!(repo.get(&code).await.unwrap().is_some());

    tokio::time::sleep(std::time::Duration::from_millis(400)).await;

    assert!(repo.get(&code).await.unwrap().is_none());
    assert_eq!(repo.sweep_expired(Utc::now()).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "needs TEST_REDIS_URL"]
async fn test_find_live_by_url() {
    let repo = store().await;
    let code = unique_code();
    let url = format!("https://dedup.example/{code}");

    repo.insert_if_absent(NewMapping::new(code.clone(), url.clone(), None))
        .await
        .unwrap();

    let found = repo.find_live_by_url(&url, Utc::now()).await.unwrap();
    assert_eq!(found.map(|m| m.code), Some(code.clone()));

    repo.delete(&code).await.unwrap();
    assert!(repo.find_live_by_url(&url, Utc::now()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "needs TEST_REDIS_URL"]
async fn test_health_check() {
    let repo = store().await;

    assert!(repo.health_check().await);
    assert_eq!(repo.backend_name(), "redis");
}

#[tokio::test]
#[ignore = "needs TEST_REDIS_URL"]
async fn test_url_index_keeps_longer_lived_mapping() {
    let repo = store().await;
    let url = format!("https://dedup.example/{}", unique_code());
    let forever = unique_code();
    let short_lived = unique_code();

    repo.insert_if_absent(NewMapping::new(forever.clone(), url.clone(), None))
        .await
        .unwrap();
    repo.insert_if_absent(NewMapping::new(
        short_lived.clone(),
        url.clone(),
        Some(Utc::now() + Duration::milliseconds(200)),
    ))
    .await
    .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(400)).await;

    let found = repo.find_live_by_url(&url, Utc::now()).await.unwrap();
    assert_eq!(found.map(|m| m.code), Some(forever.clone()));

    repo.delete(&forever).await.unwrap();
}

#[tokio::test]
#[ignore = "needs TEST_REDIS_URL"]
async fn test_url_index_moves_past_deleted_mapping() {
    let repo = store().await;
    let url = format!("https://dedup.example/{}", unique_code());
    let first = unique_code();
    let second = unique_code();

    repo.insert_if_absent(NewMapping::new(first.clone(), url.clone(), None))
        .await
        .unwrap();
    repo.delete(&first).await.unwrap();
    repo.insert_if_absent(NewMapping::new(second.clone(), url.clone(), None))
        .await
        .unwrap();

    let found = repo.find_live_by_url(&url, Utc::now()).await.unwrap();
    assert_eq!(found.map(|m| m.code), Some(second.clone()));

    repo.delete(&second).await.unwrap();
}

#[tokio::test]
#[ignore = "needs TEST_REDIS_URL"]
async fn test_cache_fill_after_invalidate_is_discarded() {
    let cache = cache().await;
    let code = unique_code();

    cache.set_url(&code, "https://a.example", 60).await.unwrap();
    assert_eq!(
        cache.get_url(&code).await.unwrap().as_deref(),
        Some("https://a.example")
    );

    // A resolve read the mapping before the delete, and its fill lands after.
    cache.invalidate(&code).await.unwrap();
    cache.set_url(&code, "https://a.example", 60).await.unwrap();

    assert_eq!(cache.get_url(&code).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "needs TEST_REDIS_URL"]
async fn test_cache_fill_keeps_existing_entry() {
    let cache = cache().await;
    let code = unique_code();

    cache.set_url(&code, "https://a.example", 60).await.unwrap();
    cache.set_url(&code, "https://b.example", 60).await.unwrap();

    assert_eq!(
        cache.get_url(&code).await.unwrap().as_deref(),
        Some("https://a.example")
    );
}

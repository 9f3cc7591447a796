//! Requires a PostgreSQL instance in `DATABASE_URL`:
//! `cargo test --test repository_pg -- --ignored`

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use shortener::domain::entities::NewMapping;
use shortener::domain::repositories::MappingStore;
use shortener::infrastructure::persistence::PgMappingStore;

fn store(pool: PgPool) -> PgMappingStore {
    PgMappingStore::new(Arc::new(pool), std::time::Duration::from_secs(2))
}

fn mapping(code: &str, url: &str) -> NewMapping {
    NewMapping::new(code.to_string(), url.to_string(), None)
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn test_insert_if_absent(pool: PgPool) {
    let repo = store(pool);

    assert!(repo.insert_if_absent(mapping("pgcode1", "https://a.example")).await.unwrap());
    assert!(!repo.insert_if_absent(mapping("pgcode1", "https://b.example")).await.unwrap());

    let stored = repo.get("pgcode1").await.unwrap().unwrap();
    assert_eq!(stored.original_url, "https://a.example");
    assert_eq!(stored.hit_count, 0);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn test_get_missing(pool: PgPool) {
    let repo = store(pool);

    assert!(repo.get("missing").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn test_increment_hit(pool: PgPool) {
    let repo = store(pool);
    repo.insert_if_absent(mapping("pghits1", "https://a.example"))
        .await
        .unwrap();

    assert!(repo.increment_hit("pghits1").await.unwrap());
    assert!(repo.increment_hit("pghits1").await.unwrap());
    assert!(!repo.increment_hit("absent1").await.unwrap());

    assert_eq!(repo.get("pghits1").await.unwrap().unwrap().hit_count, 2);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn test_expired_mapping_is_not_counted_and_is_swept(pool: PgPool) {
    let repo = store(pool);
    let past = Utc::now() - Duration::hours(1);
    repo.insert_if_absent(NewMapping::new(
        "pgold01".to_string(),
        "https://a.example".to_string(),
        Some(past),
    ))
    .await
    .unwrap();
    repo.insert_if_absent(mapping("pglive1", "https://b.example"))
        .await
        .unwrap();

    assert!(!repo.increment_hit("pgold01").await.unwrap());
    // Expired but unswept mappings still hold their code.
    assert!(!repo.insert_if_absent(mapping("pgold01", "https://c.example")).await.unwrap());

    assert_eq!(repo.sweep_expired(Utc::now()).await.unwrap(), 1);
    assert!(repo.get("pgold01").await.unwrap().is_none());
    assert!(repo.get("pglive1").await.unwrap().is_some());
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn test_delete(pool: PgPool) {
    let repo = store(pool);
    repo.insert_if_absent(mapping("pgdel01", "https://a.example"))
        .await
        .unwrap();

    assert!(repo.delete("pgdel01").await.unwrap());
    assert!(!repo.delete("pgdel01").await.unwrap());
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn test_find_live_by_url(pool: PgPool) {
    let repo = store(pool);
    repo.insert_if_absent(mapping("pgdup01", "https://dup.example"))
        .await
        .unwrap();

    let found = repo
        .find_live_by_url("https://dup.example", Utc::now())
        .await
        .unwrap();
    assert_eq!(found.map(|m| m.code).as_deref(), Some("pgdup01"));

    assert!(
        repo.find_live_by_url("https://other.example", Utc::now())
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn test_code_and_url_are_immutable(pool: PgPool) {
    let repo = store(pool.clone());
    repo.insert_if_absent(mapping("pgimm01", "https://a.example"))
        .await
        .unwrap();

    let result = sqlx::query("UPDATE url_mappings SET original_url = $1 WHERE code = $2")
        .bind("https://hijack.example")
        .bind("pgimm01")
        .execute(&pool)
        .await;

    assert!(result.is_err());
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn test_health_check(pool: PgPool) {
    let repo = store(pool);

    assert!(repo.health_check().await);
    assert_eq!(repo.backend_name(), "postgres");
}

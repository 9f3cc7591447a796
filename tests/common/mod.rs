#![allow(dead_code)]

use axum::Router;
use axum::routing::get;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

use shortener::api::handlers::{health_handler, redirect_handler};
use shortener::api::routes::v1_routes;
use shortener::application::EngineSettings;
use shortener::domain::entities::NewMapping;
use shortener::domain::hit_event::HitEvent;
use shortener::domain::repositories::MappingStore;
use shortener::infrastructure::cache::NullCache;
use shortener::infrastructure::persistence::InMemoryMappingStore;
use shortener::state::AppState;
use shortener::utils::code_generator::CodeGenerator;

pub const BASE_URL: &str = "http://s.test";

/// Everything a test needs to drive the engine and observe its effects.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<InMemoryMappingStore>,
    pub hits: mpsc::Receiver<HitEvent>,
}

pub fn create_test_state() -> TestContext {
    create_test_state_with(EngineSettings::default())
}

pub fn create_test_state_with(settings: EngineSettings) -> TestContext {
    let store = Arc::new(InMemoryMappingStore::new());
    let (tx, rx) = mpsc::channel(100);

    let state = AppState::new(
        store.clone(),
        Arc::new(NullCache::new()),
        tx,
        settings,
        BASE_URL,
    );

    TestContext {
        state,
        store,
        hits: rx,
    }
}

pub fn create_test_state_with_generator(
    settings: EngineSettings,
    generator: Arc<dyn CodeGenerator>,
) -> TestContext {
    let store = Arc::new(InMemoryMappingStore::new());
    let (tx, rx) = mpsc::channel(100);

    let state = AppState::with_generator(
        store.clone(),
        Arc::new(NullCache::new()),
        tx,
        settings,
        BASE_URL,
        generator,
    );

    TestContext {
        state,
        store,
        hits: rx,
    }
}

/// Routes without the outer middleware, as handlers see them.
pub fn test_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/{code}", get(redirect_handler))
        .merge(v1_routes())
        .with_state(state)
}

pub async fn create_test_mapping(
    store: &InMemoryMappingStore,
    code: &str,
    url: &str,
    expires_at: Option<DateTime<Utc>>,
) {
    let inserted = store
        .insert_if_absent(NewMapping::new(code.to_string(), url.to_string(), expires_at))
        .await
        .unwrap();
    assert!(inserted, "code {code} already taken");
}

pub async fn create_expired_mapping(store: &InMemoryMappingStore, code: &str, url: &str) {
    let expired = Utc::now() - chrono::Duration::hours(1);
    create_test_mapping(store, code, url, Some(expired)).await;
}

/// Replays a fixed list of codes, then repeats the last one forever.
pub struct ScriptedGenerator {
    codes: Vec<String>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            codes: codes.iter().map(|c| c.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CodeGenerator for ScriptedGenerator {
    fn generate(&self, _long_url: &str, _attempt: u32) -> String {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let idx = n.min(self.codes.len() - 1);
        self.codes[idx].clone()
    }
}

/// Every caller draws `first` on attempt 0 and a fresh code afterwards, so
/// concurrent shortens all fight over one candidate before retrying.
pub struct SharedFirstGenerator {
    first: String,
    next: AtomicUsize,
}

impl SharedFirstGenerator {
    pub fn new(first: &str) -> Self {
        Self {
            first: first.to_string(),
            next: AtomicUsize::new(0),
        }
    }
}

impl CodeGenerator for SharedFirstGenerator {
    fn generate(&self, _long_url: &str, attempt: u32) -> String {
        if attempt == 0 {
            return self.first.clone();
        }
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("r{n:06}")
    }
}

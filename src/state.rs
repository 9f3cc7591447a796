//! Shared application state injected into every handler.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::EngineSettings;
use crate::application::services::{LinkService, ResolutionService};
use crate::domain::hit_event::HitEvent;
use crate::domain::repositories::MappingStore;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::{CodeGenerator, CodePolicy, RandomCodeGenerator};

/// Application state shared across all HTTP handlers.
///
/// Cheap to clone: every field is reference-counted or a channel handle.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub resolution_service: Arc<ResolutionService>,
    pub store: Arc<dyn MappingStore>,
    pub cache: Arc<dyn CacheService>,
    pub hit_sender: mpsc::Sender<HitEvent>,
}

impl AppState {
    /// Wires the services around `store` with the random base62 generator.
    pub fn new(
        store: Arc<dyn MappingStore>,
        cache: Arc<dyn CacheService>,
        hit_sender: mpsc::Sender<HitEvent>,
        settings: EngineSettings,
        base_url: impl Into<String>,
    ) -> Self {
        let generator = Arc::new(RandomCodeGenerator::new(settings.code_length));
        Self::with_generator(store, cache, hit_sender, settings, base_url, generator)
    }

    pub fn with_generator(
        store: Arc<dyn MappingStore>,
        cache: Arc<dyn CacheService>,
        hit_sender: mpsc::Sender<HitEvent>,
        settings: EngineSettings,
        base_url: impl Into<String>,
        generator: Arc<dyn CodeGenerator>,
    ) -> Self {
        let resolution_service = Arc::new(ResolutionService::new(
            store.clone(),
            cache.clone(),
            hit_sender.clone(),
            CodePolicy::new(settings.code_length),
            settings.cache_ttl_seconds,
        ));
        let link_service = Arc::new(LinkService::new(
            store.clone(),
            generator,
            cache.clone(),
            settings,
            base_url,
        ));

        Self {
            link_service,
            resolution_service,
            store,
            cache,
            hit_sender,
        }
    }
}

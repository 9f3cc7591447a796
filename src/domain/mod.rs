//! Domain layer: the mapping entity, its storage contract and background tasks.
//!
//! # Architecture
//!
//! - [`entities`] - [`entities::UrlMapping`] and its creation input
//! - [`repositories`] - The [`repositories::MappingStore`] contract
//! - [`hit_event`] / [`hit_worker`] - Best-effort hit counting off the redirect path
//! - [`expiry_sweeper`] - Periodic removal of expired mappings
//!
//! The domain layer has no dependencies on infrastructure or presentation layers.
//!
//! # Hit Counting Flow
//!
//! 1. [`crate::application::services::ResolutionService`] resolves a live code
//! 2. A [`hit_event::HitEvent`] is offered to a bounded channel (`try_send`)
//! 3. [`hit_worker::run_hit_worker`] applies it via `MappingStore::increment_hit`

pub mod entities;
pub mod expiry_sweeper;
pub mod hit_event;
pub mod hit_worker;
pub mod repositories;

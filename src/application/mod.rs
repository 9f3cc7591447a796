//! Application layer services implementing the engine's two entry points.
//!
//! - [`services::LinkService`] - `Shorten` plus link management
//! - [`services::ResolutionService`] - `Resolve`
//! - [`services::CodeAllocator`] - Bounded-retry code allocation used by `Shorten`
//!
//! Services depend only on the domain traits; backends are injected as
//! trait objects at startup.

pub mod services;
pub mod settings;

pub use settings::{DedupPolicy, EngineSettings, MAX_EXPIRY_HOURS};

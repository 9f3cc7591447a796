//! Process-local mapping store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::domain::entities::{NewMapping, UrlMapping};
use crate::domain::repositories::{MappingStore, StoreResult};

/// Mapping store backed by a sharded concurrent map.
///
/// Each primitive holds the shard lock for its key for the whole
/// check-and-write, which makes `insert_if_absent` and `increment_hit`
/// indivisible. State is lost on restart; use it for development and tests.
#[derive(Default)]
pub struct InMemoryMappingStore {
    mappings: DashMap<String, UrlMapping>,
}

impl InMemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physically present mappings, expired ones included.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[async_trait]
impl MappingStore for InMemoryMappingStore {
    async fn insert_if_absent(&self, mapping: NewMapping) -> StoreResult<bool> {
        match self.mappings.entry(mapping.code.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(mapping.into_mapping());
                Ok(true)
            }
        }
    }

    async fn get(&self, code: &str) -> StoreResult<Option<UrlMapping>> {
        Ok(self.mappings.get(code).map(|m| m.value().clone()))
    }

    async fn increment_hit(&self, code: &str) -> StoreResult<bool> {
        match self.mappings.get_mut(code) {
            Some(mut mapping) if mapping.is_live_at(Utc::now()) => {
                mapping.hit_count += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, code: &str) -> StoreResult<bool> {
        Ok(self.mappings.remove(code).is_some())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut removed = 0;
        self.mappings.retain(|_, mapping| {
            let keep = mapping.is_live_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    /// Scans every mapping on each call; there is no URL index in memory.
    /// Fine for development data sets, linear in the number of mappings.
    async fn find_live_by_url(
        &self,
        original_url: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UrlMapping>> {
        Ok(self
            .mappings
            .iter()
            .filter(|m| m.original_url == original_url && m.is_live_at(now))
            .max_by_key(|m| m.created_at)
            .map(|m| m.value().clone()))
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

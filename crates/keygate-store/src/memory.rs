//! In-memory entity store.

use dashmap::DashMap;
use keygate_core::EntityKey;
use keygate_model::Entity;
use tracing::debug;

use crate::error::StoreError;
use crate::scope::ScopedQuery;
use crate::store::EntityStore;

/// Entity store backed by a [`DashMap`] keyed by entity key.
///
/// Results of [`EntityStore::fetch`] without an explicit order are sorted by
/// key so that repeated queries return the same sequence.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    entities: DashMap<EntityKey, Entity>,
}

impl MemoryEntityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities across all kinds and customers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Unscoped read by key, for seeding and administration.
    #[must_use]
    pub fn get(&self, key: &EntityKey) -> Option<Entity> {
        self.entities.get(key).map(|entry| entry.value().clone())
    }
}

impl EntityStore for MemoryEntityStore {
    fn fetch(&self, query: &ScopedQuery) -> Result<Vec<Entity>, StoreError> {
        let mut results: Vec<Entity> = self
            .entities
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        results.sort_by(|a, b| {
            query
                .order()
                .map_or(std::cmp::Ordering::Equal, |order| order.compare(a, b))
                .then_with(|| a.key().cmp(b.key()))
        });
        if let Some(limit) = query.limit() {
            results.truncate(limit);
        }

        debug!(
            kind = query.kind(),
            customer = %query.customer(),
            count = results.len(),
            "fetched entities"
        );
        Ok(results)
    }

    fn lookup(&self, query: &ScopedQuery, key: &EntityKey) -> Result<Option<Entity>, StoreError> {
        Ok(self
            .entities
            .get(key)
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone()))
    }

    fn put(&self, entity: Entity) -> Result<(), StoreError> {
        debug!(key = %entity.key(), kind = entity.kind(), "stored entity");
        self.entities.insert(entity.key().clone(), entity);
        Ok(())
    }

    fn delete(&self, key: &EntityKey) -> Result<(), StoreError> {
        if self.entities.remove(key).is_none() {
            return Err(StoreError::NotFound(key.clone()));
        }
        debug!(key = %key, "deleted entity");
        Ok(())
    }
}

//! Entity store abstraction.

use keygate_core::EntityKey;
use keygate_model::Entity;

use crate::error::StoreError;
use crate::scope::ScopedQuery;

/// Keyed entity storage.
///
/// Reads take a [`ScopedQuery`], so they are always restricted to one
/// customer. Writes address an entity by key and are only issued for
/// entities that a scoped read already returned. Implementations must be
/// safe to share across concurrent requests; concurrent writes to the same
/// key may race (last write wins).
pub trait EntityStore: Send + Sync {
    /// Run a scoped query, applying its order and limit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    fn fetch(&self, query: &ScopedQuery) -> Result<Vec<Entity>, StoreError>;

    /// Look up one entity by key within a scoped query.
    ///
    /// Returns `Ok(None)` when the key is absent or outside the scope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    fn lookup(&self, query: &ScopedQuery, key: &EntityKey) -> Result<Option<Entity>, StoreError>;

    /// Insert or replace an entity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    fn put(&self, entity: Entity) -> Result<(), StoreError>;

    /// Remove an entity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if nothing is stored under `key`.
    fn delete(&self, key: &EntityKey) -> Result<(), StoreError>;
}

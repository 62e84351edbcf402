//! Target entity resolution.

use keygate_core::EntityKey;
use keygate_model::Entity;
use keygate_store::{EntityStore, ScopedQuery};
use tracing::{debug, warn};

use crate::request::RequestContext;

/// The addressed entity could not be produced.
///
/// Covers a missing or malformed id, an absent entity, an entity outside the
/// caller's scope and a failed lookup alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Not found specified object")]
pub struct NotFound;

/// Resolves the single entity a request addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectResolver;

impl ObjectResolver {
    /// The id a request addresses.
    ///
    /// PUT, POST and DELETE carry it as `id` in the JSON payload; other
    /// methods use the `id` query parameter. Non-string and empty ids count
    /// as absent.
    #[must_use]
    pub fn requested_id(ctx: &RequestContext) -> Option<EntityKey> {
        let raw = match *ctx.method() {
            http::Method::PUT | http::Method::POST | http::Method::DELETE => ctx
                .parsed_body()
                .and_then(|body| body.get("id"))
                .and_then(serde_json::Value::as_str),
            _ => ctx.query_param("id"),
        };
        raw.and_then(|id| EntityKey::new(id).ok())
    }

    /// Look up the addressed entity within `query`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] for every failure.
    pub fn resolve(
        ctx: &RequestContext,
        query: &ScopedQuery,
        store: &dyn EntityStore,
    ) -> Result<Entity, NotFound> {
        let Some(key) = Self::requested_id(ctx) else {
            debug!(method = %ctx.method(), "request carries no usable id");
            return Err(NotFound);
        };
        match store.lookup(query, &key) {
            Ok(Some(entity)) => Ok(entity),
            Ok(None) => {
                debug!(key = %key, customer = %query.customer(), "entity not in scope");
                Err(NotFound)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "entity lookup failed");
                Err(NotFound)
            }
        }
    }
}

//! Binding queries to a credential's customer.
//!
//! [`ScopedQuery`] has no public constructor. The only way to obtain one is
//! [`ScopeBinder::bind`], which attaches the customer of an authenticated
//! credential, so every store read carries a customer filter.

use keygate_auth::CredentialRecord;
use keygate_core::CustomerId;
use keygate_model::Entity;

use crate::query::{OrderBy, Query};

/// A query restricted to one customer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedQuery {
    query: Query,
    customer_field: String,
    customer: CustomerId,
}

impl ScopedQuery {
    /// Entity kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.query.kind()
    }

    /// The customer this query is bound to.
    #[must_use]
    pub fn customer(&self) -> &CustomerId {
        &self.customer
    }

    /// Attribute holding each entity's customer.
    #[must_use]
    pub fn customer_field(&self) -> &str {
        &self.customer_field
    }

    /// Sort order, if any.
    #[must_use]
    pub fn order(&self) -> Option<&OrderBy> {
        self.query.order()
    }

    /// Result cap, if any.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.query.result_limit()
    }

    /// Whether `entity` belongs to this customer and passes the query.
    ///
    /// The customer attribute matches when it is a string or reference whose
    /// text equals the customer id.
    #[must_use]
    pub fn matches(&self, entity: &Entity) -> bool {
        let owned = entity
            .get(&self.customer_field)
            .and_then(|value| value.as_scope_id())
            .is_some_and(|id| id == self.customer.as_str());
        owned && self.query.matches(entity)
    }
}

/// Narrows queries to the customer of an authenticated credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeBinder;

impl ScopeBinder {
    /// Bind `query` to `credential`'s customer via `customer_field`.
    #[must_use]
    pub fn bind(credential: &CredentialRecord, query: Query, customer_field: &str) -> ScopedQuery {
        ScopedQuery {
            query,
            customer_field: customer_field.to_owned(),
            customer: credential.customer().clone(),
        }
    }
}

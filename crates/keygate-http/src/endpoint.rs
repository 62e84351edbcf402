//! Endpoint configuration.
//!
//! Each endpoint serves one entity kind at one path, with the attribute that
//! holds an entity's customer and the attributes writes may not touch.

use std::collections::HashMap;
use std::sync::Arc;

use keygate_model::{DenyList, FieldAuthorizer};

fn default_customer_field() -> String {
    "customer".to_owned()
}

/// One CRUD endpoint.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct EndpointConfig {
    /// Request path, e.g. `/api/users`.
    pub path: String,
    /// Entity kind served.
    pub kind: String,
    /// Attribute holding each entity's customer.
    #[serde(default = "default_customer_field")]
    pub customer_field: String,
    /// Attributes writes may never modify.
    #[serde(default)]
    pub denied_fields: DenyList,
}

impl EndpointConfig {
    /// Create an endpoint with the default customer field and no denylist.
    pub fn new(path: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
            customer_field: default_customer_field(),
            denied_fields: DenyList::default(),
        }
    }

    /// Set the customer field.
    #[must_use]
    pub fn with_customer_field(mut self, field: impl Into<String>) -> Self {
        self.customer_field = field.into();
        self
    }

    /// Set the denylist.
    #[must_use]
    pub fn with_denied_fields(mut self, denied: DenyList) -> Self {
        self.denied_fields = denied;
        self
    }

    /// Field authorizer for writes on this endpoint. The customer field is
    /// always denied on top of the configured denylist.
    #[must_use]
    pub fn field_authorizer(&self) -> FieldAuthorizer {
        let mut denied = self.denied_fields.clone();
        denied.insert(self.customer_field.as_str());
        FieldAuthorizer::new(denied)
    }
}

/// Endpoints keyed by path.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    by_path: HashMap<String, Arc<EndpointConfig>>,
}

impl EndpointRegistry {
    /// Build a registry. A later endpoint on the same path replaces an
    /// earlier one.
    pub fn new(endpoints: impl IntoIterator<Item = EndpointConfig>) -> Self {
        Self {
            by_path: endpoints
                .into_iter()
                .map(|e| (e.path.clone(), Arc::new(e)))
                .collect(),
        }
    }

    /// Endpoint serving `path`. A single trailing slash is ignored.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<Arc<EndpointConfig>> {
        self.by_path
            .get(path)
            .or_else(|| {
                path.strip_suffix('/')
                    .filter(|p| !p.is_empty())
                    .and_then(|p| self.by_path.get(p))
            })
            .cloned()
    }

    /// Number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    /// Whether no endpoint is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

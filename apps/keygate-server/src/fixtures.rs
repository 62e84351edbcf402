//! Seed data for the in-memory stores.
//!
//! A fixture file is one JSON document:
//!
//! ```json
//! {
//!   "credentials": [{"client_id": "c1", "secret_key": "s3cr3t", "customer": "acme"}],
//!   "schemas": [{"kind": "User", "attributes": {"name": "string", "customer": "reference"}}],
//!   "endpoints": [{"path": "/api/users", "kind": "User", "denied_fields": ["secret"]}],
//!   "entities": [{"kind": "User", "key": "K1", "attributes": {"name": "Ada", "customer": "acme"}}]
//! }
//! ```
//!
//! Every section is optional.

use std::path::Path;

use anyhow::{Context, Result};
use keygate_auth::{CredentialRecord, StaticCredentialStore};
use keygate_core::EntityKey;
use keygate_http::{EndpointConfig, EndpointRegistry};
use keygate_model::{Entity, EntitySchema, FieldAuthorizer, SchemaRegistry};
use keygate_store::{EntityStore, MemoryEntityStore};
use serde_json::{Map, Value};

/// One seeded entity.
#[derive(Debug, serde::Deserialize)]
struct EntityFixture {
    kind: String,
    key: EntityKey,
    #[serde(default)]
    attributes: Map<String, Value>,
}

/// Parsed fixture document.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct Fixtures {
    credentials: Vec<CredentialRecord>,
    schemas: Vec<EntitySchema>,
    endpoints: Vec<EndpointConfig>,
    entities: Vec<EntityFixture>,
}

/// Stores and registries built from fixtures.
#[derive(Debug)]
pub struct Seeded {
    /// Client credentials.
    pub credentials: StaticCredentialStore,
    /// Entity schemas by kind.
    pub schemas: SchemaRegistry,
    /// Endpoints by path.
    pub endpoints: EndpointRegistry,
    /// Seeded entities.
    pub store: MemoryEntityStore,
}

impl Fixtures {
    /// Read and parse a fixture file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read fixture file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid fixture file {}", path.display()))
    }

    /// Parse a fixture document.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("fixture document is not valid JSON")
    }

    /// Build the stores. Entity attributes go through the same coercion as
    /// updates; unknown attributes are dropped.
    pub fn seed(self) -> Result<Seeded> {
        let mut schemas = SchemaRegistry::new();
        for schema in self.schemas {
            schemas.register(schema);
        }

        for endpoint in &self.endpoints {
            anyhow::ensure!(
                schemas.get(&endpoint.kind).is_some(),
                "endpoint {} serves unknown kind {}",
                endpoint.path,
                endpoint.kind
            );
        }

        let store = MemoryEntityStore::new();
        let authorizer = FieldAuthorizer::default();
        for fixture in self.entities {
            let schema = schemas
                .get(&fixture.kind)
                .with_context(|| format!("entity {} has unknown kind {}", fixture.key, fixture.kind))?;
            let update = authorizer
                .authorize(&schema, &fixture.attributes)
                .with_context(|| format!("invalid attributes on entity {}", fixture.key))?;
            let mut entity = Entity::new(fixture.key, schema);
            update.apply(&mut entity);
            store.put(entity)?;
        }

        Ok(Seeded {
            credentials: StaticCredentialStore::new(self.credentials),
            schemas,
            endpoints: EndpointRegistry::new(self.endpoints),
            store,
        })
    }
}

//! Per-kind attribute schemas.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::value::AttributeKind;

/// The assignable attributes of one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct EntitySchema {
    kind: String,
    attributes: BTreeMap<String, AttributeKind>,
}

impl EntitySchema {
    /// Create a schema from `(name, kind)` pairs.
    pub fn new(
        kind: impl Into<String>,
        attributes: impl IntoIterator<Item = (String, AttributeKind)>,
    ) -> Self {
        Self {
            kind: kind.into(),
            attributes: attributes.into_iter().collect(),
        }
    }

    /// Entity kind name.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Declared kind of an attribute, if the schema knows it.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<AttributeKind> {
        self.attributes.get(name).copied()
    }

    /// Whether the schema declares `name`.
    #[must_use]
    pub fn recognizes(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Declared attribute names in sorted order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }
}

/// All known entity schemas keyed by kind.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<EntitySchema>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, replacing any previous schema of the same kind.
    pub fn register(&mut self, schema: EntitySchema) -> Arc<EntitySchema> {
        let schema = Arc::new(schema);
        self.schemas
            .insert(schema.kind().to_owned(), Arc::clone(&schema));
        schema
    }

    /// Look up the schema for a kind.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<Arc<EntitySchema>> {
        self.schemas.get(kind).cloned()
    }

    /// Number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether no kinds are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

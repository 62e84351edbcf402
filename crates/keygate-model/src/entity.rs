//! Stored entities.

use std::collections::BTreeMap;
use std::sync::Arc;

use keygate_core::EntityKey;

use crate::schema::EntitySchema;
use crate::value::AttributeValue;

/// One keyed record of a given kind.
///
/// Only attributes the schema declares can be held; [`Entity::set`] drops
/// anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    key: EntityKey,
    schema: Arc<EntitySchema>,
    attributes: BTreeMap<String, AttributeValue>,
}

impl Entity {
    /// Create an entity with no attributes set.
    #[must_use]
    pub fn new(key: EntityKey, schema: Arc<EntitySchema>) -> Self {
        Self {
            key,
            schema,
            attributes: BTreeMap::new(),
        }
    }

    /// The entity's key.
    #[must_use]
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    /// The entity's kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.schema.kind()
    }

    /// The schema this entity was created with.
    #[must_use]
    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// Current value of an attribute, `None` when unset.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Set an attribute. Returns `false` and stores nothing when the schema
    /// does not declare `name`.
    pub fn set(&mut self, name: impl Into<String>, value: AttributeValue) -> bool {
        let name = name.into();
        if !self.schema.recognizes(&name) {
            return false;
        }
        self.attributes.insert(name, value);
        true
    }

    /// All set attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }
}

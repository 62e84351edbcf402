//! Field-level write authorization.
//!
//! A write payload is checked in two passes. The first pass rejects the
//! whole payload if any attribute is in the endpoint's [`DenyList`]. The
//! second pass coerces every attribute the schema declares and drops the
//! rest. Nothing reaches the entity until both passes succeed, so a rejected
//! write leaves the entity untouched.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::debug;

use crate::entity::Entity;
use crate::schema::EntitySchema;
use crate::value::AttributeValue;

/// Attribute names a write may never modify.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(transparent)]
pub struct DenyList(BTreeSet<String>);

impl DenyList {
    /// Create a denylist from attribute names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Deny one more attribute.
    pub fn insert(&mut self, name: impl Into<String>) {
        self.0.insert(name.into());
    }

    /// Whether `name` is denied.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Whether nothing is denied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Rejection of a write payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// The payload touches a denylisted attribute.
    #[error("Cannot update attribute {0} on entity")]
    Forbidden(String),

    /// A recognized attribute has a value of the wrong shape.
    #[error("Invalid value for attribute {0}")]
    InvalidValue(String),
}

/// A payload that passed authorization, ready to apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizedUpdate {
    assignments: Vec<(String, AttributeValue)>,
    ignored: Vec<String>,
}

impl AuthorizedUpdate {
    /// Write every accepted attribute into `entity`.
    pub fn apply(self, entity: &mut Entity) {
        for (name, value) in self.assignments {
            entity.set(name, value);
        }
    }

    /// Names of the attributes that will be assigned.
    pub fn assigned(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|(name, _)| name.as_str())
    }

    /// Names the schema does not declare; these are dropped.
    #[must_use]
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }
}

/// Checks write payloads against one endpoint's denylist.
#[derive(Debug, Clone, Default)]
pub struct FieldAuthorizer {
    denied: DenyList,
}

impl FieldAuthorizer {
    /// Create an authorizer for a denylist.
    #[must_use]
    pub fn new(denied: DenyList) -> Self {
        Self { denied }
    }

    /// Authorize a write payload against a schema.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Forbidden`] naming the first denied attribute
    /// (in name order), or [`FieldError::InvalidValue`] for the first
    /// recognized attribute whose value cannot be coerced.
    pub fn authorize(
        &self,
        schema: &EntitySchema,
        payload: &Map<String, Value>,
    ) -> Result<AuthorizedUpdate, FieldError> {
        let mut names: Vec<&String> = payload.keys().collect();
        names.sort();

        if let Some(denied) = names.iter().find(|name| self.denied.contains(name)) {
            return Err(FieldError::Forbidden((*denied).clone()));
        }

        let mut update = AuthorizedUpdate::default();
        for name in names {
            let Some(kind) = schema.attribute(name) else {
                debug!(kind = schema.kind(), attribute = %name, "ignoring unknown attribute");
                update.ignored.push(name.clone());
                continue;
            };
            let value = kind
                .coerce(&payload[name.as_str()])
                .ok_or_else(|| FieldError::InvalidValue(name.clone()))?;
            update.assignments.push((name.clone(), value));
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use keygate_core::EntityKey;
    use serde_json::json;

    use super::*;
    use crate::value::AttributeKind;

    fn schema() -> Arc<EntitySchema> {
        Arc::new(EntitySchema::new(
            "User",
            [
                ("name".to_owned(), AttributeKind::String),
                ("secret".to_owned(), AttributeKind::String),
                ("age".to_owned(), AttributeKind::Number),
            ],
        ))
    }

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    fn entity() -> Entity {
        let mut entity = Entity::new(EntityKey::new("K1").unwrap(), schema());
        entity.set("name", AttributeValue::String("old".to_owned()));
        entity
    }

    #[test]
    fn test_should_reject_whole_payload_with_denied_attribute() {
        let authorizer = FieldAuthorizer::new(DenyList::new(["secret"]));
        let result = authorizer.authorize(&schema(), &payload(json!({"name": "x", "secret": "y"})));
        assert_eq!(result, Err(FieldError::Forbidden("secret".to_owned())));
        assert_eq!(
            FieldError::Forbidden("secret".to_owned()).to_string(),
            "Cannot update attribute secret on entity"
        );
    }

    #[test]
    fn test_should_ignore_unknown_attributes() {
        let authorizer = FieldAuthorizer::default();
        let update = authorizer
            .authorize(&schema(), &payload(json!({"name": "new", "nickname": "n"})))
            .unwrap();
        assert_eq!(update.assigned().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(update.ignored(), ["nickname".to_owned()]);

        let mut target = entity();
        update.apply(&mut target);
        assert_eq!(target.get("name").and_then(AttributeValue::as_str), Some("new"));
        assert!(target.get("nickname").is_none());
    }

    #[test]
    fn test_should_reject_uncoercible_value_without_applying() {
        let authorizer = FieldAuthorizer::default();
        let result = authorizer.authorize(&schema(), &payload(json!({"name": "x", "age": "ten"})));
        assert_eq!(result, Err(FieldError::InvalidValue("age".to_owned())));
    }

    #[test]
    fn test_should_check_denylist_before_coercion() {
        let authorizer = FieldAuthorizer::new(DenyList::new(["secret"]));
        let result = authorizer.authorize(&schema(), &payload(json!({"age": "bad", "secret": 1})));
        assert_eq!(result, Err(FieldError::Forbidden("secret".to_owned())));
    }

    #[test]
    fn test_should_deny_even_unrecognized_names() {
        let authorizer = FieldAuthorizer::new(DenyList::new(["owner"]));
        let result = authorizer.authorize(&schema(), &payload(json!({"owner": "me"})));
        assert!(matches!(result, Err(FieldError::Forbidden(name)) if name == "owner"));
    }

    #[test]
    fn test_should_accept_empty_payload() {
        let update = FieldAuthorizer::default()
            .authorize(&schema(), &Map::new())
            .unwrap();
        assert_eq!(update.assigned().count(), 0);
    }
}

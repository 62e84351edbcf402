//! Opaque identifiers shared across KeyGate layers.

use std::fmt;

/// Opaque key addressing one stored entity.
///
/// The token round-trips to the store's native key and is never parsed here;
/// the only rule is that it is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityKey(String);

impl EntityKey {
    /// Create an entity key from its encoded form.
    ///
    /// # Errors
    /// Returns an error if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, crate::KeyGateError> {
        let key = key.into();
        if key.is_empty() {
            return Err(crate::KeyGateError::EmptyEntityKey);
        }
        Ok(Self(key))
    }

    /// Get the encoded key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityKey {
    type Error = crate::KeyGateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityKey> for String {
    fn from(key: EntityKey) -> Self {
        key.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Customer (tenant) scope identifier carried by a credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Create a customer id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the customer id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

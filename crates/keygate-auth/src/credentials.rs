//! Credential store trait and implementations.
//!
//! This module defines the [`CredentialStore`] trait for resolving a
//! [`CredentialRecord`] from a client id, along with a
//! [`StaticCredentialStore`] for tests and local development.

use std::collections::HashMap;
use std::fmt;

use keygate_core::CustomerId;

use crate::error::AuthError;

/// A client identity, its secret signing key and its customer scope.
///
/// Records are immutable: they are looked up per request and never changed by
/// the gateway.
#[derive(Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CredentialRecord {
    client_id: String,
    #[serde(with = "secret_text")]
    secret_key: Vec<u8>,
    customer: CustomerId,
}

impl CredentialRecord {
    /// Create a credential record.
    pub fn new(
        client_id: impl Into<String>,
        secret_key: impl Into<Vec<u8>>,
        customer: CustomerId,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            secret_key: secret_key.into(),
            customer,
        }
    }

    /// The unique client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The opaque secret signing key.
    #[must_use]
    pub fn secret_key(&self) -> &[u8] {
        &self.secret_key
    }

    /// The customer every query made with this credential is scoped to.
    #[must_use]
    pub fn customer(&self) -> &CustomerId {
        &self.customer
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("client_id", &self.client_id)
            .field("secret_key", &"[REDACTED]")
            .field("customer", &self.customer)
            .finish()
    }
}

/// Fixture files carry secrets as plain text.
mod secret_text {
    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        String::deserialize(de).map(String::into_bytes)
    }
}

/// Trait for looking up credential records by client id.
///
/// Implementations may back this with a database, configuration file,
/// or any other credential store.
pub trait CredentialStore: Send + Sync {
    /// Retrieve the credential record for the given client id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownClient`] if the client id is not recognized.
    fn lookup(&self, client_id: &str) -> Result<CredentialRecord, AuthError>;
}

/// A simple in-memory credential store backed by a `HashMap`.
///
/// # Examples
///
/// ```
/// use keygate_auth::credentials::{CredentialRecord, CredentialStore, StaticCredentialStore};
/// use keygate_core::CustomerId;
///
/// let store = StaticCredentialStore::new(vec![CredentialRecord::new(
///     "client-1",
///     b"s3cr3t".to_vec(),
///     CustomerId::new("acme"),
/// )]);
///
/// let record = store.lookup("client-1").unwrap();
/// assert_eq!(record.customer().as_str(), "acme");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    records: HashMap<String, CredentialRecord>,
}

impl StaticCredentialStore {
    /// Create a new store from an iterable of records.
    ///
    /// A later record with the same client id replaces an earlier one.
    pub fn new(records: impl IntoIterator<Item = CredentialRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.client_id.clone(), r))
                .collect(),
        }
    }

    /// Number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no clients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CredentialStore for StaticCredentialStore {
    fn lookup(&self, client_id: &str) -> Result<CredentialRecord, AuthError> {
        self.records
            .get(client_id)
            .cloned()
            .ok_or_else(|| AuthError::UnknownClient(client_id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(client_id: &str, customer: &str) -> CredentialRecord {
        CredentialRecord::new(client_id, b"secret".to_vec(), CustomerId::new(customer))
    }

    #[test]
    fn test_should_return_record_for_known_client() {
        let store = StaticCredentialStore::new(vec![record("client-1", "acme")]);

        let result = store.lookup("client-1");
        assert!(result.is_ok());
        let found = result.unwrap();
        assert_eq!(found.client_id(), "client-1");
        assert_eq!(found.secret_key(), b"secret");
        assert_eq!(found.customer().as_str(), "acme");
    }

    #[test]
    fn test_should_return_error_for_unknown_client() {
        let store = StaticCredentialStore::new(vec![]);

        let result = store.lookup("UNKNOWN");
        assert!(matches!(result, Err(AuthError::UnknownClient(id)) if id == "UNKNOWN"));
    }

    #[test]
    fn test_should_redact_secret_in_debug_output() {
        let rendered = format!("{:?}", record("client-1", "acme"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("secret\""));
    }

    #[test]
    fn test_should_deserialize_record_from_fixture_json() {
        let json = r#"{"client_id":"c1","secret_key":"k3y","customer":"acme"}"#;
        let parsed: CredentialRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, CredentialRecord::new("c1", b"k3y".to_vec(), CustomerId::new("acme")));
    }
}

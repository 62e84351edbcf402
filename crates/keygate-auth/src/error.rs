//! Error types for request authentication.
//!
//! All authentication failures are represented by [`AuthError`]. Every variant
//! maps to HTTP 403 at the gateway; only [`AuthError::MissingHeader`] exposes
//! its detail to the client.

/// Errors that can occur while authenticating a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A required header is missing or is not valid UTF-8.
    #[error("Not found header {0} on request")]
    MissingHeader(String),

    /// The client id was not found in the credential store.
    #[error("Specified client not found: {0}")]
    UnknownClient(String),

    /// The computed signature does not match the provided signature.
    #[error("Invalid request signature")]
    BadSignature,
}

impl AuthError {
    /// The reason string that may be returned to the caller.
    ///
    /// Lookup and signature failures collapse into one generic reason so a
    /// caller cannot probe which client ids exist.
    #[must_use]
    pub fn public_reason(&self) -> String {
        match self {
            Self::MissingHeader(_) => self.to_string(),
            Self::UnknownClient(_) | Self::BadSignature => "Cannot validate request".to_owned(),
        }
    }
}

//! Gateway error types.
//!
//! Every failure that reaches the client is a [`GatewayError`] rendered as
//! `{"status": <int>, "reason": <string>}`. The source error, if any, is kept
//! for logging and never serialized.

use std::fmt;

use crate::encode::EncodeError;
use crate::fields::FieldError;

/// Well-known gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum GatewayErrorCode {
    /// A required header is absent.
    MissingHeader,
    /// The client id is not known.
    UnknownClient,
    /// The request signature does not match.
    BadSignature,
    /// The addressed entity does not exist in the caller's scope.
    NotFoundEntity,
    /// No endpoint is configured for the request path.
    NotFoundEndpoint,
    /// An update carries no `attributes` map.
    MissingAttributes,
    /// The store rejected an update.
    PersistenceFailure,
    /// The store rejected a delete.
    DeletionFailure,
    /// An update touches a denylisted attribute.
    ForbiddenAttribute,
    /// A query parameter is malformed.
    InvalidParameter,
    /// An attribute value cannot be converted to its declared kind.
    InvalidAttributeValue,
    /// The method has no handler on this endpoint.
    MethodNotAllowed,
    /// A result could not be encoded as JSON.
    EncodeError,
    /// Unexpected internal failure.
    #[default]
    InternalError,
}

impl GatewayErrorCode {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingHeader => "MissingHeader",
            Self::UnknownClient => "UnknownClient",
            Self::BadSignature => "BadSignature",
            Self::NotFoundEntity => "NotFoundEntity",
            Self::NotFoundEndpoint => "NotFoundEndpoint",
            Self::MissingAttributes => "MissingAttributes",
            Self::PersistenceFailure => "PersistenceFailure",
            Self::DeletionFailure => "DeletionFailure",
            Self::ForbiddenAttribute => "ForbiddenAttribute",
            Self::InvalidParameter => "InvalidParameter",
            Self::InvalidAttributeValue => "InvalidAttributeValue",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::EncodeError => "EncodeError",
            Self::InternalError => "InternalError",
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::MissingHeader | Self::UnknownClient | Self::BadSignature => {
                http::StatusCode::FORBIDDEN
            }
            Self::NotFoundEntity | Self::NotFoundEndpoint => http::StatusCode::NOT_FOUND,
            Self::ForbiddenAttribute => http::StatusCode::CONFLICT,
            Self::InvalidParameter | Self::InvalidAttributeValue => http::StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingAttributes
            | Self::PersistenceFailure
            | Self::DeletionFailure
            | Self::EncodeError
            | Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Create a `GatewayError` from an error code and client-facing reason.
///
/// # Examples
///
/// ```
/// use keygate_model::gateway_error;
/// use keygate_model::error::GatewayErrorCode;
///
/// let err = gateway_error!(InvalidParameter, "Invalid limit parameter");
/// assert_eq!(err.code, GatewayErrorCode::InvalidParameter);
/// assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
/// ```
#[macro_export]
macro_rules! gateway_error {
    ($code:ident, $msg:expr) => {
        $crate::error::GatewayError::with_message($crate::error::GatewayErrorCode::$code, $msg)
    };
}

/// A gateway error response.
#[derive(Debug)]
pub struct GatewayError {
    /// The error code.
    pub code: GatewayErrorCode,
    /// The reason returned to the client.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GatewayError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl GatewayError {
    /// Create a new `GatewayError` with a custom message.
    #[must_use]
    pub fn with_message(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The uniform JSON error body.
    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status_code.as_u16(),
            "reason": self.message,
        })
    }

    // -- Convenience constructors --

    /// The addressed entity is missing or outside the caller's scope.
    #[must_use]
    pub fn not_found_entity() -> Self {
        gateway_error!(NotFoundEntity, "Not found specified object")
    }

    /// No endpoint serves the path.
    #[must_use]
    pub fn not_found_endpoint() -> Self {
        gateway_error!(NotFoundEndpoint, "Not found endpoint")
    }

    /// The update payload has no `attributes` map.
    #[must_use]
    pub fn missing_attributes() -> Self {
        gateway_error!(MissingAttributes, "Not defined attributes to update")
    }

    /// Persisting an update failed.
    #[must_use]
    pub fn persistence_failure() -> Self {
        gateway_error!(PersistenceFailure, "Cannot update entity")
    }

    /// Deleting an entity failed.
    #[must_use]
    pub fn deletion_failure() -> Self {
        gateway_error!(DeletionFailure, "Cannot delete specified object")
    }

    /// The method is not handled on this endpoint.
    #[must_use]
    pub fn method_not_allowed() -> Self {
        gateway_error!(MethodNotAllowed, "Method not supported on endpoint")
    }

    /// A query parameter is malformed.
    #[must_use]
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        gateway_error!(InvalidParameter, message)
    }

    /// Internal server error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        gateway_error!(InternalError, message)
    }
}

impl From<FieldError> for GatewayError {
    fn from(err: FieldError) -> Self {
        let code = match err {
            FieldError::Forbidden(_) => GatewayErrorCode::ForbiddenAttribute,
            FieldError::InvalidValue(_) => GatewayErrorCode::InvalidAttributeValue,
        };
        Self::with_message(code, err.to_string())
    }
}

impl From<EncodeError> for GatewayError {
    fn from(err: EncodeError) -> Self {
        gateway_error!(EncodeError, "Cannot encode response").with_source(err)
    }
}

//! Request validation: required headers, credential lookup, signature check.
//!
//! The main entry point is [`RequestValidator::validate`]:
//!
//! 1. Every header in [`REQUIRED_HEADERS`] must be present.
//! 2. The client id is resolved through the [`CredentialStore`].
//! 3. The signature is recomputed with the client's secret for the current
//!    minute and each accepted preceding minute, and compared to the provided
//!    signature in constant time.

use std::env;
use std::sync::Arc;

use chrono::Duration;
use subtle::{Choice, ConstantTimeEq};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::credentials::{CredentialRecord, CredentialStore};
use crate::error::AuthError;
use crate::signature::{
    SignableRequest, SignatureAlgorithm, canonical_string, compute_signature,
    content_type_essence, timestamp_for,
};

/// Header naming the calling client.
pub const CLIENT_HEADER: &str = "X-API-Client";

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "X-API-Request-Sign";

/// Headers every request must carry, checked in this order.
pub const REQUIRED_HEADERS: [&str; 2] = [CLIENT_HEADER, SIGNATURE_HEADER];

/// Largest accepted signature window, in minutes.
pub const MAX_WINDOW_MINUTES: u32 = 60;

/// Signature validation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// HMAC flavor clients sign with.
    pub algorithm: SignatureAlgorithm,
    /// Number of minutes before the current one whose timestamp is also accepted.
    pub window_minutes: u32,
    /// Skip the signature comparison (headers and client lookup still apply).
    pub skip_signature_validation: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            algorithm: SignatureAlgorithm::HmacSha1,
            window_minutes: 1,
            skip_signature_validation: false,
        }
    }
}

impl AuthConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup. The window is
    /// clamped to [`MAX_WINDOW_MINUTES`].
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            algorithm: lookup("KEYGATE_SIGNATURE_ALGORITHM")
                .and_then(|v| SignatureAlgorithm::from_name(&v))
                .unwrap_or(defaults.algorithm),
            window_minutes: lookup("KEYGATE_SIGNATURE_WINDOW_MINUTES")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .map_or(defaults.window_minutes, |w| w.min(MAX_WINDOW_MINUTES)),
            skip_signature_validation: lookup("KEYGATE_SKIP_SIGNATURE_VALIDATION").map_or(
                defaults.skip_signature_validation,
                |v| matches!(v.as_str(), "1" | "true" | "yes" | "TRUE" | "YES"),
            ),
        }
    }
}

/// Authenticates requests against a credential store.
#[derive(Clone)]
pub struct RequestValidator {
    credentials: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    config: AuthConfig,
}

impl std::fmt::Debug for RequestValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestValidator")
            .field("credentials", &"...")
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish()
    }
}

impl RequestValidator {
    /// Create a validator using the system clock.
    pub fn new(credentials: Arc<dyn CredentialStore>, config: AuthConfig) -> Self {
        Self::with_clock(credentials, Arc::new(SystemClock), config)
    }

    /// Create a validator with an explicit time source.
    pub fn with_clock(
        credentials: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
        config: AuthConfig,
    ) -> Self {
        Self {
            credentials,
            clock,
            config,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Validate a request and return the credential it was signed with.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] if:
    /// - a required header is missing
    /// - the client id is not known
    /// - the signature does not match
    pub fn validate(
        &self,
        parts: &http::request::Parts,
        body: &[u8],
    ) -> Result<CredentialRecord, AuthError> {
        for name in REQUIRED_HEADERS {
            extract_header_value(parts, name)?;
        }
        let client_id = extract_header_value(parts, CLIENT_HEADER)?;
        let provided = extract_header_value(parts, SIGNATURE_HEADER)?;

        let record = self.credentials.lookup(client_id)?;

        if self.config.skip_signature_validation {
            debug!(client_id, "signature validation skipped");
            return Ok(record);
        }

        let content_type = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(content_type_essence)
            .unwrap_or_default();
        let uri = request_uri(parts);
        let request = SignableRequest {
            method: parts.method.as_str(),
            content_type: &content_type,
            body,
            uri: &uri,
        };

        if self.matches_window(&request, record.secret_key(), provided) {
            debug!(client_id, customer = %record.customer(), "request signature verified");
            Ok(record)
        } else {
            warn!(client_id, method = %parts.method, uri = %uri, "request signature mismatch");
            Err(AuthError::BadSignature)
        }
    }

    /// Compare against every accepted minute without short-circuiting.
    fn matches_window(&self, request: &SignableRequest<'_>, key: &[u8], provided: &str) -> bool {
        let now = self.clock.now();
        let mut matched = Choice::from(0);

        let window = self.config.window_minutes.min(MAX_WINDOW_MINUTES);
        for minutes_back in 0..=i64::from(window) {
            let timestamp = timestamp_for(now - Duration::minutes(minutes_back));
            let canonical = canonical_string(request, &timestamp);
            debug!(canonical, "built canonical string");
            let expected = compute_signature(self.config.algorithm, key, &canonical);
            matched |= expected.as_bytes().ct_eq(provided.as_bytes());
        }

        matched.into()
    }
}

/// The signed URI: path and query exactly as received.
#[must_use]
pub fn request_uri(parts: &http::request::Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_owned(), |pq| pq.as_str().to_owned())
}

/// Extract a header value as a string from the request parts.
fn extract_header_value<'a>(
    parts: &'a http::request::Parts,
    name: &str,
) -> Result<&'a str, AuthError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| AuthError::MissingHeader(name.to_owned()))?
        .to_str()
        .map_err(|_| AuthError::MissingHeader(name.to_owned()))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use keygate_core::CustomerId;

    use super::*;
    use crate::clock::FixedClock;
    use crate::credentials::StaticCredentialStore;
    use crate::signature::sign;

    const CLIENT: &str = "client-1";
    const SECRET: &[u8] = b"s3cr3t";

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 8, 15, 40).unwrap()
    }

    fn validator(clock: &FixedClock, config: AuthConfig) -> RequestValidator {
        let store = StaticCredentialStore::new(vec![CredentialRecord::new(
            CLIENT,
            SECRET.to_vec(),
            CustomerId::new("acme"),
        )]);
        RequestValidator::with_clock(Arc::new(store), Arc::new(clock.clone()), config)
    }

    fn signed_parts(signature: Option<&str>, client: Option<&str>) -> http::request::Parts {
        let mut builder = http::Request::builder()
            .method("PUT")
            .uri("/api/users?x=1")
            .header("content-type", "application/json; charset=utf-8");
        if let Some(client) = client {
            builder = builder.header(CLIENT_HEADER, client);
        }
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn signature_at(body: &[u8], at: DateTime<Utc>) -> String {
        let request = SignableRequest {
            method: "PUT",
            content_type: "application/json",
            body,
            uri: "/api/users?x=1",
        };
        sign(SignatureAlgorithm::HmacSha1, &request, SECRET, at)
    }

    #[test]
    fn test_should_clamp_window_from_environment() {
        let lookup = |value: &'static str| {
            move |key: &str| (key == "KEYGATE_SIGNATURE_WINDOW_MINUTES").then(|| value.to_owned())
        };
        assert_eq!(AuthConfig::from_lookup(lookup("5")).window_minutes, 5);
        assert_eq!(
            AuthConfig::from_lookup(lookup("4000000000")).window_minutes,
            MAX_WINDOW_MINUTES
        );
        assert_eq!(AuthConfig::from_lookup(lookup("soon")).window_minutes, 1);

        let config = AuthConfig::from_lookup(|key| match key {
            "KEYGATE_SIGNATURE_ALGORITHM" => Some("hmac-sha256".to_owned()),
            "KEYGATE_SKIP_SIGNATURE_VALIDATION" => Some("true".to_owned()),
            _ => None,
        });
        assert_eq!(config.algorithm, SignatureAlgorithm::HmacSha256);
        assert!(config.skip_signature_validation);
    }

    #[test]
    fn test_should_validate_correctly_signed_request() {
        let clock = FixedClock::new(start());
        let body = br#"{"id":"K1"}"#;
        let sig = signature_at(body, start());
        let parts = signed_parts(Some(&sig), Some(CLIENT));

        let record = validator(&clock, AuthConfig::default())
            .validate(&parts, body)
            .unwrap();
        assert_eq!(record.client_id(), CLIENT);
        assert_eq!(record.customer().as_str(), "acme");
    }

    #[test]
    fn test_should_report_first_missing_required_header() {
        let clock = FixedClock::new(start());
        let v = validator(&clock, AuthConfig::default());

        let err = v.validate(&signed_parts(None, None), b"").unwrap_err();
        assert!(matches!(err, AuthError::MissingHeader(ref h) if h == CLIENT_HEADER));

        let err = v.validate(&signed_parts(None, Some(CLIENT)), b"").unwrap_err();
        assert!(matches!(err, AuthError::MissingHeader(ref h) if h == SIGNATURE_HEADER));
    }

    #[test]
    fn test_should_reject_unknown_client() {
        let clock = FixedClock::new(start());
        let parts = signed_parts(Some("deadbeef"), Some("nobody"));
        let err = validator(&clock, AuthConfig::default())
            .validate(&parts, b"")
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownClient(_)));
    }

    #[test]
    fn test_should_reject_tampered_body() {
        let clock = FixedClock::new(start());
        let sig = signature_at(br#"{"id":"K1"}"#, start());
        let parts = signed_parts(Some(&sig), Some(CLIENT));
        let err = validator(&clock, AuthConfig::default())
            .validate(&parts, br#"{"id":"K2"}"#)
            .unwrap_err();
        assert!(matches!(err, AuthError::BadSignature));
    }

    #[test]
    fn test_should_accept_signature_from_preceding_minute() {
        let clock = FixedClock::new(start());
        let sig = signature_at(b"", start());
        let parts = signed_parts(Some(&sig), Some(CLIENT));
        let v = validator(&clock, AuthConfig::default());

        clock.advance(Duration::seconds(45));
        assert!(v.validate(&parts, b"").is_ok());

        clock.advance(Duration::seconds(60));
        assert!(matches!(
            v.validate(&parts, b""),
            Err(AuthError::BadSignature)
        ));
    }

    #[test]
    fn test_should_only_accept_current_minute_with_zero_window() {
        let clock = FixedClock::new(start());
        let sig = signature_at(b"", start());
        let parts = signed_parts(Some(&sig), Some(CLIENT));
        let config = AuthConfig {
            window_minutes: 0,
            ..AuthConfig::default()
        };
        let v = validator(&clock, config);

        assert!(v.validate(&parts, b"").is_ok());
        clock.advance(Duration::seconds(30));
        assert!(v.validate(&parts, b"").is_err());
    }

    #[test]
    fn test_should_skip_signature_but_still_resolve_client() {
        let clock = FixedClock::new(start());
        let config = AuthConfig {
            skip_signature_validation: true,
            ..AuthConfig::default()
        };
        let v = validator(&clock, config);

        assert!(v.validate(&signed_parts(Some("garbage"), Some(CLIENT)), b"").is_ok());
        assert!(matches!(
            v.validate(&signed_parts(Some("garbage"), Some("nobody")), b""),
            Err(AuthError::UnknownClient(_))
        ));
    }

    #[test]
    fn test_should_sign_path_and_query() {
        let parts = signed_parts(None, None);
        assert_eq!(request_uri(&parts), "/api/users?x=1");
    }
}

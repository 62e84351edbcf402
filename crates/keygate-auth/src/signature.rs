//! Canonical string construction and keyed request signing.
//!
//! The string to sign is:
//!
//! ```text
//! Method + "\n" +
//! ContentType + "\n" +
//! Hex(MD5(Body)) + "\n" +
//! Timestamp + "\n" +
//! Uri + "\n"
//! ```
//!
//! `Timestamp` is the UTC time truncated to the minute (`%Y-%m-%d-%H:%M`) and
//! `ContentType` is the media type without parameters. The signature is
//! `Hex(HMAC(SecretKey, StringToSign))`, HMAC-SHA1 unless configured otherwise.

use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Format of the minute-truncated signing timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H:%M";

/// HMAC flavor used to sign the canonical string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    /// HMAC-SHA1, the wire-compatible default.
    #[default]
    HmacSha1,
    /// HMAC-SHA256.
    HmacSha256,
}

impl SignatureAlgorithm {
    /// Parse an algorithm name such as `hmac-sha1` or `HMAC-SHA256`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "hmac-sha1" | "sha1" => Some(Self::HmacSha1),
            "hmac-sha256" | "sha256" => Some(Self::HmacSha256),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HmacSha1 => "hmac-sha1",
            Self::HmacSha256 => "hmac-sha256",
        }
    }
}

/// The parts of a request covered by the signature.
#[derive(Debug, Clone, Copy)]
pub struct SignableRequest<'a> {
    /// HTTP method, e.g. `PUT`.
    pub method: &'a str,
    /// Media type essence, or empty when the request has none.
    pub content_type: &'a str,
    /// Raw request body.
    pub body: &'a [u8],
    /// Path and query as received.
    pub uri: &'a str,
}

/// Render the signing timestamp for `at`.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use keygate_auth::signature::timestamp_for;
///
/// let at = Utc.with_ymd_and_hms(2026, 10, 16, 9, 5, 59).unwrap();
/// assert_eq!(timestamp_for(at), "2026-10-16-09:05");
/// ```
#[must_use]
pub fn timestamp_for(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Hex-encoded MD5 of the request body.
#[must_use]
pub fn hash_body(body: &[u8]) -> String {
    hex::encode(Md5::digest(body))
}

/// Reduce a `Content-Type` header value to its media type essence.
///
/// Parameters such as `charset` are not part of the signature. A value that
/// does not parse as a media type is used trimmed and as-is.
#[must_use]
pub fn content_type_essence(raw: &str) -> String {
    raw.parse::<mime::Mime>()
        .map_or_else(|_| raw.trim().to_owned(), |m| m.essence_str().to_owned())
}

/// Build the canonical string for a request at a given timestamp.
#[must_use]
pub fn canonical_string(request: &SignableRequest<'_>, timestamp: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n",
        request.method,
        request.content_type,
        hash_body(request.body),
        timestamp,
        request.uri,
    )
}

/// Compute the hex signature of `data` with the given key and algorithm.
#[must_use]
pub fn compute_signature(algorithm: SignatureAlgorithm, key: &[u8], data: &str) -> String {
    match algorithm {
        SignatureAlgorithm::HmacSha1 => {
            let mut mac =
                HmacSha1::new_from_slice(key).expect("HMAC can accept keys of any length");
            mac.update(data.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        }
        SignatureAlgorithm::HmacSha256 => {
            let mut mac =
                HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
            mac.update(data.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        }
    }
}

/// Sign a request as of `at`.
#[must_use]
pub fn sign(
    algorithm: SignatureAlgorithm,
    request: &SignableRequest<'_>,
    key: &[u8],
    at: DateTime<Utc>,
) -> String {
    compute_signature(algorithm, key, &canonical_string(request, &timestamp_for(at)))
}

/// Client-side helper producing the `X-API-Request-Sign` header value.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use keygate_auth::signature::{RequestSigner, SignableRequest, SignatureAlgorithm};
///
/// let signer = RequestSigner::new(b"s3cr3t".to_vec(), SignatureAlgorithm::HmacSha1);
/// let request = SignableRequest {
///     method: "GET",
///     content_type: "",
///     body: b"",
///     uri: "/api/users?id=K123",
/// };
/// let signature = signer.sign(&request, Utc::now());
/// assert_eq!(signature.len(), 40);
/// ```
#[derive(Clone)]
pub struct RequestSigner {
    key: Vec<u8>,
    algorithm: SignatureAlgorithm,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl RequestSigner {
    /// Create a signer for one client secret.
    #[must_use]
    pub fn new(key: Vec<u8>, algorithm: SignatureAlgorithm) -> Self {
        Self { key, algorithm }
    }

    /// Signature for `request` as of `at`.
    #[must_use]
    pub fn sign(&self, request: &SignableRequest<'_>, at: DateTime<Utc>) -> String {
        sign(self.algorithm, request, &self.key, at)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 30, 15).unwrap()
    }

    fn request<'a>(body: &'a [u8]) -> SignableRequest<'a> {
        SignableRequest {
            method: "PUT",
            content_type: "application/json",
            body,
            uri: "/api/users",
        }
    }

    #[test]
    fn test_should_hash_empty_body() {
        assert_eq!(hash_body(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_should_truncate_timestamp_to_minute() {
        assert_eq!(timestamp_for(at()), "2026-10-16-12:30");
        let later = Utc.with_ymd_and_hms(2026, 10, 16, 12, 30, 59).unwrap();
        assert_eq!(timestamp_for(later), timestamp_for(at()));
    }

    #[test]
    fn test_should_build_canonical_string() {
        let canonical = canonical_string(&request(b""), "2026-10-16-12:30");
        assert_eq!(
            canonical,
            "PUT\napplication/json\nd41d8cd98f00b204e9800998ecf8427e\n2026-10-16-12:30\n/api/users\n"
        );
    }

    #[test]
    fn test_should_strip_content_type_parameters() {
        assert_eq!(
            content_type_essence("application/json; charset=utf-8"),
            "application/json"
        );
        assert_eq!(content_type_essence("text/plain"), "text/plain");
        assert_eq!(content_type_essence(" not a mime "), "not a mime");
    }

    #[test]
    fn test_should_compute_known_hmac_sha1_vector() {
        // RFC 2202 test case 2.
        let sig = compute_signature(
            SignatureAlgorithm::HmacSha1,
            b"Jefe",
            "what do ya want for nothing?",
        );
        assert_eq!(sig, "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79");
    }

    #[test]
    fn test_should_compute_known_hmac_sha256_vector() {
        // RFC 4231 test case 2.
        let sig = compute_signature(
            SignatureAlgorithm::HmacSha256,
            b"Jefe",
            "what do ya want for nothing?",
        );
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_should_sign_deterministically_within_minute() {
        let key = b"key";
        let first = sign(SignatureAlgorithm::HmacSha1, &request(b"{}"), key, at());
        let later = Utc.with_ymd_and_hms(2026, 10, 16, 12, 30, 58).unwrap();
        let second = sign(SignatureAlgorithm::HmacSha1, &request(b"{}"), key, later);
        assert_eq!(first, second);
        assert_eq!(first, first.to_lowercase());
    }

    #[test]
    fn test_should_change_signature_when_request_is_tampered() {
        let key = b"key";
        let base = sign(SignatureAlgorithm::HmacSha1, &request(b"{\"a\":1}"), key, at());

        let body = sign(SignatureAlgorithm::HmacSha1, &request(b"{\"a\":2}"), key, at());
        let method = sign(
            SignatureAlgorithm::HmacSha1,
            &SignableRequest { method: "GET", ..request(b"{\"a\":1}") },
            key,
            at(),
        );
        let content_type = sign(
            SignatureAlgorithm::HmacSha1,
            &SignableRequest { content_type: "text/plain", ..request(b"{\"a\":1}") },
            key,
            at(),
        );
        let uri = sign(
            SignatureAlgorithm::HmacSha1,
            &SignableRequest { uri: "/api/userz", ..request(b"{\"a\":1}") },
            key,
            at(),
        );
        let other_key = sign(SignatureAlgorithm::HmacSha1, &request(b"{\"a\":1}"), b"kez", at());

        for tampered in [body, method, content_type, uri, other_key] {
            assert_ne!(base, tampered);
        }
    }

    #[test]
    fn test_should_change_signature_across_minute_boundary() {
        let next_minute = Utc.with_ymd_and_hms(2026, 10, 16, 12, 31, 0).unwrap();
        let a = sign(SignatureAlgorithm::HmacSha1, &request(b""), b"key", at());
        let b = sign(SignatureAlgorithm::HmacSha1, &request(b""), b"key", next_minute);
        assert_ne!(a, b);
    }

    #[test]
    fn test_should_parse_algorithm_names() {
        assert_eq!(
            SignatureAlgorithm::from_name("HMAC-SHA1"),
            Some(SignatureAlgorithm::HmacSha1)
        );
        assert_eq!(
            SignatureAlgorithm::from_name("hmac-sha256"),
            Some(SignatureAlgorithm::HmacSha256)
        );
        assert_eq!(SignatureAlgorithm::from_name("md5"), None);
    }

    #[test]
    fn test_should_sign_with_request_signer() {
        let signer = RequestSigner::new(b"key".to_vec(), SignatureAlgorithm::HmacSha256);
        let sig = signer.sign(&request(b""), at());
        assert_eq!(sig, sign(SignatureAlgorithm::HmacSha256, &request(b""), b"key", at()));
        assert_eq!(sig.len(), 64);
        assert!(!format!("{signer:?}").contains("key\""));
    }
}

//! Keyed request-signature authentication for KeyGate.
//!
//! Every request to the gateway carries two headers: `X-API-Client`, naming
//! the calling client, and `X-API-Request-Sign`, an HMAC over a canonical
//! description of the request keyed with that client's secret. This crate
//! implements the verification side: given the request parts, the raw body
//! and a credential store, it resolves the client and checks the signature.
//!
//! # Canonical string
//!
//! ```text
//! Method + "\n" +
//! Content-Type + "\n" +
//! Hex(MD5(Body)) + "\n" +
//! UtcNow("%Y-%m-%d-%H:%M") + "\n" +
//! Uri + "\n"
//! ```
//!
//! The timestamp is regenerated by the server rather than sent by the
//! client, so a signature is only reproducible inside the minute it was made.
//! [`RequestValidator`] accepts a configurable number of preceding minutes.
//!
//! # Usage
//!
//! ```rust
//! use keygate_auth::{CredentialRecord, StaticCredentialStore};
//! use keygate_core::CustomerId;
//!
//! let store = StaticCredentialStore::new(vec![CredentialRecord::new(
//!     "client-1",
//!     b"s3cr3t".to_vec(),
//!     CustomerId::new("acme"),
//! )]);
//! ```
//!
//! # Modules
//!
//! - [`clock`] - Time source abstraction used to regenerate timestamps
//! - [`credentials`] - Credential record, store trait and in-memory store
//! - [`error`] - Authentication error types
//! - [`signature`] - Canonical string construction and HMAC signing
//! - [`validator`] - Header checks, credential lookup and signature comparison

pub mod clock;
pub mod credentials;
pub mod error;
pub mod signature;
pub mod validator;

pub use clock::{Clock, FixedClock, SystemClock};
pub use credentials::{CredentialRecord, CredentialStore, StaticCredentialStore};
pub use error::AuthError;
pub use signature::{RequestSigner, SignableRequest, SignatureAlgorithm};
pub use validator::{
    AuthConfig, CLIENT_HEADER, MAX_WINDOW_MINUTES, REQUIRED_HEADERS, RequestValidator,
    SIGNATURE_HEADER,
};

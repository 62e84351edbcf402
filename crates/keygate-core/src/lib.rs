//! Core types, configuration, and errors for KeyGate.
//!
//! This crate provides the building blocks shared by every KeyGate crate:
//! process-level configuration, the opaque identifiers that flow between the
//! auth, store and HTTP layers, and the infrastructure error type.

mod config;
mod error;
mod types;

pub use config::{KeyGateConfig, LogFormat};
pub use error::KeyGateError;
pub use types::{CustomerId, EntityKey};

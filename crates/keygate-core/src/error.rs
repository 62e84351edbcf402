//! Error types for the KeyGate core.

/// Core error type for KeyGate infrastructure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyGateError {
    /// An entity key was empty.
    #[error("invalid entity key: must not be empty")]
    EmptyEntityKey,
}

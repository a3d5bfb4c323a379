//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`MycoError`]
//! at port boundaries. Storage adapters decide which of their failures are
//! transient ([`MycoError::Busy`]) and which are not.

use std::error::Error;

/// Boxed foreign error carried across port boundaries.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Workspace-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum MycoError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// An inbound payload could not be decoded.
    #[error("malformed payload")]
    Payload(#[from] PayloadError),

    /// The store is locked by another writer; the operation may succeed later.
    #[error("storage busy")]
    Busy(#[source] BoxError),

    /// Any other storage failure.
    #[error("storage error")]
    Storage(#[source] BoxError),

    /// The publish transport rejected a message.
    #[error("transport error")]
    Transport(#[source] BoxError),
}

impl MycoError {
    /// Whether retrying the same operation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("client id must not be empty")]
    EmptyClientId,

    #[error("client id must not contain '/'")]
    SlashInClientId,

    #[error("unknown parameter kind {0:?}")]
    UnknownParameterKind(String),

    #[error("unknown operating mode {0:?}")]
    UnknownMode(String),

    #[error("unknown actuator {0:?}")]
    UnknownActuator(String),

    #[error("unknown event topic {0:?}")]
    UnknownEventTopic(String),
}

/// Reasons an inbound payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("expected {expected} comma-separated fields, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    #[error("field {field} is not a finite number: {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("registration name must not be empty")]
    EmptyName,

    #[error("connected-client count is not an integer: {0:?}")]
    InvalidCount(String),
}

//! Invocation error taxonomy
//!
//! Every failure a proxy can surface is one of these kinds. They are safe to
//! represent identically whether the call was collocated or remote.

use std::fmt;
use bytes::Bytes;
use thiserror::Error;
use super::identity::{Facet, Identity};
use super::reference::Reference;

/// Result type for invocation operations
pub type Result<T> = std::result::Result<T, OrbError>;

/// Declared application-level failure raised by a servant
///
/// The payload is already encoded by the service's codec and is carried
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserException {
    /// Type id of the declared exception
    pub type_id: String,
    /// Encoded exception members
    pub payload: Bytes,
}

impl UserException {
    /// Create a user exception
    pub fn new(type_id: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            type_id: type_id.into(),
            payload: payload.into(),
        }
    }
}

impl fmt::Display for UserException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.type_id, self.payload.len())
    }
}

/// Invocation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrbError {
    /// Target moved; the proxy retries against the new reference
    #[error("location forward to {0}")]
    LocationForward(Box<Reference>),

    /// The call may already have taken effect and must not be retried
    #[error("non-repeatable: {0}")]
    NonRepeatable(#[source] Box<OrbError>),

    /// No servant is registered for the identity
    #[error("object not found: {identity} (facet `{facet}`, operation `{operation}`)")]
    ObjectNotFound {
        identity: Identity,
        facet: Facet,
        operation: String,
    },

    /// The identity exists but not with the requested facet
    #[error("facet not found: {identity} (facet `{facet}`, operation `{operation}`)")]
    FacetNotFound {
        identity: Identity,
        facet: Facet,
        operation: String,
    },

    /// The servant does not provide the requested operation
    #[error("operation not found: `{operation}` on {identity} (facet `{facet}`)")]
    OperationNotExist {
        identity: Identity,
        facet: Facet,
        operation: String,
    },

    /// The adapter was deactivated
    #[error("object adapter `{0}` deactivated")]
    AdapterDeactivated(String),

    /// Servant raised an undeclared failure
    #[error("unknown exception: {0}")]
    UnknownException(String),

    /// Servant failed with a programming error
    #[error("unknown runtime exception: {0}")]
    UnknownRuntimeException(String),

    /// Declared application-level failure, passed through untouched
    #[error("user exception: {0}")]
    User(UserException),

    /// Forwarding exceeded the configured policy
    #[error("operation `{operation}` forwarded more than {limit} times")]
    ForwardLimitExceeded { operation: String, limit: u32 },

    /// No collocated adapter and no transport for the reference
    #[error("no endpoint for {0}")]
    NoEndpoint(String),

    /// Transport-level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed stringified identity
    #[error("invalid identity: `{0}`")]
    InvalidIdentity(String),

    /// Registration conflict in an object adapter
    #[error("already registered: {0}")]
    AlreadyRegistered(String),
}

impl OrbError {
    /// Location-forward signal towards `reference`
    pub fn forward(reference: Reference) -> Self {
        OrbError::LocationForward(Box::new(reference))
    }

    /// Mark a failure as non-repeatable
    pub fn non_repeatable(inner: OrbError) -> Self {
        match inner {
            already @ OrbError::NonRepeatable(_) => already,
            other => OrbError::NonRepeatable(Box::new(other)),
        }
    }

    /// True for the location-forward control signal
    pub fn is_location_forward(&self) -> bool {
        matches!(self, OrbError::LocationForward(_))
    }
}

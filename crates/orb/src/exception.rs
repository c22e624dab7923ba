//! Servant failure normalisation
//!
//! Servant code reports failures as a [`ServantError`]. Before a failure
//! leaves a delegate it is translated into an [`OrbError`]:
//!
//! ```text
//! ServantError::User(e)                 -> OrbError::User(e)            (untouched)
//! ServantError::Orb(e), RPC-safe kind   -> e
//! ServantError::Orb(e), any other kind  -> OrbError::UnknownRuntimeException
//! ServantError::Unexpected(Checked)     -> OrbError::UnknownException
//! ServantError::Unexpected(Unchecked)   -> OrbError::UnknownRuntimeException
//! panic in servant code                 -> OrbError::UnknownRuntimeException
//! ```
//!
//! Delegates run servant code through [`catch`], release the lease, and
//! only then call [`translate`].

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use crate::types::{OrbError, Reference, UserException};

/// Result type for servant code
pub type ServantResult<T> = std::result::Result<T, ServantError>;

/// Where an undeclared failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Ordinary failure the servant chose not to declare
    Checked,
    /// Programming error (broken invariant, bug)
    Unchecked,
}

/// Undeclared servant failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unexpected {
    /// Failure origin
    pub origin: Origin,
    /// Human-readable description
    pub message: String,
}

impl fmt::Display for Unexpected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Failure raised by servant code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServantError {
    /// Failure declared by the service interface
    User(UserException),
    /// One of the RPC-safe kinds, e.g. a location forward
    Orb(OrbError),
    /// Anything else
    Unexpected(Unexpected),
}

impl ServantError {
    /// Undeclared ordinary failure
    pub fn checked(message: impl Into<String>) -> Self {
        ServantError::Unexpected(Unexpected {
            origin: Origin::Checked,
            message: message.into(),
        })
    }

    /// Programming error
    pub fn unchecked(message: impl Into<String>) -> Self {
        ServantError::Unexpected(Unexpected {
            origin: Origin::Unchecked,
            message: message.into(),
        })
    }

    /// Location-forward signal
    pub fn forward(reference: Reference) -> Self {
        ServantError::Orb(OrbError::forward(reference))
    }
}

impl fmt::Display for ServantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServantError::User(e) => write!(f, "user exception: {}", e),
            ServantError::Orb(e) => write!(f, "{}", e),
            ServantError::Unexpected(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ServantError {}

impl From<UserException> for ServantError {
    fn from(e: UserException) -> Self {
        ServantError::User(e)
    }
}

impl From<OrbError> for ServantError {
    fn from(e: OrbError) -> Self {
        ServantError::Orb(e)
    }
}

/// Translate a servant failure into the caller-visible taxonomy
pub fn translate(err: ServantError) -> OrbError {
    match err {
        ServantError::User(e) => OrbError::User(e),
        ServantError::Orb(e) if is_rpc_safe(&e) => e,
        ServantError::Orb(e) => {
            tracing::warn!("servant raised local runtime error: {}", e);
            OrbError::UnknownRuntimeException(e.to_string())
        }
        ServantError::Unexpected(Unexpected { origin: Origin::Checked, message }) => {
            tracing::warn!("servant raised undeclared exception: {}", message);
            OrbError::UnknownException(message)
        }
        ServantError::Unexpected(Unexpected { origin: Origin::Unchecked, message }) => {
            tracing::warn!("servant raised runtime exception: {}", message);
            OrbError::UnknownRuntimeException(message)
        }
    }
}

/// Kinds that may cross the delegate boundary unchanged
fn is_rpc_safe(err: &OrbError) -> bool {
    matches!(
        err,
        OrbError::LocationForward(_)
            | OrbError::NonRepeatable(_)
            | OrbError::ObjectNotFound { .. }
            | OrbError::FacetNotFound { .. }
            | OrbError::OperationNotExist { .. }
            | OrbError::UnknownException(_)
            | OrbError::UnknownRuntimeException(_)
            | OrbError::User(_)
    )
}

/// Run servant code, turning a panic into an unchecked failure
pub fn catch<T>(f: impl FnOnce() -> ServantResult<T>) -> ServantResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(ServantError::unchecked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "servant panicked".to_string()
    }
}

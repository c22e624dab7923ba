//! Core invocation types
//!
//! This module contains the values every call is built from:
//! - Identities and facets
//! - References (identity, facet and location)
//! - The per-call `Current` and its context
//! - The error taxonomy surfaced to callers

mod current;
mod error;
mod identity;
mod reference;

pub use current::{Context, Current, OperationMode};
pub use error::{OrbError, Result, UserException};
pub use identity::{Facet, Identity};
pub use reference::{Endpoint, Reference};

/// Well-known operation names for the built-in probes
pub mod operation {
    /// Type check
    pub const IS_A: &str = "ice_isA";
    /// Liveness probe
    pub const PING: &str = "ice_ping";
    /// All type ids
    pub const IDS: &str = "ice_ids";
    /// Most-derived type id
    pub const ID: &str = "ice_id";
    /// Registered facet names
    pub const FACETS: &str = "ice_facets";
}

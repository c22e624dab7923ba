//! Object adapter runtime
//!
//! The adapter is the long-lived registry collocated calls resolve against:
//! - Servant table keyed by identity and facet
//! - Servant locators consulted by category
//! - In-flight lease tracking for deactivation

mod object_adapter;
mod tables;

pub use object_adapter::*;
pub use tables::*;

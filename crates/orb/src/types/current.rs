//! Per-call context
//!
//! A `Current` is projected from a reference for every call (and for every
//! retry after a forward). It is never mutated once built.

use std::collections::HashMap;
use std::fmt;
use super::identity::{Facet, Identity};
use super::reference::Reference;

/// Caller-supplied request context, passed to the servant verbatim
pub type Context = HashMap<String, String>;

/// Declared mode of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationMode {
    /// The operation may change object state
    Mutating,
    /// The operation does not change object state
    Nonmutating,
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationMode::Mutating => f.write_str("mutating"),
            OperationMode::Nonmutating => f.write_str("nonmutating"),
        }
    }
}

/// Immutable per-call information handed to the servant
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Current {
    /// Name of the adapter dispatching the call, if collocated
    pub adapter: Option<String>,
    /// Target identity
    pub id: Identity,
    /// Target facet
    pub facet: Facet,
    /// Operation name
    pub operation: String,
    /// Declared operation mode
    pub mode: OperationMode,
    /// Caller context
    pub ctx: Context,
}

impl Current {
    /// Project a reference and call metadata into a new current
    pub fn new(
        reference: &Reference,
        operation: impl Into<String>,
        mode: OperationMode,
        ctx: &Context,
    ) -> Self {
        Self {
            adapter: None,
            id: reference.identity().clone(),
            facet: reference.facet().clone(),
            operation: operation.into(),
            mode,
            ctx: ctx.clone(),
        }
    }

    /// Tag the current with the adapter that dispatches it
    pub fn in_adapter(mut self, adapter: impl Into<String>) -> Self {
        self.adapter = Some(adapter.into());
        self
    }
}

//! Delegates
//!
//! A delegate carries out the operations of one proxy against one
//! reference. There are exactly two implementations sharing this contract:
//! - [`CollocatedDelegate`]: dispatches in-process through an object adapter
//! - [`RemoteDelegate`]: hands requests to a [`Transport`]
//!
//! Delegates are immutable once constructed and are shared between threads
//! without synchronisation.

use std::collections::BTreeSet;
use std::fmt;
use bytes::Bytes;
use crate::servant::InvokeReply;
use crate::types::{Context, Facet, OperationMode, Reference, Result};

mod collocated;
mod remote;

pub use collocated::CollocatedDelegate;
pub use remote::{OutgoingRequest, RemoteDelegate, ReplyBody, RequestBody, Transport, TransportFailure};

/// Operations every delegate provides
pub trait Delegate: Send + Sync + fmt::Debug {
    /// Reference this delegate is bound to
    fn reference(&self) -> &Reference;

    /// True for in-process delegates
    fn is_collocated(&self) -> bool;

    /// Check whether the target implements `type_id`
    fn is_a(&self, type_id: &str, ctx: &Context) -> Result<bool>;

    /// Liveness probe
    fn ping(&self, ctx: &Context) -> Result<()>;

    /// All type ids the target implements
    fn ids(&self, ctx: &Context) -> Result<BTreeSet<String>>;

    /// Most-derived type id of the target
    fn id(&self, ctx: &Context) -> Result<String>;

    /// Facets registered for the target identity
    fn facets(&self, ctx: &Context) -> Result<Vec<Facet>>;

    /// Dynamic invocation with pre-encoded parameters
    fn invoke(
        &self,
        operation: &str,
        mode: OperationMode,
        in_params: Bytes,
        ctx: &Context,
    ) -> Result<InvokeReply>;

    /// Flush batched requests
    fn flush(&self) -> Result<()>;
}

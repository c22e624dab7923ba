//! Object request broker invocation core
//!
//! This crate implements the path a call takes from a client-visible proxy
//! to the servant that implements the target object, for both in-process
//! (collocated) and remote targets.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ObjectProxy  - forward/retry loop, one active delegate     │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │  CollocatedDelegate          │  RemoteDelegate              │
//! │  - Current per call          │  - OutgoingRequest per call  │
//! │  - Direct lease              │  - Transport (external)      │
//! │  - failure translation       │                              │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │  ObjectAdapter - servants by (identity, facet), locators,   │
//! │                  in-flight lease tracking                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! - **Reference**: identity + facet + how to reach the object
//! - **Current**: immutable per-call context handed to the servant
//! - **Direct**: scoped lease on a servant, released exactly once
//! - **Location forward**: "the target moved", followed by the proxy
//! - **Non-repeatable**: the call may already have run and is not retried
//!
//! # Modules
//!
//! - [`types`]: identities, references, `Current`, error taxonomy
//! - [`servant`]: servant, raw-invocation and locator capabilities
//! - [`exception`]: servant failure normalisation
//! - [`adapter`]: object adapter runtime
//! - [`direct`]: scoped servant lease
//! - [`delegate`]: collocated and remote delegates
//! - [`proxy`]: object proxies

pub mod types;
pub mod servant;
pub mod exception;
pub mod adapter;
pub mod direct;
pub mod delegate;
pub mod proxy;

mod config;
mod orb;

// Re-export main types and runtime APIs
pub use types::{
    OrbError, Result, UserException,
    Identity, Facet, Reference, Endpoint,
    Current, Context, OperationMode,
};
pub use servant::{Servant, Blobject, ServantLocator, Cookie, InvokeReply, OBJECT_TYPE_ID};
pub use exception::{ServantError, ServantResult};
pub use adapter::{ObjectAdapter, LeaseStats};
pub use direct::Direct;
pub use delegate::{Delegate, CollocatedDelegate, RemoteDelegate, Transport};
pub use proxy::ObjectProxy;
pub use config::{ForwardPolicy, OrbConfig};
pub use orb::{Orb, OrbBuilder};

/// Cap on location forwards per call under the default [`ForwardPolicy`]
///
/// [`ForwardPolicy::Unbounded`] removes the cap.
pub const DEFAULT_MAX_FORWARDS: u32 = 5;

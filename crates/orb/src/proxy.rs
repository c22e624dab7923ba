//! Object proxies
//!
//! A proxy is what application code calls. It holds the delegate chosen for
//! its current reference and drives the forward/retry loop:
//!
//! ```text
//! Dispatching --ok--------------------------> Completed
//! Dispatching --LocationForward--> Forwarded --rebind--> Dispatching
//! Dispatching --NonRepeatable / other error-> Failed
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;
use bytes::Bytes;
use parking_lot::RwLock;
use crate::config::ForwardPolicy;
use crate::delegate::Delegate;
use crate::orb::Orb;
use crate::servant::InvokeReply;
use crate::types::{operation, Context, Facet, OperationMode, OrbError, Reference, Result};

/// Proxy for a target object
pub struct ObjectProxy {
    orb: Orb,
    /// Delegate for the current reference; replaced only on forward
    delegate: RwLock<Arc<dyn Delegate>>,
}

impl ObjectProxy {
    pub(crate) fn new(orb: Orb, delegate: Arc<dyn Delegate>) -> Self {
        Self {
            orb,
            delegate: RwLock::new(delegate),
        }
    }

    /// Current reference
    pub fn reference(&self) -> Reference {
        self.delegate.read().reference().clone()
    }

    /// Current delegate
    pub fn delegate(&self) -> Arc<dyn Delegate> {
        self.delegate.read().clone()
    }

    /// True if calls are currently dispatched in-process
    pub fn is_collocated(&self) -> bool {
        self.delegate.read().is_collocated()
    }

    /// Proxy for another facet of the same object
    pub fn with_facet(&self, facet: impl Into<Facet>) -> Result<ObjectProxy> {
        self.orb.create_proxy(self.reference().with_facet(facet))
    }

    /// Check whether the target implements `type_id`
    pub fn is_a(&self, type_id: &str, ctx: &Context) -> Result<bool> {
        self.dispatch(operation::IS_A, |delegate| delegate.is_a(type_id, ctx))
    }

    /// Liveness probe
    pub fn ping(&self, ctx: &Context) -> Result<()> {
        self.dispatch(operation::PING, |delegate| delegate.ping(ctx))
    }

    /// All type ids the target implements
    pub fn ids(&self, ctx: &Context) -> Result<BTreeSet<String>> {
        self.dispatch(operation::IDS, |delegate| delegate.ids(ctx))
    }

    /// Most-derived type id of the target
    pub fn id(&self, ctx: &Context) -> Result<String> {
        self.dispatch(operation::ID, |delegate| delegate.id(ctx))
    }

    /// Facets registered for the target identity
    pub fn facets(&self, ctx: &Context) -> Result<Vec<Facet>> {
        self.dispatch(operation::FACETS, |delegate| delegate.facets(ctx))
    }

    /// Dynamic invocation with pre-encoded parameters
    pub fn invoke(
        &self,
        operation: &str,
        mode: OperationMode,
        in_params: Bytes,
        ctx: &Context,
    ) -> Result<InvokeReply> {
        self.dispatch(operation, |delegate| {
            delegate.invoke(operation, mode, in_params.clone(), ctx)
        })
    }

    /// Flush batched requests of the current delegate
    pub fn flush(&self) -> Result<()> {
        self.delegate().flush()
    }

    fn dispatch<T>(&self, operation: &str, call: impl Fn(&dyn Delegate) -> Result<T>) -> Result<T> {
        let policy = self.orb.config().forward_policy;
        let mut forwards = 0u32;

        loop {
            let delegate = self.delegate();
            match call(delegate.as_ref()) {
                Err(OrbError::LocationForward(target)) => {
                    if !policy.allows(forwards) {
                        let limit = match policy {
                            ForwardPolicy::Limited(limit) => limit,
                            ForwardPolicy::Unbounded => forwards,
                        };
                        tracing::warn!(
                            "`{}` on {} exceeded forward limit of {}",
                            operation,
                            delegate.reference(),
                            limit
                        );
                        return Err(OrbError::ForwardLimitExceeded {
                            operation: operation.to_string(),
                            limit,
                        });
                    }
                    forwards += 1;
                    self.location_forward(*target)?;
                }
                outcome => return outcome,
            }
        }
    }

    fn location_forward(&self, target: Reference) -> Result<()> {
        let delegate = self.orb.delegate_for(&target)?;
        tracing::debug!(
            "forwarding {} to {} ({})",
            self.delegate.read().reference(),
            target,
            if delegate.is_collocated() { "collocated" } else { "remote" }
        );
        *self.delegate.write() = delegate;
        Ok(())
    }
}

impl Clone for ObjectProxy {
    fn clone(&self) -> Self {
        Self::new(self.orb.clone(), self.delegate())
    }
}

impl std::fmt::Debug for ObjectProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectProxy")
            .field("reference", &self.reference())
            .field("collocated", &self.is_collocated())
            .finish()
    }
}

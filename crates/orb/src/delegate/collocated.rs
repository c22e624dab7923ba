//! Collocated delegate
//!
//! Dispatches calls in-process: every operation builds a fresh `Current`,
//! leases the servant through a [`Direct`], calls it, releases the lease,
//! and only then translates any failure.

use std::collections::BTreeSet;
use std::sync::Arc;
use bytes::Bytes;
use crate::adapter::ObjectAdapter;
use crate::direct::Direct;
use crate::exception::{self, ServantError, ServantResult};
use crate::servant::InvokeReply;
use crate::types::{operation, Context, Current, Facet, OperationMode, OrbError, Reference, Result};
use super::Delegate;

/// In-process delegate bound to one reference and one adapter
#[derive(Clone, Debug)]
pub struct CollocatedDelegate {
    reference: Reference,
    adapter: Arc<ObjectAdapter>,
}

impl CollocatedDelegate {
    /// Bind a reference to the adapter hosting it
    pub fn new(reference: Reference, adapter: Arc<ObjectAdapter>) -> Self {
        Self { reference, adapter }
    }

    /// Adapter calls are dispatched through
    pub fn adapter(&self) -> &Arc<ObjectAdapter> {
        &self.adapter
    }

    fn current(&self, operation: &str, mode: OperationMode, ctx: &Context) -> Current {
        Current::new(&self.reference, operation, mode, ctx).in_adapter(self.adapter.name())
    }

    fn dispatch<T>(
        &self,
        operation: &str,
        mode: OperationMode,
        ctx: &Context,
        call: impl FnOnce(&Direct<'_>) -> ServantResult<T>,
    ) -> Result<T> {
        let current = self.current(operation, mode, ctx);
        let outcome = {
            let direct = Direct::acquire(&self.adapter, &current)?;
            exception::catch(|| call(&direct))
        };
        outcome.map_err(exception::translate)
    }
}

impl Delegate for CollocatedDelegate {
    fn reference(&self) -> &Reference {
        &self.reference
    }

    fn is_collocated(&self) -> bool {
        true
    }

    fn is_a(&self, type_id: &str, ctx: &Context) -> Result<bool> {
        self.dispatch(operation::IS_A, OperationMode::Nonmutating, ctx, |direct| {
            direct.servant().is_a(type_id, direct.current())
        })
    }

    fn ping(&self, ctx: &Context) -> Result<()> {
        self.dispatch(operation::PING, OperationMode::Nonmutating, ctx, |direct| {
            direct.servant().ping(direct.current())
        })
    }

    fn ids(&self, ctx: &Context) -> Result<BTreeSet<String>> {
        self.dispatch(operation::IDS, OperationMode::Nonmutating, ctx, |direct| {
            direct.servant().ids(direct.current())
        })
    }

    fn id(&self, ctx: &Context) -> Result<String> {
        self.dispatch(operation::ID, OperationMode::Nonmutating, ctx, |direct| {
            direct.servant().id(direct.current())
        })
    }

    fn facets(&self, ctx: &Context) -> Result<Vec<Facet>> {
        self.dispatch(operation::FACETS, OperationMode::Nonmutating, ctx, |direct| {
            Ok(direct.facets())
        })
    }

    fn invoke(
        &self,
        operation: &str,
        mode: OperationMode,
        in_params: Bytes,
        ctx: &Context,
    ) -> Result<InvokeReply> {
        self.dispatch(operation, mode, ctx, |direct| {
            let current = direct.current();
            match direct.servant().as_blobject() {
                Some(blobject) => blobject.invoke(in_params, current),
                None => Err(ServantError::Orb(OrbError::OperationNotExist {
                    identity: current.id.clone(),
                    facet: current.facet.clone(),
                    operation: current.operation.clone(),
                })),
            }
        })
    }

    fn flush(&self) -> Result<()> {
        // Collocated calls are never batched.
        Ok(())
    }
}

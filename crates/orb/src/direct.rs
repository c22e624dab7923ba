//! Scoped servant lease for one collocated call
//!
//! A [`Direct`] borrows the call's [`Current`] and the adapter, so it cannot
//! outlive the call that created it. Dropping it releases the lease exactly
//! once, whether the servant returned, failed, or panicked.

use std::sync::Arc;
use crate::adapter::ObjectAdapter;
use crate::exception::{self, ServantError};
use crate::servant::{Cookie, Servant, ServantLocator};
use crate::types::{Current, Facet, Result};

/// Lease on a resolved servant
pub struct Direct<'a> {
    adapter: &'a ObjectAdapter,
    current: &'a Current,
    servant: Arc<dyn Servant>,
    located: Option<(Arc<dyn ServantLocator>, Cookie)>,
}

impl<'a> Direct<'a> {
    /// Resolve `current` against `adapter` and take a lease on the servant
    ///
    /// A resolution failure leaves no lease behind.
    pub fn acquire(adapter: &'a ObjectAdapter, current: &'a Current) -> Result<Self> {
        adapter.inc_direct_count()?;

        // Locators run servant code; a panic there must not leak the count.
        let resolved = match exception::catch(|| adapter.resolve(current).map_err(ServantError::Orb))
            .map_err(exception::translate)
        {
            Ok(resolved) => resolved,
            Err(e) => {
                adapter.dec_direct_count();
                tracing::trace!(
                    "resolution of {} for `{}` failed: {}",
                    current.id,
                    current.operation,
                    e
                );
                return Err(e);
            }
        };

        adapter.record_acquired();
        tracing::trace!(
            "lease acquired on {} (facet `{}`) for `{}`",
            current.id,
            current.facet,
            current.operation
        );

        Ok(Self {
            adapter,
            current,
            servant: resolved.servant,
            located: resolved.located,
        })
    }

    /// The leased servant
    pub fn servant(&self) -> &dyn Servant {
        self.servant.as_ref()
    }

    /// Facets registered under the leased identity
    ///
    /// A servant supplied by a locator is not in the servant table; it
    /// reports the one facet it was located for.
    pub fn facets(&self) -> Vec<Facet> {
        if self.located.is_some() {
            return vec![self.current.facet.clone()];
        }
        self.adapter.facets_of(&self.current.id)
    }

    /// The call this lease belongs to
    pub fn current(&self) -> &Current {
        self.current
    }
}

impl Drop for Direct<'_> {
    fn drop(&mut self) {
        if let Some((locator, cookie)) = self.located.take() {
            let finished = exception::catch(|| {
                locator.finished(self.current, &self.servant, cookie);
                Ok(())
            });
            if let Err(e) = finished {
                tracing::warn!(
                    "servant locator `finished` failed for {} (`{}`): {}",
                    self.current.id,
                    self.current.operation,
                    e
                );
            }
        }
        self.adapter.record_released();
        self.adapter.dec_direct_count();
        tracing::trace!(
            "lease released on {} for `{}`",
            self.current.id,
            self.current.operation
        );
    }
}

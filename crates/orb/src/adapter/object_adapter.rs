//! Object adapter
//!
//! The adapter owns the servants registered under it, resolves
//! `(identity, facet)` for incoming collocated calls, and tracks in-flight
//! leases so deactivation can wait for them to drain.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use parking_lot::{Condvar, Mutex};
use crate::exception::translate;
use crate::servant::{Cookie, Servant, ServantLocator};
use crate::types::{Current, Endpoint, Facet, Identity, OrbError, Reference, Result};
use super::tables::{FacetLookup, LocatorTable, ServantTable};

/// Lease counters of an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeaseStats {
    /// Leases granted to callers
    pub acquired: u64,
    /// Leases released by callers
    pub released: u64,
}

impl LeaseStats {
    /// Leases currently held
    pub fn outstanding(&self) -> u64 {
        self.acquired.saturating_sub(self.released)
    }
}

#[derive(Debug, Default)]
struct AdapterState {
    deactivated: bool,
    destroyed: bool,
    direct_count: usize,
}

/// A servant resolved for one call, plus the locator that produced it
pub(crate) struct Resolved {
    pub(crate) servant: Arc<dyn Servant>,
    pub(crate) located: Option<(Arc<dyn ServantLocator>, Cookie)>,
}

/// Object adapter
pub struct ObjectAdapter {
    /// Adapter name, also its adapter id
    name: String,
    /// Endpoints this adapter is reachable at
    endpoints: Vec<Endpoint>,
    /// Active servants
    servants: ServantTable,
    /// Servant locators by category
    locators: LocatorTable,
    /// Lifecycle and in-flight direct calls
    state: Mutex<AdapterState>,
    /// Signalled when the direct count drains after deactivation
    drained: Condvar,
    acquired: AtomicU64,
    released: AtomicU64,
}

impl ObjectAdapter {
    /// Create an active adapter
    pub fn new(name: impl Into<String>, endpoints: Vec<Endpoint>) -> Self {
        let name = name.into();
        tracing::info!("object adapter `{}` activated", name);
        Self {
            name,
            endpoints,
            servants: ServantTable::new(),
            locators: LocatorTable::new(),
            state: Mutex::new(AdapterState::default()),
            drained: Condvar::new(),
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    /// Adapter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Endpoints
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Register a servant as the default facet of `identity`
    pub fn add(&self, servant: Arc<dyn Servant>, identity: Identity) -> Result<Reference> {
        self.add_facet(servant, identity, Facet::DEFAULT)
    }

    /// Register a servant under a generated identity
    pub fn add_with_uuid(&self, servant: Arc<dyn Servant>) -> Result<Reference> {
        self.add(servant, Identity::generate())
    }

    /// Register a servant for one facet of `identity`
    pub fn add_facet(
        &self,
        servant: Arc<dyn Servant>,
        identity: Identity,
        facet: Facet,
    ) -> Result<Reference> {
        self.check_for_deactivation()?;
        self.servants.add(identity.clone(), facet.clone(), servant)?;
        Ok(self.create_reference(identity).with_facet(facet))
    }

    /// Remove the default facet of `identity`
    pub fn remove(&self, identity: &Identity) -> Result<Option<Arc<dyn Servant>>> {
        self.remove_facet(identity, &Facet::DEFAULT)
    }

    /// Remove one facet of `identity`
    pub fn remove_facet(&self, identity: &Identity, facet: &Facet) -> Result<Option<Arc<dyn Servant>>> {
        self.check_for_deactivation()?;
        Ok(self.servants.remove(identity, facet))
    }

    /// Remove every facet of `identity`
    pub fn remove_all_facets(&self, identity: &Identity) -> Result<Vec<(Facet, Arc<dyn Servant>)>> {
        self.check_for_deactivation()?;
        Ok(self.servants.remove_all(identity).into_iter().collect())
    }

    /// Find the default-facet servant of `identity`
    pub fn find(&self, identity: &Identity) -> Option<Arc<dyn Servant>> {
        self.find_facet(identity, &Facet::DEFAULT)
    }

    /// Find the servant for one facet of `identity`
    pub fn find_facet(&self, identity: &Identity, facet: &Facet) -> Option<Arc<dyn Servant>> {
        match self.servants.lookup(identity, facet) {
            FacetLookup::Found(servant) => Some(servant),
            FacetLookup::NoFacet | FacetLookup::NoIdentity => None,
        }
    }

    /// Facets registered for `identity`, in name order
    pub fn facets_of(&self, identity: &Identity) -> Vec<Facet> {
        self.servants.facets(identity)
    }

    /// Register a servant locator for a category (empty for the default)
    pub fn add_servant_locator(
        &self,
        locator: Arc<dyn ServantLocator>,
        category: impl Into<String>,
    ) -> Result<()> {
        self.check_for_deactivation()?;
        self.locators.add(category.into(), locator)
    }

    /// Remove the servant locator for a category
    pub fn remove_servant_locator(&self, category: &str) -> Result<Option<Arc<dyn ServantLocator>>> {
        self.check_for_deactivation()?;
        Ok(self.locators.remove(category))
    }

    /// Find the servant locator for a category
    pub fn find_servant_locator(&self, category: &str) -> Option<Arc<dyn ServantLocator>> {
        self.locators.lookup(category)
    }

    /// Reference to `identity` hosted by this adapter
    pub fn create_reference(&self, identity: Identity) -> Reference {
        Reference::new(identity)
            .with_adapter_id(self.name.clone())
            .with_endpoints(self.endpoints.clone())
    }

    /// True if `reference` designates an object hosted by this adapter
    pub fn is_local(&self, reference: &Reference) -> bool {
        if reference.adapter_id() == Some(self.name.as_str()) {
            return true;
        }
        reference
            .endpoints()
            .iter()
            .any(|endpoint| self.endpoints.contains(endpoint))
    }

    /// Stop accepting new calls
    pub fn deactivate(&self) {
        let mut state = self.state.lock();
        if state.deactivated {
            return;
        }
        state.deactivated = true;
        tracing::info!(
            "object adapter `{}` deactivated with {} call(s) in flight",
            self.name,
            state.direct_count
        );
        self.drained.notify_all();
    }

    /// Block until deactivated and drained, then destroy servants and locators
    pub fn wait_for_deactivate(&self) {
        {
            let mut state = self.state.lock();
            while !state.deactivated || state.direct_count > 0 {
                self.drained.wait(&mut state);
            }
            if state.destroyed {
                return;
            }
            state.destroyed = true;
        }

        self.servants.clear();
        for locator in self.locators.drain() {
            locator.deactivate();
        }
        tracing::debug!("object adapter `{}` destroyed", self.name);
    }

    /// True once `deactivate` has been called
    pub fn is_deactivated(&self) -> bool {
        self.state.lock().deactivated
    }

    /// Number of collocated calls currently in flight
    pub fn direct_count(&self) -> usize {
        self.state.lock().direct_count
    }

    /// Lease counters
    pub fn lease_stats(&self) -> LeaseStats {
        LeaseStats {
            acquired: self.acquired.load(Ordering::SeqCst),
            released: self.released.load(Ordering::SeqCst),
        }
    }

    fn check_for_deactivation(&self) -> Result<()> {
        if self.state.lock().deactivated {
            Err(OrbError::AdapterDeactivated(self.name.clone()))
        } else {
            Ok(())
        }
    }

    /// Count a new in-flight call; fails once deactivated
    pub(crate) fn inc_direct_count(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.deactivated {
            return Err(OrbError::AdapterDeactivated(self.name.clone()));
        }
        state.direct_count += 1;
        Ok(())
    }

    /// End an in-flight call
    pub(crate) fn dec_direct_count(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.direct_count > 0);
        state.direct_count = state.direct_count.saturating_sub(1);
        if state.deactivated && state.direct_count == 0 {
            self.drained.notify_all();
        }
    }

    pub(crate) fn record_acquired(&self) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_released(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }

    /// Resolve the servant for `current`, consulting locators on a miss
    pub(crate) fn resolve(&self, current: &Current) -> Result<Resolved> {
        match self.servants.lookup(&current.id, &current.facet) {
            FacetLookup::Found(servant) => {
                return Ok(Resolved {
                    servant,
                    located: None,
                })
            }
            FacetLookup::NoFacet => {
                return Err(OrbError::FacetNotFound {
                    identity: current.id.clone(),
                    facet: current.facet.clone(),
                    operation: current.operation.clone(),
                })
            }
            FacetLookup::NoIdentity => {}
        }

        let locator = self
            .locators
            .lookup(&current.id.category)
            .or_else(|| self.locators.lookup(""));

        if let Some(locator) = locator {
            if let Some((servant, cookie)) = locator.locate(current).map_err(translate)? {
                return Ok(Resolved {
                    servant,
                    located: Some((locator, cookie)),
                });
            }
        }

        Err(OrbError::ObjectNotFound {
            identity: current.id.clone(),
            facet: current.facet.clone(),
            operation: current.operation.clone(),
        })
    }
}

impl std::fmt::Debug for ObjectAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectAdapter")
            .field("name", &self.name)
            .field("endpoints", &self.endpoints)
            .field("servants", &self.servants.len())
            .finish()
    }
}

//! Servant and servant-locator tables
//!
//! These tables are shared by every call dispatched through an adapter and
//! support concurrent lookups of arbitrary (possibly identical) identities.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use parking_lot::RwLock;
use crate::servant::{Servant, ServantLocator};
use crate::types::{Facet, Identity, OrbError, Result};

/// Outcome of a facet lookup
pub enum FacetLookup {
    /// A servant is registered for the identity and facet
    Found(Arc<dyn Servant>),
    /// The identity is registered, but not with this facet
    NoFacet,
    /// The identity is not registered at all
    NoIdentity,
}

/// Thread-safe table of `(identity, facet) -> servant`
pub struct ServantTable {
    entries: RwLock<HashMap<Identity, BTreeMap<Facet, Arc<dyn Servant>>>>,
}

impl ServantTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register a servant; fails if the facet is already taken
    pub fn add(&self, identity: Identity, facet: Facet, servant: Arc<dyn Servant>) -> Result<()> {
        let mut entries = self.entries.write();
        let facets = entries.entry(identity.clone()).or_default();
        if facets.contains_key(&facet) {
            return Err(OrbError::AlreadyRegistered(format!(
                "servant for {} (facet `{}`)",
                identity, facet
            )));
        }
        facets.insert(facet, servant);
        Ok(())
    }

    /// Remove one facet, dropping the identity once it has none left
    pub fn remove(&self, identity: &Identity, facet: &Facet) -> Option<Arc<dyn Servant>> {
        let mut entries = self.entries.write();
        let facets = entries.get_mut(identity)?;
        let removed = facets.remove(facet);
        if facets.is_empty() {
            entries.remove(identity);
        }
        removed
    }

    /// Remove every facet of an identity
    pub fn remove_all(&self, identity: &Identity) -> BTreeMap<Facet, Arc<dyn Servant>> {
        let mut entries = self.entries.write();
        entries.remove(identity).unwrap_or_default()
    }

    /// Look up a facet
    pub fn lookup(&self, identity: &Identity, facet: &Facet) -> FacetLookup {
        let entries = self.entries.read();
        match entries.get(identity) {
            Some(facets) => match facets.get(facet) {
                Some(servant) => FacetLookup::Found(servant.clone()),
                None => FacetLookup::NoFacet,
            },
            None => FacetLookup::NoIdentity,
        }
    }

    /// Registered facets of an identity, in name order
    pub fn facets(&self, identity: &Identity) -> Vec<Facet> {
        let entries = self.entries.read();
        entries
            .get(identity)
            .map(|facets| facets.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of registered identities
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove everything
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for ServantTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe table of `category -> servant locator`
pub struct LocatorTable {
    entries: RwLock<HashMap<String, Arc<dyn ServantLocator>>>,
}

impl LocatorTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register a locator for a category
    pub fn add(&self, category: String, locator: Arc<dyn ServantLocator>) -> Result<()> {
        let mut entries = self.entries.write();
        if entries.contains_key(&category) {
            return Err(OrbError::AlreadyRegistered(format!(
                "servant locator for category `{}`",
                category
            )));
        }
        entries.insert(category, locator);
        Ok(())
    }

    /// Remove the locator for a category
    pub fn remove(&self, category: &str) -> Option<Arc<dyn ServantLocator>> {
        self.entries.write().remove(category)
    }

    /// Look up the locator for a category
    pub fn lookup(&self, category: &str) -> Option<Arc<dyn ServantLocator>> {
        self.entries.read().get(category).cloned()
    }

    /// Remove and return every locator
    pub fn drain(&self) -> Vec<Arc<dyn ServantLocator>> {
        self.entries.write().drain().map(|(_, locator)| locator).collect()
    }
}

impl Default for LocatorTable {
    fn default() -> Self {
        Self::new()
    }
}

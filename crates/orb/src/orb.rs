//! Runtime entry point
//!
//! The [`Orb`] owns the object adapters of this process and the outgoing
//! transport, and decides for every reference whether calls are dispatched
//! in-process or remotely.

use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use crate::adapter::ObjectAdapter;
use crate::config::{ForwardPolicy, OrbConfig};
use crate::delegate::{CollocatedDelegate, Delegate, RemoteDelegate, Transport};
use crate::proxy::ObjectProxy;
use crate::types::{Endpoint, OrbError, Reference, Result};

struct OrbInner {
    config: OrbConfig,
    adapters: RwLock<HashMap<String, Arc<ObjectAdapter>>>,
    transport: Option<Arc<dyn Transport>>,
}

/// Object request broker runtime
///
/// Cheap to clone; clones share adapters, transport and configuration.
#[derive(Clone)]
pub struct Orb {
    inner: Arc<OrbInner>,
}

impl Orb {
    /// Create a runtime with the default configuration and no transport
    pub fn new() -> Self {
        OrbBuilder::new().build()
    }

    /// Start building a runtime
    pub fn builder() -> OrbBuilder {
        OrbBuilder::new()
    }

    /// Configuration
    pub fn config(&self) -> &OrbConfig {
        &self.inner.config
    }

    /// Create and register a new object adapter
    pub fn create_object_adapter(
        &self,
        name: impl Into<String>,
        endpoints: Vec<Endpoint>,
    ) -> Result<Arc<ObjectAdapter>> {
        let name = name.into();
        let mut adapters = self.inner.adapters.write();
        if adapters.contains_key(&name) {
            return Err(OrbError::AlreadyRegistered(format!("object adapter `{}`", name)));
        }
        let adapter = Arc::new(ObjectAdapter::new(name.clone(), endpoints));
        adapters.insert(name, adapter.clone());
        Ok(adapter)
    }

    /// Look up an adapter by name
    pub fn find_object_adapter(&self, name: &str) -> Option<Arc<ObjectAdapter>> {
        self.inner.adapters.read().get(name).cloned()
    }

    /// The local adapter hosting `reference`, if any
    pub fn find_collocated(&self, reference: &Reference) -> Option<Arc<ObjectAdapter>> {
        if !self.inner.config.collocation {
            return None;
        }
        let adapters = self.inner.adapters.read();
        if let Some(adapter) = reference.adapter_id().and_then(|id| adapters.get(id)) {
            return Some(adapter.clone());
        }
        adapters
            .values()
            .find(|adapter| adapter.is_local(reference))
            .cloned()
    }

    /// Build the delegate for `reference`
    pub fn delegate_for(&self, reference: &Reference) -> Result<Arc<dyn Delegate>> {
        if let Some(adapter) = self.find_collocated(reference) {
            tracing::debug!("{} is collocated in `{}`", reference, adapter.name());
            return Ok(Arc::new(CollocatedDelegate::new(reference.clone(), adapter)));
        }

        match &self.inner.transport {
            Some(transport) => {
                tracing::debug!("{} is remote", reference);
                Ok(Arc::new(RemoteDelegate::new(reference.clone(), transport.clone())))
            }
            None => Err(OrbError::NoEndpoint(reference.to_string())),
        }
    }

    /// Create a proxy for `reference`
    pub fn create_proxy(&self, reference: Reference) -> Result<ObjectProxy> {
        let delegate = self.delegate_for(&reference)?;
        Ok(ObjectProxy::new(self.clone(), delegate))
    }

    /// Deactivate every adapter, wait for in-flight calls, and forget them
    pub fn shutdown(&self) {
        let adapters: Vec<Arc<ObjectAdapter>> =
            self.inner.adapters.write().drain().map(|(_, a)| a).collect();
        for adapter in &adapters {
            adapter.deactivate();
        }
        for adapter in &adapters {
            adapter.wait_for_deactivate();
        }
        tracing::info!("orb shut down ({} adapter(s))", adapters.len());
    }
}

impl Default for Orb {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Orb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orb")
            .field("config", &self.inner.config)
            .field("adapters", &self.inner.adapters.read().len())
            .field("transport", &self.inner.transport.is_some())
            .finish()
    }
}

/// Builder for [`Orb`]
pub struct OrbBuilder {
    config: OrbConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl OrbBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: OrbConfig::default(),
            transport: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: OrbConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the forward retry policy
    pub fn forward_policy(mut self, policy: ForwardPolicy) -> Self {
        self.config.forward_policy = policy;
        self
    }

    /// Enable or disable collocated dispatch
    pub fn collocation(mut self, enable: bool) -> Self {
        self.config.collocation = enable;
        self
    }

    /// Set the transport used for remote references
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the runtime
    pub fn build(self) -> Orb {
        Orb {
            inner: Arc::new(OrbInner {
                config: self.config,
                adapters: RwLock::new(HashMap::new()),
                transport: self.transport,
            }),
        }
    }
}

impl Default for OrbBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Object references
//!
//! A reference says which object a proxy talks to (identity and facet) and
//! how to reach it (adapter id and/or endpoints). References are immutable;
//! every `with_*` method returns a new value.

use std::fmt;
use super::identity::{Facet, Identity};

/// Opaque endpoint description, interpreted only by the transport
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    /// Create an endpoint from its textual form
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Textual form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Immutable reference to a target object
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reference {
    identity: Identity,
    facet: Facet,
    adapter_id: Option<String>,
    endpoints: Vec<Endpoint>,
}

impl Reference {
    /// Create a reference to the default facet of `identity` with no location
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            facet: Facet::DEFAULT,
            adapter_id: None,
            endpoints: Vec::new(),
        }
    }

    /// Target identity
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Target facet
    pub fn facet(&self) -> &Facet {
        &self.facet
    }

    /// Adapter id for indirect references
    pub fn adapter_id(&self) -> Option<&str> {
        self.adapter_id.as_deref()
    }

    /// Endpoints for direct references
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Same target object, different facet
    pub fn with_facet(&self, facet: impl Into<Facet>) -> Self {
        Self {
            facet: facet.into(),
            ..self.clone()
        }
    }

    /// Same target, located through an adapter id
    pub fn with_adapter_id(&self, adapter_id: impl Into<String>) -> Self {
        Self {
            adapter_id: Some(adapter_id.into()),
            ..self.clone()
        }
    }

    /// Same target, reachable at the given endpoints
    pub fn with_endpoints(&self, endpoints: Vec<Endpoint>) -> Self {
        Self {
            endpoints,
            ..self.clone()
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity)?;
        if !self.facet.is_default() {
            write!(f, " -f {}", self.facet)?;
        }
        if let Some(adapter_id) = &self.adapter_id {
            write!(f, " @ {}", adapter_id)?;
        }
        for endpoint in &self.endpoints {
            write!(f, ":{}", endpoint)?;
        }
        Ok(())
    }
}

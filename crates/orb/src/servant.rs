//! Servant capabilities
//!
//! A servant is the implementation object behind one registered
//! identity/facet. Every servant answers the built-in probes; servants that
//! accept pre-encoded requests additionally expose the [`Blobject`]
//! capability through [`Servant::as_blobject`].

use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;
use bytes::Bytes;
use crate::exception::ServantResult;
use crate::types::Current;

/// Type id every servant implements
pub const OBJECT_TYPE_ID: &str = "::Ice::Object";

/// Reply of a dynamic invocation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvokeReply {
    /// False when `out_params` encodes a user exception
    pub ok: bool,
    /// Encoded results or user exception
    pub out_params: Bytes,
}

impl InvokeReply {
    /// Successful reply
    pub fn success(out_params: impl Into<Bytes>) -> Self {
        Self {
            ok: true,
            out_params: out_params.into(),
        }
    }

    /// Reply carrying an encoded user exception
    pub fn user_exception(out_params: impl Into<Bytes>) -> Self {
        Self {
            ok: false,
            out_params: out_params.into(),
        }
    }
}

/// Trait for servant implementations
pub trait Servant: Send + Sync + 'static {
    /// All type ids this servant implements
    fn ids(&self, current: &Current) -> ServantResult<BTreeSet<String>>;

    /// Most-derived type id
    fn id(&self, current: &Current) -> ServantResult<String>;

    /// Check whether this servant implements `type_id`
    fn is_a(&self, type_id: &str, current: &Current) -> ServantResult<bool> {
        Ok(self.ids(current)?.contains(type_id))
    }

    /// Liveness probe
    fn ping(&self, _current: &Current) -> ServantResult<()> {
        Ok(())
    }

    /// Raw invocation capability, if supported
    fn as_blobject(&self) -> Option<&dyn Blobject> {
        None
    }
}

/// Raw invocation capability
///
/// Accepts pre-encoded in-parameters and returns pre-encoded results.
pub trait Blobject: Send + Sync {
    /// Dispatch `current.operation` with encoded parameters
    fn invoke(&self, in_params: Bytes, current: &Current) -> ServantResult<InvokeReply>;
}

/// Opaque value a locator hands back with a located servant
pub type Cookie = Option<Box<dyn Any + Send>>;

/// Servant locator, consulted when no servant is registered for an identity
pub trait ServantLocator: Send + Sync + 'static {
    /// Locate a servant for `current`, or `None` when it does not exist
    fn locate(&self, current: &Current) -> ServantResult<Option<(Arc<dyn Servant>, Cookie)>>;

    /// Called exactly once after each successful `locate`, when the call ends
    fn finished(&self, current: &Current, servant: &Arc<dyn Servant>, cookie: Cookie);

    /// Called when the owning adapter is destroyed
    fn deactivate(&self) {}
}

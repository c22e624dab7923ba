//! Runtime configuration

use crate::DEFAULT_MAX_FORWARDS;

/// How many location forwards a single call may follow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardPolicy {
    /// Fail with `ForwardLimitExceeded` after this many forwards
    Limited(u32),
    /// Follow forwards indefinitely; a forwarding cycle never terminates
    Unbounded,
}

impl ForwardPolicy {
    /// True if a call that has already been forwarded `forwards` times may
    /// follow one more forward
    pub fn allows(&self, forwards: u32) -> bool {
        match self {
            ForwardPolicy::Limited(limit) => forwards < *limit,
            ForwardPolicy::Unbounded => true,
        }
    }
}

/// Caps a call at [`DEFAULT_MAX_FORWARDS`] forwards, so a forwarding cycle
/// ends in `ForwardLimitExceeded` instead of looping. Choose
/// [`ForwardPolicy::Unbounded`] explicitly to follow forwards without a cap.
impl Default for ForwardPolicy {
    fn default() -> Self {
        ForwardPolicy::Limited(DEFAULT_MAX_FORWARDS)
    }
}

/// Configuration for an [`Orb`](crate::Orb)
#[derive(Clone, Debug)]
pub struct OrbConfig {
    /// Forward retry policy for every proxy
    pub forward_policy: ForwardPolicy,
    /// Dispatch in-process when the target adapter is local
    pub collocation: bool,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            forward_policy: ForwardPolicy::default(),
            collocation: true,
        }
    }
}

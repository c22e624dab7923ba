//! Shared fixtures for the integration tests
//!
//! Provides logging setup, configurable servants, a scripted transport and
//! helpers for checking lease bookkeeping.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use orb::delegate::{OutgoingRequest, ReplyBody, RequestBody, TransportFailure};
use orb::{
    Blobject, Context, Current, InvokeReply, LeaseStats, ObjectAdapter, OrbError, Reference,
    Servant, ServantError, ServantResult, Transport, UserException, OBJECT_TYPE_ID,
};

pub const FOO_TYPE_ID: &str = "::Demo::Foo";
pub const OVERDRAWN_TYPE_ID: &str = "::Demo::Overdrawn";

static INIT: Once = Once::new();

/// Initialise tracing once per test process (honours `RUST_LOG`)
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Build a context with one entry
pub fn ctx(key: &str, value: &str) -> Context {
    let mut ctx = Context::new();
    ctx.insert(key.to_string(), value.to_string());
    ctx
}

/// What a [`FooServant`] does when called
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Answer normally
    Succeed,
    /// Raise a declared user exception
    UserError(UserException),
    /// Raise an undeclared ordinary failure
    Checked(String),
    /// Raise an undeclared programming error
    Unchecked(String),
    /// Panic
    Panic(String),
    /// Forward to another reference
    Forward(Reference),
    /// Sleep before answering normally
    Slow(Duration),
    /// Propagate an error from a call the servant made itself
    Nested(OrbError),
}

/// Servant implementing `::Demo::Foo` with configurable behaviour
pub struct FooServant {
    behavior: Behavior,
    calls: AtomicUsize,
    seen: Mutex<Vec<Current>>,
}

impl FooServant {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn succeeding() -> Arc<Self> {
        Self::new(Behavior::Succeed)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Current> {
        self.seen.lock().clone()
    }

    fn act(&self, current: &Current) -> ServantResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(current.clone());
        match &self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::UserError(e) => Err(ServantError::User(e.clone())),
            Behavior::Checked(msg) => Err(ServantError::checked(msg.clone())),
            Behavior::Unchecked(msg) => Err(ServantError::unchecked(msg.clone())),
            Behavior::Panic(msg) => panic!("{}", msg),
            Behavior::Forward(target) => Err(ServantError::forward(target.clone())),
            Behavior::Slow(delay) => {
                std::thread::sleep(*delay);
                Ok(())
            }
            Behavior::Nested(e) => Err(e.clone().into()),
        }
    }
}

impl Servant for FooServant {
    fn ids(&self, current: &Current) -> ServantResult<BTreeSet<String>> {
        self.act(current)?;
        Ok([FOO_TYPE_ID.to_string(), OBJECT_TYPE_ID.to_string()]
            .into_iter()
            .collect())
    }

    fn id(&self, current: &Current) -> ServantResult<String> {
        self.act(current)?;
        Ok(FOO_TYPE_ID.to_string())
    }

    fn is_a(&self, type_id: &str, current: &Current) -> ServantResult<bool> {
        self.act(current)?;
        Ok(type_id == FOO_TYPE_ID || type_id == OBJECT_TYPE_ID)
    }

    fn ping(&self, current: &Current) -> ServantResult<()> {
        self.act(current)
    }
}

/// Servant that only supports dynamic invocation and echoes its input
pub struct EchoBlobject {
    type_id: String,
}

impl EchoBlobject {
    pub fn new(type_id: &str) -> Arc<Self> {
        Arc::new(Self {
            type_id: type_id.to_string(),
        })
    }
}

impl Servant for EchoBlobject {
    fn ids(&self, _current: &Current) -> ServantResult<BTreeSet<String>> {
        Ok([self.type_id.clone(), OBJECT_TYPE_ID.to_string()]
            .into_iter()
            .collect())
    }

    fn id(&self, _current: &Current) -> ServantResult<String> {
        Ok(self.type_id.clone())
    }

    fn as_blobject(&self) -> Option<&dyn Blobject> {
        Some(self)
    }
}

impl Blobject for EchoBlobject {
    fn invoke(&self, in_params: Bytes, current: &Current) -> ServantResult<InvokeReply> {
        match current.operation.as_str() {
            "echo" => Ok(InvokeReply::success(in_params)),
            "fail" => Ok(InvokeReply::user_exception(in_params)),
            other => Err(ServantError::Orb(OrbError::OperationNotExist {
                identity: current.id.clone(),
                facet: current.facet.clone(),
                operation: other.to_string(),
            })),
        }
    }
}

/// Transport that answers from a script and records what it was sent
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<Vec<Result<ReplyBody, TransportFailure>>>,
    sent: Mutex<Vec<(Reference, String, RequestBody)>>,
}

impl ScriptedTransport {
    /// Replies are consumed in order
    pub fn new(replies: Vec<Result<ReplyBody, TransportFailure>>) -> Arc<Self> {
        let transport = Self::default();
        *transport.replies.lock() = replies.into_iter().rev().collect();
        Arc::new(transport)
    }

    pub fn sent(&self) -> Vec<(Reference, String, RequestBody)> {
        self.sent.lock().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: OutgoingRequest<'_>) -> Result<ReplyBody, TransportFailure> {
        self.sent.lock().push((
            request.reference.clone(),
            request.operation.to_string(),
            request.body,
        ));
        self.replies.lock().pop().unwrap_or_else(|| {
            Err(TransportFailure::NotSent(OrbError::Transport(
                "script exhausted".to_string(),
            )))
        })
    }

    fn flush(&self, _reference: &Reference) -> orb::Result<()> {
        Ok(())
    }
}

/// Assert every lease taken on `adapter` was released and none is in flight
pub fn assert_leases_balanced(adapter: &ObjectAdapter, expected: u64) {
    let stats = adapter.lease_stats();
    assert_eq!(
        stats,
        LeaseStats {
            acquired: expected,
            released: expected
        },
        "lease bookkeeping out of balance on `{}`",
        adapter.name()
    );
    assert_eq!(adapter.direct_count(), 0);
}

//! Concurrency Tests - Many Callers Against One Adapter
//!
//! These tests exercise the invocation core from many threads at once:
//! - Per-call context isolation under load
//! - Lease bookkeeping with overlapping calls
//! - Deactivation while calls are in flight
//! - Concurrent forwards through a shared proxy

mod common;

use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::future::join_all;

use common::*;
use orb::{
    Blobject, Context, Current, Identity, InvokeReply, OperationMode, Orb, OrbError, Servant,
    ServantResult, OBJECT_TYPE_ID,
};

/// Replies with the `caller` entry of the context it was called with
struct ContextReflector;

impl Servant for ContextReflector {
    fn ids(&self, _current: &Current) -> ServantResult<BTreeSet<String>> {
        Ok([OBJECT_TYPE_ID.to_string()].into_iter().collect())
    }

    fn id(&self, _current: &Current) -> ServantResult<String> {
        Ok(OBJECT_TYPE_ID.to_string())
    }

    fn as_blobject(&self) -> Option<&dyn Blobject> {
        Some(self)
    }
}

impl Blobject for ContextReflector {
    fn invoke(&self, _in_params: Bytes, current: &Current) -> ServantResult<InvokeReply> {
        let caller = current.ctx.get("caller").cloned().unwrap_or_default();
        std::thread::yield_now();
        Ok(InvokeReply::success(Bytes::from(caller)))
    }
}

/// Poll until `done` holds or the timeout elapses
fn wait_until(timeout: Duration, done: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    done()
}

/// Test: every caller sees only its own context
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_contexts_do_not_leak_between_callers() {
    init_logging();

    const NUM_CALLERS: usize = 32;
    const CALLS_PER_CALLER: usize = 50;

    let orb = Orb::new();
    let adapter = orb.create_object_adapter("TestAdapter", Vec::new()).unwrap();
    let reference = adapter
        .add(Arc::new(ContextReflector), Identity::new("reflector"))
        .unwrap();
    let proxy = orb.create_proxy(reference).unwrap();
    let barrier = Arc::new(Barrier::new(NUM_CALLERS));

    let handles: Vec<_> = (0..NUM_CALLERS)
        .map(|caller| {
            let proxy = proxy.clone();
            let barrier = barrier.clone();
            tokio::task::spawn_blocking(move || {
                barrier.wait();
                let context = ctx("caller", &format!("caller-{caller}"));
                let mut mismatches = 0;
                for _ in 0..CALLS_PER_CALLER {
                    let reply = proxy
                        .invoke("reflect", OperationMode::Nonmutating, Bytes::new(), &context)
                        .unwrap();
                    if reply.out_params != Bytes::from(format!("caller-{caller}")) {
                        mismatches += 1;
                    }
                }
                mismatches
            })
        })
        .collect();

    let mismatches: usize = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .sum();

    assert_eq!(mismatches, 0);
    assert_leases_balanced(&adapter, (NUM_CALLERS * CALLS_PER_CALLER) as u64);
}

/// Test: a servant shared by many callers sees one Current per call
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_each_call_gets_its_own_current() {
    init_logging();

    const NUM_CALLERS: usize = 16;
    const CALLS_PER_CALLER: usize = 20;

    let orb = Orb::new();
    let adapter = orb.create_object_adapter("TestAdapter", Vec::new()).unwrap();
    let servant = FooServant::succeeding();
    let reference = adapter.add(servant.clone(), Identity::new("shared")).unwrap();
    let proxy = orb.create_proxy(reference).unwrap();

    let handles: Vec<_> = (0..NUM_CALLERS)
        .map(|caller| {
            let proxy = proxy.clone();
            tokio::task::spawn_blocking(move || {
                let context = ctx("caller", &caller.to_string());
                for _ in 0..CALLS_PER_CALLER {
                    proxy.ping(&context).unwrap();
                }
            })
        })
        .collect();

    for result in join_all(handles).await {
        result.unwrap();
    }

    let seen = servant.seen();
    assert_eq!(seen.len(), NUM_CALLERS * CALLS_PER_CALLER);
    for caller in 0..NUM_CALLERS {
        let key = caller.to_string();
        let count = seen
            .iter()
            .filter(|c| c.ctx.get("caller") == Some(&key))
            .count();
        assert_eq!(count, CALLS_PER_CALLER, "caller {caller}");
    }
    assert!(seen.iter().all(|c| c.operation == "ice_ping"));
    assert_leases_balanced(&adapter, (NUM_CALLERS * CALLS_PER_CALLER) as u64);
}

/// Test: deactivation waits for in-flight calls and then rejects new ones
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_deactivation_drains_in_flight_calls() {
    init_logging();

    const NUM_CALLERS: usize = 6;
    const CALL_TIME: Duration = Duration::from_millis(300);

    let orb = Orb::new();
    let adapter = orb.create_object_adapter("TestAdapter", Vec::new()).unwrap();
    let identity = Identity::new("slow");
    let reference = adapter
        .add(FooServant::new(Behavior::Slow(CALL_TIME)), identity.clone())
        .unwrap();
    let proxy = orb.create_proxy(reference).unwrap();

    let callers: Vec<_> = (0..NUM_CALLERS)
        .map(|_| {
            let proxy = proxy.clone();
            tokio::task::spawn_blocking(move || proxy.ping(&Context::new()))
        })
        .collect();

    let in_flight = {
        let adapter = adapter.clone();
        tokio::task::spawn_blocking(move || {
            wait_until(Duration::from_secs(5), || adapter.direct_count() == NUM_CALLERS)
        })
        .await
        .unwrap()
    };
    assert!(in_flight, "calls never overlapped");

    let drained = {
        let adapter = adapter.clone();
        tokio::task::spawn_blocking(move || {
            adapter.deactivate();
            let start = Instant::now();
            adapter.wait_for_deactivate();
            (start.elapsed(), adapter.direct_count())
        })
    };

    // New calls are rejected as soon as the adapter is deactivated.
    let rejected = {
        let adapter = adapter.clone();
        let proxy = proxy.clone();
        tokio::task::spawn_blocking(move || {
            wait_until(Duration::from_secs(5), || adapter.is_deactivated());
            proxy.ping(&Context::new())
        })
        .await
        .unwrap()
    };
    assert_eq!(
        rejected,
        Err(OrbError::AdapterDeactivated("TestAdapter".to_string()))
    );

    for outcome in join_all(callers).await {
        outcome.unwrap().unwrap();
    }

    let (waited, remaining) = drained.await.unwrap();
    assert_eq!(remaining, 0);
    assert!(waited > Duration::ZERO);
    assert!(adapter.find(&identity).is_none());
    assert_leases_balanced(&adapter, NUM_CALLERS as u64);
}

/// Test: callers sharing one proxy converge on the forwarded target
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_forwards_through_shared_proxy() {
    init_logging();

    const NUM_CALLERS: usize = 24;

    let orb = Orb::new();
    let old_home = orb.create_object_adapter("OldHome", Vec::new()).unwrap();
    let new_home = orb.create_object_adapter("NewHome", Vec::new()).unwrap();

    let servant = FooServant::succeeding();
    let target = new_home.add(servant.clone(), Identity::new("account")).unwrap();
    let mover = FooServant::new(Behavior::Forward(target.clone()));
    let start = old_home.add(mover.clone(), Identity::new("account")).unwrap();

    let proxy = Arc::new(orb.create_proxy(start).unwrap());
    let barrier = Arc::new(Barrier::new(NUM_CALLERS));

    let handles: Vec<_> = (0..NUM_CALLERS)
        .map(|_| {
            let proxy = proxy.clone();
            let barrier = barrier.clone();
            tokio::task::spawn_blocking(move || {
                barrier.wait();
                proxy.id(&Context::new())
            })
        })
        .collect();

    for outcome in join_all(handles).await {
        assert_eq!(outcome.unwrap().unwrap(), FOO_TYPE_ID);
    }

    assert_eq!(servant.calls(), NUM_CALLERS);
    assert!(mover.calls() >= 1 && mover.calls() <= NUM_CALLERS);
    assert_eq!(proxy.reference(), target);

    assert_leases_balanced(&old_home, mover.calls() as u64);
    assert_leases_balanced(&new_home, NUM_CALLERS as u64);
}

/// Test: shutting the runtime down waits for in-flight calls on every adapter
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_orb_shutdown_with_calls_in_flight() {
    init_logging();

    const CALL_TIME: Duration = Duration::from_millis(200);

    let orb = Orb::new();
    let first = orb.create_object_adapter("First", Vec::new()).unwrap();
    let second = orb.create_object_adapter("Second", Vec::new()).unwrap();
    let a = first
        .add(FooServant::new(Behavior::Slow(CALL_TIME)), Identity::new("a"))
        .unwrap();
    let b = second
        .add(FooServant::new(Behavior::Slow(CALL_TIME)), Identity::new("b"))
        .unwrap();

    let callers: Vec<_> = [a, b]
        .into_iter()
        .map(|reference| {
            let proxy = orb.create_proxy(reference).unwrap();
            tokio::task::spawn_blocking(move || proxy.ping(&Context::new()))
        })
        .collect();

    let overlapped = {
        let (first, second) = (first.clone(), second.clone());
        tokio::task::spawn_blocking(move || {
            wait_until(Duration::from_secs(5), || {
                first.direct_count() == 1 && second.direct_count() == 1
            })
        })
        .await
        .unwrap()
    };
    assert!(overlapped);

    {
        let orb = orb.clone();
        tokio::task::spawn_blocking(move || orb.shutdown())
            .await
            .unwrap();
    }

    for outcome in join_all(callers).await {
        outcome.unwrap().unwrap();
    }
    assert!(first.is_deactivated() && second.is_deactivated());
    assert!(orb.find_object_adapter("First").is_none());
    assert_leases_balanced(&first, 1);
    assert_leases_balanced(&second, 1);
}

//! CAS-guarded update tests
//!
//! - Exactly one retry for two writers racing on the same read
//! - Conflict after the attempt budget is spent
//! - NotFound without a retry
//! - Cancellation and deadlines interrupt the loop

use crate::common::*;
use durakv::{
    BackoffPolicy, CancellationToken, DocumentStore, DurabilityRequirement, Error, Fault,
    FailureKind, InMemoryStore, OpOptions, OperationOutcome, RetryPolicy, StoreOp,
};
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn increment(v: &serde_json::Value) -> serde_json::Value {
    json!(v.as_i64().unwrap_or(0) + 1)
}

// ============================================================================
// Racing writers
// ============================================================================

#[test]
fn two_racing_increments_retry_exactly_once() {
    let inner = InMemoryStore::new();
    seed(&inner, "counter", json!(0));
    inner.reset_stats();

    let store = Arc::new(GatedStore::new(inner, 2));
    let client = client_over(Arc::clone(&store), 5);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let client = client.clone();
            thread::spawn(move || {
                client
                    .update_detailed("counter", increment, &OpOptions::new())
                    .unwrap()
            })
        })
        .collect();
    let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(reports.iter().all(|r| r.outcome.is_success()));
    let mut attempts: Vec<u32> = reports.iter().map(|r| r.attempts).collect();
    attempts.sort();
    assert_eq!(attempts, vec![1, 2]);

    assert_eq!(current(&store.inner, "counter"), json!(2));
    let stats = store.inner.stats();
    assert_eq!(stats.gets, 3);
    assert_eq!(stats.replaces, 3);
    assert_eq!(stats.cas_mismatches, 1);
}

#[test]
fn winner_and_loser_cas_values_differ() {
    let inner = InMemoryStore::new();
    seed(&inner, "doc", json!({"tags": []}));
    let store = Arc::new(GatedStore::new(inner, 2));
    let client = client_over(Arc::clone(&store), 5);

    let handles: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|tag| {
            let client = client.clone();
            thread::spawn(move || {
                client
                    .update(
                        "doc",
                        |v| {
                            let mut v = v.clone();
                            v["tags"].as_array_mut().unwrap().push(json!(tag));
                            v
                        },
                        &OpOptions::new(),
                    )
                    .unwrap()
            })
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let cas: Vec<_> = outcomes.iter().map(|o| o.cas().unwrap()).collect();
    assert_ne!(cas[0], cas[1]);

    // Neither tag was lost
    let tags = current(&store.inner, "doc")["tags"].clone();
    let mut tags: Vec<String> = serde_json::from_value(tags).unwrap();
    tags.sort();
    assert_eq!(tags, vec!["a", "b"]);
}

// ============================================================================
// Attempt budget
// ============================================================================

#[test]
fn conflict_after_three_mismatches() {
    let store = Arc::new(InMemoryStore::new());
    seed(&store, "counter", json!(0));
    store
        .faults()
        .push(StoreOp::Replace, Fault::Fail(FailureKind::CasMismatch), 3);
    store.reset_stats();

    let client = client_over(Arc::clone(&store), 3);
    let report = client
        .update_detailed("counter", increment, &OpOptions::new())
        .unwrap();

    assert_eq!(report.outcome, OperationOutcome::Conflict { attempts: 3 });
    assert_eq!(report.retries(), 2);
    assert_eq!(store.stats().replaces, 3);
    assert_eq!(current(&store, "counter"), json!(0));
}

#[test]
fn per_call_budget_overrides_default() {
    let store = Arc::new(InMemoryStore::new());
    seed(&store, "counter", json!(0));
    store
        .faults()
        .push(StoreOp::Replace, Fault::Fail(FailureKind::CasMismatch), 10);

    let client = client_over(Arc::clone(&store), 10);
    let outcome = client
        .update("counter", increment, &OpOptions::new().with_max_attempts(1))
        .unwrap();

    assert_eq!(outcome, OperationOutcome::Conflict { attempts: 1 });
    assert_eq!(store.faults().pending(StoreOp::Replace), 9);
}

#[test]
fn missing_document_is_not_found_on_first_attempt() {
    let store = Arc::new(InMemoryStore::new());
    let client = client_over(Arc::clone(&store), 5);

    let report = client
        .update_detailed("nope", increment, &OpOptions::new())
        .unwrap();

    assert_eq!(report.outcome, OperationOutcome::NotFound);
    assert_eq!(report.attempts, 1);
    assert_eq!(store.stats().gets, 1);
    assert_eq!(store.stats().writes(), 0);
}

#[test]
fn document_deleted_mid_update_is_not_found() {
    let store = Arc::new(InMemoryStore::new());
    seed(&store, "doc", json!(1));
    let client = client_over(Arc::clone(&store), 5);

    let remover = Arc::clone(&store);
    let outcome = client
        .update(
            "doc",
            move |v| {
                remover
                    .remove(&key("doc"), None, DurabilityRequirement::None)
                    .unwrap();
                increment(v)
            },
            &OpOptions::new(),
        )
        .unwrap();

    assert_eq!(outcome, OperationOutcome::NotFound);
}

// ============================================================================
// Interruption
// ============================================================================

#[test]
fn cancellation_wakes_a_sleeping_retry() {
    let store = Arc::new(InMemoryStore::new());
    seed(&store, "counter", json!(0));
    store
        .faults()
        .push(StoreOp::Replace, Fault::Fail(FailureKind::CasMismatch), 100);

    let client = client_over(Arc::clone(&store), 100);
    let token = CancellationToken::new();
    let opts = OpOptions::new()
        .with_retry(
            RetryPolicy::new()
                .with_max_attempts(100)
                .with_backoff(BackoffPolicy::fixed(60_000)),
        )
        .with_cancel(token.clone());

    let worker = thread::spawn(move || client.update("counter", increment, &opts));
    thread::sleep(Duration::from_millis(50));
    let start = Instant::now();
    token.cancel();

    let result = worker.join().unwrap();
    assert!(matches!(result, Err(Error::Cancelled { attempts: 1 })));
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(current(&store, "counter"), json!(0));
}

#[test]
fn deadline_bounds_total_time() {
    let store = Arc::new(InMemoryStore::new());
    seed(&store, "counter", json!(0));
    store
        .faults()
        .push(StoreOp::Get, Fault::Fail(FailureKind::Timeout), 1_000);

    let client = client_over(Arc::clone(&store), 1_000);
    let start = Instant::now();
    let result = client.update(
        "counter",
        increment,
        &OpOptions::new().with_timeout(Duration::from_millis(100)),
    );

    assert!(matches!(result, Err(Error::DeadlineExceeded { .. })));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn unbounded_timeout_runs_without_deadline() {
    let store = Arc::new(InMemoryStore::new());
    seed(&store, "counter", json!(0));
    store
        .faults()
        .push(StoreOp::Get, Fault::Fail(FailureKind::Timeout), 1);

    let client = client_over(Arc::clone(&store), 3);
    let opts = OpOptions::new().with_timeout(Duration::MAX);

    let report = client.update_detailed("counter", increment, &opts).unwrap();
    assert!(report.outcome.is_success());
    assert_eq!(report.attempts, 2);
    assert_eq!(
        client.get("counter", &opts).unwrap().document().unwrap().value,
        json!(1)
    );
}

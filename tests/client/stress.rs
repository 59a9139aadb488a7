//! Concurrent writer stress tests
//!
//! Many threads hammer the same keys through CAS-guarded updates. Every
//! successful update must be visible in the final value and in the per-key
//! history, with no update applied to a stale read.

use crate::common::*;
use durakv::{
    BackoffPolicy, ClientDefaults, Fault, FailureKind, InMemoryStore, KvClient, OpOptions,
    RetryPolicy, StoreOp,
};
use parking_lot::Mutex;
use rand::prelude::*;
use serde_json::json;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn contended_client(store: Arc<InMemoryStore>) -> KvClient<InMemoryStore> {
    init_tracing();
    KvClient::with_defaults(
        store,
        ClientDefaults {
            retry: RetryPolicy::new()
                .with_max_attempts(1_000)
                .with_backoff(BackoffPolicy::exponential(1, 8).with_jitter(0.5)),
            ..ClientDefaults::default()
        },
    )
}

#[test]
fn no_lost_updates_under_contention() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 50;

    let store = Arc::new(InMemoryStore::new().with_history_limit(THREADS * PER_THREAD + 1));
    seed(&store, "counter", json!(0));
    let client = contended_client(Arc::clone(&store));
    let barrier = Arc::new(Barrier::new(THREADS));
    let retries = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let client = client.clone();
            let barrier = Arc::clone(&barrier);
            let retries = Arc::clone(&retries);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..PER_THREAD {
                    let report = client
                        .update_detailed(
                            "counter",
                            |v| json!(v.as_i64().unwrap() + 1),
                            &OpOptions::new(),
                        )
                        .unwrap();
                    assert!(report.outcome.is_success(), "{}", report.outcome);
                    retries.lock().push(report.retries());
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let total = (THREADS * PER_THREAD) as i64;
    assert_eq!(current(&store, "counter"), json!(total));

    // History: every value from 0 to total, each at a higher CAS
    let history = store.history(&key("counter"));
    assert_eq!(history.len() as i64, total + 1);
    for (i, pair) in history.windows(2).enumerate() {
        assert!(pair[0].0.as_u64() < pair[1].0.as_u64());
        assert_eq!(pair[1].1, json!(i as i64 + 1));
    }

    // Retries only happen on conflicts, and every conflict was counted
    let retries: u64 = retries.lock().iter().map(|&r| u64::from(r)).sum();
    assert_eq!(retries, store.stats().cas_mismatches);
}

#[test]
fn random_operations_with_injected_faults() {
    const THREADS: usize = 4;
    const OPS: usize = 200;
    const KEYS: usize = 5;

    let store = Arc::new(InMemoryStore::new());
    for k in 0..KEYS {
        seed(&store, &format!("k{k}"), json!(0));
    }
    let client = contended_client(Arc::clone(&store));
    let applied = Arc::new(Mutex::new(vec![0i64; KEYS]));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let client = client.clone();
            let store = Arc::clone(&store);
            let applied = Arc::clone(&applied);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(t as u64);
                for _ in 0..OPS {
                    let k = rng.gen_range(0..KEYS);
                    if rng.gen_bool(0.1) {
                        let kind = TRANSIENT[rng.gen_range(0..TRANSIENT.len())].clone();
                        store.faults().push(StoreOp::Get, Fault::Fail(kind), 1);
                    }
                    if rng.gen_bool(0.05) {
                        store.faults().push(
                            StoreOp::Replace,
                            Fault::Fail(FailureKind::CasMismatch),
                            1,
                        );
                    }
                    let delta = rng.gen_range(1..=3);
                    let outcome = client
                        .update(
                            &format!("k{k}"),
                            |v| json!(v.as_i64().unwrap() + delta),
                            &OpOptions::new(),
                        )
                        .unwrap();
                    assert!(outcome.is_success(), "{outcome}");
                    applied.lock()[k] += delta;
                    if rng.gen_bool(0.1) {
                        thread::sleep(Duration::from_micros(rng.gen_range(0..200)));
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // Faults pushed late may never have been drawn
    store.faults().clear();
    let applied = applied.lock();
    for (k, expected) in applied.iter().enumerate() {
        assert_eq!(current(&store, &format!("k{k}")), json!(*expected));
    }
}

//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use durakv::{
    BackoffPolicy, Cas, ClientDefaults, Document, DocumentKey, DocumentStore,
    DurabilityRequirement, FailureKind, InMemoryStore, KvClient, RetryPolicy, Topology, Value,
};
use durakv_store::StoreResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

// ============================================================================
// Initialization
// ============================================================================

/// Route client logs through the test harness' captured output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn key(s: &str) -> DocumentKey {
    DocumentKey::new(s).unwrap()
}

/// Policy with near-zero, deterministic backoff
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new()
        .with_max_attempts(max_attempts)
        .with_backoff(BackoffPolicy::fixed(1))
        .with_jitter_seed(42)
}

pub fn defaults(max_attempts: u32) -> ClientDefaults {
    ClientDefaults {
        retry: fast_policy(max_attempts),
        ..ClientDefaults::default()
    }
}

/// Store with two healthy replicas, so every sync level is satisfiable
pub fn replicated_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::with_topology(Topology::with_replicas(2)))
}

pub fn client_over<S: DocumentStore>(store: Arc<S>, max_attempts: u32) -> KvClient<S> {
    init_tracing();
    KvClient::with_defaults(store, defaults(max_attempts))
}

pub fn seed(store: &InMemoryStore, k: &str, value: Value) -> Cas {
    store
        .upsert(&key(k), &value, DurabilityRequirement::None)
        .unwrap()
}

pub fn current(store: &InMemoryStore, k: &str) -> Value {
    store.get(&key(k)).unwrap().value
}

// ============================================================================
// GatedStore - forces read interleavings
// ============================================================================

/// Wraps an [`InMemoryStore`] so that the first `gated` reads all complete
/// before any of them returns.
///
/// With `gated` equal to the number of writers, every writer reads the same
/// CAS, which guarantees a conflict on all but one replace.
pub struct GatedStore {
    pub inner: InMemoryStore,
    barrier: Barrier,
    remaining: AtomicUsize,
}

impl GatedStore {
    pub fn new(inner: InMemoryStore, gated: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(gated),
            remaining: AtomicUsize::new(gated),
        }
    }
}

impl DocumentStore for GatedStore {
    fn get(&self, key: &DocumentKey) -> StoreResult<Document> {
        let result = self.inner.get(key);
        let gated = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if gated {
            self.barrier.wait();
        }
        result
    }

    fn insert(
        &self,
        key: &DocumentKey,
        value: &Value,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas> {
        self.inner.insert(key, value, durability)
    }

    fn upsert(
        &self,
        key: &DocumentKey,
        value: &Value,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas> {
        self.inner.upsert(key, value, durability)
    }

    fn replace(
        &self,
        key: &DocumentKey,
        value: &Value,
        expected: Option<Cas>,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas> {
        self.inner.replace(key, value, expected, durability)
    }

    fn remove(
        &self,
        key: &DocumentKey,
        expected: Option<Cas>,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas> {
        self.inner.remove(key, expected, durability)
    }

    fn topology(&self) -> Topology {
        self.inner.topology()
    }
}

/// Failure kinds the classifier treats as transient
pub const TRANSIENT: [FailureKind; 3] = [
    FailureKind::TemporaryFailure,
    FailureKind::Timeout,
    FailureKind::Locked,
];

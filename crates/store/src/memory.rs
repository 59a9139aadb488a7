//! In-memory document store
//!
//! Reference implementation of [`DocumentStore`].
//!
//! # Design
//!
//! - DashMap: sharded map, a write holds only its key's shard
//! - CAS: global AtomicU64, allocated while the shard is held, so CAS values
//!   are unique and increase per key
//! - Compare and swap happen under the same shard guard: a stale CAS can
//!   never be applied
//! - Durability is checked against the current [`Topology`] before a write
//!   is applied; an impossible requirement leaves the store untouched
//! - Per-key write history (bounded) so tests can audit every applied write

use crate::faults::{Fault, FaultPlan, StoreOp};
use crate::stats::{StatsSnapshot, StoreStats};
use crate::traits::{DocumentStore, StoreResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use durakv_core::limits::encoded_len;
use durakv_core::{
    Cas, Document, DocumentKey, DurabilityRequirement, FailureKind, Topology, Value,
    MAX_DOCUMENT_SIZE,
};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Default number of writes remembered per key
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

/// Stored document plus its recent write history
///
/// History is kept oldest-first and includes the current value.
#[derive(Debug, Clone)]
struct StoredDocument {
    value: Value,
    cas: Cas,
    history: VecDeque<(Cas, Value)>,
}

impl StoredDocument {
    fn new(value: Value, cas: Cas, limit: usize) -> Self {
        let mut doc = Self {
            value: Value::Null,
            cas,
            history: VecDeque::new(),
        };
        doc.overwrite(value, cas, limit);
        doc
    }

    fn overwrite(&mut self, value: Value, cas: Cas, limit: usize) {
        if limit > 0 {
            if self.history.len() == limit {
                self.history.pop_front();
            }
            self.history.push_back((cas, value.clone()));
        }
        self.value = value;
        self.cas = cas;
    }
}

/// Thread-safe in-memory store
#[derive(Debug)]
pub struct InMemoryStore {
    docs: DashMap<DocumentKey, StoredDocument>,
    next_cas: AtomicU64,
    topology: RwLock<Topology>,
    faults: FaultPlan,
    stats: StoreStats,
    history_limit: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Empty store with one healthy replica
    pub fn new() -> Self {
        Self::with_topology(Topology::default())
    }

    /// Empty store with the given topology
    pub fn with_topology(topology: Topology) -> Self {
        Self {
            docs: DashMap::new(),
            next_cas: AtomicU64::new(0),
            topology: RwLock::new(topology),
            faults: FaultPlan::new(),
            stats: StoreStats::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Change how many writes are remembered per key (0 disables history)
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Replace the topology, e.g. to simulate replicas going down
    pub fn set_topology(&self, topology: Topology) {
        *self.topology.write() = topology;
    }

    /// Fault queues for this store
    pub fn faults(&self) -> &FaultPlan {
        &self.faults
    }

    /// Copy of the call counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Zero the call counters
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Applied writes for `key`, oldest first
    pub fn history(&self, key: &DocumentKey) -> Vec<(Cas, Value)> {
        self.docs
            .get(key)
            .map(|doc| doc.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether `key` is present (does not count as a call)
    pub fn contains_key(&self, key: &DocumentKey) -> bool {
        self.docs.contains_key(key)
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the store holds no documents
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn allocate_cas(&self) -> Cas {
        Cas::new(self.next_cas.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Shared write path: faults, size limit, durability, then `apply`
    fn write_with<F>(
        &self,
        op: StoreOp,
        key: &DocumentKey,
        value: Option<&Value>,
        durability: DurabilityRequirement,
        apply: F,
    ) -> StoreResult<Cas>
    where
        F: FnOnce() -> StoreResult<Cas>,
    {
        self.stats.record(op);
        trace!(target: "durakv::store", op = %op, key = %key, %durability, "store write");

        let fault = self.faults.take(op);
        if let Some(Fault::Fail(kind)) = &fault {
            if *kind == FailureKind::CasMismatch {
                self.stats.record_cas_mismatch();
            }
            return Err(kind.clone());
        }

        if let Some(value) = value {
            if encoded_len(value) > MAX_DOCUMENT_SIZE {
                return Err(FailureKind::ValueTooLarge);
            }
        }

        let topology = *self.topology.read();
        topology.check(&durability)?;

        match fault {
            Some(Fault::Ambiguous { applied: false }) => Err(FailureKind::DurabilityAmbiguous),
            Some(Fault::Ambiguous { applied: true }) => {
                apply()?;
                Err(FailureKind::DurabilityAmbiguous)
            }
            _ => apply(),
        }
    }

    fn check_cas(&self, current: Cas, expected: Option<Cas>) -> StoreResult<()> {
        match expected {
            Some(expected) if expected != current => {
                self.stats.record_cas_mismatch();
                Err(FailureKind::CasMismatch)
            }
            _ => Ok(()),
        }
    }
}

impl DocumentStore for InMemoryStore {
    fn get(&self, key: &DocumentKey) -> StoreResult<Document> {
        self.stats.record(StoreOp::Get);
        trace!(target: "durakv::store", key = %key, "store get");

        match self.faults.take(StoreOp::Get) {
            Some(Fault::Fail(kind)) => return Err(kind),
            Some(Fault::Ambiguous { .. }) => return Err(FailureKind::Timeout),
            None => {}
        }

        self.docs
            .get(key)
            .map(|doc| Document::new(key.clone(), doc.value.clone(), doc.cas))
            .ok_or(FailureKind::DocumentNotFound)
    }

    fn insert(
        &self,
        key: &DocumentKey,
        value: &Value,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas> {
        self.write_with(StoreOp::Insert, key, Some(value), durability, || {
            match self.docs.entry(key.clone()) {
                Entry::Occupied(_) => Err(FailureKind::DocumentExists),
                Entry::Vacant(slot) => {
                    let cas = self.allocate_cas();
                    slot.insert(StoredDocument::new(value.clone(), cas, self.history_limit));
                    Ok(cas)
                }
            }
        })
    }

    fn upsert(
        &self,
        key: &DocumentKey,
        value: &Value,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas> {
        self.write_with(StoreOp::Upsert, key, Some(value), durability, || {
            let cas = match self.docs.entry(key.clone()) {
                Entry::Occupied(mut slot) => {
                    let cas = self.allocate_cas();
                    slot.get_mut()
                        .overwrite(value.clone(), cas, self.history_limit);
                    cas
                }
                Entry::Vacant(slot) => {
                    let cas = self.allocate_cas();
                    slot.insert(StoredDocument::new(value.clone(), cas, self.history_limit));
                    cas
                }
            };
            Ok(cas)
        })
    }

    fn replace(
        &self,
        key: &DocumentKey,
        value: &Value,
        expected: Option<Cas>,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas> {
        self.write_with(StoreOp::Replace, key, Some(value), durability, || {
            let mut doc = self
                .docs
                .get_mut(key)
                .ok_or(FailureKind::DocumentNotFound)?;
            self.check_cas(doc.cas, expected)?;
            let cas = self.allocate_cas();
            doc.overwrite(value.clone(), cas, self.history_limit);
            Ok(cas)
        })
    }

    fn remove(
        &self,
        key: &DocumentKey,
        expected: Option<Cas>,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas> {
        self.write_with(StoreOp::Remove, key, None, durability, || {
            match self.docs.entry(key.clone()) {
                Entry::Vacant(_) => Err(FailureKind::DocumentNotFound),
                Entry::Occupied(slot) => {
                    self.check_cas(slot.get().cas, expected)?;
                    let cas = self.allocate_cas();
                    slot.remove();
                    Ok(cas)
                }
            }
        })
    }

    fn topology(&self) -> Topology {
        *self.topology.read()
    }
}

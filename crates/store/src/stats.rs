//! Call statistics

use crate::faults::StoreOp;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated on every call
#[derive(Debug, Default)]
pub struct StoreStats {
    gets: AtomicU64,
    inserts: AtomicU64,
    upserts: AtomicU64,
    replaces: AtomicU64,
    removes: AtomicU64,
    cas_mismatches: AtomicU64,
}

/// Point-in-time copy of [`StoreStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// `get` calls
    pub gets: u64,
    /// `insert` calls
    pub inserts: u64,
    /// `upsert` calls
    pub upserts: u64,
    /// `replace` calls
    pub replaces: u64,
    /// `remove` calls
    pub removes: u64,
    /// Writes rejected because of a stale CAS (injected or real)
    pub cas_mismatches: u64,
}

impl StatsSnapshot {
    /// Total calls of any kind
    pub fn total_calls(&self) -> u64 {
        self.gets + self.inserts + self.upserts + self.replaces + self.removes
    }

    /// Total mutating calls
    pub fn writes(&self) -> u64 {
        self.inserts + self.upserts + self.replaces + self.removes
    }
}

impl StoreStats {
    /// Count one call of `op`
    pub fn record(&self, op: StoreOp) {
        let counter = match op {
            StoreOp::Get => &self.gets,
            StoreOp::Insert => &self.inserts,
            StoreOp::Upsert => &self.upserts,
            StoreOp::Replace => &self.replaces,
            StoreOp::Remove => &self.removes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one CAS rejection
    pub fn record_cas_mismatch(&self) {
        self.cas_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            upserts: self.upserts.load(Ordering::Relaxed),
            replaces: self.replaces.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            cas_mismatches: self.cas_mismatches.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        for counter in [
            &self.gets,
            &self.inserts,
            &self.upserts,
            &self.replaces,
            &self.removes,
            &self.cas_mismatches,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

//! Fault injection
//!
//! Queue failures per operation so tests (and chaos runs against the
//! in-memory store) can reproduce conflicts, overload and ambiguous durable
//! writes deterministically. Faults are consumed in FIFO order, one per call.

use durakv_core::FailureKind;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Store operation a fault applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// `get`
    Get,
    /// `insert`
    Insert,
    /// `upsert`
    Upsert,
    /// `replace`
    Replace,
    /// `remove`
    Remove,
}

impl StoreOp {
    /// Whether the operation mutates the store
    pub fn is_write(&self) -> bool {
        !matches!(self, StoreOp::Get)
    }
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreOp::Get => "get",
            StoreOp::Insert => "insert",
            StoreOp::Upsert => "upsert",
            StoreOp::Replace => "replace",
            StoreOp::Remove => "remove",
        })
    }
}

/// An injected fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Fail the call before touching any data
    Fail(FailureKind),
    /// Report `DurabilityAmbiguous`, after applying the write if `applied`
    ///
    /// On `get` this is reported as a `Timeout`.
    Ambiguous {
        /// Whether the write actually lands
        applied: bool,
    },
}

/// FIFO queues of pending faults, per operation
#[derive(Debug, Default)]
pub struct FaultPlan {
    queues: Mutex<HashMap<StoreOp, VecDeque<Fault>>>,
}

impl FaultPlan {
    /// Empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `fault` for the next `times` calls of `op`
    pub fn push(&self, op: StoreOp, fault: Fault, times: usize) {
        let mut queues = self.queues.lock();
        let queue = queues.entry(op).or_default();
        queue.extend(std::iter::repeat(fault).take(times));
    }

    /// Take the fault for the current call of `op`, if any
    pub fn take(&self, op: StoreOp) -> Option<Fault> {
        self.queues.lock().get_mut(&op).and_then(|q| q.pop_front())
    }

    /// Faults still queued for `op`
    pub fn pending(&self, op: StoreOp) -> usize {
        self.queues.lock().get(&op).map_or(0, |q| q.len())
    }

    /// Drop every queued fault
    pub fn clear(&self) {
        self.queues.lock().clear();
    }
}

//! Document store layer for durakv
//!
//! - DocumentStore: the collaborator trait the client is written against
//! - InMemoryStore: DashMap-backed reference store with CAS, durability
//!   checks against a simulated topology, and per-key write history
//! - FaultPlan: deterministic failure injection per operation
//! - StoreStats: per-operation call counters

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod faults;
pub mod memory;
pub mod stats;
pub mod traits;

pub use faults::{Fault, FaultPlan, StoreOp};
pub use memory::{InMemoryStore, DEFAULT_HISTORY_LIMIT};
pub use stats::{StatsSnapshot, StoreStats};
pub use traits::{DocumentStore, StoreResult};

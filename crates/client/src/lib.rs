//! Retrying, durability-aware client for durakv
//!
//! - CasMutator: optimistic read-modify-write with bounded CAS retries
//! - DurableWriter: writes carrying a durability requirement, mapped onto a
//!   single terminal outcome
//! - Ambiguity recovery: read-back resolution and idempotent insert
//! - KvClient: configured facade over both, built from `durakv.toml`
//!
//! Every operation ends in exactly one [`OperationOutcome`](durakv_core::OperationOutcome).
//! `Err` is reserved for the abort path: invalid configuration (before any
//! store call), cancellation, deadline, and caller mutation errors.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ambiguity;
pub mod client;
pub mod config;
pub mod mutator;
pub mod options;
mod step;
pub mod writer;

pub use ambiguity::AmbiguityResolution;
pub use client::{KvClient, ReadOutcome};
pub use config::{ClientConfig, ObserveConfig, RetryConfig, CONFIG_FILE_NAME};
pub use mutator::CasMutator;
pub use options::{ClientDefaults, OpOptions};
pub use writer::DurableWriter;

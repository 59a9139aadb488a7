//! Client Integration Tests
//!
//! End-to-end behavior of KvClient over InMemoryStore: CAS retry loops,
//! durability outcomes, ambiguity recovery, config loading, and concurrent
//! writers.

#[path = "../common/mod.rs"]
mod common;

mod cas_update;
mod config;
mod durability;
mod stress;

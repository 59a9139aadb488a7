//! durakv - retrying, durability-aware key/value client
//!
//! durakv wraps a document store with three things most callers end up
//! writing by hand: bounded retries with backoff for transient failures,
//! optimistic read-modify-write guarded by CAS, and writes that carry a
//! durability requirement and report exactly one terminal outcome.
//!
//! # Quick Start
//!
//! ```
//! use durakv::{ClientConfig, DurabilityRequirement, InMemoryStore, KvClient, OpOptions};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryStore::new());
//! let client = KvClient::new(store, &ClientConfig::default()).unwrap();
//!
//! let outcome = client
//!     .write_with_durability("counter", &json!(0), DurabilityRequirement::Majority)
//!     .unwrap();
//! assert!(outcome.is_success());
//!
//! let outcome = client
//!     .update("counter", |v| json!(v.as_i64().unwrap_or(0) + 1), &OpOptions::new())
//!     .unwrap();
//! assert!(outcome.is_success());
//! ```
//!
//! # Architecture
//!
//! - `durakv-core`: keys, CAS, durability requirements, failure kinds, outcomes
//! - `durakv-retry`: backoff policy, transient classifier, retry context
//! - `durakv-store`: the `DocumentStore` trait and an in-memory store
//! - `durakv-client`: mutator, writer, ambiguity recovery, config

pub use durakv_client::*;
pub use durakv_core::{
    Cas, Document, DocumentKey, DurabilityRequirement, Error, FailureKind, OperationOutcome,
    OperationReport, Result, Topology, Value,
};
pub use durakv_retry::{
    classify, BackoffPolicy, BackoffStrategy, CancellationToken, FailureClass, RetryPolicy,
};
pub use durakv_store::{DocumentStore, Fault, FaultPlan, InMemoryStore, StoreOp};

//! Core types for durakv
//!
//! This crate defines the vocabulary shared by every layer:
//! - DocumentKey: validated document identifier
//! - Cas / Document: version token and the value read at it
//! - DurabilityRequirement / Topology: what a write must reach, and what the store can offer
//! - FailureKind: closed set of store-reported failures
//! - OperationOutcome: terminal result of a logical operation
//! - Error: abort-path errors (configuration, cancellation, serialization)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod durability;
pub mod error;
pub mod failure;
pub mod key;
pub mod limits;
pub mod outcome;
pub mod types;

pub use durability::{DurabilityRequirement, Topology};
pub use error::{Error, Result};
pub use failure::FailureKind;
pub use key::{validate_key, DocumentKey, KeyError};
pub use limits::{MAX_DOCUMENT_SIZE, MAX_KEY_LENGTH};
pub use outcome::{OperationOutcome, OperationReport};
pub use types::{Cas, Document};

/// JSON value type stored in documents
pub use serde_json::Value;

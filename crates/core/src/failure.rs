//! Store-reported failure kinds
//!
//! The closed set of failures a document store call can report. Anything a
//! store cannot map to a specific kind is reported as `Unknown`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a single store call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum FailureKind {
    /// The supplied CAS no longer matches the stored document
    #[error("CAS mismatch")]
    CasMismatch,

    /// Store temporarily unable to serve the request; the write was not applied
    #[error("temporary failure")]
    TemporaryFailure,

    /// Request timed out before a response (reads only; write-side timeouts
    /// are reported as `DurabilityAmbiguous`)
    #[error("timeout")]
    Timeout,

    /// Document is locked by another client
    #[error("document locked")]
    Locked,

    /// Document does not exist
    #[error("document not found")]
    DocumentNotFound,

    /// Document already exists (insert)
    #[error("document already exists")]
    DocumentExists,

    /// Serialized value exceeds the store's document size limit
    #[error("value too large")]
    ValueTooLarge,

    /// Request rejected as malformed
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Durability requirement cannot be met with the current topology
    #[error("durability impossible")]
    DurabilityImpossible,

    /// Store does not support the requested durability level
    #[error("durability level not supported")]
    DurabilityInvalidLevel,

    /// Observe durability requested but the bucket has no replicas configured
    #[error("no replicas configured")]
    ReplicaNotConfigured,

    /// Write sent but durability confirmation never arrived; it may or may
    /// not have been applied
    #[error("durable write ambiguous")]
    DurabilityAmbiguous,

    /// Unrecognized failure
    #[error("unknown failure: {0}")]
    Unknown(String),
}

impl FailureKind {
    /// Short stable name, used as a structured log field
    pub fn name(&self) -> &'static str {
        match self {
            FailureKind::CasMismatch => "cas_mismatch",
            FailureKind::TemporaryFailure => "temporary_failure",
            FailureKind::Timeout => "timeout",
            FailureKind::Locked => "locked",
            FailureKind::DocumentNotFound => "document_not_found",
            FailureKind::DocumentExists => "document_exists",
            FailureKind::ValueTooLarge => "value_too_large",
            FailureKind::InvalidArgument(_) => "invalid_argument",
            FailureKind::DurabilityImpossible => "durability_impossible",
            FailureKind::DurabilityInvalidLevel => "durability_invalid_level",
            FailureKind::ReplicaNotConfigured => "replica_not_configured",
            FailureKind::DurabilityAmbiguous => "durability_ambiguous",
            FailureKind::Unknown(_) => "unknown",
        }
    }
}

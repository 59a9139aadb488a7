//! Transient failure classification
//!
//! Total over the closed [`FailureKind`] set. Anything not known to be
//! transient is permanent, including `Unknown`.

use durakv_core::FailureKind;

/// How a retry loop must treat a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Concurrent modification; retryable only by re-reading the document
    Conflict,
    /// Expected to succeed if retried unchanged
    Transient,
    /// Outcome unknown; surfaced to the caller, never retried
    Ambiguous,
    /// Retrying cannot help
    Permanent,
}

/// Classify a failure
pub fn classify(kind: &FailureKind) -> FailureClass {
    match kind {
        FailureKind::CasMismatch => FailureClass::Conflict,
        FailureKind::TemporaryFailure | FailureKind::Timeout | FailureKind::Locked => {
            FailureClass::Transient
        }
        FailureKind::DurabilityAmbiguous => FailureClass::Ambiguous,
        FailureKind::DocumentNotFound
        | FailureKind::DocumentExists
        | FailureKind::ValueTooLarge
        | FailureKind::InvalidArgument(_)
        | FailureKind::DurabilityImpossible
        | FailureKind::DurabilityInvalidLevel
        | FailureKind::ReplicaNotConfigured
        | FailureKind::Unknown(_) => FailureClass::Permanent,
    }
}

/// Whether a failure may succeed on a later attempt
pub fn is_retryable(kind: &FailureKind) -> bool {
    matches!(
        classify(kind),
        FailureClass::Conflict | FailureClass::Transient
    )
}

/// Whether a failure means the durability requirement can never be met
pub fn is_definite_durability_failure(kind: &FailureKind) -> bool {
    matches!(
        kind,
        FailureKind::DurabilityImpossible
            | FailureKind::DurabilityInvalidLevel
            | FailureKind::ReplicaNotConfigured
    )
}

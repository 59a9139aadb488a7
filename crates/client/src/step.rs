//! Attempt results shared by the mutator and the writer

use durakv_core::{Error, FailureKind, OperationOutcome};
use durakv_retry::{classify, FailureClass};
use tracing::{debug, warn};

/// What one attempt decided
#[derive(Debug)]
pub(crate) enum Step {
    /// Terminal; report this outcome
    Done(OperationOutcome),
    /// Retryable failure; back off and try again if budget remains
    Retry(FailureKind),
}

impl Step {
    /// Map a store failure for loops that can re-read on conflict
    pub(crate) fn from_failure(kind: FailureKind) -> Step {
        match classify(&kind) {
            FailureClass::Conflict | FailureClass::Transient => Step::Retry(kind),
            FailureClass::Ambiguous => Step::Done(OperationOutcome::AmbiguousDurability),
            FailureClass::Permanent => Step::Done(permanent_outcome(kind)),
        }
    }
}

/// Terminal outcome of a failure that retrying cannot fix
pub(crate) fn permanent_outcome(kind: FailureKind) -> OperationOutcome {
    match kind {
        FailureKind::DocumentNotFound => OperationOutcome::NotFound,
        FailureKind::DocumentExists => OperationOutcome::AlreadyExists,
        other => OperationOutcome::DefiniteFailure(other),
    }
}

/// Outcome once the attempt budget is spent on `last`
pub(crate) fn exhausted_outcome(last: FailureKind, attempts: u32) -> OperationOutcome {
    match last {
        FailureKind::CasMismatch | FailureKind::DocumentExists => {
            OperationOutcome::Conflict { attempts }
        }
        last => OperationOutcome::RetriesExhausted { attempts, last },
    }
}

/// Log an operation that stopped without an outcome and hand the error back
pub(crate) fn aborted(op: &'static str, err: Error) -> Error {
    if err.is_interrupted() {
        warn!(target: "durakv::client", op, error = %err, "Operation interrupted");
    } else if err.is_configuration() {
        debug!(target: "durakv::client", op, error = %err, "Operation rejected");
    }
    err
}

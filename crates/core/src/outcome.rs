//! Terminal outcomes of a logical operation
//!
//! Every client operation ends in exactly one `OperationOutcome`. Outcomes
//! are values, not errors, so callers branch on them explicitly:
//!
//! ```
//! use durakv_core::{Cas, OperationOutcome};
//!
//! let outcome = OperationOutcome::Success(Cas::new(7));
//! match outcome {
//!     OperationOutcome::Success(cas) => assert_eq!(cas.as_u64(), 7),
//!     OperationOutcome::AmbiguousDurability => { /* check state before retrying */ }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use crate::failure::FailureKind;
use crate::types::Cas;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Terminal result of a logical operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationOutcome {
    /// Write applied and its durability requirement confirmed
    Success(Cas),

    /// CAS mismatch that could not be resolved within the attempt budget
    Conflict {
        /// Attempts consumed
        attempts: u32,
    },

    /// Document does not exist and the operation requires it
    NotFound,

    /// Insert of a key that already exists
    AlreadyExists,

    /// Write may or may not have been applied; never retried automatically
    AmbiguousDurability,

    /// Failure that retrying cannot fix (e.g. durability impossible)
    DefiniteFailure(FailureKind),

    /// A transient failure persisted through every attempt
    RetriesExhausted {
        /// Attempts consumed
        attempts: u32,
        /// Failure seen on the last attempt
        last: FailureKind,
    },
}

impl OperationOutcome {
    /// Whether the operation applied its write
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success(_))
    }

    /// New CAS, if the write succeeded
    pub fn cas(&self) -> Option<Cas> {
        match self {
            OperationOutcome::Success(cas) => Some(*cas),
            _ => None,
        }
    }

    /// Whether the caller cannot know if the write was applied
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, OperationOutcome::AmbiguousDurability)
    }

    /// Short stable name, used as a structured log field
    pub fn name(&self) -> &'static str {
        match self {
            OperationOutcome::Success(_) => "success",
            OperationOutcome::Conflict { .. } => "conflict",
            OperationOutcome::NotFound => "not_found",
            OperationOutcome::AlreadyExists => "already_exists",
            OperationOutcome::AmbiguousDurability => "ambiguous_durability",
            OperationOutcome::DefiniteFailure(_) => "definite_failure",
            OperationOutcome::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationOutcome::Success(cas) => write!(f, "success (cas {cas})"),
            OperationOutcome::Conflict { attempts } => {
                write!(f, "conflict after {attempts} attempt(s)")
            }
            OperationOutcome::NotFound => f.write_str("not found"),
            OperationOutcome::AlreadyExists => f.write_str("already exists"),
            OperationOutcome::AmbiguousDurability => f.write_str("ambiguous durability"),
            OperationOutcome::DefiniteFailure(kind) => write!(f, "definite failure: {kind}"),
            OperationOutcome::RetriesExhausted { attempts, last } => {
                write!(f, "retries exhausted after {attempts} attempt(s): {last}")
            }
        }
    }
}

/// Outcome plus the retry statistics of the operation that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReport {
    /// Terminal outcome
    pub outcome: OperationOutcome,
    /// Attempts started (1 = no retry)
    pub attempts: u32,
    /// Wall time from start to terminal outcome
    pub elapsed: Duration,
}

impl OperationReport {
    /// Number of retries performed after the first attempt
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

//! Retry machinery for durakv
//!
//! - Backoff Policy: fixed / linear / exponential / random delays with seeded jitter
//! - Transient Classifier: which store failures a loop may absorb
//! - RetryPolicy: attempt budget + backoff
//! - RetryContext: per-operation attempt counter, deadline and cancellation
//! - CancellationToken: wakes sleeping retry loops

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backoff;
pub mod cancel;
pub mod classifier;
pub mod context;
pub mod policy;

pub use backoff::{BackoffPolicy, BackoffStrategy};
pub use cancel::CancellationToken;
pub use classifier::{classify, is_definite_durability_failure, is_retryable, FailureClass};
pub use context::RetryContext;
pub use policy::RetryPolicy;

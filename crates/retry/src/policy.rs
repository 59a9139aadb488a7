//! Retry policy
//!
//! Attempt budget plus backoff. Callers pass a policy per operation; there is
//! no process-wide default beyond `RetryPolicy::default()`.

use crate::backoff::BackoffPolicy;
use durakv_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for retry behavior
///
/// # Example
/// ```
/// use durakv_retry::{BackoffPolicy, RetryPolicy};
///
/// let policy = RetryPolicy::new()
///     .with_max_attempts(5)
///     .with_backoff(BackoffPolicy::linear(500, 2_000));
/// assert_eq!(policy.max_attempts, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts allowed, first attempt included (must be at least 1)
    pub max_attempts: u32,
    /// Delay between attempts
    pub backoff: BackoffPolicy,
    /// Seed for jitter and random delays; `None` draws from OS entropy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter_seed: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: BackoffPolicy::default(),
            jitter_seed: None,
        }
    }
}

impl RetryPolicy {
    /// Create a RetryPolicy with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Set maximum number of attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set backoff policy
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Fix the jitter seed for reproducible delays
    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }

    /// Check parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_config("max_attempts must be at least 1"));
        }
        self.backoff.validate()
    }
}

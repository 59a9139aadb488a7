//! Per-call overrides and client defaults

use crate::config::ClientConfig;
use durakv_core::{DurabilityRequirement, Result};
use durakv_retry::{CancellationToken, RetryContext, RetryPolicy};
use std::time::{Duration, Instant};

/// Defaults applied when a call does not override them
#[derive(Debug, Clone, PartialEq)]
pub struct ClientDefaults {
    /// Retry policy
    pub retry: RetryPolicy,
    /// Durability requirement for writes
    pub durability: DurabilityRequirement,
    /// Per-operation time budget
    pub timeout: Option<Duration>,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            durability: DurabilityRequirement::None,
            timeout: None,
        }
    }
}

impl ClientDefaults {
    /// Derive defaults from a validated config
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            retry: config.retry_policy()?,
            durability: config.durability_requirement()?,
            timeout: config.operation_timeout(),
        })
    }
}

/// Options for a single operation
///
/// Every field is optional; unset fields fall back to [`ClientDefaults`].
///
/// ```
/// use durakv_client::OpOptions;
/// use durakv_core::DurabilityRequirement;
/// use std::time::Duration;
///
/// let opts = OpOptions::new()
///     .with_max_attempts(3)
///     .with_durability(DurabilityRequirement::Majority)
///     .with_timeout(Duration::from_secs(2));
/// assert_eq!(opts.durability, Some(DurabilityRequirement::Majority));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpOptions {
    /// Retry policy override
    pub retry: Option<RetryPolicy>,
    /// Attempt budget override, applied on top of whichever policy is in force
    pub max_attempts: Option<u32>,
    /// Durability override
    pub durability: Option<DurabilityRequirement>,
    /// Time budget measured from the start of the call
    pub timeout: Option<Duration>,
    /// Absolute deadline; the earlier of this and `timeout` wins
    pub deadline: Option<Instant>,
    /// Cancellation signal checked before each attempt and during backoff
    pub cancel: Option<CancellationToken>,
}

impl OpOptions {
    /// No overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the retry policy
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Override only the attempt budget
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Override the durability requirement
    pub fn with_durability(mut self, durability: DurabilityRequirement) -> Self {
        self.durability = Some(durability);
        self
    }

    /// Bound the call by a relative timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Bound the call by an absolute deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a cancellation token
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Merge with defaults and validate
    pub(crate) fn resolve(&self, defaults: &ClientDefaults) -> Result<Resolved> {
        let mut retry = match &self.retry {
            Some(policy) => policy.clone(),
            None => defaults.retry.clone(),
        };
        if let Some(max_attempts) = self.max_attempts {
            retry.max_attempts = max_attempts;
        }
        retry.validate()?;

        let durability = self.durability.unwrap_or(defaults.durability);
        durability.validate()?;

        let now = Instant::now();
        // A timeout past the representable range means no deadline
        let timeout_deadline = self
            .timeout
            .or(defaults.timeout)
            .and_then(|t| now.checked_add(t));
        let deadline = match (self.deadline, timeout_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        Ok(Resolved {
            retry,
            durability,
            deadline,
            cancel: self.cancel.clone(),
        })
    }
}

/// Options after merging with defaults
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub retry: RetryPolicy,
    pub durability: DurabilityRequirement,
    pub deadline: Option<Instant>,
    pub cancel: Option<CancellationToken>,
}

impl Resolved {
    /// Fresh retry state for one logical operation
    pub fn context(&self) -> RetryContext {
        RetryContext::new(self.retry.clone(), self.deadline, self.cancel.clone())
    }
}

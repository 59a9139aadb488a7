//! Per-operation retry state
//!
//! A `RetryContext` is created when a logical operation starts, advanced once
//! per attempt, and discarded when the operation reaches a terminal outcome.
//! Attempts are strictly sequential; the context is not shared.

use crate::cancel::CancellationToken;
use crate::policy::RetryPolicy;
use durakv_core::{Error, OperationOutcome, OperationReport, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::debug;

/// Retry state of one logical operation
#[derive(Debug)]
pub struct RetryContext {
    policy: RetryPolicy,
    attempts: u32,
    started: Instant,
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
    rng: StdRng,
}

impl RetryContext {
    /// Start tracking a new operation
    pub fn new(
        policy: RetryPolicy,
        deadline: Option<Instant>,
        cancel: Option<CancellationToken>,
    ) -> Self {
        let rng = match policy.jitter_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            policy,
            attempts: 0,
            started: Instant::now(),
            deadline,
            cancel,
            rng,
        }
    }

    /// Attempts started so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Time since the operation started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The policy in force
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Whether another attempt fits in the budget
    pub fn has_budget(&self) -> bool {
        self.attempts < self.policy.max_attempts
    }

    /// Start the next attempt
    ///
    /// Checks cancellation and the deadline first; an interrupted operation
    /// never starts another store call.
    pub fn begin_attempt(&mut self) -> Result<u32> {
        self.check_interrupted()?;
        self.attempts += 1;
        Ok(self.attempts)
    }

    /// Sleep before the next attempt
    ///
    /// Returns early with `Cancelled` when the token fires, and with
    /// `DeadlineExceeded` without sleeping when the delay would overrun the
    /// deadline.
    pub fn backoff(&mut self) -> Result<()> {
        let retry_index = self.attempts.saturating_sub(1);
        let seed: u64 = self.rng.gen();
        let delay = self.policy.backoff.delay_with_seed(retry_index, seed);

        if let Some(deadline) = self.deadline {
            let wakes_at = Instant::now().checked_add(delay);
            if wakes_at.map_or(true, |at| at >= deadline) {
                return Err(Error::DeadlineExceeded {
                    attempts: self.attempts,
                });
            }
        }

        debug!(
            target: "durakv::retry",
            attempt = self.attempts,
            delay_ms = delay.as_millis() as u64,
            "Backing off before retry"
        );

        if delay.is_zero() {
            return self.check_interrupted();
        }

        let cancelled = match &self.cancel {
            Some(token) => token.sleep(delay),
            None => {
                std::thread::sleep(delay);
                false
            }
        };
        if cancelled {
            return Err(Error::Cancelled {
                attempts: self.attempts,
            });
        }
        Ok(())
    }

    /// Finish the operation
    pub fn report(&self, outcome: OperationOutcome) -> OperationReport {
        OperationReport {
            outcome,
            attempts: self.attempts,
            elapsed: self.elapsed(),
        }
    }

    fn check_interrupted(&self) -> Result<()> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(Error::Cancelled {
                attempts: self.attempts,
            });
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::DeadlineExceeded {
                attempts: self.attempts,
            });
        }
        Ok(())
    }
}

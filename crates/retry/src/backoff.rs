//! Backoff policy
//!
//! Computes the delay before a retry. `next_delay` is a pure function of the
//! retry index; randomness only enters through the separately supplied seed
//! of `delay_with_seed`, so delays are reproducible in tests.
//!
//! # Strategies
//!
//! | Strategy | Delay before retry `n` (0-based) |
//! |----------|----------------------------------|
//! | Fixed | `base` |
//! | Linear | `base * (n + 1)`, capped at `max` |
//! | Exponential | `base * 2^n`, capped at `max` |
//! | Random | uniform in `[base, max]` (lower bound without a seed) |

use durakv_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Shape of the delay curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same delay before every retry
    Fixed,
    /// Delay grows by `base` per retry
    Linear,
    /// Delay doubles per retry
    Exponential,
    /// Uniformly random delay between `base` and `max`
    Random,
}

impl fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackoffStrategy::Fixed => "fixed",
            BackoffStrategy::Linear => "linear",
            BackoffStrategy::Exponential => "exponential",
            BackoffStrategy::Random => "random",
        })
    }
}

impl FromStr for BackoffStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fixed" => Ok(BackoffStrategy::Fixed),
            "linear" => Ok(BackoffStrategy::Linear),
            "exponential" => Ok(BackoffStrategy::Exponential),
            "random" => Ok(BackoffStrategy::Random),
            other => Err(Error::invalid_config(format!(
                "Invalid backoff strategy '{}'. Expected \"fixed\", \"linear\", \
                 \"exponential\" or \"random\".",
                other
            ))),
        }
    }
}

/// Backoff configuration
///
/// # Example
/// ```
/// use durakv_retry::{BackoffPolicy, BackoffStrategy};
/// use std::time::Duration;
///
/// let backoff = BackoffPolicy::exponential(10, 100);
/// assert_eq!(backoff.next_delay(0), Duration::from_millis(10));
/// assert_eq!(backoff.next_delay(2), Duration::from_millis(40));
/// assert_eq!(backoff.next_delay(10), Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Delay curve
    pub strategy: BackoffStrategy,
    /// Base delay in milliseconds
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,
    /// Additive jitter as a fraction of the computed delay (0.0 = none)
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::exponential(10, 100)
    }
}

impl BackoffPolicy {
    /// Constant delay
    pub fn fixed(delay_ms: u64) -> Self {
        Self {
            strategy: BackoffStrategy::Fixed,
            base_delay_ms: delay_ms,
            max_delay_ms: delay_ms,
            jitter: 0.0,
        }
    }

    /// Linearly increasing delay
    pub fn linear(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            strategy: BackoffStrategy::Linear,
            base_delay_ms,
            max_delay_ms,
            jitter: 0.0,
        }
    }

    /// Exponentially increasing delay
    pub fn exponential(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            strategy: BackoffStrategy::Exponential,
            base_delay_ms,
            max_delay_ms,
            jitter: 0.0,
        }
    }

    /// Random delay between `min_delay_ms` and `max_delay_ms`
    pub fn random(min_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            strategy: BackoffStrategy::Random,
            base_delay_ms: min_delay_ms,
            max_delay_ms,
            jitter: 0.0,
        }
    }

    /// No delay at all between retries
    pub fn none() -> Self {
        Self::fixed(0)
    }

    /// Set the jitter fraction
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Check parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_delay_ms < self.base_delay_ms {
            return Err(Error::invalid_config(format!(
                "max_delay_ms ({}) must not be lower than base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(Error::invalid_config(format!(
                "jitter must be within [0.0, 1.0], got {}",
                self.jitter
            )));
        }
        Ok(())
    }

    /// Delay before retry `attempt` (0-based), without jitter
    pub fn next_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_ms(attempt))
    }

    /// Delay before retry `attempt`, with jitter and randomness drawn from `seed`
    pub fn delay_with_seed(&self, attempt: u32, seed: u64) -> Duration {
        let mut delay_ms = self.base_ms(attempt);

        if self.strategy == BackoffStrategy::Random {
            let spread = self.max_delay_ms.saturating_sub(self.base_delay_ms);
            delay_ms = self
                .base_delay_ms
                .saturating_add(seed % spread.saturating_add(1));
        }

        if self.jitter > 0.0 {
            let jitter_range = (delay_ms as f64 * self.jitter) as u64;
            // Rotate so jitter is not correlated with the Random spread above
            let jitter = seed.rotate_left(32) % jitter_range.saturating_add(1);
            delay_ms = delay_ms.saturating_add(jitter);
        }

        Duration::from_millis(delay_ms)
    }

    fn base_ms(&self, attempt: u32) -> u64 {
        match self.strategy {
            BackoffStrategy::Fixed => self.base_delay_ms,
            BackoffStrategy::Linear => self
                .base_delay_ms
                .saturating_mul(u64::from(attempt).saturating_add(1))
                .min(self.max_delay_ms),
            BackoffStrategy::Exponential => {
                // Cap the shift to prevent overflow (1 << 63 is the max for u64)
                let shift = attempt.min(63);
                let multiplier = 1u64 << shift;
                self.base_delay_ms
                    .saturating_mul(multiplier)
                    .min(self.max_delay_ms)
            }
            BackoffStrategy::Random => self.base_delay_ms,
        }
    }
}

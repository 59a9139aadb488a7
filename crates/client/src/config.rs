//! Client configuration via `durakv.toml`
//!
//! Every value here is a default that a single call can override through
//! [`OpOptions`](crate::OpOptions). Nothing is read from the environment or
//! from global state: the application loads a config and passes it to
//! [`KvClient::new`](crate::KvClient::new).

use durakv_core::{DurabilityRequirement, Error, Result};
use durakv_retry::{BackoffPolicy, BackoffStrategy, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "durakv.toml";

/// `[retry]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per operation, first included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// `"fixed"`, `"linear"`, `"exponential"` or `"random"`
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Base delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Additive jitter fraction in `[0.0, 1.0]`
    #[serde(default)]
    pub jitter: f64,
    /// Fixed jitter seed (tests and replays)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter_seed: Option<u64>,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_strategy() -> String {
    "exponential".to_string()
}

fn default_base_delay_ms() -> u64 {
    10
}

fn default_max_delay_ms() -> u64 {
    100
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: default_strategy(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: 0.0,
            jitter_seed: None,
        }
    }
}

/// `[observe]` section: legacy replicate-to / persist-to durability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserveConfig {
    /// Replicas that must hold the write in memory
    #[serde(default)]
    pub replicate_to: u8,
    /// Nodes that must persist the write, active included
    #[serde(default)]
    pub persist_to: u8,
}

/// Client configuration loaded from `durakv.toml`.
///
/// # Example
///
/// ```toml
/// durability = "majority"
/// operation_timeout_ms = 2500
///
/// [retry]
/// max_attempts = 5
/// strategy = "exponential"
/// base_delay_ms = 10
/// max_delay_ms = 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Default durability level name
    #[serde(default = "default_durability_str")]
    pub durability: String,
    /// Per-operation time budget in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_timeout_ms: Option<u64>,
    /// Observe-based durability; mutually exclusive with a sync level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observe: Option<ObserveConfig>,
    /// Retry defaults
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_durability_str() -> String {
    "none".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            durability: default_durability_str(),
            operation_timeout_ms: None,
            observe: None,
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parse the durability settings into a requirement.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for an unknown level name, for observe
    /// counts out of range, or when both a sync level and `[observe]` are set.
    pub fn durability_requirement(&self) -> Result<DurabilityRequirement> {
        let level: DurabilityRequirement = self.durability.parse()?;
        match self.observe {
            None => Ok(level),
            Some(_) if level != DurabilityRequirement::None => Err(Error::invalid_config(
                format!(
                    "durability = \"{}\" cannot be combined with [observe]",
                    self.durability
                ),
            )),
            Some(observe) => {
                let requirement = DurabilityRequirement::Observe {
                    replicate_to: observe.replicate_to,
                    persist_to: observe.persist_to,
                };
                requirement.validate()?;
                Ok(requirement)
            }
        }
    }

    /// Build the retry policy described by `[retry]`.
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        let strategy: BackoffStrategy = self.retry.strategy.parse()?;
        let policy = RetryPolicy {
            max_attempts: self.retry.max_attempts,
            backoff: BackoffPolicy {
                strategy,
                base_delay_ms: self.retry.base_delay_ms,
                max_delay_ms: self.retry.max_delay_ms,
                jitter: self.retry.jitter,
            },
            jitter_seed: self.retry.jitter_seed,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Per-operation timeout, if configured
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    /// Validate every section eagerly
    pub fn validate(&self) -> Result<()> {
        self.durability_requirement()?;
        self.retry_policy()?;
        if self.operation_timeout_ms == Some(0) {
            return Err(Error::invalid_config(
                "operation_timeout_ms must be positive; omit it for no timeout",
            ));
        }
        Ok(())
    }

    /// Set the default durability requirement
    pub fn with_durability(mut self, requirement: DurabilityRequirement) -> Self {
        match requirement {
            DurabilityRequirement::Observe {
                replicate_to,
                persist_to,
            } => {
                self.durability = default_durability_str();
                self.observe = Some(ObserveConfig {
                    replicate_to,
                    persist_to,
                });
            }
            level => {
                self.durability = level.to_string();
                self.observe = None;
            }
        }
        self
    }

    /// Set the default retry policy
    pub fn with_retry(mut self, policy: &RetryPolicy) -> Self {
        self.retry = RetryConfig {
            max_attempts: policy.max_attempts,
            strategy: policy.backoff.strategy.to_string(),
            base_delay_ms: policy.backoff.base_delay_ms,
            max_delay_ms: policy.backoff.max_delay_ms,
            jitter: policy.backoff.jitter,
            jitter_seed: policy.jitter_seed,
        };
        self
    }

    /// Set the maximum number of attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry.max_attempts = max_attempts;
        self
    }

    /// Set the per-operation timeout
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# durakv client configuration
#
# Durability level applied to writes unless a call overrides it:
#   "none" (default), "majority", "majority_and_persist_to_active",
#   "persist_to_majority"
durability = "none"

# Legacy observe-based durability. Leave durability = "none" when using it.
# [observe]
# replicate_to = 1
# persist_to = 1

# Time budget per logical operation, retries included (optional).
# operation_timeout_ms = 2500

[retry]
# Total attempts per operation, first attempt included.
max_attempts = 5
# "fixed", "linear", "exponential" or "random"
strategy = "exponential"
base_delay_ms = 10
max_delay_ms = 100
# Additive jitter as a fraction of the delay (0.0 - 1.0).
jitter = 0.0
"#
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{} ({})", msg, path.display())),
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

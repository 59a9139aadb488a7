//! Durability requirements and cluster topology
//!
//! A write is not complete until the store confirms the requested level of
//! replication/persistence. Whether a level can be met at all depends on the
//! store's [`Topology`].
//!
//! # Levels
//!
//! | Requirement | Confirmed when |
//! |-------------|----------------|
//! | None | the active node accepted the write |
//! | Majority | a majority of nodes hold it in memory |
//! | MajorityAndPersistToActive | majority in memory, persisted on the active |
//! | PersistToMajority | persisted on a majority of nodes |
//! | Observe | client-verified replicate-to / persist-to counts |

use crate::error::{Error, Result};
use crate::failure::FailureKind;
use crate::limits::{MAX_REPLICAS, MAX_SYNC_DURABILITY_REPLICAS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Durability requirement attached to a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurabilityRequirement {
    /// No durability beyond acceptance by the active node
    #[default]
    None,

    /// Replicated to a majority of nodes (in memory)
    Majority,

    /// Majority in memory and persisted to disk on the active node
    MajorityAndPersistToActive,

    /// Persisted to disk on a majority of nodes
    PersistToMajority,

    /// Legacy observe-based durability, verified by polling replicas
    Observe {
        /// Number of replicas that must hold the write in memory (0..=3)
        replicate_to: u8,
        /// Number of nodes that must persist the write, active included (0..=4)
        persist_to: u8,
    },
}

impl DurabilityRequirement {
    /// Whether this is a server-enforced synchronous durability level
    pub fn is_sync(&self) -> bool {
        matches!(
            self,
            DurabilityRequirement::Majority
                | DurabilityRequirement::MajorityAndPersistToActive
                | DurabilityRequirement::PersistToMajority
        )
    }

    /// Whether any durability beyond `None` is requested
    pub fn is_durable(&self) -> bool {
        match self {
            DurabilityRequirement::None => false,
            DurabilityRequirement::Observe {
                replicate_to,
                persist_to,
            } => *replicate_to > 0 || *persist_to > 0,
            _ => true,
        }
    }

    /// Validate the requirement itself, independent of any topology
    ///
    /// Counts outside the ranges any bucket could satisfy are a caller error,
    /// not a store outcome.
    pub fn validate(&self) -> Result<()> {
        if let DurabilityRequirement::Observe {
            replicate_to,
            persist_to,
        } = self
        {
            if *replicate_to > MAX_REPLICAS {
                return Err(Error::invalid_config(format!(
                    "replicate_to {} exceeds maximum {}",
                    replicate_to, MAX_REPLICAS
                )));
            }
            if *persist_to > MAX_REPLICAS + 1 {
                return Err(Error::invalid_config(format!(
                    "persist_to {} exceeds maximum {}",
                    persist_to,
                    MAX_REPLICAS + 1
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for DurabilityRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurabilityRequirement::None => f.write_str("none"),
            DurabilityRequirement::Majority => f.write_str("majority"),
            DurabilityRequirement::MajorityAndPersistToActive => {
                f.write_str("majority_and_persist_to_active")
            }
            DurabilityRequirement::PersistToMajority => f.write_str("persist_to_majority"),
            DurabilityRequirement::Observe {
                replicate_to,
                persist_to,
            } => write!(f, "observe(replicate_to={replicate_to}, persist_to={persist_to})"),
        }
    }
}

impl FromStr for DurabilityRequirement {
    type Err = Error;

    /// Parse a synchronous level name. Observe durability has no string form.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(DurabilityRequirement::None),
            "majority" => Ok(DurabilityRequirement::Majority),
            "majority_and_persist_to_active" => {
                Ok(DurabilityRequirement::MajorityAndPersistToActive)
            }
            "persist_to_majority" => Ok(DurabilityRequirement::PersistToMajority),
            other => Err(Error::invalid_config(format!(
                "Invalid durability level '{}'. Expected \"none\", \"majority\", \
                 \"majority_and_persist_to_active\" or \"persist_to_majority\".",
                other
            ))),
        }
    }
}

/// Replication layout of the store a write lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// Replicas configured for the bucket (0..=3)
    pub replicas: u8,
    /// Replicas currently reachable
    pub live_replicas: u8,
    /// Whether the store supports synchronous durability levels
    pub sync_durability_supported: bool,
}

impl Default for Topology {
    fn default() -> Self {
        Self::with_replicas(1)
    }
}

impl Topology {
    /// Single node, no replicas
    pub fn single_node() -> Self {
        Self::with_replicas(0)
    }

    /// Healthy topology with `replicas` replicas, all reachable
    pub fn with_replicas(replicas: u8) -> Self {
        Self {
            replicas,
            live_replicas: replicas,
            sync_durability_supported: true,
        }
    }

    /// Total nodes holding the document (active + replicas)
    pub fn nodes(&self) -> u8 {
        self.replicas.saturating_add(1)
    }

    /// Nodes needed for a majority
    pub fn majority(&self) -> u8 {
        self.nodes() / 2 + 1
    }

    /// Decide whether `requirement` can be met on this topology
    ///
    /// Returns the definite failure the store reports when it cannot.
    pub fn check(&self, requirement: &DurabilityRequirement) -> std::result::Result<(), FailureKind> {
        match requirement {
            DurabilityRequirement::None => Ok(()),
            DurabilityRequirement::Majority
            | DurabilityRequirement::MajorityAndPersistToActive
            | DurabilityRequirement::PersistToMajority => {
                if !self.sync_durability_supported {
                    return Err(FailureKind::DurabilityInvalidLevel);
                }
                // Sync writes need at least one replica and are not supported at 3.
                if self.replicas == 0 || self.replicas > MAX_SYNC_DURABILITY_REPLICAS {
                    return Err(FailureKind::DurabilityImpossible);
                }
                if self.live_replicas.saturating_add(1) < self.majority() {
                    return Err(FailureKind::DurabilityImpossible);
                }
                Ok(())
            }
            DurabilityRequirement::Observe {
                replicate_to,
                persist_to,
            } => {
                if *replicate_to == 0 && *persist_to == 0 {
                    return Ok(());
                }
                if self.replicas == 0 && (*replicate_to > 0 || *persist_to > 1) {
                    return Err(FailureKind::ReplicaNotConfigured);
                }
                if *replicate_to > self.replicas || *persist_to > self.nodes() {
                    return Err(FailureKind::DurabilityImpossible);
                }
                if *replicate_to > self.live_replicas
                    || *persist_to > self.live_replicas.saturating_add(1)
                {
                    return Err(FailureKind::DurabilityImpossible);
                }
                Ok(())
            }
        }
    }
}

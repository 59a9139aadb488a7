//! Durability-aware writes
//!
//! A write carries a [`DurabilityRequirement`] down to the store and maps
//! what comes back onto exactly one [`OperationOutcome`]:
//!
//! | Store result | Outcome | Retried |
//! |--------------|---------|---------|
//! | `Ok(cas)` | `Success(cas)` | - |
//! | `TemporaryFailure`, `Timeout`, `Locked` | `RetriesExhausted` once the budget is spent | yes |
//! | `CasMismatch` | `Conflict` | no, the caller's CAS is stale |
//! | `DurabilityAmbiguous` | `AmbiguousDurability` | never |
//! | `DurabilityImpossible` and other definite durability failures | `DefiniteFailure` | no |
//! | `DocumentNotFound` / `DocumentExists` | `NotFound` / `AlreadyExists` | no |
//!
//! An ambiguous write is never repeated here: repeating a non-idempotent
//! write could apply it twice. See [`insert_idempotent`](DurableWriter::insert_idempotent)
//! and [`resolve_ambiguous`](DurableWriter::resolve_ambiguous) for the
//! opt-in recovery paths.

use crate::options::{ClientDefaults, OpOptions};
use crate::step::{aborted, exhausted_outcome, Step};
use durakv_core::{
    Cas, DocumentKey, DurabilityRequirement, OperationOutcome, OperationReport, Result, Value,
};
use durakv_retry::{classify, is_definite_durability_failure, FailureClass};
use durakv_store::{DocumentStore, StoreResult};
use std::sync::Arc;
use tracing::{debug, debug_span, warn};
use uuid::Uuid;

/// Writes with a durability requirement over a [`DocumentStore`]
pub struct DurableWriter<S> {
    pub(crate) store: Arc<S>,
    pub(crate) defaults: ClientDefaults,
}

impl<S> Clone for DurableWriter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            defaults: self.defaults.clone(),
        }
    }
}

impl<S: DocumentStore> DurableWriter<S> {
    /// Create a writer over `store`
    pub fn new(store: Arc<S>, defaults: ClientDefaults) -> Self {
        Self { store, defaults }
    }

    /// Upsert `value` under `key` with the given durability requirement,
    /// retrying transient failures with the default policy.
    pub fn write_with_durability(
        &self,
        key: &str,
        value: &Value,
        requirement: DurabilityRequirement,
    ) -> Result<OperationOutcome> {
        let opts = OpOptions::new().with_durability(requirement);
        self.upsert(key, value, &opts).map(|report| report.outcome)
    }

    /// Create or overwrite `key`
    pub fn upsert(&self, key: &str, value: &Value, opts: &OpOptions) -> Result<OperationReport> {
        self.run_write("upsert", key, opts, |store, key, durability| {
            store.upsert(key, value, durability)
        })
    }

    /// Create `key`; `AlreadyExists` if it is present
    pub fn insert(&self, key: &str, value: &Value, opts: &OpOptions) -> Result<OperationReport> {
        self.run_write("insert", key, opts, |store, key, durability| {
            store.insert(key, value, durability)
        })
    }

    /// Overwrite an existing `key`, guarded by `cas` when given
    pub fn replace(
        &self,
        key: &str,
        value: &Value,
        cas: Option<Cas>,
        opts: &OpOptions,
    ) -> Result<OperationReport> {
        self.run_write("replace", key, opts, |store, key, durability| {
            store.replace(key, value, cas, durability)
        })
    }

    /// Delete `key`, guarded by `cas` when given
    pub fn remove(&self, key: &str, cas: Option<Cas>, opts: &OpOptions) -> Result<OperationReport> {
        self.run_write("remove", key, opts, |store, key, durability| {
            store.remove(key, cas, durability)
        })
    }

    fn run_write<F>(
        &self,
        op: &'static str,
        key: &str,
        opts: &OpOptions,
        mut call: F,
    ) -> Result<OperationReport>
    where
        F: FnMut(&S, &DocumentKey, DurabilityRequirement) -> StoreResult<Cas>,
    {
        let key = DocumentKey::new(key).map_err(|e| aborted(op, e))?;
        let resolved = opts.resolve(&self.defaults).map_err(|e| aborted(op, e))?;
        let mut ctx = resolved.context();

        let span = debug_span!(
            target: "durakv::writer",
            "write",
            op,
            op_id = %Uuid::new_v4(),
            key = %key,
            durability = %resolved.durability,
        );
        let _guard = span.enter();

        loop {
            let attempt = ctx.begin_attempt().map_err(|e| aborted(op, e))?;
            let step = match call(self.store.as_ref(), &key, resolved.durability) {
                Ok(cas) => Step::Done(OperationOutcome::Success(cas)),
                Err(kind) if classify(&kind) == FailureClass::Conflict => {
                    Step::Done(OperationOutcome::Conflict { attempts: attempt })
                }
                Err(kind) => {
                    if is_definite_durability_failure(&kind) {
                        warn!(
                            target: "durakv::writer",
                            failure = kind.name(),
                            "Durability requirement cannot be met"
                        );
                    }
                    Step::from_failure(kind)
                }
            };

            match step {
                Step::Done(outcome) => {
                    if outcome.is_ambiguous() {
                        warn!(
                            target: "durakv::writer",
                            attempt,
                            "Write outcome ambiguous; not retrying"
                        );
                    } else {
                        debug!(
                            target: "durakv::writer",
                            attempt,
                            outcome = outcome.name(),
                            "Write finished"
                        );
                    }
                    return Ok(ctx.report(outcome));
                }
                Step::Retry(kind) => {
                    if !ctx.has_budget() {
                        let outcome = exhausted_outcome(kind, attempt);
                        warn!(
                            target: "durakv::writer",
                            attempts = attempt,
                            outcome = outcome.name(),
                            "Write gave up"
                        );
                        return Ok(ctx.report(outcome));
                    }
                    debug!(
                        target: "durakv::writer",
                        attempt,
                        failure = kind.name(),
                        "Retrying write"
                    );
                    ctx.backoff().map_err(|e| aborted(op, e))?;
                }
            }
        }
    }
}

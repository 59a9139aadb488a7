//! CAS-guarded read-modify-write
//!
//! Each attempt reads the document, applies the caller's mutation to the
//! value it read, and writes back guarded by the CAS from that read. A CAS
//! mismatch means another writer got in between: the loop backs off,
//! re-reads, and re-applies the mutation to the fresh value. The mutation is
//! never applied to a stale read twice.
//!
//! # Example
//!
//! ```
//! use durakv_client::{CasMutator, ClientDefaults, OpOptions};
//! use durakv_core::{DocumentKey, DurabilityRequirement, Value};
//! use durakv_store::{DocumentStore, InMemoryStore};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryStore::new());
//! let key = DocumentKey::new("counter").unwrap();
//! store.insert(&key, &json!(0), DurabilityRequirement::None).unwrap();
//!
//! let mutator = CasMutator::new(store, ClientDefaults::default());
//! let outcome = mutator
//!     .update("counter", |v: &Value| json!(v.as_i64().unwrap_or(0) + 1), &OpOptions::new())
//!     .unwrap();
//! assert!(outcome.is_success());
//! ```

use crate::options::{ClientDefaults, OpOptions, Resolved};
use crate::step::{aborted, exhausted_outcome, Step};
use durakv_core::{
    DocumentKey, Error, FailureKind, OperationOutcome, OperationReport, Result, Value,
};
use durakv_store::DocumentStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, debug_span, warn};
use uuid::Uuid;

/// Optimistic read-modify-write over a [`DocumentStore`]
pub struct CasMutator<S> {
    store: Arc<S>,
    defaults: ClientDefaults,
}

impl<S> Clone for CasMutator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            defaults: self.defaults.clone(),
        }
    }
}

impl<S: DocumentStore> CasMutator<S> {
    /// Create a mutator over `store`
    pub fn new(store: Arc<S>, defaults: ClientDefaults) -> Self {
        Self { store, defaults }
    }

    /// Defaults applied when a call does not override them
    pub fn defaults(&self) -> &ClientDefaults {
        &self.defaults
    }

    /// Apply `mutate` to the current value of `key` until it lands.
    ///
    /// Returns `NotFound` without retrying when the document is missing,
    /// `Conflict` when every attempt lost a CAS race, and
    /// `AmbiguousDurability` when the store could not confirm the write.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for a bad key, policy or durability requirement
    /// (no store call is made), `Cancelled` / `DeadlineExceeded` when the
    /// operation is interrupted.
    pub fn update<F>(&self, key: &str, mutate: F, opts: &OpOptions) -> Result<OperationOutcome>
    where
        F: FnMut(&Value) -> Value,
    {
        self.update_detailed(key, mutate, opts)
            .map(|report| report.outcome)
    }

    /// Like [`update`](Self::update), also reporting attempts and elapsed time
    pub fn update_detailed<F>(
        &self,
        key: &str,
        mut mutate: F,
        opts: &OpOptions,
    ) -> Result<OperationReport>
    where
        F: FnMut(&Value) -> Value,
    {
        self.run(key, None, &mut |value: &Value| Ok(mutate(value)), opts)
    }

    /// Apply a fallible mutation.
    ///
    /// A mutation error aborts the operation with [`Error::Mutation`] before
    /// anything is written for that attempt.
    pub fn try_update<F, E>(
        &self,
        key: &str,
        mut mutate: F,
        opts: &OpOptions,
    ) -> Result<OperationReport>
    where
        F: FnMut(&Value) -> std::result::Result<Value, E>,
        E: Display,
    {
        self.run(
            key,
            None,
            &mut |value: &Value| mutate(value).map_err(|e| Error::Mutation(e.to_string())),
            opts,
        )
    }

    /// Mutate `key`, or insert `initial` when it does not exist.
    ///
    /// `initial` is stored as given; `mutate` only runs against a document
    /// that was read. Losing an insert race to another writer consumes an
    /// attempt and falls back to the read-modify-write path.
    pub fn update_or_insert<F>(
        &self,
        key: &str,
        initial: &Value,
        mut mutate: F,
        opts: &OpOptions,
    ) -> Result<OperationReport>
    where
        F: FnMut(&Value) -> Value,
    {
        self.run(key, Some(initial), &mut |value: &Value| Ok(mutate(value)), opts)
    }

    /// Typed read-modify-write through serde.
    ///
    /// A document that does not deserialize as `T` aborts the operation with
    /// [`Error::Serialization`].
    pub fn update_as<T, F>(
        &self,
        key: &str,
        mut mutate: F,
        opts: &OpOptions,
    ) -> Result<OperationReport>
    where
        T: DeserializeOwned + Serialize,
        F: FnMut(T) -> T,
    {
        self.run(
            key,
            None,
            &mut |value: &Value| {
                let current: T = serde_json::from_value(value.clone())?;
                Ok(serde_json::to_value(mutate(current))?)
            },
            opts,
        )
    }

    fn run(
        &self,
        key: &str,
        initial: Option<&Value>,
        mutate: &mut dyn FnMut(&Value) -> Result<Value>,
        opts: &OpOptions,
    ) -> Result<OperationReport> {
        let key = DocumentKey::new(key).map_err(|e| aborted("update", e))?;
        let resolved = opts
            .resolve(&self.defaults)
            .map_err(|e| aborted("update", e))?;
        let mut ctx = resolved.context();

        let span = debug_span!(
            target: "durakv::mutator",
            "cas_update",
            op_id = %Uuid::new_v4(),
            key = %key,
        );
        let _guard = span.enter();

        loop {
            let attempt = ctx.begin_attempt().map_err(|e| aborted("update", e))?;
            match self.attempt(&key, initial, mutate, &resolved)? {
                Step::Done(outcome) => {
                    debug!(
                        target: "durakv::mutator",
                        attempt,
                        outcome = outcome.name(),
                        "Update finished"
                    );
                    return Ok(ctx.report(outcome));
                }
                Step::Retry(kind) => {
                    if !ctx.has_budget() {
                        let outcome = exhausted_outcome(kind, attempt);
                        warn!(
                            target: "durakv::mutator",
                            attempts = attempt,
                            outcome = outcome.name(),
                            "Update gave up"
                        );
                        return Ok(ctx.report(outcome));
                    }
                    debug!(
                        target: "durakv::mutator",
                        attempt,
                        failure = kind.name(),
                        "Retrying update"
                    );
                    ctx.backoff().map_err(|e| aborted("update", e))?;
                }
            }
        }
    }

    fn attempt(
        &self,
        key: &DocumentKey,
        initial: Option<&Value>,
        mutate: &mut dyn FnMut(&Value) -> Result<Value>,
        resolved: &Resolved,
    ) -> Result<Step> {
        let current = match self.store.get(key) {
            Ok(doc) => doc,
            Err(FailureKind::DocumentNotFound) => {
                let Some(initial) = initial else {
                    return Ok(Step::Done(OperationOutcome::NotFound));
                };
                return Ok(match self.store.insert(key, initial, resolved.durability) {
                    Ok(cas) => Step::Done(OperationOutcome::Success(cas)),
                    // Raced with another creator; re-read and mutate theirs
                    Err(FailureKind::DocumentExists) => Step::Retry(FailureKind::DocumentExists),
                    Err(kind) => Step::from_failure(kind),
                });
            }
            Err(kind) => return Ok(Step::from_failure(kind)),
        };

        let next = mutate(&current.value)?;
        Ok(
            match self
                .store
                .replace(key, &next, Some(current.cas), resolved.durability)
            {
                Ok(cas) => Step::Done(OperationOutcome::Success(cas)),
                Err(kind) => Step::from_failure(kind),
            },
        )
    }
}

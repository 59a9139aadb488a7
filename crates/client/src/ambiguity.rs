//! Recovering from ambiguous writes
//!
//! `AmbiguousDurability` means the write may or may not have landed. The
//! writer never repeats such a write on its own; these are the explicit
//! follow-ups a caller can choose.

use crate::options::OpOptions;
use crate::step::permanent_outcome;
use crate::writer::DurableWriter;
use durakv_core::{
    Cas, DocumentKey, FailureKind, OperationOutcome, OperationReport, Result, Value,
};
use durakv_retry::{classify, FailureClass};
use durakv_store::DocumentStore;
use tracing::{debug, debug_span, info, warn};
use uuid::Uuid;

/// What a read-back says about an ambiguous write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmbiguityResolution {
    /// The document holds exactly the intended value
    Applied(Cas),
    /// The document does not exist
    NotApplied,
    /// The document holds a different value: the write never landed, or
    /// landed and was overwritten since
    Superseded(Cas),
    /// The read-back itself failed
    Unresolved(FailureKind),
}

impl<S: DocumentStore> DurableWriter<S> {
    /// Read `key` back and compare it with the value an ambiguous write
    /// intended to store.
    ///
    /// Transient read failures are retried under the usual policy. Value
    /// equality is the only evidence available, so a document that already
    /// held `intended` before the write also reports `Applied`.
    pub fn resolve_ambiguous(
        &self,
        key: &str,
        intended: &Value,
        opts: &OpOptions,
    ) -> Result<AmbiguityResolution> {
        let key = DocumentKey::new(key)?;
        let resolved = opts.resolve(&self.defaults)?;
        let mut ctx = resolved.context();

        loop {
            let attempt = ctx.begin_attempt()?;
            let kind = match self.store.get(&key) {
                Ok(doc) if doc.value == *intended => {
                    return Ok(AmbiguityResolution::Applied(doc.cas))
                }
                Ok(doc) => return Ok(AmbiguityResolution::Superseded(doc.cas)),
                Err(FailureKind::DocumentNotFound) => {
                    return Ok(AmbiguityResolution::NotApplied)
                }
                Err(kind) => kind,
            };
            if classify(&kind) != FailureClass::Transient || !ctx.has_budget() {
                debug!(
                    target: "durakv::ambiguity",
                    key = %key,
                    attempt,
                    failure = kind.name(),
                    "Read-back failed"
                );
                return Ok(AmbiguityResolution::Unresolved(kind));
            }
            ctx.backoff()?;
        }
    }

    /// Insert that can be retried safely after an ambiguous attempt.
    ///
    /// An ambiguous insert is retried. If a later attempt then finds the key
    /// already present holding exactly `value`, the earlier attempt is taken
    /// to have landed and the outcome is `Success` with the stored CAS. A key
    /// that existed before any ambiguity is still `AlreadyExists`.
    pub fn insert_idempotent(
        &self,
        key: &str,
        value: &Value,
        opts: &OpOptions,
    ) -> Result<OperationReport> {
        let doc_key = DocumentKey::new(key)?;
        let resolved = opts.resolve(&self.defaults)?;
        let mut ctx = resolved.context();

        let span = debug_span!(
            target: "durakv::ambiguity",
            "insert_idempotent",
            op_id = %Uuid::new_v4(),
            key = %doc_key,
        );
        let _guard = span.enter();

        let mut saw_ambiguous = false;
        loop {
            let attempt = ctx.begin_attempt()?;
            let kind = match self.store.insert(&doc_key, value, resolved.durability) {
                Ok(cas) => return Ok(ctx.report(OperationOutcome::Success(cas))),
                Err(kind) => kind,
            };

            let class = classify(&kind);
            if class == FailureClass::Ambiguous {
                saw_ambiguous = true;
                warn!(
                    target: "durakv::ambiguity",
                    attempt,
                    "Insert ambiguous; retrying"
                );
                if !ctx.has_budget() {
                    return Ok(ctx.report(OperationOutcome::AmbiguousDurability));
                }
            } else if saw_ambiguous && kind == FailureKind::DocumentExists {
                let outcome = match self.store.get(&doc_key) {
                    Ok(doc) if doc.value == *value => {
                        info!(
                            target: "durakv::ambiguity",
                            attempt,
                            "Earlier ambiguous insert had landed"
                        );
                        OperationOutcome::Success(doc.cas)
                    }
                    Ok(_) => OperationOutcome::AlreadyExists,
                    // Could not confirm either way
                    Err(_) => OperationOutcome::AmbiguousDurability,
                };
                return Ok(ctx.report(outcome));
            } else if class == FailureClass::Transient {
                if !ctx.has_budget() {
                    let outcome = if saw_ambiguous {
                        OperationOutcome::AmbiguousDurability
                    } else {
                        OperationOutcome::RetriesExhausted {
                            attempts: attempt,
                            last: kind,
                        }
                    };
                    return Ok(ctx.report(outcome));
                }
            } else if class == FailureClass::Conflict {
                // No CAS to refresh; same terminal conflict as a plain write
                return Ok(ctx.report(OperationOutcome::Conflict { attempts: attempt }));
            } else {
                return Ok(ctx.report(permanent_outcome(kind)));
            }
            ctx.backoff()?;
        }
    }
}

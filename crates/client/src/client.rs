//! KvClient: configured entry point over a document store
//!
//! The client owns no connection state of its own. It pairs a shared store
//! handle with the defaults from [`ClientConfig`], and hands each call to the
//! [`CasMutator`] or [`DurableWriter`]. Cloning is cheap; clones share the
//! store and may be used from any number of threads.

use crate::ambiguity::AmbiguityResolution;
use crate::config::ClientConfig;
use crate::mutator::CasMutator;
use crate::options::{ClientDefaults, OpOptions};
use crate::writer::DurableWriter;
use durakv_core::{
    Cas, Document, DocumentKey, DurabilityRequirement, FailureKind, OperationOutcome,
    OperationReport, Result, Value,
};
use durakv_retry::{classify, FailureClass};
use durakv_store::DocumentStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Result of a read
///
/// `T` is the document for [`KvClient::get`] and the deserialized content
/// for [`KvClient::get_as`]. A failed read is never folded into `NotFound`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<T = Document> {
    /// The document (or its content) as currently stored
    Found(T),
    /// No document under the key
    NotFound,
    /// Transient read failures persisted through every attempt
    RetriesExhausted {
        /// Attempts consumed
        attempts: u32,
        /// Failure seen on the last attempt
        last: FailureKind,
    },
    /// Failure that retrying cannot fix
    DefiniteFailure(FailureKind),
}

impl<T> ReadOutcome<T> {
    /// The found value, if any
    pub fn found(self) -> Option<T> {
        match self {
            ReadOutcome::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Whether the read reached the store and got an answer
    pub fn is_answered(&self) -> bool {
        matches!(self, ReadOutcome::Found(_) | ReadOutcome::NotFound)
    }

    /// Convert the found value, keeping every other arm as is
    pub fn try_map<U, F>(self, f: F) -> Result<ReadOutcome<U>>
    where
        F: FnOnce(T) -> Result<U>,
    {
        Ok(match self {
            ReadOutcome::Found(value) => ReadOutcome::Found(f(value)?),
            ReadOutcome::NotFound => ReadOutcome::NotFound,
            ReadOutcome::RetriesExhausted { attempts, last } => {
                ReadOutcome::RetriesExhausted { attempts, last }
            }
            ReadOutcome::DefiniteFailure(kind) => ReadOutcome::DefiniteFailure(kind),
        })
    }
}

impl ReadOutcome {
    /// The document, if found
    pub fn document(self) -> Option<Document> {
        self.found()
    }
}

/// Retrying, durability-aware KV client
pub struct KvClient<S> {
    id: Uuid,
    store: Arc<S>,
    mutator: CasMutator<S>,
    writer: DurableWriter<S>,
}

impl<S> Clone for KvClient<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            store: Arc::clone(&self.store),
            mutator: self.mutator.clone(),
            writer: self.writer.clone(),
        }
    }
}

impl<S: DocumentStore> KvClient<S> {
    /// Create a client over `store` with defaults from `config`.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if any config section is invalid.
    pub fn new(store: Arc<S>, config: &ClientConfig) -> Result<Self> {
        let defaults = ClientDefaults::from_config(config)?;
        Ok(Self::with_defaults(store, defaults))
    }

    /// Create a client from a `durakv.toml` file
    pub fn from_config_file(store: Arc<S>, path: &Path) -> Result<Self> {
        let config = ClientConfig::from_file(path)?;
        Self::new(store, &config)
    }

    /// Create a client with explicit defaults
    pub fn with_defaults(store: Arc<S>, defaults: ClientDefaults) -> Self {
        let id = Uuid::new_v4();
        info!(
            target: "durakv::client",
            client_id = %id,
            durability = %defaults.durability,
            max_attempts = defaults.retry.max_attempts,
            strategy = %defaults.retry.backoff.strategy,
            "Client created"
        );
        Self {
            id,
            mutator: CasMutator::new(Arc::clone(&store), defaults.clone()),
            writer: DurableWriter::new(Arc::clone(&store), defaults),
            store,
        }
    }

    /// Identifier used in this client's log lines
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Defaults applied to calls that do not override them
    pub fn defaults(&self) -> &ClientDefaults {
        self.mutator.defaults()
    }

    /// Read-modify-write component
    pub fn mutator(&self) -> &CasMutator<S> {
        &self.mutator
    }

    /// Durable write component
    pub fn writer(&self) -> &DurableWriter<S> {
        &self.writer
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read `key`, retrying transient failures
    pub fn get(&self, key: &str, opts: &OpOptions) -> Result<ReadOutcome> {
        let key = DocumentKey::new(key)?;
        let resolved = opts.resolve(self.defaults())?;
        let mut ctx = resolved.context();

        loop {
            let attempt = ctx.begin_attempt()?;
            let kind = match self.store.get(&key) {
                Ok(doc) => return Ok(ReadOutcome::Found(doc)),
                Err(FailureKind::DocumentNotFound) => return Ok(ReadOutcome::NotFound),
                Err(kind) => kind,
            };
            if classify(&kind) != FailureClass::Transient {
                return Ok(ReadOutcome::DefiniteFailure(kind));
            }
            if !ctx.has_budget() {
                return Ok(ReadOutcome::RetriesExhausted {
                    attempts: attempt,
                    last: kind,
                });
            }
            debug!(
                target: "durakv::client",
                key = %key,
                attempt,
                failure = kind.name(),
                "Retrying read"
            );
            ctx.backoff()?;
        }
    }

    /// Read `key` and deserialize its content
    ///
    /// Read failures come back as the same arms [`get`](Self::get) reports.
    ///
    /// # Errors
    ///
    /// `Serialization` when the stored value does not deserialize as `T`.
    pub fn get_as<T: DeserializeOwned>(
        &self,
        key: &str,
        opts: &OpOptions,
    ) -> Result<ReadOutcome<T>> {
        self.get(key, opts)?.try_map(|doc| doc.content_as())
    }

    // ========================================================================
    // CAS-guarded mutation
    // ========================================================================

    /// See [`CasMutator::update`]
    pub fn update<F>(&self, key: &str, mutate: F, opts: &OpOptions) -> Result<OperationOutcome>
    where
        F: FnMut(&Value) -> Value,
    {
        self.mutator.update(key, mutate, opts)
    }

    /// See [`CasMutator::update_detailed`]
    pub fn update_detailed<F>(
        &self,
        key: &str,
        mutate: F,
        opts: &OpOptions,
    ) -> Result<OperationReport>
    where
        F: FnMut(&Value) -> Value,
    {
        self.mutator.update_detailed(key, mutate, opts)
    }

    /// See [`CasMutator::try_update`]
    pub fn try_update<F, E>(
        &self,
        key: &str,
        mutate: F,
        opts: &OpOptions,
    ) -> Result<OperationReport>
    where
        F: FnMut(&Value) -> std::result::Result<Value, E>,
        E: Display,
    {
        self.mutator.try_update(key, mutate, opts)
    }

    /// See [`CasMutator::update_or_insert`]
    pub fn update_or_insert<T, F>(
        &self,
        key: &str,
        initial: &T,
        mutate: F,
        opts: &OpOptions,
    ) -> Result<OperationReport>
    where
        T: Serialize,
        F: FnMut(&Value) -> Value,
    {
        let initial = serde_json::to_value(initial)?;
        self.mutator.update_or_insert(key, &initial, mutate, opts)
    }

    /// See [`CasMutator::update_as`]
    pub fn update_as<T, F>(
        &self,
        key: &str,
        mutate: F,
        opts: &OpOptions,
    ) -> Result<OperationReport>
    where
        T: DeserializeOwned + Serialize,
        F: FnMut(T) -> T,
    {
        self.mutator.update_as(key, mutate, opts)
    }

    // ========================================================================
    // Durable writes
    // ========================================================================

    /// Upsert `value` with an explicit durability requirement
    pub fn write_with_durability<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        requirement: DurabilityRequirement,
    ) -> Result<OperationOutcome> {
        let value = serde_json::to_value(value)?;
        self.writer.write_with_durability(key, &value, requirement)
    }

    /// Create or overwrite `key`
    pub fn upsert<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        opts: &OpOptions,
    ) -> Result<OperationReport> {
        let value = serde_json::to_value(value)?;
        self.writer.upsert(key, &value, opts)
    }

    /// Create `key`
    pub fn insert<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        opts: &OpOptions,
    ) -> Result<OperationReport> {
        let value = serde_json::to_value(value)?;
        self.writer.insert(key, &value, opts)
    }

    /// Overwrite existing `key`, guarded by `cas` when given
    pub fn replace<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        cas: Option<Cas>,
        opts: &OpOptions,
    ) -> Result<OperationReport> {
        let value = serde_json::to_value(value)?;
        self.writer.replace(key, &value, cas, opts)
    }

    /// Delete `key`, guarded by `cas` when given
    pub fn remove(&self, key: &str, cas: Option<Cas>, opts: &OpOptions) -> Result<OperationReport> {
        self.writer.remove(key, cas, opts)
    }

    /// See [`DurableWriter::insert_idempotent`]
    pub fn insert_idempotent<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        opts: &OpOptions,
    ) -> Result<OperationReport> {
        let value = serde_json::to_value(value)?;
        self.writer.insert_idempotent(key, &value, opts)
    }

    /// See [`DurableWriter::resolve_ambiguous`]
    pub fn resolve_ambiguous<T: Serialize>(
        &self,
        key: &str,
        intended: &T,
        opts: &OpOptions,
    ) -> Result<AmbiguityResolution> {
        let intended = serde_json::to_value(intended)?;
        self.writer.resolve_ambiguous(key, &intended, opts)
    }

    /// Release this handle
    ///
    /// In-flight operations on clones are unaffected; the store is dropped
    /// with its last handle.
    pub fn close(self) {
        info!(
            target: "durakv::client",
            client_id = %self.id,
            handles = Arc::strong_count(&self.store),
            "Client closed"
        );
    }
}

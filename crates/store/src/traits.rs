//! Document store collaborator
//!
//! The client only ever talks to a store through this trait. Implementations
//! must apply CAS checks atomically: a write carrying a stale CAS is rejected
//! with `CasMismatch`, never applied.
//!
//! Every method is a single call; the client owns retry policy. Stores must
//! not retry internally.

use durakv_core::{Cas, Document, DocumentKey, DurabilityRequirement, FailureKind, Topology, Value};
use std::sync::Arc;

/// Result of a single store call
pub type StoreResult<T> = std::result::Result<T, FailureKind>;

/// A remote (or embedded) document store
pub trait DocumentStore: Send + Sync {
    /// Read a document and its current CAS
    ///
    /// Returns `DocumentNotFound` when the key is absent.
    fn get(&self, key: &DocumentKey) -> StoreResult<Document>;

    /// Create a document; `DocumentExists` if the key is present
    fn insert(
        &self,
        key: &DocumentKey,
        value: &Value,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas>;

    /// Create or overwrite a document
    fn upsert(
        &self,
        key: &DocumentKey,
        value: &Value,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas>;

    /// Overwrite an existing document
    ///
    /// With `expected` set, the write only applies if the stored CAS matches;
    /// otherwise `CasMismatch`. `DocumentNotFound` if the key is absent.
    fn replace(
        &self,
        key: &DocumentKey,
        value: &Value,
        expected: Option<Cas>,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas>;

    /// Delete a document, returning the CAS of the removal
    fn remove(
        &self,
        key: &DocumentKey,
        expected: Option<Cas>,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas>;

    /// Current replication layout
    fn topology(&self) -> Topology;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn get(&self, key: &DocumentKey) -> StoreResult<Document> {
        (**self).get(key)
    }

    fn insert(
        &self,
        key: &DocumentKey,
        value: &Value,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas> {
        (**self).insert(key, value, durability)
    }

    fn upsert(
        &self,
        key: &DocumentKey,
        value: &Value,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas> {
        (**self).upsert(key, value, durability)
    }

    fn replace(
        &self,
        key: &DocumentKey,
        value: &Value,
        expected: Option<Cas>,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas> {
        (**self).replace(key, value, expected, durability)
    }

    fn remove(
        &self,
        key: &DocumentKey,
        expected: Option<Cas>,
        durability: DurabilityRequirement,
    ) -> StoreResult<Cas> {
        (**self).remove(key, expected, durability)
    }

    fn topology(&self) -> Topology {
        (**self).topology()
    }
}

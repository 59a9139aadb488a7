//! Document and version types
//!
//! - Cas: opaque version token assigned by the store on every write
//! - Document: key + JSON value + the CAS it was read at

use crate::key::DocumentKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Compare-and-swap token
///
/// Opaque to the client: it is only ever compared for equality by the store.
/// Stores never issue `Cas(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cas(u64);

impl Cas {
    /// Wrap a raw token
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw token value
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Cas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// A document as read from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document key
    pub key: DocumentKey,
    /// Current value
    pub value: Value,
    /// CAS the value was read at
    pub cas: Cas,
}

impl Document {
    /// Create a document
    pub fn new(key: DocumentKey, value: Value, cas: Cas) -> Self {
        Self { key, value, cas }
    }

    /// Deserialize the value into a typed struct
    pub fn content_as<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

//! Document keys
//!
//! Keys are validated once, when a `DocumentKey` is built, so every layer
//! below the client can assume a well-formed key:
//! - Keys must not be empty
//! - Keys must not contain NUL bytes (\0)
//! - Keys must not exceed [`MAX_KEY_LENGTH`] bytes

use crate::error::{Error, Result};
use crate::limits::MAX_KEY_LENGTH;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Key validation error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Key is empty
    #[error("key must not be empty")]
    Empty,

    /// Key contains a NUL byte
    #[error("key must not contain NUL bytes")]
    ContainsNul,

    /// Key exceeds the maximum length
    #[error("key length {length} exceeds maximum {max}")]
    TooLong {
        /// Actual length in bytes
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
}

impl From<KeyError> for Error {
    fn from(e: KeyError) -> Self {
        Error::InvalidConfiguration(e.to_string())
    }
}

/// Validate a raw key string
///
/// # Examples
///
/// ```
/// use durakv_core::key::validate_key;
///
/// assert!(validate_key("user:123").is_ok());
/// assert!(validate_key("").is_err());
/// assert!(validate_key("a\x00b").is_err());
/// ```
pub fn validate_key(key: &str) -> std::result::Result<(), KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    if key.contains('\x00') {
        return Err(KeyError::ContainsNul);
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(KeyError::TooLong {
            length: key.len(),
            max: MAX_KEY_LENGTH,
        });
    }
    Ok(())
}

/// Unique identifier of a document in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Build a validated key
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the key violates a validation rule.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self(key))
    }

    /// Borrow the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DocumentKey {
    type Error = KeyError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        validate_key(&value)?;
        Ok(Self(value))
    }
}

impl TryFrom<&str> for DocumentKey {
    type Error = KeyError;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        DocumentKey::try_from(value.to_string())
    }
}

impl From<DocumentKey> for String {
    fn from(key: DocumentKey) -> Self {
        key.0
    }
}

impl AsRef<str> for DocumentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Size limits for keys and documents
//!
//! These mirror the limits a document store enforces server side. The client
//! checks keys eagerly so an invalid key never reaches the store; document
//! size is checked by the store and reported as `ValueTooLarge`.

/// Maximum key length in bytes
pub const MAX_KEY_LENGTH: usize = 250;

/// Maximum serialized document size in bytes (20 MiB)
pub const MAX_DOCUMENT_SIZE: usize = 20 * 1024 * 1024;

/// Maximum number of replicas a bucket can be configured with
pub const MAX_REPLICAS: u8 = 3;

/// Maximum replica count for which synchronous durability is supported
pub const MAX_SYNC_DURABILITY_REPLICAS: u8 = 2;

/// Serialized size of a JSON value in bytes
///
/// Used by stores to enforce [`MAX_DOCUMENT_SIZE`].
pub fn encoded_len(value: &serde_json::Value) -> usize {
    serde_json::to_vec(value).map(|v| v.len()).unwrap_or(usize::MAX)
}

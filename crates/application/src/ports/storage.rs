//! Key-value persistence port
//!
//! Tokens and the resume location are kept in client-side storage with
//! per-entry expiry. Expiry is evaluated by the callers; stores only persist
//! what they are given.

use async_trait::async_trait;
use vigor_domain::StoredValue;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Persistent string store with expiring entries.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads an entry. Missing keys are `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StorageError>;

    /// Writes an entry, replacing any previous value.
    async fn set(&self, key: &str, value: StoredValue) -> Result<(), StorageError>;

    /// Removes an entry. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

//! Session file encoding.
//!
//! The session file is rewritten on every token change, so its encoding is
//! fixed: two-space indentation, keys in map order (`BTreeMap` keeps them
//! sorted) and a trailing newline.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Session file encoding errors.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// The value could not be encoded.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The file content is not the expected JSON.
    #[error("JSON deserialization failed: {0}")]
    Deserialize(serde_json::Error),
}

/// Encodes `value` as stable, indented JSON ready to write to disk.
///
/// # Errors
///
/// Returns an error if `value` cannot be represented as JSON.
pub fn to_json_stable_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"  "));
    value.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Decodes JSON read from disk.
///
/// # Errors
///
/// Returns `SerializationError::Deserialize` if the bytes are not valid JSON
/// for `T`.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(SerializationError::Deserialize)
}

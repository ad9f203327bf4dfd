//! The `{ status, message, data }` body shape every admin endpoint returns.

use serde::{Deserialize, Serialize};

/// Outcome flag carried in every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    /// The call succeeded.
    Success,
    /// The call failed; `message` explains why.
    Error,
}

/// Standard response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Success or error.
    pub status: ApiStatus,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Payload, present on most successful calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Builds a success envelope.
    #[must_use]
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ApiStatus::Success,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Builds a success envelope without a payload.
    #[must_use]
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Success,
            message: message.into(),
            data: None,
        }
    }

    /// Builds an error envelope.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Error,
            message: message.into(),
            data: None,
        }
    }

    /// Returns true when `status` is `"success"`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, ApiStatus::Success)
    }

    /// Consumes the envelope, returning the payload.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

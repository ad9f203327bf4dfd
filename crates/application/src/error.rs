//! Application error types

use thiserror::Error;
use vigor_domain::{ApiResponse, DomainError};

use crate::auth::RefreshError;
use crate::ports::{StorageError, TransportError};

/// Errors surfaced to callers of the admin client.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Envelope message, or the reason phrase when the body is not an envelope.
        message: String,
        /// The untouched response.
        response: Box<ApiResponse>,
    },

    /// The session could not be recovered and has been terminated.
    #[error("session expired: {0}")]
    SessionExpired(#[from] RefreshError),

    /// A 2xx response whose envelope reported an error.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The response body did not have the expected shape.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Local storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApplicationError {
    /// Wraps a non-success response.
    #[must_use]
    pub fn from_response(response: ApiResponse) -> Self {
        Self::Status {
            status: response.status.as_u16(),
            message: response.error_message(),
            response: Box::new(response),
        }
    }

    /// HTTP status, when the error came from a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the caller should send the admin to the login screen.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

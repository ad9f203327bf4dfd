//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A navigable location could not be parsed.
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// The request body could not be encoded as JSON.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// The admin email address is malformed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The one-time password is empty or not numeric.
    #[error("invalid one-time password")]
    InvalidOtp,

    /// The admin resource name is not known.
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    /// An identifier is invalid or empty.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

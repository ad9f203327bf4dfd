//! Vigor Domain - Core types for the admin API client
//!
//! This crate defines the wire and session model shared by every layer:
//! tokens, request descriptors, responses and the backend envelope.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod envelope;
pub mod error;
pub mod request;
pub mod resource;
pub mod response;
pub mod session;

pub use auth::{
    OtpRequest, OtpVerification, RefreshTokenRequest, StoredValue, TokenKind, TokenPair,
    token_preview,
};
pub use envelope::{ApiEnvelope, ApiStatus};
pub use error::{DomainError, DomainResult};
pub use request::{ApiRequest, HttpMethod};
pub use resource::{Page, Resource};
pub use response::{ApiResponse, StatusCode};
pub use session::{ResumeLocation, SessionEvent};

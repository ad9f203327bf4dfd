//! HTTP transport port

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;
use vigor_domain::{ApiRequest, ApiResponse};

/// Network-level failures. HTTP error statuses are not transport errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The call did not complete within its timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The server could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The final URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request could not be encoded.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Anything else the HTTP stack reported.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Builds a timeout error from a duration.
    #[must_use]
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// How many times a request descriptor has been sent.
///
/// A request is sent once, and replayed at most once after a token refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Attempt(u8);

impl Attempt {
    /// The first send.
    pub const FIRST: Self = Self(0);

    /// The replay after a refresh.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// True once the request has already been replayed.
    #[must_use]
    pub const fn is_replay(self) -> bool {
        self.0 > 0
    }

    /// Zero-based attempt number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }
}

/// A request ready to go on the wire: descriptor plus credential and timing.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// Id used to correlate log lines for this send.
    pub id: Uuid,
    /// The immutable descriptor, shared across attempts.
    pub request: Arc<ApiRequest>,
    /// Access token to send as a bearer credential, if any.
    pub access_token: Option<String>,
    /// Which send this is.
    pub attempt: Attempt,
    /// Upper bound for the whole call.
    pub timeout: Duration,
    /// When the request was prepared.
    pub started_at: Instant,
}

impl PreparedRequest {
    /// Prepares a send of `request`.
    #[must_use]
    pub fn new(
        request: Arc<ApiRequest>,
        access_token: Option<String>,
        attempt: Attempt,
        timeout: Duration,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            request,
            access_token,
            attempt,
            timeout,
            started_at: Instant::now(),
        }
    }

    /// Value of the `Authorization` header, if a token is attached.
    #[must_use]
    pub fn authorization(&self) -> Option<String> {
        self.access_token
            .as_deref()
            .map(|token| format!("Bearer {token}"))
    }
}

/// Port for executing HTTP requests against the admin API.
///
/// Implementations resolve `request.path` against the configured base URL,
/// attach `authorization()` when present and honour `timeout`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Executes the request. Any HTTP status is `Ok`; only network-level
    /// failures are `Err`.
    async fn execute(&self, request: &PreparedRequest) -> Result<ApiResponse, TransportError>;
}

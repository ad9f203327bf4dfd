//! Request and response decoration.
//!
//! Outbound: attach the current access token as a bearer credential and
//! stamp the send with an id and start time. Inbound: log the outcome.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};
use vigor_domain::{ApiRequest, ApiResponse, token_preview};

use super::TokenStore;
use crate::ports::{Attempt, PreparedRequest, TransportError};

/// Prepares requests for the wire and logs their results.
#[derive(Debug, Clone)]
pub struct RequestDecorator {
    tokens: TokenStore,
    timeout: Duration,
}

impl RequestDecorator {
    /// Creates a decorator that applies `timeout` to every call it prepares.
    #[must_use]
    pub const fn new(tokens: TokenStore, timeout: Duration) -> Self {
        Self { tokens, timeout }
    }

    /// Prepares a send carrying whatever access token is currently stored.
    /// Without a token the request goes out unauthenticated.
    pub async fn prepare(&self, request: Arc<ApiRequest>, attempt: Attempt) -> PreparedRequest {
        let token = self.tokens.access_token().await;
        self.prepare_with(request, token, attempt)
    }

    /// Prepares a send carrying an explicit access token.
    #[must_use]
    pub fn prepare_with(
        &self,
        request: Arc<ApiRequest>,
        access_token: Option<String>,
        attempt: Attempt,
    ) -> PreparedRequest {
        let prepared = PreparedRequest::new(request, access_token, attempt, self.timeout);
        let token = prepared.access_token.as_deref().map(token_preview);
        debug!(
            request_id = %prepared.id,
            method = %prepared.request.method,
            target = %prepared.request.target(),
            attempt = attempt.number(),
            token = token.as_deref(),
            "sending request"
        );
        prepared
    }

    /// Prepares a send that never carries a credential (login endpoints).
    #[must_use]
    pub fn prepare_anonymous(&self, request: Arc<ApiRequest>) -> PreparedRequest {
        self.prepare_with(request, None, Attempt::FIRST)
    }

    /// Logs the outcome of a send.
    pub fn observe(&self, prepared: &PreparedRequest, result: &Result<ApiResponse, TransportError>) {
        let elapsed_ms = u64::try_from(prepared.started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        let method = prepared.request.method;
        let target = prepared.request.target();

        match result {
            Ok(response) if response.is_success() => debug!(
                request_id = %prepared.id,
                %method,
                %target,
                status = response.status.as_u16(),
                elapsed_ms,
                "request completed"
            ),
            Ok(response) => warn!(
                request_id = %prepared.id,
                %method,
                %target,
                status = response.status.as_u16(),
                attempt = prepared.attempt.number(),
                elapsed_ms,
                message = %response.error_message(),
                "request returned error status"
            ),
            Err(e) => error!(
                request_id = %prepared.id,
                %method,
                %target,
                elapsed_ms,
                error = %e,
                "request failed"
            ),
        }
    }
}

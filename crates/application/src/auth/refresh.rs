//! Single-flight token refresh.
//!
//! When a request comes back 401 the client hands it to the coordinator.
//! The first caller in an idle window becomes the leader and performs the
//! one refresh-token exchange; callers arriving while that exchange is in
//! flight queue a one-shot waiter instead. When the exchange settles the
//! queue is drained in FIFO order with the same outcome, and the state
//! returns to idle with an empty queue.

use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use vigor_domain::{ApiEnvelope, ApiRequest, RefreshTokenRequest, SessionEvent, TokenPair};

use super::TokenStore;
use crate::ports::{Attempt, HttpTransport, PreparedRequest, TransportError};
use crate::session::SessionTerminator;

/// Default path of the refresh-token exchange.
pub const REFRESH_PATH: &str = "/auth/admin/refresh-token";

/// Why a refresh cycle failed. Cloned to every queued waiter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// There was no refresh token to exchange.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The auth backend answered with an error.
    #[error("refresh rejected ({status}): {message}")]
    Rejected {
        /// HTTP status of the exchange.
        status: u16,
        /// Message from the response envelope.
        message: String,
    },

    /// The exchange did not complete.
    #[error("refresh request failed: {0}")]
    Transport(#[from] TransportError),

    /// The exchange succeeded but the body had no usable token pair.
    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    /// The new pair could not be persisted.
    #[error("could not store refreshed tokens: {0}")]
    Storage(String),

    /// The leading caller went away before the exchange settled.
    #[error("refresh was interrupted")]
    Interrupted,
}

type RefreshOutcome = Result<String, RefreshError>;

/// A caller parked until the in-flight exchange settles.
struct PendingRequest {
    tx: oneshot::Sender<RefreshOutcome>,
}

impl PendingRequest {
    fn settle(self, outcome: RefreshOutcome) {
        // A closed receiver means the caller stopped waiting.
        let _ = self.tx.send(outcome);
    }
}

enum RefreshState {
    Idle,
    Refreshing { queue: Vec<PendingRequest> },
}

enum Role {
    Leader,
    Follower(oneshot::Receiver<RefreshOutcome>),
}

/// Owns the refresh state for one client.
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    tokens: TokenStore,
    transport: Arc<dyn HttpTransport>,
    terminator: Arc<SessionTerminator>,
    timeout: Duration,
    path: String,
    exchanges: AtomicU64,
    // Bumped under `state` each time a cycle drains.
    cycles: AtomicU64,
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub fn new(
        tokens: TokenStore,
        transport: Arc<dyn HttpTransport>,
        terminator: Arc<SessionTerminator>,
        timeout: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(RefreshState::Idle),
            tokens,
            transport,
            terminator,
            timeout,
            path: REFRESH_PATH.to_string(),
            exchanges: AtomicU64::new(0),
            cycles: AtomicU64::new(0),
        }
    }

    /// Overrides the exchange endpoint path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// True while an exchange is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock(), RefreshState::Refreshing { .. })
    }

    /// Number of callers parked behind the in-flight exchange.
    #[must_use]
    pub fn queued(&self) -> usize {
        match &*self.state.lock() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { queue } => queue.len(),
        }
    }

    /// Number of exchange calls issued since creation.
    #[must_use]
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    /// Obtains a usable access token after a 401.
    ///
    /// `rejected` is the token the failed request carried. If the store
    /// already holds a different token, a refresh finished while that request
    /// was in flight and the current token is returned without a new
    /// exchange.
    ///
    /// # Errors
    ///
    /// Returns the refresh failure; by then the session has been terminated.
    pub async fn recover(&self, rejected: Option<&str>) -> Result<String, RefreshError> {
        let role = loop {
            let seen = self.cycles.load(Ordering::Acquire);
            if let Some(current) = self.tokens.access_token().await
                && rejected != Some(current.as_str())
            {
                debug!("401 carried a superseded token, replaying with the current one");
                return Ok(current);
            }

            let role = {
                let mut state = self.state.lock();
                // A cycle that settled after the token read means the read is stale.
                if self.cycles.load(Ordering::Acquire) == seen {
                    Some(match &mut *state {
                        RefreshState::Refreshing { queue } => {
                            let (tx, rx) = oneshot::channel();
                            queue.push(PendingRequest { tx });
                            debug!(queued = queue.len(), "refresh in flight, queueing request");
                            Role::Follower(rx)
                        }
                        RefreshState::Idle => {
                            *state = RefreshState::Refreshing { queue: Vec::new() };
                            Role::Leader
                        }
                    })
                } else {
                    None
                }
            };
            if let Some(role) = role {
                break role;
            }
        };

        match role {
            Role::Follower(rx) => rx.await.unwrap_or(Err(RefreshError::Interrupted)),
            Role::Leader => {
                let mut cycle = Cycle::new(self);
                let outcome = self.exchange().await;
                if let Err(e) = &outcome {
                    warn!(error = %e, "token refresh failed, ending session");
                    self.terminator.terminate(&e.to_string()).await;
                }
                cycle.finish(&outcome);
                outcome
            }
        }
    }

    async fn exchange(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.tokens.refresh_token().await else {
            return Err(RefreshError::MissingRefreshToken);
        };

        let request = ApiRequest::post(&self.path)
            .with_json(&RefreshTokenRequest {
                token: refresh_token,
            })
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        let prepared = PreparedRequest::new(Arc::new(request), None, Attempt::FIRST, self.timeout);

        self.exchanges.fetch_add(1, Ordering::Relaxed);
        info!(request_id = %prepared.id, "refreshing access token");

        let response = tokio::time::timeout(self.timeout, self.transport.execute(&prepared))
            .await
            .map_err(|_| TransportError::timeout(self.timeout))??;

        if !response.is_success() {
            return Err(RefreshError::Rejected {
                status: response.status.as_u16(),
                message: response.error_message(),
            });
        }

        let envelope: ApiEnvelope<TokenPair> = response
            .envelope()
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
        if !envelope.is_success() {
            return Err(RefreshError::Rejected {
                status: response.status.as_u16(),
                message: envelope.message,
            });
        }
        let pair = envelope
            .into_data()
            .ok_or_else(|| RefreshError::InvalidResponse("missing token pair".to_string()))?;

        self.tokens
            .set_tokens(&pair)
            .await
            .map_err(|e| RefreshError::Storage(e.to_string()))?;
        self.terminator.notify(SessionEvent::TokensRefreshed);
        info!("access token refreshed");

        Ok(pair.access_token)
    }

    fn drain(&self, outcome: &RefreshOutcome) {
        let queue = {
            let mut state = self.state.lock();
            self.cycles.fetch_add(1, Ordering::AcqRel);
            match mem::replace(&mut *state, RefreshState::Idle) {
                RefreshState::Refreshing { queue } => queue,
                RefreshState::Idle => Vec::new(),
            }
        };
        if !queue.is_empty() {
            debug!(waiters = queue.len(), ok = outcome.is_ok(), "releasing queued requests");
        }
        for pending in queue {
            pending.settle(outcome.clone());
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &self.is_refreshing())
            .field("path", &self.path)
            .field("exchanges", &self.exchange_count())
            .finish_non_exhaustive()
    }
}

/// One leader-held refresh cycle. If the leader is dropped mid-exchange the
/// queue is released with `Interrupted` so no waiter is left parked.
struct Cycle<'a> {
    coordinator: &'a RefreshCoordinator,
    finished: bool,
}

impl<'a> Cycle<'a> {
    const fn new(coordinator: &'a RefreshCoordinator) -> Self {
        Self {
            coordinator,
            finished: false,
        }
    }

    fn finish(&mut self, outcome: &RefreshOutcome) {
        self.finished = true;
        self.coordinator.drain(outcome);
    }
}

impl Drop for Cycle<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.coordinator.drain(&Err(RefreshError::Interrupted));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::InMemoryStore;
    use crate::ports::{Clock, KeyValueStore, NullNavigator, StorageError};
    use crate::session::ResumeSlot;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::Weak;
    use std::sync::atomic::AtomicBool;
    use vigor_domain::{ApiResponse, StoredValue};

    struct WallClock;

    impl Clock for WallClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Answers every exchange with the same pair.
    struct FixedExchange(TokenPair);

    #[async_trait]
    impl HttpTransport for FixedExchange {
        async fn execute(&self, _request: &PreparedRequest) -> Result<ApiResponse, TransportError> {
            let body = serde_json::to_vec(&ApiEnvelope::success("ok", self.0.clone())).unwrap();
            Ok(ApiResponse::new(200u16, body, Duration::ZERO))
        }
    }

    fn coordinator(tokens: &TokenStore) -> RefreshCoordinator {
        let storage = Arc::new(InMemoryStore::new());
        let resume = ResumeSlot::new(storage, Arc::new(WallClock));
        let terminator = Arc::new(SessionTerminator::new(
            tokens.clone(),
            resume,
            Arc::new(NullNavigator),
        ));
        RefreshCoordinator::new(
            tokens.clone(),
            Arc::new(FixedExchange(TokenPair::new("a2", "r2"))),
            terminator,
            Duration::from_secs(5),
        )
    }

    /// Settles a refresh cycle right after the first access-token read, as
    /// another task finishing its exchange at that moment would.
    #[derive(Default)]
    struct SettlingStore {
        inner: InMemoryStore,
        coordinator: Mutex<Weak<RefreshCoordinator>>,
        armed: AtomicBool,
    }

    #[async_trait]
    impl KeyValueStore for SettlingStore {
        async fn get(&self, key: &str) -> Result<Option<StoredValue>, StorageError> {
            let value = self.inner.get(key).await?;
            if key == "accessToken" && self.armed.swap(false, Ordering::SeqCst) {
                self.inner
                    .set("accessToken", StoredValue::persistent("a2"))
                    .await?;
                if let Some(coordinator) = self.coordinator.lock().upgrade() {
                    coordinator.drain(&Ok("a2".to_string()));
                }
            }
            Ok(value)
        }

        async fn set(&self, key: &str, value: StoredValue) -> Result<(), StorageError> {
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key).await
        }
    }

    fn tokens() -> TokenStore {
        TokenStore::new(Arc::new(InMemoryStore::new()), Arc::new(WallClock))
    }

    #[tokio::test]
    async fn test_superseded_token_skips_exchange() {
        let tokens = tokens();
        tokens.set_tokens(&TokenPair::new("a2", "r2")).await.unwrap();
        let coordinator = coordinator(&tokens);

        let token = coordinator.recover(Some("a1")).await.unwrap();
        assert_eq!(token, "a2");
        assert_eq!(coordinator.exchange_count(), 0);
    }

    #[tokio::test]
    async fn test_exchange_stores_new_pair() {
        let tokens = tokens();
        tokens.set_tokens(&TokenPair::new("a1", "r1")).await.unwrap();
        let coordinator = coordinator(&tokens);

        let token = coordinator.recover(Some("a1")).await.unwrap();
        assert_eq!(token, "a2");
        assert_eq!(coordinator.exchange_count(), 1);
        assert_eq!(tokens.tokens().await, Some(TokenPair::new("a2", "r2")));
        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.queued(), 0);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_skips_exchange() {
        let tokens = tokens();
        let coordinator = coordinator(&tokens);

        let result = coordinator.recover(None).await;
        assert_eq!(result, Err(RefreshError::MissingRefreshToken));
        assert_eq!(coordinator.exchange_count(), 0);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_cycle_settling_after_token_read_skips_exchange() {
        let store = Arc::new(SettlingStore::default());
        let tokens = TokenStore::new(store.clone(), Arc::new(WallClock));
        tokens.set_tokens(&TokenPair::new("a1", "r1")).await.unwrap();
        let coordinator = Arc::new(coordinator(&tokens));
        *store.coordinator.lock() = Arc::downgrade(&coordinator);
        store.armed.store(true, Ordering::SeqCst);

        let token = coordinator.recover(Some("a1")).await.unwrap();
        assert_eq!(token, "a2");
        assert_eq!(coordinator.exchange_count(), 0);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_dropped_leader_releases_waiters() {
        let tokens = tokens();
        let coordinator = coordinator(&tokens);

        *coordinator.state.lock() = RefreshState::Refreshing { queue: Vec::new() };
        let (tx, rx) = oneshot::channel();
        if let RefreshState::Refreshing { queue } = &mut *coordinator.state.lock() {
            queue.push(PendingRequest { tx });
        }

        drop(Cycle::new(&coordinator));

        assert_eq!(rx.await.unwrap(), Err(RefreshError::Interrupted));
        assert!(!coordinator.is_refreshing());
    }
}

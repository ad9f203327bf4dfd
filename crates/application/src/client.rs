//! The authenticated admin client.
//!
//! Every admin call goes through [`AdminClient::send`]: the request is
//! decorated with the stored access token and sent. A first 401 is handed to
//! the refresh coordinator and the request is replayed once with the token it
//! hands back. Any other failure is returned as-is.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as Ttl;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::debug;
use vigor_domain::{ApiEnvelope, ApiRequest, ApiResponse, SessionEvent};

use crate::auth::{
    InMemoryStore, REFRESH_PATH, RefreshCoordinator, RequestDecorator, TokenStore, TokenTtl,
};
use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::{
    Attempt, Clock, HttpTransport, KeyValueStore, Navigator, NullNavigator, PreparedRequest,
};
use crate::session::{ResumeSlot, SessionTerminator};

/// Timeouts and endpoints of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Upper bound for ordinary calls.
    pub request_timeout: Duration,
    /// Upper bound for the refresh-token exchange.
    pub refresh_timeout: Duration,
    /// Path of the refresh-token exchange.
    pub refresh_path: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            refresh_timeout: Duration::from_secs(5),
            refresh_path: REFRESH_PATH.to_string(),
        }
    }
}

/// Client for the admin API. Cheap to clone; clones share tokens, refresh
/// state and the session event channel.
#[derive(Clone)]
pub struct AdminClient {
    transport: Arc<dyn HttpTransport>,
    tokens: TokenStore,
    decorator: RequestDecorator,
    coordinator: Arc<RefreshCoordinator>,
    terminator: Arc<SessionTerminator>,
}

impl AdminClient {
    /// Starts building a client around `transport` and `clock`.
    #[must_use]
    pub fn builder(transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>) -> AdminClientBuilder {
        AdminClientBuilder::new(transport, clock)
    }

    /// Sends an authenticated request.
    ///
    /// # Errors
    ///
    /// - `Transport` when no response arrived
    /// - `SessionExpired` when a 401 could not be recovered
    /// - `Status` for any other non-2xx response, including a 401 on the replay
    pub async fn send(&self, request: &ApiRequest) -> ApplicationResult<ApiResponse> {
        let request = Arc::new(request.clone());
        let mut prepared = self.decorator.prepare(Arc::clone(&request), Attempt::FIRST).await;

        loop {
            let result = self.transport.execute(&prepared).await;
            self.decorator.observe(&prepared, &result);
            let response = result?;

            if response.is_success() {
                return Ok(response);
            }
            if !response.status.is_unauthorized() || prepared.attempt.is_replay() {
                return Err(ApplicationError::from_response(response));
            }

            let token = self
                .coordinator
                .recover(prepared.access_token.as_deref())
                .await?;
            debug!(request_id = %prepared.id, "replaying request after refresh");
            prepared = self.decorator.prepare_with(
                Arc::clone(&request),
                Some(token),
                prepared.attempt.next(),
            );
        }
    }

    /// Sends an authenticated request and decodes the envelope.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send), plus `Decode` for a body that is not an
    /// envelope of `T` and `Rejected` for an envelope with status `error`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> ApplicationResult<ApiEnvelope<T>> {
        let response = self.send(request).await?;
        decode(&response)
    }

    /// Sends an authenticated request and returns the envelope data.
    ///
    /// # Errors
    ///
    /// As [`send_json`](Self::send_json), plus `Decode` when `data` is absent.
    pub async fn data<T: DeserializeOwned>(&self, request: &ApiRequest) -> ApplicationResult<T> {
        self.send_json(request)
            .await?
            .into_data()
            .ok_or_else(|| ApplicationError::Decode("response has no data".to_string()))
    }

    /// Sends a request without a credential and without refresh handling.
    /// Used for the login endpoints.
    ///
    /// # Errors
    ///
    /// `Transport` when no response arrived, `Status` for non-2xx responses.
    pub async fn send_public(&self, request: &ApiRequest) -> ApplicationResult<ApiResponse> {
        let prepared = self.decorator.prepare_anonymous(Arc::new(request.clone()));
        self.execute_once(&prepared).await
    }

    /// Sends an authenticated request once. A 401 is returned as a `Status`
    /// error instead of triggering a refresh.
    ///
    /// # Errors
    ///
    /// `Transport` when no response arrived, `Status` for non-2xx responses.
    pub async fn send_once(&self, request: &ApiRequest) -> ApplicationResult<ApiResponse> {
        let prepared = self
            .decorator
            .prepare(Arc::new(request.clone()), Attempt::FIRST)
            .await;
        self.execute_once(&prepared).await
    }

    async fn execute_once(
        &self,
        prepared: &PreparedRequest,
    ) -> ApplicationResult<ApiResponse> {
        let result = self.transport.execute(prepared).await;
        self.decorator.observe(prepared, &result);
        let response = result?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApplicationError::from_response(response))
        }
    }

    /// Subscribes to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.terminator.subscribe()
    }

    /// The token store shared by the pipeline.
    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// The session terminator shared by the pipeline.
    #[must_use]
    pub fn terminator(&self) -> &SessionTerminator {
        &self.terminator
    }

    /// The refresh coordinator shared by the pipeline.
    #[must_use]
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("decorator", &self.decorator)
            .field("coordinator", &self.coordinator)
            .field("terminator", &self.terminator)
            .finish_non_exhaustive()
    }
}

/// Decodes an envelope, turning an `error` status into `Rejected`.
pub(crate) fn decode<T: DeserializeOwned>(response: &ApiResponse) -> ApplicationResult<ApiEnvelope<T>> {
    let envelope: ApiEnvelope<T> = response
        .envelope()
        .map_err(|e| ApplicationError::Decode(e.to_string()))?;
    if envelope.is_success() {
        Ok(envelope)
    } else {
        Err(ApplicationError::Rejected(envelope.message))
    }
}

/// Builder for [`AdminClient`].
pub struct AdminClientBuilder {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    storage: Option<Arc<dyn KeyValueStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    token_ttl: TokenTtl,
    resume_ttl: Ttl,
    settings: ClientSettings,
}

impl AdminClientBuilder {
    /// Creates a builder with in-memory storage and no navigator.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            clock,
            storage: None,
            navigator: None,
            token_ttl: TokenTtl::default(),
            resume_ttl: Ttl::minutes(10),
            settings: ClientSettings::default(),
        }
    }

    /// Persists tokens and the resume location in `storage`.
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Reads the current location from `navigator` on session end.
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Sets the token lifetimes.
    #[must_use]
    pub const fn token_ttl(mut self, ttl: TokenTtl) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Sets how long a resume location stays valid.
    #[must_use]
    pub const fn resume_ttl(mut self, ttl: Ttl) -> Self {
        self.resume_ttl = ttl;
        self
    }

    /// Sets timeouts and the refresh path.
    #[must_use]
    pub fn settings(mut self, settings: ClientSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Wires the pipeline.
    #[must_use]
    pub fn build(self) -> AdminClient {
        let storage: Arc<dyn KeyValueStore> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(InMemoryStore::new()),
        };
        let navigator: Arc<dyn Navigator> = match self.navigator {
            Some(navigator) => navigator,
            None => Arc::new(NullNavigator),
        };

        let tokens = TokenStore::new(Arc::clone(&storage), Arc::clone(&self.clock))
            .with_ttl(self.token_ttl);
        let resume = ResumeSlot::new(storage, self.clock).with_ttl(self.resume_ttl);
        let terminator = Arc::new(SessionTerminator::new(tokens.clone(), resume, navigator));
        let coordinator = RefreshCoordinator::new(
            tokens.clone(),
            Arc::clone(&self.transport),
            Arc::clone(&terminator),
            self.settings.refresh_timeout,
        )
        .with_path(self.settings.refresh_path);

        AdminClient {
            decorator: RequestDecorator::new(tokens.clone(), self.settings.request_timeout),
            transport: self.transport,
            tokens,
            coordinator: Arc::new(coordinator),
            terminator,
        }
    }
}

impl std::fmt::Debug for AdminClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClientBuilder")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

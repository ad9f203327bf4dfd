//! Shared fixtures for pipeline tests: a scripted admin backend and
//! controllable host ports.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::json;
use vigor_application::ports::{
    Clock, HttpTransport, KeyValueStore, Navigator, PreparedRequest, StorageError, TransportError,
};
use vigor_application::{AdminClient, ClientSettings, InMemoryStore, TokenStore};
use vigor_domain::{ApiEnvelope, ApiResponse, ResumeLocation, StoredValue, TokenPair};

pub const REFRESH: &str = "/auth/admin/refresh-token";
pub const VERIFY: &str = "/auth/admin/verify-otp";

/// How the backend answers the refresh exchange.
#[derive(Debug, Clone)]
pub enum RefreshBehavior {
    /// Issue this pair after a short delay.
    Issue(TokenPair),
    /// Answer with this status and an error envelope.
    Reject(u16),
    /// Never answer within any sane timeout.
    Hang,
}

/// One call as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub path: String,
    pub authorization: Option<String>,
}

/// In-process admin backend.
///
/// - `/public` always answers 200
/// - `/missing` always answers 404
/// - `/always-401` always answers 401
/// - `/offline` fails with a transport timeout
/// - `/race` installs `race_pair` in `race_store` and answers 401, as if a
///   refresh by another task finished while this request was in flight
/// - anything else answers 200 for the accepted bearer token and 401 otherwise
pub struct ScriptedBackend {
    accepted: Mutex<Option<String>>,
    refresh: Mutex<RefreshBehavior>,
    refresh_delay: Duration,
    refresh_calls: AtomicUsize,
    calls: Mutex<Vec<Call>>,
    race_store: Mutex<Option<(TokenStore, TokenPair)>>,
}

impl ScriptedBackend {
    pub fn new(accepted: Option<&str>, refresh: RefreshBehavior) -> Arc<Self> {
        Arc::new(Self {
            accepted: Mutex::new(accepted.map(str::to_string)),
            refresh: Mutex::new(refresh),
            refresh_delay: Duration::from_millis(50),
            refresh_calls: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            race_store: Mutex::new(None),
        })
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Calls to `path` that carried `Bearer <token>`.
    pub fn calls_with(&self, path: &str, token: &str) -> usize {
        let bearer = format!("Bearer {token}");
        self.calls
            .lock()
            .iter()
            .filter(|call| call.path == path && call.authorization.as_deref() == Some(&bearer))
            .count()
    }

    pub fn arm_race(&self, tokens: TokenStore, pair: TokenPair) {
        *self.race_store.lock() = Some((tokens, pair));
    }

    fn ok(data: serde_json::Value) -> ApiResponse {
        let body = serde_json::to_vec(&ApiEnvelope::success("ok", data)).unwrap();
        ApiResponse::new(200u16, body, Duration::ZERO)
    }

    fn error(status: u16, message: &str) -> ApiResponse {
        let body = serde_json::to_vec(&ApiEnvelope::<()>::error(message)).unwrap();
        ApiResponse::new(status, body, Duration::ZERO)
    }

    async fn exchange(&self, prepared: &PreparedRequest) -> Result<ApiResponse, TransportError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        assert!(prepared.authorization().is_none(), "refresh must not carry a bearer");

        let behavior = self.refresh.lock().clone();
        match behavior {
            RefreshBehavior::Issue(pair) => {
                tokio::time::sleep(self.refresh_delay).await;
                *self.accepted.lock() = Some(pair.access_token.clone());
                Ok(Self::ok(serde_json::to_value(&pair).unwrap()))
            }
            RefreshBehavior::Reject(status) => {
                tokio::time::sleep(self.refresh_delay).await;
                Ok(Self::error(status, "Invalid refresh token"))
            }
            RefreshBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(TransportError::ConnectionFailed("hung".to_string()))
            }
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedBackend {
    async fn execute(&self, prepared: &PreparedRequest) -> Result<ApiResponse, TransportError> {
        let path = prepared.request.path.clone();
        let authorization = prepared.authorization();
        self.calls.lock().push(Call {
            path: path.clone(),
            authorization: authorization.clone(),
        });

        match path.as_str() {
            REFRESH => return self.exchange(prepared).await,
            VERIFY => {
                let pair = TokenPair::new("a-login", "r-login");
                *self.accepted.lock() = Some(pair.access_token.clone());
                return Ok(Self::ok(serde_json::to_value(&pair).unwrap()));
            }
            "/public" => return Ok(Self::ok(json!({ "public": true }))),
            "/missing" => return Ok(Self::error(404, "Order not found")),
            "/always-401" => return Ok(Self::error(401, "Unauthorized")),
            "/offline" => return Err(TransportError::timeout(Duration::from_millis(10))),
            "/race" => {
                let race = self.race_store.lock().take();
                if let Some((tokens, pair)) = race {
                    tokens.set_tokens(&pair).await.unwrap();
                    *self.accepted.lock() = Some(pair.access_token);
                    return Ok(Self::error(401, "jwt expired"));
                }
            }
            _ => {}
        }

        let accepted = self.accepted.lock().clone();
        match (authorization, accepted) {
            (Some(header), Some(token)) if header == format!("Bearer {token}") => {
                Ok(Self::ok(json!({ "path": path, "token": token })))
            }
            _ => Ok(Self::error(401, "jwt expired")),
        }
    }
}

pub struct WallClock;

impl Clock for WallClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Navigator whose location the test sets.
#[derive(Default)]
pub struct TestNavigator(Mutex<Option<ResumeLocation>>);

impl TestNavigator {
    pub fn at(location: &str) -> Arc<Self> {
        Arc::new(Self(Mutex::new(Some(ResumeLocation::parse(location).unwrap()))))
    }
}

impl Navigator for TestNavigator {
    fn current_location(&self) -> Option<ResumeLocation> {
        self.0.lock().clone()
    }
}

/// In-memory store that counts removals per key.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryStore,
    removals: Mutex<HashMap<String, usize>>,
}

impl CountingStore {
    pub fn removals(&self, key: &str) -> usize {
        self.removals.lock().get(key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: StoredValue) -> Result<(), StorageError> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        *self.removals.lock().entry(key.to_string()).or_default() += 1;
        self.inner.remove(key).await
    }
}

/// Client over `backend` with a counting store and the given navigator.
pub fn client(
    backend: &Arc<ScriptedBackend>,
    navigator: Arc<TestNavigator>,
) -> (AdminClient, Arc<CountingStore>) {
    let storage = Arc::new(CountingStore::default());
    let client = AdminClient::builder(backend.clone(), Arc::new(WallClock))
        .storage(storage.clone())
        .navigator(navigator)
        .settings(ClientSettings {
            refresh_timeout: Duration::from_millis(200),
            ..ClientSettings::default()
        })
        .build();
    (client, storage)
}

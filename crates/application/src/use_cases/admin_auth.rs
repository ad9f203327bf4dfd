//! Admin login with an emailed one-time password.

use tracing::{info, warn};
use vigor_domain::{
    ApiRequest, OtpRequest, OtpVerification, ResumeLocation, SessionEvent, TokenPair,
};

use crate::client::{AdminClient, decode};
use crate::error::{ApplicationError, ApplicationResult};

/// Paths of the admin auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    /// Mails a one-time password.
    pub login: String,
    /// Exchanges the one-time password for a token pair.
    pub verify: String,
    /// Ends the session server-side.
    pub logout: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/auth/admin/login".to_string(),
            verify: "/auth/admin/verify-otp".to_string(),
            logout: "/auth/admin/logout".to_string(),
        }
    }
}

/// Result of a completed login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Where the admin was when the previous session expired.
    pub resume: Option<ResumeLocation>,
}

/// Login, verification and logout for admins.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    client: AdminClient,
    endpoints: AuthEndpoints,
}

impl AdminAuth {
    /// Creates the use case with the default endpoints.
    #[must_use]
    pub fn new(client: AdminClient) -> Self {
        Self {
            client,
            endpoints: AuthEndpoints::default(),
        }
    }

    /// Overrides the endpoint paths.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: AuthEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Asks the backend to mail a one-time password to `email`.
    ///
    /// # Errors
    ///
    /// `Domain` for a malformed address; otherwise any error of the call.
    pub async fn request_otp(&self, email: &str) -> ApplicationResult<String> {
        let body = OtpRequest::new(email)?;
        let request = ApiRequest::post(&self.endpoints.login).with_json(&body)?;
        let response = self.client.send_public(&request).await?;
        let envelope = decode::<serde_json::Value>(&response)?;
        info!(email = %body.email, "one-time password requested");
        Ok(envelope.message)
    }

    /// Verifies the one-time password and starts a session.
    ///
    /// # Errors
    ///
    /// `Domain` for malformed input, `Decode` when no token pair came back,
    /// `Storage` when the tokens cannot be persisted; otherwise any error of
    /// the call.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> ApplicationResult<LoginOutcome> {
        let body = OtpVerification::new(email, otp)?;
        let request = ApiRequest::post(&self.endpoints.verify).with_json(&body)?;
        let response = self.client.send_public(&request).await?;
        let pair: TokenPair = decode(&response)?
            .into_data()
            .ok_or_else(|| ApplicationError::Decode("login response has no tokens".to_string()))?;

        self.client.tokens().set_tokens(&pair).await?;
        let terminator = self.client.terminator();
        terminator.rearm();
        terminator.notify(SessionEvent::LoggedIn);
        info!(email = %body.email, "admin logged in");

        Ok(LoginOutcome {
            resume: terminator.take_resume().await,
        })
    }

    /// Ends the session. The server call is best effort; local tokens are
    /// always cleared.
    pub async fn logout(&self) {
        let request = ApiRequest::post(&self.endpoints.logout);
        if let Err(e) = self.client.send_once(&request).await {
            warn!(error = %e, "server logout failed, clearing local session anyway");
        }
        self.client.tokens().clear_tokens().await;
        self.client.terminator().notify(SessionEvent::LoggedOut);
        info!("admin logged out");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::{
        Clock, HttpTransport, Navigator, PreparedRequest, TransportError,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use vigor_domain::{ApiEnvelope, ApiResponse, DomainError};

    struct WallClock;

    impl Clock for WallClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    struct OrdersScreen;

    impl Navigator for OrdersScreen {
        fn current_location(&self) -> Option<ResumeLocation> {
            ResumeLocation::parse("/orders?status=pending").ok()
        }
    }

    /// Answers by path and records (path, authorization) per call.
    #[derive(Default)]
    struct AuthBackend {
        calls: Mutex<Vec<(String, Option<String>)>>,
        logout_fails: bool,
    }

    #[async_trait]
    impl HttpTransport for AuthBackend {
        async fn execute(&self, prepared: &PreparedRequest) -> Result<ApiResponse, TransportError> {
            let path = prepared.request.path.clone();
            self.calls.lock().push((path.clone(), prepared.authorization()));
            let body = match path.as_str() {
                "/auth/admin/login" => serde_json::to_vec(&ApiEnvelope::<()>::acknowledged("OTP sent")),
                "/auth/admin/verify-otp" => serde_json::to_vec(&ApiEnvelope::success(
                    "Logged in",
                    TokenPair::new("a1", "r1"),
                )),
                "/auth/admin/logout" if self.logout_fails => {
                    return Err(TransportError::ConnectionFailed("refused".to_string()));
                }
                _ => serde_json::to_vec(&ApiEnvelope::<()>::acknowledged("ok")),
            };
            Ok(ApiResponse::new(200u16, body.unwrap(), Duration::ZERO))
        }
    }

    fn auth(backend: Arc<AuthBackend>) -> AdminAuth {
        let client = AdminClient::builder(backend, Arc::new(WallClock))
            .navigator(Arc::new(OrdersScreen))
            .build();
        AdminAuth::new(client)
    }

    #[tokio::test]
    async fn test_request_otp_is_anonymous() {
        let backend = Arc::new(AuthBackend::default());
        let auth = auth(backend.clone());
        auth.client.tokens().set_tokens(&TokenPair::new("old", "r0")).await.unwrap();

        let message = auth.request_otp(" Admin@Vigor.Bike ").await.unwrap();
        assert_eq!(message, "OTP sent");
        assert_eq!(
            backend.calls.lock().clone(),
            vec![("/auth/admin/login".to_string(), None)]
        );
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_backend() {
        let backend = Arc::new(AuthBackend::default());
        let auth = auth(backend.clone());

        let err = auth.verify_otp("admin@vigor.bike", "12ab").await.unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(DomainError::InvalidOtp)));
        assert!(backend.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_verify_stores_tokens_and_returns_resume() {
        let backend = Arc::new(AuthBackend::default());
        let auth = auth(backend);
        let mut events = auth.client.subscribe();

        auth.client.terminator().terminate("refresh rejected").await;
        assert!(events.recv().await.unwrap().is_expired());

        let outcome = auth.verify_otp("admin@vigor.bike", "123456").await.unwrap();
        assert_eq!(
            outcome.resume,
            Some(ResumeLocation::parse("/orders?status=pending").unwrap())
        );
        assert_eq!(
            auth.client.tokens().tokens().await,
            Some(TokenPair::new("a1", "r1"))
        );
        assert!(!auth.client.terminator().is_expired());
        assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedIn);

        let again = auth.verify_otp("admin@vigor.bike", "123456").await.unwrap();
        assert_eq!(again.resume, None);
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_server_fails() {
        let backend = Arc::new(AuthBackend {
            logout_fails: true,
            ..AuthBackend::default()
        });
        let auth = auth(backend.clone());
        let mut events = auth.client.subscribe();
        auth.client.tokens().set_tokens(&TokenPair::new("a1", "r1")).await.unwrap();

        auth.logout().await;

        assert!(auth.client.tokens().tokens().await.is_none());
        assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedOut);
        assert_eq!(
            backend.calls.lock().clone(),
            vec![("/auth/admin/logout".to_string(), Some("Bearer a1".to_string()))]
        );
    }
}

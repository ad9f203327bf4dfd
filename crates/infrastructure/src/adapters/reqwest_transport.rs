//! HTTP transport implementation using reqwest.
//!
//! Every call goes to `{base_url}/{api_version}{path}`. The bearer
//! credential, timeout and body come from the prepared request; this adapter
//! only moves bytes and reports what happened.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use tracing::trace;
use vigor_application::ports::{HttpTransport, PreparedRequest, TransportError};
use vigor_domain::{ApiResponse, HttpMethod};

/// HTTP transport for the admin API.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    api_root: Url,
}

impl ReqwestTransport {
    /// Creates a transport for `base_url` and `api_version`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root URL is unusable or the client cannot be
    /// created.
    pub fn new(base_url: &Url, api_version: &str, user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Self::with_client(client, base_url, api_version)
    }

    /// Creates a transport around an existing reqwest client.
    ///
    /// # Errors
    ///
    /// Returns an error if the root URL is unusable.
    pub fn with_client(client: Client, base_url: &Url, api_version: &str) -> Result<Self, TransportError> {
        let root = format!(
            "{}/{}/",
            base_url.as_str().trim_end_matches('/'),
            api_version.trim_matches('/')
        );
        let api_root = Url::parse(&root).map_err(|e| TransportError::InvalidUrl(format!("{e}: {root}")))?;
        Ok(Self { client, api_root })
    }

    /// Full URL for a request path and query.
    ///
    /// # Errors
    ///
    /// Returns an error if the result is not a valid URL.
    pub fn endpoint(&self, path: &str, query: &[(String, String)]) -> Result<Url, TransportError> {
        let raw = format!("{}{}", self.api_root, path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl(format!("{e}: {raw}")))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }
        if error.is_connect() {
            return TransportError::ConnectionFailed(error.to_string());
        }
        if error.is_builder() {
            return TransportError::InvalidRequest(error.to_string());
        }
        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, prepared: &PreparedRequest) -> Result<ApiResponse, TransportError> {
        let request = &prepared.request;
        let url = self.endpoint(&request.path, &request.query)?;
        let timeout_ms = u64::try_from(prepared.timeout.as_millis()).unwrap_or(u64::MAX);

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(prepared.timeout)
            .header("Accept", "application/json");
        if let Some(token) = &prepared.access_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?
            .to_vec();
        let duration = start.elapsed();

        trace!(request_id = %prepared.id, status, bytes = body.len(), "response received");

        Ok(headers
            .into_iter()
            .fold(ApiResponse::new(status, body, duration), |response, (name, value)| {
                response.with_header(&name, value)
            }))
    }
}

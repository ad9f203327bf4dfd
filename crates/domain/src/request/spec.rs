//! Immutable request descriptor
//!
//! An `ApiRequest` names an admin API call relative to the versioned base
//! URL. It carries no credentials: the bearer header is attached at send
//! time, so the same descriptor can be replayed after a token refresh.

use serde::Serialize;
use serde_json::Value;

use super::HttpMethod;
use crate::error::{DomainError, DomainResult};

/// Description of one admin API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path below the versioned base URL, always starting with `/`
    pub path: String,
    /// Query parameters in insertion order
    pub query: Vec<(String, String)>,
    /// Optional JSON body
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Creates a request for the given method and path.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl AsRef<str>) -> Self {
        let path = path.as_ref().trim();
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        Self {
            method,
            path,
            query: Vec::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl AsRef<str>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl AsRef<str>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Creates a PUT request.
    #[must_use]
    pub fn put(path: impl AsRef<str>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl AsRef<str>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Sets a raw JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `body` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBody` if the value cannot be represented as JSON.
    pub fn with_json<T: Serialize + ?Sized>(self, body: &T) -> DomainResult<Self> {
        let body = serde_json::to_value(body).map_err(|e| DomainError::InvalidBody(e.to_string()))?;
        Ok(self.with_body(body))
    }

    /// Path plus query string, for logs.
    #[must_use]
    pub fn target(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.path)
    }
}

//! Token and login payload types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Access/refresh token pair issued by the admin auth endpoints.
///
/// The backend sends this as `{ "accessToken": .., "refreshToken": .. }`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived bearer credential.
    pub access_token: String,
    /// Longer-lived credential exchanged for a new pair.
    pub refresh_token: String,
}

impl TokenPair {
    /// Creates a token pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

// Tokens never show up in logs in full.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &token_preview(&self.access_token))
            .field("refresh_token", &token_preview(&self.refresh_token))
            .finish()
    }
}

/// Returns a log-safe preview of a token (first 8 chars + ...).
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.chars().count() > 12 {
        let head: String = token.chars().take(8).collect();
        format!("{head}...")
    } else {
        "***".to_string()
    }
}

/// Which half of the token pair a stored value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// The bearer credential attached to requests.
    Access,
    /// The credential used for the refresh exchange.
    Refresh,
}

impl TokenKind {
    /// Key under which the token is persisted.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Access => "accessToken",
            Self::Refresh => "refreshToken",
        }
    }
}

/// A persisted value with an optional expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredValue {
    /// The raw value.
    pub value: String,
    /// When the value stops being readable, if ever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredValue {
    /// Creates a value that expires at the given instant.
    #[must_use]
    pub fn expiring(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Creates a value without expiry.
    #[must_use]
    pub fn persistent(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// Returns true once `now` has reached the expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Body of `POST /auth/admin/refresh-token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshTokenRequest {
    /// The refresh token being exchanged.
    pub token: String,
}

/// Body of `POST /auth/admin/login`, which mails a one-time password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpRequest {
    /// Admin email address.
    pub email: String,
}

impl OtpRequest {
    /// Validates and normalizes the email address.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidEmail` if the address is malformed.
    pub fn new(email: &str) -> DomainResult<Self> {
        Ok(Self {
            email: normalize_email(email)?,
        })
    }
}

/// Body of `POST /auth/admin/verify-otp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpVerification {
    /// Admin email address.
    pub email: String,
    /// The one-time password received by email.
    pub otp: String,
}

impl OtpVerification {
    /// Validates the email address and the one-time password.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidEmail` or `DomainError::InvalidOtp`.
    pub fn new(email: &str, otp: &str) -> DomainResult<Self> {
        let otp = otp.trim();
        if otp.is_empty() || !otp.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::InvalidOtp);
        }
        Ok(Self {
            email: normalize_email(email)?,
            otp: otp.to_string(),
        })
    }
}

fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email.to_lowercase())
        }
        _ => Err(DomainError::InvalidEmail(email.to_string())),
    }
}

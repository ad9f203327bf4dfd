//! Persisted token storage with expiry tracking.
//!
//! The store is the only writer of the access/refresh pair. Each half is
//! persisted under its own key with its own expiry; an expired entry reads
//! as absent and is removed on the way out.

use std::sync::Arc;

use chrono::Duration;
use tracing::warn;
use vigor_domain::{StoredValue, TokenKind, TokenPair};

use crate::ports::{Clock, KeyValueStore, StorageError};

/// Lifetimes applied when a token pair is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtl {
    /// Access token lifetime.
    pub access: Duration,
    /// Refresh token lifetime.
    pub refresh: Duration,
}

impl Default for TokenTtl {
    fn default() -> Self {
        Self {
            access: Duration::days(1),
            refresh: Duration::days(7),
        }
    }
}

/// Token store backed by a `KeyValueStore`.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: TokenTtl,
}

impl TokenStore {
    /// Creates a token store with default lifetimes.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            ttl: TokenTtl::default(),
        }
    }

    /// Overrides the token lifetimes.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: TokenTtl) -> Self {
        self.ttl = ttl;
        self
    }

    /// Persists both tokens with independent expirations.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    pub async fn set_tokens(&self, pair: &TokenPair) -> Result<(), StorageError> {
        let now = self.clock.now();
        self.storage
            .set(
                TokenKind::Access.storage_key(),
                StoredValue::expiring(&pair.access_token, now + self.ttl.access),
            )
            .await?;
        self.storage
            .set(
                TokenKind::Refresh.storage_key(),
                StoredValue::expiring(&pair.refresh_token, now + self.ttl.refresh),
            )
            .await
    }

    /// The current access token, if set and not expired.
    pub async fn access_token(&self) -> Option<String> {
        self.read(TokenKind::Access).await
    }

    /// The current refresh token, if set and not expired.
    pub async fn refresh_token(&self) -> Option<String> {
        self.read(TokenKind::Refresh).await
    }

    /// Both tokens, when both are present.
    pub async fn tokens(&self) -> Option<TokenPair> {
        let access = self.access_token().await?;
        let refresh = self.refresh_token().await?;
        Some(TokenPair::new(access, refresh))
    }

    /// Removes both tokens. Clearing an empty store is a no-op.
    pub async fn clear_tokens(&self) {
        for kind in [TokenKind::Access, TokenKind::Refresh] {
            if let Err(e) = self.storage.remove(kind.storage_key()).await {
                warn!(key = kind.storage_key(), error = %e, "failed to clear token");
            }
        }
    }

    /// Token status for display.
    pub async fn status(&self) -> TokenStatus {
        let now = self.clock.now();
        let access = self.entry(TokenKind::Access).await;
        let refresh = self.entry(TokenKind::Refresh).await;
        let can_refresh = refresh.as_ref().is_some_and(|r| !r.is_expired_at(now));

        match access {
            Some(entry) if !entry.is_expired_at(now) => TokenStatus::Valid {
                seconds_remaining: entry.expires_at.map(|exp| (exp - now).num_seconds()),
            },
            Some(_) => TokenStatus::Expired { can_refresh },
            None if can_refresh => TokenStatus::Expired { can_refresh },
            None => TokenStatus::NotAuthenticated,
        }
    }

    async fn entry(&self, kind: TokenKind) -> Option<StoredValue> {
        match self.storage.get(kind.storage_key()).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = kind.storage_key(), error = %e, "failed to read token");
                None
            }
        }
    }

    async fn read(&self, kind: TokenKind) -> Option<String> {
        let entry = self.entry(kind).await?;
        if entry.is_expired_at(self.clock.now()) {
            if let Err(e) = self.storage.remove(kind.storage_key()).await {
                warn!(key = kind.storage_key(), error = %e, "failed to drop expired token");
            }
            return None;
        }
        Some(entry.value)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

/// Status of the stored session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// No tokens are stored.
    NotAuthenticated,
    /// The access token is usable.
    Valid {
        /// Seconds until expiry, or None if no expiry.
        seconds_remaining: Option<i64>,
    },
    /// The access token is gone or expired.
    Expired {
        /// Whether a refresh token is still available.
        can_refresh: bool,
    },
}

impl TokenStatus {
    /// Returns true if requests will carry a credential.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Not authenticated".to_string(),
            Self::Valid {
                seconds_remaining: Some(secs),
            } => {
                if *secs > 3600 {
                    format!("Valid for {} hours", secs / 3600)
                } else if *secs > 60 {
                    format!("Valid for {} minutes", secs / 60)
                } else {
                    format!("Valid for {secs} seconds")
                }
            }
            Self::Valid {
                seconds_remaining: None,
            } => "Valid (no expiry)".to_string(),
            Self::Expired { can_refresh: true } => "Expired (will refresh on next request)".to_string(),
            Self::Expired { can_refresh: false } => "Expired".to_string(),
        }
    }
}

//! Short-lived storage for the post-login resume location.

use std::sync::Arc;

use chrono::Duration;
use tracing::warn;
use vigor_domain::{ResumeLocation, StoredValue};

use crate::ports::{Clock, KeyValueStore, StorageError};

/// Storage key of the resume location.
pub const RESUME_KEY: &str = "resumePath";

/// Holds at most one resume location, expiring after a short TTL.
#[derive(Clone)]
pub struct ResumeSlot {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ResumeSlot {
    /// Creates a slot with a ten minute lifetime.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            ttl: Duration::minutes(10),
        }
    }

    /// Overrides how long a stored location stays valid.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Stores `location`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    pub async fn store(&self, location: &ResumeLocation) -> Result<(), StorageError> {
        let expires_at = self.clock.now() + self.ttl;
        self.storage
            .set(RESUME_KEY, StoredValue::expiring(location.to_string(), expires_at))
            .await
    }

    /// Reads the stored location without consuming it.
    pub async fn peek(&self) -> Option<ResumeLocation> {
        let entry = match self.storage.get(RESUME_KEY).await {
            Ok(entry) => entry?,
            Err(e) => {
                warn!(error = %e, "failed to read resume location");
                return None;
            }
        };
        if entry.is_expired_at(self.clock.now()) {
            self.discard().await;
            return None;
        }
        match ResumeLocation::parse(&entry.value) {
            Ok(location) => Some(location),
            Err(e) => {
                warn!(error = %e, "dropping unreadable resume location");
                self.discard().await;
                None
            }
        }
    }

    /// Returns the stored location and removes it.
    pub async fn take(&self) -> Option<ResumeLocation> {
        let location = self.peek().await;
        if location.is_some() {
            self.discard().await;
        }
        location
    }

    async fn discard(&self) {
        if let Err(e) = self.storage.remove(RESUME_KEY).await {
            warn!(error = %e, "failed to clear resume location");
        }
    }
}

impl std::fmt::Debug for ResumeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeSlot").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

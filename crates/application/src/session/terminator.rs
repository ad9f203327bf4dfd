//! Ends a session that can no longer be recovered.
//!
//! Termination clears the token pair, remembers where the admin was and
//! broadcasts `SessionEvent::Expired` so the host can show its login screen.
//! Tokens are cleared on every call. The resume capture and the event happen
//! once per session: the latch is re-armed by the next successful login, or
//! when a token pair was stored since the last termination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use vigor_domain::{ResumeLocation, SessionEvent};

use super::ResumeSlot;
use crate::auth::TokenStore;
use crate::ports::Navigator;

const EVENT_CAPACITY: usize = 16;

/// Clears credentials and signals the host when a session ends.
pub struct SessionTerminator {
    tokens: TokenStore,
    resume: ResumeSlot,
    navigator: Arc<dyn Navigator>,
    events: broadcast::Sender<SessionEvent>,
    expired: AtomicBool,
}

impl SessionTerminator {
    /// Creates an armed terminator.
    #[must_use]
    pub fn new(tokens: TokenStore, resume: ResumeSlot, navigator: Arc<dyn Navigator>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            tokens,
            resume,
            navigator,
            events,
            expired: AtomicBool::new(false),
        }
    }

    /// Subscribes to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Broadcasts an event. Having no subscribers is fine.
    pub fn notify(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("no session event subscribers");
        }
    }

    /// Ends the session. Tokens are always cleared; returns false when the
    /// session was already ended and no new pair was stored since.
    pub async fn terminate(&self, reason: &str) -> bool {
        let reseeded =
            self.tokens.access_token().await.is_some() || self.tokens.refresh_token().await.is_some();
        self.tokens.clear_tokens().await;
        if reseeded {
            self.expired.store(false, Ordering::Release);
        }

        if self
            .expired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(reason, "session already terminated");
            return false;
        }

        let resume = self.navigator.current_location();
        if let Some(location) = &resume
            && let Err(e) = self.resume.store(location).await
        {
            warn!(error = %e, "failed to remember resume location");
        }

        info!(
            reason,
            resume = resume.as_ref().map(ToString::to_string).as_deref(),
            "session expired"
        );
        self.notify(SessionEvent::Expired {
            resume,
            reason: reason.to_string(),
        });
        true
    }

    /// Re-arms the latch after a successful login.
    pub fn rearm(&self) {
        self.expired.store(false, Ordering::Release);
    }

    /// True once terminated and not yet re-armed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    /// Consumes the location captured by the last termination.
    pub async fn take_resume(&self) -> Option<ResumeLocation> {
        self.resume.take().await
    }
}

impl std::fmt::Debug for SessionTerminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTerminator")
            .field("expired", &self.is_expired())
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

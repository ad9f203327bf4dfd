//! Host-driven navigator.

use std::sync::Arc;

use parking_lot::RwLock;
use vigor_application::ports::Navigator;
use vigor_domain::ResumeLocation;

/// Navigator whose location the host updates as the admin moves around.
/// Clones share the same location.
#[derive(Debug, Clone, Default)]
pub struct HostNavigator {
    location: Arc<RwLock<Option<ResumeLocation>>>,
}

impl HostNavigator {
    /// Creates a navigator with no location.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the current location.
    pub fn set(&self, location: ResumeLocation) {
        *self.location.write() = Some(location);
    }

    /// Forgets the current location, e.g. while on the login screen.
    pub fn clear(&self) {
        *self.location.write() = None;
    }
}

impl Navigator for HostNavigator {
    fn current_location(&self) -> Option<ResumeLocation> {
        self.location.read().clone()
    }
}

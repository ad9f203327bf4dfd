//! Navigator port
//!
//! The host application knows which screen the admin is looking at. When a
//! session ends the terminator asks the navigator for that location so it can
//! be offered again after the next login.

use vigor_domain::ResumeLocation;

/// Source of the host's current navigable location.
pub trait Navigator: Send + Sync {
    /// The location the admin is currently at, if the host has one.
    fn current_location(&self) -> Option<ResumeLocation>;
}

/// Navigator for hosts without a notion of location.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNavigator;

impl Navigator for NullNavigator {
    fn current_location(&self) -> Option<ResumeLocation> {
        None
    }
}

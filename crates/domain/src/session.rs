//! Session lifecycle types
//!
//! A `ResumeLocation` is where the admin was when the session ended, so the
//! host can send them back there after the next login.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A navigable location inside the dashboard: path plus optional query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResumeLocation {
    path: String,
    query: Option<String>,
}

impl ResumeLocation {
    /// Parses `"/users/123?tab=orders"` style locations.
    ///
    /// Fragments are dropped. Absolute and protocol-relative URLs are
    /// rejected so a resume location can never point off-site.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidLocation` for anything that is not a
    /// rooted in-app path.
    pub fn parse(location: &str) -> DomainResult<Self> {
        let location = location.trim();
        let location = location.split_once('#').map_or(location, |(head, _)| head);
        let (path, query) = match location.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (location, None),
        };

        if !path.starts_with('/') || path.starts_with("//") {
            return Err(DomainError::InvalidLocation(location.to_string()));
        }

        Ok(Self {
            path: path.to_string(),
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
        })
    }

    /// The path component.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The query component, without the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}

impl fmt::Display for ResumeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}?{query}", self.path),
            None => f.write_str(&self.path),
        }
    }
}

impl FromStr for ResumeLocation {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResumeLocation {
    type Error = DomainError;

    fn try_from(value: String) -> DomainResult<Self> {
        Self::parse(&value)
    }
}

impl From<ResumeLocation> for String {
    fn from(location: ResumeLocation) -> Self {
        location.to_string()
    }
}

/// Session lifecycle notifications broadcast to the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A login completed and tokens were stored.
    LoggedIn,
    /// The token pair was renewed after a 401.
    TokensRefreshed,
    /// The admin logged out on purpose.
    LoggedOut,
    /// The session could not be recovered; the host should show the login
    /// screen and, after login, return to `resume`.
    Expired {
        /// Where the admin was when the session ended.
        resume: Option<ResumeLocation>,
        /// Why the session ended.
        reason: String,
    },
}

impl SessionEvent {
    /// Returns true for `Expired`.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }
}

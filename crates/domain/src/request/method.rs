//! Verbs of the admin REST API

use std::fmt;

/// Admin API verb. Updates are full replacements, so there is no PATCH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    /// Read a collection or an item
    #[default]
    Get,
    /// Create an item or invoke an action
    Post,
    /// Replace an item
    Put,
    /// Remove an item
    Delete,
}

impl HttpMethod {
    /// Wire name of the verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

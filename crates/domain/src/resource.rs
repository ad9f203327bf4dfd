//! Admin REST resources

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Collections managed from the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Customer accounts
    Users,
    /// Shopping carts
    Carts,
    /// Orders
    Orders,
    /// Top-level product categories
    Categories,
    /// Categories nested under a category
    Subcategories,
    /// Products
    Products,
    /// Product variants (size, colour, ...)
    Variants,
    /// Uploaded images
    Images,
    /// Blog posts
    Blogs,
    /// Site settings
    Settings,
}

impl Resource {
    /// Every resource, in menu order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Users,
            Self::Carts,
            Self::Orders,
            Self::Categories,
            Self::Subcategories,
            Self::Products,
            Self::Variants,
            Self::Images,
            Self::Blogs,
            Self::Settings,
        ]
    }

    /// Lowercase resource name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Carts => "carts",
            Self::Orders => "orders",
            Self::Categories => "categories",
            Self::Subcategories => "subcategories",
            Self::Products => "products",
            Self::Variants => "variants",
            Self::Images => "images",
            Self::Blogs => "blogs",
            Self::Settings => "settings",
        }
    }

    /// Collection path below the versioned base URL.
    #[must_use]
    pub fn collection_path(self) -> String {
        format!("/{}", self.as_str())
    }

    /// Item path for `id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidIdentifier` for empty ids or ids
    /// containing path separators.
    pub fn item_path(self, id: &str) -> DomainResult<String> {
        let id = id.trim();
        if id.is_empty() || id.contains(['/', '?', '#']) {
            return Err(DomainError::InvalidIdentifier(id.to_string()));
        }
        Ok(format!("/{}/{id}", self.as_str()))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|resource| resource.as_str() == wanted)
            .ok_or_else(|| DomainError::UnknownResource(s.to_string()))
    }
}

/// Server-side page selector for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    pub limit: u32,
}

impl Page {
    /// Creates a page selector, clamping `page` to at least 1 and `limit` to 1..=100.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, 100),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

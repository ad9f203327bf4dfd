//! Authentication pipeline for the admin API.
//!
//! This module provides:
//! - Persisted token storage with independent access/refresh expiry
//! - The request decorator that attaches the bearer credential
//! - The refresh coordinator that renews tokens once per contention window

mod decorator;
mod memory_store;
mod refresh;
mod token_store;

pub use decorator::RequestDecorator;
pub use memory_store::InMemoryStore;
pub use refresh::{REFRESH_PATH, RefreshCoordinator, RefreshError};
pub use token_store::{TokenStatus, TokenStore, TokenTtl};

//! Vigor Admin Application Layer
//!
//! This crate contains the authenticated request pipeline and the use cases
//! built on it. It depends only on the domain layer and defines ports
//! (traits) for transport, storage, clock and navigation, implemented by the
//! infrastructure layer.

pub mod auth;
pub mod client;
pub mod error;
pub mod ports;
pub mod session;
pub mod use_cases;

pub use auth::{
    InMemoryStore, REFRESH_PATH, RefreshCoordinator, RefreshError, RequestDecorator, TokenStatus,
    TokenStore, TokenTtl,
};
pub use client::{AdminClient, AdminClientBuilder, ClientSettings};
pub use error::{ApplicationError, ApplicationResult};
pub use session::{ResumeSlot, SessionTerminator};
pub use use_cases::{AdminAuth, AuthEndpoints, LoginOutcome, ResourceClient};

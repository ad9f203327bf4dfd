//! Application use cases (business logic orchestration).

mod admin_auth;
mod resources;

pub use admin_auth::{AdminAuth, AuthEndpoints, LoginOutcome};
pub use resources::ResourceClient;

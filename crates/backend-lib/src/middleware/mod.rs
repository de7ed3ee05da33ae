// crates/backend-lib/src/middleware/mod.rs

//! Request admission middleware for the Medika API server.

pub mod auth;
pub mod role;

pub use auth::{require_auth, AuthContext, AuthGate, BearerToken, Rejection};
pub use role::{require_role, ADMIN_ROLES};

#[cfg(test)]
mod tests;

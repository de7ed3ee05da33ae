// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the Medika API server: token-based
//! authentication with server-side revocation, and user management.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod store;
pub mod users;

use crate::auth::{AuthError, CredentialVerifier, SessionManager, TokenCodec};
use crate::config::Settings;
use crate::middleware::AuthGate;
use crate::storage::PrincipalStore;
use crate::store::SessionStore;
use crate::users::{UserError, UserService};
use std::sync::Arc;
use tracing::info;

pub use router::create_router;

/// Application state shared across all handlers
pub struct AppState {
    /// Login, logout, refresh and revocation
    pub sessions: Arc<SessionManager>,
    /// User management
    pub users: Arc<UserService>,
    /// Bearer-token admission
    pub gate: Arc<AuthGate>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire the components over the given backends
    pub fn new(
        settings: Settings,
        store: Arc<dyn SessionStore>,
        principals: Arc<dyn PrincipalStore>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Result<Self, AuthError> {
        let codec = Arc::new(TokenCodec::new(
            &settings.jwt.secret,
            settings.jwt.access_ttl(),
            settings.jwt.refresh_ttl(),
        )?);

        let sessions = Arc::new(SessionManager::new(
            codec.clone(),
            store.clone(),
            principals.clone(),
            verifier.clone(),
        ));
        let users = Arc::new(UserService::new(principals, verifier, sessions.clone()));
        let gate = Arc::new(AuthGate::new(codec, store));

        Ok(Self {
            sessions,
            users,
            gate,
            settings: Arc::new(settings),
        })
    }

    /// Create the configured bootstrap admin if it does not exist yet
    pub async fn bootstrap_admin(&self) -> Result<(), UserError> {
        let Some(admin) = &self.settings.bootstrap_admin else {
            return Ok(());
        };

        if self
            .users
            .ensure_bootstrap_admin(&admin.name, &admin.email, &admin.password)
            .await?
        {
            info!(email = %admin.email, "Created bootstrap admin");
        }
        Ok(())
    }
}

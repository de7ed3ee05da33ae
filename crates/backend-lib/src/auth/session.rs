// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Session lifecycle: login, logout, refresh and forced invalidation.
//!
//! A token is admitted only if its signature and expiry check out AND it is
//! not on the blacklist. Active-session records exist so that a new login can
//! find and revoke every earlier token of the same principal.
use super::{AuthError, CredentialVerifier, TokenCodec, TokenPair};
use crate::metrics::{LOGIN_FAILED, LOGIN_SUCCEEDED, LOGOUT, SESSIONS_INVALIDATED, TOKEN_REFRESHED};
use crate::storage::{Principal, PrincipalStore};
use crate::store::{self, SessionStore, ACTIVE, BLACKLISTED};
use chrono::Utc;
use medika_common::PrincipalId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Orchestrates the token lifecycle over the codec and the two stores
pub struct SessionManager {
    codec: Arc<TokenCodec>,
    sessions: Arc<dyn SessionStore>,
    principals: Arc<dyn PrincipalStore>,
    verifier: Arc<dyn CredentialVerifier>,
    /// Checked against when no usable record exists, so every failed login costs one verification
    dummy_hash: String,
}

const DUMMY_SECRET: &str = "medika-no-such-principal";

impl SessionManager {
    pub fn new(
        codec: Arc<TokenCodec>,
        sessions: Arc<dyn SessionStore>,
        principals: Arc<dyn PrincipalStore>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        let dummy_hash = verifier.hash(DUMMY_SECRET).unwrap_or_else(|err| {
            warn!(error = %err, "Failed to prepare dummy credential hash");
            String::new()
        });

        Self {
            codec,
            sessions,
            principals,
            verifier,
            dummy_hash,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authenticate by email and secret, revoke earlier sessions, issue a new pair
    pub async fn login(&self, email: &str, secret: &str) -> Result<TokenPair, AuthError> {
        let found = self.principals.find_by_email(email).await?;

        // Unknown and inactive accounts still pay for one verification.
        let hash = match &found {
            Some(p) if p.active => p.password_hash.as_str(),
            _ => self.dummy_hash.as_str(),
        };
        let verified = self.verifier.verify(secret, hash);

        let principal = match found {
            Some(p) if p.active && verified => p,
            Some(p) => {
                ::metrics::counter!(LOGIN_FAILED).increment(1);
                warn!(principal_id = p.id, active = p.active, "Password verification failed");
                return Err(AuthError::InvalidCredentials);
            },
            None => {
                ::metrics::counter!(LOGIN_FAILED).increment(1);
                warn!(email, "Login for unknown email");
                return Err(AuthError::InvalidCredentials);
            },
        };

        // Single-session enforcement is advisory; login must not fail on it.
        if let Err(err) = self.invalidate_other_sessions(principal.id).await {
            warn!(principal_id = principal.id, error = %err, "Failed to invalidate other sessions");
        }

        let pair = self.issue(&principal).await?;
        ::metrics::counter!(LOGIN_SUCCEEDED).increment(1);
        info!(principal_id = principal.id, "Login succeeded");
        Ok(pair)
    }

    /// Blacklist `token` for the rest of its lifetime and drop its session record
    pub async fn logout(&self, token: &str, principal_id: PrincipalId) -> Result<(), AuthError> {
        let now = Utc::now();
        // fall back to the full lifetime when the remaining one is unknown
        let ttl = self
            .codec
            .parse_access(token)
            .ok()
            .and_then(|claims| claims.remaining(now))
            .unwrap_or_else(|| self.codec.access_ttl());

        self.sessions
            .set(token, BLACKLISTED, ttl)
            .await
            .map_err(AuthError::Revocation)?;

        let key = store::active_session_key(principal_id, token);
        if let Err(err) = self.sessions.delete(&[key]).await {
            warn!(principal_id, error = %err, "Failed to remove token from active sessions");
        }

        ::metrics::counter!(LOGOUT).increment(1);
        info!(principal_id, ttl_secs = ttl.as_secs(), "Logged out");
        Ok(())
    }

    /// Exchange a valid refresh token for a new pair.
    ///
    /// The presented refresh token stays valid until it expires.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let principal_id = self.codec.parse_refresh(refresh_token)?;

        let principal = match self.principals.find_by_id(principal_id).await? {
            Some(p) if p.active => p,
            _ => return Err(AuthError::PrincipalNotFound(principal_id)),
        };

        let pair = self.issue(&principal).await?;
        ::metrics::counter!(TOKEN_REFRESHED).increment(1);
        debug!(principal_id, "Refreshed token pair");
        Ok(pair)
    }

    /// Blacklist every active token of `principal_id` and clear its session records.
    ///
    /// Returns how many sessions were found.
    pub async fn invalidate_other_sessions(&self, principal_id: PrincipalId) -> Result<usize, AuthError> {
        let prefix = store::active_session_prefix(principal_id);
        let keys = self
            .sessions
            .keys_matching(&store::active_session_pattern(principal_id))
            .await
            .map_err(AuthError::SessionInvalidation)?;

        if keys.is_empty() {
            return Ok(0);
        }

        // Each entry uses the full lifetime; the token's own remaining time is not looked up.
        let ttl = self.codec.access_ttl();
        for key in &keys {
            let Some(token) = key.strip_prefix(&prefix) else {
                continue;
            };
            if let Err(err) = self.sessions.set(token, BLACKLISTED, ttl).await {
                warn!(principal_id, error = %err, "Failed to blacklist session token");
            }
        }

        self.sessions
            .delete(&keys)
            .await
            .map_err(AuthError::SessionInvalidation)?;

        ::metrics::counter!(SESSIONS_INVALIDATED).increment(keys.len() as u64);
        info!(principal_id, count = keys.len(), "Invalidated sessions");
        Ok(keys.len())
    }

    /// Mint a pair for `principal` and record the access token as active
    async fn issue(&self, principal: &Principal) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access = self
            .codec
            .mint_access(principal.id, &principal.email, principal.role, now)?;
        let refresh = self.codec.mint_refresh(principal.id, now)?;

        let ttl = access.claims.remaining(now).unwrap_or(Duration::from_secs(1));
        self.sessions
            .set(&store::active_session_key(principal.id, &access.value), ACTIVE, ttl)
            .await?;

        Ok(TokenPair { access, refresh })
    }
}

// ============================
// crates/backend-lib/src/auth/error.rs
// ============================
//! Failures of the authentication/session subsystem.
use crate::storage::StorageError;
use crate::store::StoreError;
use medika_common::PrincipalId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown email, inactive account or wrong secret. Never distinguished to the caller.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token subject is not a principal id: {0:?}")]
    MalformedSubject(String),

    #[error("principal {0} not found")]
    PrincipalNotFound(PrincipalId),

    #[error("failed to sign token: {0}")]
    TokenMint(String),

    #[error("failed to blacklist token: {0}")]
    Revocation(#[source] StoreError),

    #[error("failed to invalidate sessions: {0}")]
    SessionInvalidation(#[source] StoreError),

    #[error("session store error: {0}")]
    SessionStore(#[from] StoreError),

    #[error("user store error: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Caller-caused failures (bad secret, bad or stale token); everything else is infrastructure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::InvalidToken(_)
                | AuthError::MalformedSubject(_)
                | AuthError::PrincipalNotFound(_)
        )
    }
}

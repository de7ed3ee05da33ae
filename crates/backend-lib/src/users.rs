// ============================
// crates/backend-lib/src/users.rs
// ============================
//! User management on top of the principal store.
use crate::auth::{CredentialVerifier, SessionManager};
use crate::storage::{NewPrincipal, Principal, PrincipalStore, StorageError};
use medika_common::{CreateUserRequest, ListUsersQuery, PrincipalId, Role, UpdateUserRequest};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum UserError {
    #[error("user {0} not found")]
    NotFound(PrincipalId),

    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("incorrect old password")]
    IncorrectPassword,

    #[error("failed to process password: {0}")]
    Hash(String),

    #[error("user store error: {0}")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for UserError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateEmail(email) => UserError::EmailTaken(email),
            StorageError::NotFound(id) => UserError::NotFound(id),
            other => UserError::Storage(other),
        }
    }
}

pub struct UserService {
    principals: Arc<dyn PrincipalStore>,
    verifier: Arc<dyn CredentialVerifier>,
    sessions: Arc<SessionManager>,
}

impl UserService {
    pub fn new(
        principals: Arc<dyn PrincipalStore>,
        verifier: Arc<dyn CredentialVerifier>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            principals,
            verifier,
            sessions,
        }
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> Result<Principal, UserError> {
        if self.principals.find_by_email(&req.email).await?.is_some() {
            return Err(UserError::EmailTaken(req.email));
        }

        let password_hash = self.hash(&req.password)?;
        let principal = self
            .principals
            .create(NewPrincipal {
                name: req.name,
                email: req.email,
                password_hash,
                role: req.role,
            })
            .await?;

        info!(principal_id = principal.id, role = %principal.role, "Created user");
        Ok(principal)
    }

    pub async fn get_user(&self, id: PrincipalId) -> Result<Principal, UserError> {
        self.principals
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// Change name and/or email. Password and role are left untouched.
    pub async fn update_user(&self, id: PrincipalId, req: UpdateUserRequest) -> Result<Principal, UserError> {
        let mut principal = self.get_user(id).await?;
        if let Some(name) = req.name {
            principal.name = name;
        }
        if let Some(email) = req.email {
            principal.email = email;
        }

        self.principals.update(&principal).await?;
        info!(principal_id = id, "Updated user");
        self.get_user(id).await
    }

    pub async fn list_users(&self, query: &ListUsersQuery) -> Result<Vec<Principal>, UserError> {
        Ok(self.principals.list(query).await?)
    }

    /// Remove the record, then revoke whatever sessions it still had
    pub async fn delete_user(&self, id: PrincipalId) -> Result<(), UserError> {
        if !self.principals.delete(id).await? {
            return Err(UserError::NotFound(id));
        }
        info!(principal_id = id, "Deleted user");

        if let Err(err) = self.sessions.invalidate_other_sessions(id).await {
            warn!(principal_id = id, error = %err, "Failed to invalidate sessions of deleted user");
        }
        Ok(())
    }

    pub async fn change_password(&self, id: PrincipalId, old: &str, new: &str) -> Result<(), UserError> {
        let mut principal = self.get_user(id).await?;
        if !self.verifier.verify(old, &principal.password_hash) {
            return Err(UserError::IncorrectPassword);
        }

        principal.password_hash = self.hash(new)?;
        self.principals.update(&principal).await?;
        info!(principal_id = id, "Changed password");
        Ok(())
    }

    /// Create a super admin with `email` unless one already exists.
    ///
    /// Returns `true` when a record was created.
    pub async fn ensure_bootstrap_admin(&self, name: &str, email: &str, password: &str) -> Result<bool, UserError> {
        if self.principals.find_by_email(email).await?.is_some() {
            return Ok(false);
        }

        self.create_user(CreateUserRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Role::SuperAdmin,
        })
        .await?;
        Ok(true)
    }

    fn hash(&self, secret: &str) -> Result<String, UserError> {
        self.verifier
            .hash(secret)
            .map_err(|e| UserError::Hash(e.to_string()))
    }
}

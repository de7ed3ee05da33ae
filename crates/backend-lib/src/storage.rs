// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! User record store abstraction with flat-file implementation.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use medika_common::{ListUsersQuery, PrincipalId, Role, UserResponse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::{fs as tokio_fs, sync::RwLock};
use tracing::debug;

/// Default page size for listings
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size a listing may request
pub const MAX_PAGE_SIZE: u32 = 100;

const USERS_FILE: &str = "users.json";

/// User record store failures
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error("principal {0} not found")]
    NotFound(PrincipalId),
}

/// A stored user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    /// Public view, without the password hash
    pub fn profile(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            active: self.active,
            created_at: self.created_at,
        }
    }
}

/// Fields needed to create a principal; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Trait for user record backends
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StorageError>;

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>, StorageError>;

    async fn create(&self, new: NewPrincipal) -> Result<Principal, StorageError>;

    /// Replace the stored record with the same id
    async fn update(&self, principal: &Principal) -> Result<(), StorageError>;

    /// Remove a record, returning whether it existed
    async fn delete(&self, id: PrincipalId) -> Result<bool, StorageError>;

    /// Active records, newest first, paged
    async fn list(&self, query: &ListUsersQuery) -> Result<Vec<Principal>, StorageError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserTable {
    next_id: PrincipalId,
    users: BTreeMap<PrincipalId, Principal>,
}

impl UserTable {
    fn email_taken(&self, email: &str, except: Option<PrincipalId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// Flat-file implementation of [`PrincipalStore`]: one JSON document,
/// held in memory and written through on every mutation.
#[derive(Clone)]
pub struct FlatFileStorage {
    path: PathBuf,
    table: Arc<RwLock<UserTable>>,
}

impl FlatFileStorage {
    /// Open (or create) the store under `root`
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref();
        tokio_fs::create_dir_all(root).await?;
        let path = root.join(USERS_FILE);

        let table = if tokio_fs::try_exists(&path).await? {
            let content = tokio_fs::read(&path).await?;
            serde_json::from_slice(&content)?
        } else {
            UserTable {
                next_id: 1,
                ..UserTable::default()
            }
        };
        debug!(path = %path.display(), users = table.users.len(), "Opened user store");

        Ok(Self {
            path,
            table: Arc::new(RwLock::new(table)),
        })
    }

    async fn persist(&self, table: &UserTable) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(table)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl PrincipalStore for FlatFileStorage {
    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StorageError> {
        let table = self.table.read().await;
        Ok(table.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>, StorageError> {
        let table = self.table.read().await;
        Ok(table.users.get(&id).cloned())
    }

    async fn create(&self, new: NewPrincipal) -> Result<Principal, StorageError> {
        let mut table = self.table.write().await;
        if table.email_taken(&new.email, None) {
            return Err(StorageError::DuplicateEmail(new.email));
        }

        let now = Utc::now();
        let principal = Principal {
            id: table.next_id.max(1),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            active: true,
            created_at: now,
            updated_at: now,
        };
        table.next_id = principal.id + 1;
        table.users.insert(principal.id, principal.clone());

        if let Err(e) = self.persist(&table).await {
            // keep memory and disk in step
            table.users.remove(&principal.id);
            return Err(e);
        }
        Ok(principal)
    }

    async fn update(&self, principal: &Principal) -> Result<(), StorageError> {
        let mut table = self.table.write().await;
        if !table.users.contains_key(&principal.id) {
            return Err(StorageError::NotFound(principal.id));
        }
        if table.email_taken(&principal.email, Some(principal.id)) {
            return Err(StorageError::DuplicateEmail(principal.email.clone()));
        }

        let mut updated = principal.clone();
        updated.updated_at = Utc::now();
        let previous = table.users.insert(updated.id, updated);

        if let Err(e) = self.persist(&table).await {
            if let Some(previous) = previous {
                table.users.insert(previous.id, previous);
            }
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, id: PrincipalId) -> Result<bool, StorageError> {
        let mut table = self.table.write().await;
        let Some(removed) = table.users.remove(&id) else {
            return Ok(false);
        };

        if let Err(e) = self.persist(&table).await {
            table.users.insert(id, removed);
            return Err(e);
        }
        Ok(true)
    }

    async fn list(&self, query: &ListUsersQuery) -> Result<Vec<Principal>, StorageError> {
        let page = query.page.unwrap_or(1).max(1) as usize;
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE) as usize;
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let table = self.table.read().await;
        let mut matching: Vec<&Principal> = table
            .users
            .values()
            .filter(|u| u.active)
            .filter(|u| match &search {
                Some(needle) => u.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(matching
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect())
    }
}

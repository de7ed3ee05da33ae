// ============================
// crates/backend-lib/src/store/mod.rs
// ============================
//! Session store abstraction: TTL-capable key-value service used for
//! revocation bookkeeping (active sessions and the token blacklist).
//!
//! Layout:
//! - `user:<principal_id>:token:<access_token>` -> `"active"`
//! - `<access_token>` -> `"blacklisted"`
//!
//! Every operation is atomic per key. Nothing here relies on cross-key
//! transactions.

pub mod memory;
pub mod redis;

pub use self::memory::MemorySessionStore;
pub use self::redis::RedisSessionStore;

use async_trait::async_trait;
use medika_common::PrincipalId;
use std::time::Duration;
use thiserror::Error;

/// Value stored under an active-session key
pub const ACTIVE: &str = "active";

/// Value stored under a blacklisted token
pub const BLACKLISTED: &str = "blacklisted";

/// Session store failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Capability required by the session manager and the auth gate
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Write `value` under `key`, expiring after `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Read the value under `key`, `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Remove every key in `keys`, returning how many existed
    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError>;

    /// All live keys matching a `*` glob pattern
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, StoreError>;
}

/// Prefix shared by every active-session key of a principal
pub fn active_session_prefix(principal_id: PrincipalId) -> String {
    format!("user:{principal_id}:token:")
}

/// Glob matching every active-session key of a principal
pub fn active_session_pattern(principal_id: PrincipalId) -> String {
    format!("{}*", active_session_prefix(principal_id))
}

/// Key marking `token` as an active session of `principal_id`
pub fn active_session_key(principal_id: PrincipalId, token: &str) -> String {
    format!("{}{token}", active_session_prefix(principal_id))
}

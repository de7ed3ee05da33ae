// ============================
// crates/backend-lib/src/store/memory.rs
// ============================
//! In-process session store: a test double for the Redis store. Entries expire
//! lazily on access, so nothing here bounds memory for long-running use.
use super::{SessionStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// `DashMap`-backed session store with lazy expiry
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining lifetime of `key`, `None` if absent or expired
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.expires_at - now)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let value = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => None,
            None => return Ok(None),
        };
        // expired: evict outside the read guard
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(value)
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        let now = Instant::now();
        let removed = keys
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .filter(|(_, entry)| entry.is_live(now))
            .count();
        Ok(removed as u64)
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        Ok(self
            .entries
            .iter()
            .filter(|e| e.is_live(now) && glob_match(pattern, e.key()))
            .map(|e| e.key().clone())
            .collect())
    }
}

/// Match `candidate` against a pattern where `*` stands for any run of characters.
fn glob_match(pattern: &str, candidate: &str) -> bool {
    let mut segments = pattern.split('*');
    let head = segments.next().unwrap_or_default();
    let Some(mut rest) = candidate.strip_prefix(head) else {
        return false;
    };

    let tail: Vec<&str> = segments.collect();
    let Some((last, middle)) = tail.split_last() else {
        // no `*` at all
        return rest.is_empty();
    };

    for segment in middle {
        match rest.find(segment) {
            Some(idx) => rest = &rest[idx + segment.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matching() {
        assert!(glob_match("user:1:token:*", "user:1:token:abc"));
        assert!(glob_match("user:1:token:*", "user:1:token:"));
        assert!(!glob_match("user:1:token:*", "user:10:token:abc"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
        assert!(glob_match("a*c*e", "abcde"));
        assert!(!glob_match("a*c*e", "abcd"));
        assert!(glob_match("*", "anything"));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemorySessionStore::new();
        store.set("k", "v", Duration::from_secs(5)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.ttl("k"), Some(Duration::from_secs(5)));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.ttl("k"), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn set_overwrites_value_and_ttl() {
        let store = MemorySessionStore::new();
        store.set("k", "active", Duration::from_secs(60)).await.unwrap();
        store.set("k", "blacklisted", Duration::from_secs(600)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("blacklisted"));
        assert!(store.ttl("k").unwrap() > Duration::from_secs(60));
    }

    #[tokio::test]
    async fn delete_counts_only_existing_keys() {
        let store = MemorySessionStore::new();
        store.set("a", "1", Duration::from_secs(60)).await.unwrap();
        store.set("b", "1", Duration::from_secs(60)).await.unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(store.delete(&keys).await.unwrap(), 2);
        assert_eq!(store.delete(&keys).await.unwrap(), 0);
        assert_eq!(store.delete(&[]).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_matching_skips_expired_entries() {
        let store = MemorySessionStore::new();
        store.set("user:1:token:a", "active", Duration::from_secs(1)).await.unwrap();
        store.set("user:1:token:b", "active", Duration::from_secs(60)).await.unwrap();
        store.set("user:2:token:c", "active", Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        let keys = store.keys_matching("user:1:token:*").await.unwrap();
        assert_eq!(keys, vec!["user:1:token:b".to_string()]);

        store.purge_expired();
        assert_eq!(store.len(), 2);
    }
}

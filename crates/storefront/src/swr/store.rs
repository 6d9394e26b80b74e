//! Key-value store abstraction used by the SWR cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use thiserror::Error;

/// Errors reported by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the operation.
    #[error("store operation failed: {0}")]
    Operation(String),
}

/// A shared, externally synchronized string store.
///
/// Implementations must be safe for concurrent use; the SWR cache takes no
/// locks of its own around store operations.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read a value. `Ok(None)` means the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value with no expiry.
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Write a value that expires after `ttl`.
    async fn set_with_expiry(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Remove a value.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Clone)]
struct StoredValue {
    value: Arc<str>,
    ttl: Option<Duration>,
}

/// Expires each entry after its own TTL; entries without one live until evicted.
struct PerEntryExpiry;

impl Expiry<String, StoredValue> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// In-process store backed by `moka`.
///
/// Bounded by entry count; least recently used entries are evicted first.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<String, StoredValue>,
}

impl MemoryStore {
    /// Create a store holding at most `max_entries` values.
    #[must_use]
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryExpiry)
            .build();

        Self { cache }
    }

    /// Number of live entries (approximate until pending tasks run).
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .cache
            .get(key)
            .await
            .map(|stored| stored.value.to_string()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.cache
            .insert(
                key.to_owned(),
                StoredValue {
                    value: value.into(),
                    ttl: None,
                },
            )
            .await;
        Ok(())
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.cache
            .insert(
                key.to_owned(),
                StoredValue {
                    value: value.into(),
                    ttl: Some(ttl),
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new(100);
        store.set("a", "1".to_string()).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expiry_removes_value() {
        let store = MemoryStore::new(100);
        store
            .set_with_expiry("marker", "true".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        assert!(store.get("marker").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(store.get("marker").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_plain_set_clears_previous_expiry() {
        let store = MemoryStore::new(100);
        store
            .set_with_expiry("k", "old".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        store.set("k", "new".to_string()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new(100);
        store.set("a", "1".to_string()).await.unwrap();
        store.delete("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
    }
}

//! In-memory key-value backend (default, thread-safe, async).
//!
//! Stands in for Redis in tests and local runs. Uses DashMap for concurrent
//! access and mirrors the Redis command semantics the components rely on:
//! plain values vs. lists (WRONGTYPE on mismatch), INCR on decimal text, and
//! lazy TTL expiry on access.
//!
//! Expiry is measured with `tokio::time::Instant`, so tests can pause and
//! advance the clock instead of sleeping.

use super::CacheBackend;
use crate::error::{Error, Result};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

enum StoredData {
    Value(Vec<u8>),
    List(Vec<Vec<u8>>),
}

/// In-memory store entry with optional expiration.
struct StoredEntry {
    data: StoredData,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn value(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        StoredEntry {
            data: StoredData::Value(data),
            expires_at,
        }
    }

    fn list() -> Self {
        StoredEntry {
            data: StoredData::List(Vec::new()),
            expires_at: None,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// Thread-safe async in-memory key-value backend.
///
/// # Example
///
/// ```no_run
/// use cache_ledger::backend::{InMemoryBackend, CacheBackend};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     backend.set("key1", b"value".to_vec(), None).await?;
///     assert_eq!(backend.incr("hits").await?, 1);
///     backend.rpush("log", b"first".to_vec()).await?;
///
///     backend.set("key2", b"expires".to_vec(), Some(Duration::from_secs(10))).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, StoredEntry>>,
}

impl InMemoryBackend {
    /// Create a new, empty in-memory backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Number of keys currently held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drop the key if its TTL has elapsed.
    fn evict_if_expired(&self, key: &str) {
        self.store.remove_if(key, |_, entry| entry.is_expired());
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve Redis-style inclusive, possibly negative, bounds against `len`.
fn list_bounds(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.evict_if_expired(key);

        match self.store.get(key) {
            Some(entry) => match &entry.data {
                StoredData::Value(bytes) => {
                    debug!("✓ InMemory GET {} -> HIT", key);
                    Ok(Some(bytes.clone()))
                }
                StoredData::List(_) => Err(Error::BackendError(WRONGTYPE.to_string())),
            },
            None => {
                debug!("✓ InMemory GET {} -> MISS", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        self.store
            .insert(key.to_string(), StoredEntry::value(value, ttl));

        if let Some(d) = ttl {
            debug!("✓ InMemory SET {} (TTL: {:?})", key, d);
        } else {
            debug!("✓ InMemory SET {}", key);
        }

        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.evict_if_expired(key);

        let mut entry = self
            .store
            .entry(key.to_string())
            .or_insert_with(|| StoredEntry::value(b"0".to_vec(), None));

        let StoredData::Value(bytes) = &mut entry.data else {
            return Err(Error::BackendError(WRONGTYPE.to_string()));
        };

        let current: i64 = std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                Error::BackendError("value is not an integer or out of range".to_string())
            })?;
        let next = current.checked_add(1).ok_or_else(|| {
            Error::BackendError("increment or decrement would overflow".to_string())
        })?;

        *bytes = next.to_string().into_bytes();
        debug!("✓ InMemory INCR {} -> {}", key, next);
        Ok(next)
    }

    async fn rpush(&self, key: &str, value: Vec<u8>) -> Result<usize> {
        self.evict_if_expired(key);

        let mut entry = self
            .store
            .entry(key.to_string())
            .or_insert_with(StoredEntry::list);

        let StoredData::List(items) = &mut entry.data else {
            return Err(Error::BackendError(WRONGTYPE.to_string()));
        };

        items.push(value);
        debug!("✓ InMemory RPUSH {} (len: {})", key, items.len());
        Ok(items.len())
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<Vec<u8>>> {
        self.evict_if_expired(key);

        let Some(entry) = self.store.get(key) else {
            return Ok(Vec::new());
        };

        match &entry.data {
            StoredData::List(items) => Ok(list_bounds(items.len(), start, stop)
                .map(|(from, to)| items[from..=to].to_vec())
                .unwrap_or_default()),
            StoredData::Value(_) => Err(Error::BackendError(WRONGTYPE.to_string())),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        // In-memory backend is always healthy
        Ok(true)
    }

    async fn clear_all(&self) -> Result<()> {
        self.store.clear();
        warn!("⚠ InMemory CLEAR_ALL executed - all keys wiped!");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inmemory_backend_set_get() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), None)
            .await
            .expect("Failed to set");

        let result = backend.get("key1").await.expect("Failed to get");
        assert_eq!(result, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_inmemory_backend_miss() {
        let backend = InMemoryBackend::new();

        let result = backend.get("nonexistent").await.expect("Failed to get");
        assert_eq!(result, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inmemory_backend_ttl_expiration() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), Some(Duration::from_secs(10)))
            .await
            .expect("Failed to set");

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(backend.get("key1").await.expect("Failed to get").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(backend.get("key1").await.expect("Failed to get").is_none());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_inmemory_backend_set_replaces_ttl() {
        let backend = InMemoryBackend::new();

        backend
            .set("key", b"a".to_vec(), Some(Duration::from_secs(1)))
            .await
            .expect("Failed to set");
        backend
            .set("key", b"b".to_vec(), None)
            .await
            .expect("Failed to set");

        let entry = backend.store.get("key").expect("Entry missing");
        assert!(entry.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_inmemory_backend_incr() {
        let backend = InMemoryBackend::new();

        assert_eq!(backend.incr("counter").await.expect("Failed to incr"), 1);
        assert_eq!(backend.incr("counter").await.expect("Failed to incr"), 2);
        assert_eq!(
            backend.get("counter").await.expect("Failed to get"),
            Some(b"2".to_vec())
        );

        backend
            .set("numeric", b"41".to_vec(), None)
            .await
            .expect("Failed to set");
        assert_eq!(backend.incr("numeric").await.expect("Failed to incr"), 42);
    }

    #[tokio::test]
    async fn test_inmemory_backend_incr_non_integer() {
        let backend = InMemoryBackend::new();

        backend
            .set("text", b"abc".to_vec(), None)
            .await
            .expect("Failed to set");

        let result = backend.incr("text").await;
        assert!(matches!(result, Err(Error::BackendError(_))));
    }

    #[tokio::test]
    async fn test_inmemory_backend_rpush_lrange() {
        let backend = InMemoryBackend::new();

        for item in ["a", "b", "c"] {
            backend
                .rpush("list", item.as_bytes().to_vec())
                .await
                .expect("Failed to rpush");
        }

        let all = backend.lrange("list", 0, -1).await.expect("Failed to lrange");
        assert_eq!(all, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);

        let tail = backend.lrange("list", -2, -1).await.expect("Failed to lrange");
        assert_eq!(tail, vec![b"b".to_vec(), b"c".to_vec()]);

        let head = backend.lrange("list", 0, 0).await.expect("Failed to lrange");
        assert_eq!(head, vec![b"a".to_vec()]);

        let past_end = backend.lrange("list", 5, 10).await.expect("Failed to lrange");
        assert!(past_end.is_empty());

        let missing = backend.lrange("nope", 0, -1).await.expect("Failed to lrange");
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_inmemory_backend_wrong_type() {
        let backend = InMemoryBackend::new();

        backend
            .rpush("list", b"a".to_vec())
            .await
            .expect("Failed to rpush");
        backend
            .set("plain", b"v".to_vec(), None)
            .await
            .expect("Failed to set");

        assert!(matches!(
            backend.get("list").await,
            Err(Error::BackendError(_))
        ));
        assert!(matches!(
            backend.incr("list").await,
            Err(Error::BackendError(_))
        ));
        assert!(matches!(
            backend.rpush("plain", b"b".to_vec()).await,
            Err(Error::BackendError(_))
        ));
        assert!(matches!(
            backend.lrange("plain", 0, -1).await,
            Err(Error::BackendError(_))
        ));
    }

    #[tokio::test]
    async fn test_inmemory_backend_clear_all() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), None)
            .await
            .expect("Failed to set");
        backend
            .rpush("key2", b"value2".to_vec())
            .await
            .expect("Failed to rpush");

        assert_eq!(backend.len(), 2);

        backend.clear_all().await.expect("Failed to clear");

        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_inmemory_backend_clone_shares_store() {
        let backend1 = InMemoryBackend::new();
        backend1
            .set("key", b"value".to_vec(), None)
            .await
            .expect("Failed to set");

        let backend2 = backend1.clone();
        let value = backend2.get("key").await.expect("Failed to get");
        assert_eq!(value, Some(b"value".to_vec()));
    }

    #[tokio::test]
    async fn test_inmemory_backend_concurrent_incr() {
        let backend = InMemoryBackend::new();
        let mut handles = vec![];

        for _ in 0..10 {
            let b = backend.clone();
            handles.push(tokio::spawn(async move {
                b.incr("shared").await.expect("Failed to incr");
            }));
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }

        assert_eq!(
            backend.get("shared").await.expect("Failed to get"),
            Some(b"10".to_vec())
        );
    }

    #[test]
    fn test_list_bounds() {
        assert_eq!(list_bounds(3, 0, -1), Some((0, 2)));
        assert_eq!(list_bounds(3, -100, 100), Some((0, 2)));
        assert_eq!(list_bounds(3, 2, 1), None);
        assert_eq!(list_bounds(0, 0, -1), None);
    }
}

//! Key-value store backends.

use crate::error::Result;
use std::time::Duration;

pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis;

pub use inmemory::InMemoryBackend;
#[cfg(feature = "redis")]
pub use redis::{PoolStats, RedisBackend, RedisConfig};

/// Trait for key-value store backends.
///
/// Exposes exactly the store commands the cache wrapper and the page fetcher
/// issue: plain values with optional TTL, integer counters and append-only
/// lists. Semantics follow Redis (GET/SET/SETEX/INCR/RPUSH/LRANGE/FLUSHDB).
///
/// **IMPORTANT:** All methods use `&self` instead of `&mut self` to allow concurrent access.
/// Backend implementations should use interior mutability or external storage.
///
/// **ASYNC:** All methods are async and must be awaited.
#[allow(async_fn_in_trait)]
pub trait CacheBackend: Send + Sync + Clone {
    /// Retrieve a plain value by key.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value found
    /// - `Ok(None)` - Key absent or expired
    ///
    /// # Errors
    /// Returns `Err` if the backend fails or the key holds a list
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a plain value with optional TTL, replacing whatever the key held.
    ///
    /// # Arguments
    /// - `key`: Store key
    /// - `value`: Encoded bytes
    /// - `ttl`: Time-to-live. None = never expires
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Atomically increment the integer stored at `key` by one.
    ///
    /// An absent key counts as `0`. Returns the value after the increment.
    ///
    /// # Errors
    /// Returns `Err` if the key holds something other than a decimal integer
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Append a value to the list at `key`, creating it if absent.
    ///
    /// Returns the list length after the push.
    ///
    /// # Errors
    /// Returns `Err` if the key holds a plain value
    async fn rpush(&self, key: &str, value: Vec<u8>) -> Result<usize>;

    /// Read list elements between `start` and `stop`, both inclusive.
    ///
    /// Negative indices count from the end (`-1` is the last element), so
    /// `lrange(key, 0, -1)` reads the whole list. An absent key reads as empty.
    ///
    /// # Errors
    /// Returns `Err` if the key holds a plain value
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<Vec<u8>>>;

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Wipe every key in the current database (FLUSHDB).
    ///
    /// # Errors
    /// Returns `Err` if operation is not implemented or fails
    async fn clear_all(&self) -> Result<()> {
        Err(crate::error::Error::NotImplemented(
            "clear_all not implemented for this backend".to_string(),
        ))
    }
}

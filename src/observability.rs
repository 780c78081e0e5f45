//! Observability hooks and TTL policy for the page cache.
//!
//! Implement [`CacheMetrics`] to feed page-cache events into your monitoring
//! system:
//!
//! ```ignore
//! use cache_ledger::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         // counter!("page_cache_hits").inc();
//!     }
//! }
//!
//! // let fetcher = PageFetcher::new(backend, source)
//! //     .with_metrics(Box::new(PrometheusMetrics));
//! ```
//!
//! Methods not overridden fall back to the trait defaults, which log through
//! the `log` crate. [`NoOpMetrics`] silences everything.
//!
//! | Policy | Use Case |
//! |--------|----------|
//! | `Fixed` | Entries expire after the given duration (default: 10 seconds) |
//! | `Infinite` | Entries never expire |

use std::time::Duration;

/// TTL applied to cached pages unless configured otherwise.
pub const DEFAULT_PAGE_TTL: Duration = Duration::from_secs(10);

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a cache miss.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record an origin fetch and how long it took.
    fn record_fetch(&self, url: &str, duration: Duration) {
        debug!("Origin FETCH: {} took {:?}", url, duration);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_fetch(&self, _url: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics handler that logs every event through the trait defaults.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}

/// TTL (Time-to-Live) policy for cached pages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TtlPolicy {
    /// Fixed duration for all entries
    Fixed(Duration),

    /// No TTL (entries live until the store is flushed)
    Infinite,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        TtlPolicy::Fixed(DEFAULT_PAGE_TTL)
    }
}

impl TtlPolicy {
    /// TTL to pass to the backend.
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            TtlPolicy::Fixed(d) => Some(*d),
            TtlPolicy::Infinite => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_hit("key", Duration::from_secs(1));
        metrics.record_miss("key", Duration::from_secs(2));
        metrics.record_fetch("http://example.com", Duration::from_millis(5));
    }

    #[test]
    fn test_ttl_policy_default_is_ten_seconds() {
        assert_eq!(TtlPolicy::default().ttl(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_ttl_policy_fixed() {
        let policy = TtlPolicy::Fixed(Duration::from_secs(300));
        assert_eq!(policy.ttl(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_ttl_policy_infinite() {
        assert_eq!(TtlPolicy::Infinite.ttl(), None);
    }
}

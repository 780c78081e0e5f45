//! Expiring page cache.
//!
//! [`PageFetcher::get_page`] serves a URL's body from the key-value store when
//! it is cached, and otherwise fetches it from a [`PageSource`], caching the
//! result under `cache:<url>` for the configured TTL (10 seconds by default).
//!
//! Each origin fetch increments `count:<url>`. The counter never expires and
//! is bumped as part of the fetch itself, so cache hits leave it untouched.
//! Concurrent misses for the same URL are not deduplicated: each one fetches
//! and counts.

use crate::backend::CacheBackend;
use crate::error::{Error, Result};
use crate::key::CacheKeyBuilder;
use crate::observability::{CacheMetrics, NoOpMetrics, TtlPolicy};
use crate::value;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Origin of page bodies.
///
/// Implementations: `HttpPageSource` (feature `http`), [`InMemoryPageSource`]
/// for tests.
#[allow(async_fn_in_trait)]
pub trait PageSource: Send + Sync {
    /// Fetch the body of `url` as text.
    ///
    /// # Errors
    /// Returns `Err` if the origin cannot be reached
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Caches page bodies in a key-value store with a fixed TTL.
pub struct PageFetcher<B: CacheBackend, S: PageSource> {
    backend: B,
    source: S,
    metrics: Box<dyn CacheMetrics>,
    ttl_policy: TtlPolicy,
}

impl<B: CacheBackend, S: PageSource> PageFetcher<B, S> {
    /// Create a fetcher with the default 10 second TTL.
    pub fn new(backend: B, source: S) -> Self {
        PageFetcher {
            backend,
            source,
            metrics: Box::new(NoOpMetrics),
            ttl_policy: TtlPolicy::default(),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set custom TTL policy.
    pub fn with_ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Body of `url`, from the cache when present, else from the origin.
    ///
    /// An empty cached body counts as absent.
    ///
    /// # Errors
    /// Returns `Err` if the store or the origin fails, or a cached body is not
    /// valid UTF-8.
    pub async fn get_page(&self, url: &str) -> Result<String> {
        let timer = Instant::now();
        let body_key = CacheKeyBuilder::page_body(url);

        let result = match self.lookup(&body_key, url).await {
            Ok(Some(body)) => {
                self.metrics.record_hit(&body_key, timer.elapsed());
                Ok(body)
            }
            Ok(None) => {
                self.metrics.record_miss(&body_key, timer.elapsed());
                self.refresh(&body_key, url).await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            self.metrics.record_error(&body_key, &e.to_string());
        }
        result
    }

    async fn lookup(&self, body_key: &str, url: &str) -> Result<Option<String>> {
        match self.backend.get(body_key).await? {
            Some(bytes) if !bytes.is_empty() => {
                debug!("✓ Page cache hit for {}", url);
                value::decode_text(bytes).map(Some)
            }
            _ => Ok(None),
        }
    }

    async fn refresh(&self, body_key: &str, url: &str) -> Result<String> {
        let body = self.fetch_counted(url).await?;
        self.backend
            .set(body_key, body.clone().into_bytes(), self.ttl_policy.ttl())
            .await?;
        Ok(body)
    }

    /// Origin fetch, counted under `count:<url>` before it is issued.
    async fn fetch_counted(&self, url: &str) -> Result<String> {
        let count = self
            .backend
            .incr(&CacheKeyBuilder::page_count(url))
            .await?;
        debug!("» Fetching {} (access #{})", url, count);

        let timer = Instant::now();
        let body = self.source.fetch(url).await?;
        self.metrics.record_fetch(url, timer.elapsed());
        Ok(body)
    }

    /// Number of origin fetches recorded for `url` (0 if never fetched).
    ///
    /// # Errors
    /// Returns `Err` if the backend fails or the counter is corrupt.
    pub async fn access_count(&self, url: &str) -> Result<u64> {
        match self.backend.get(&CacheKeyBuilder::page_count(url)).await? {
            Some(bytes) => Ok(u64::try_from(value::decode_int(&bytes)?).unwrap_or(0)),
            None => Ok(0),
        }
    }
}

// ============================================================================
// HTTP Page Source
// ============================================================================

/// Fetches pages over HTTP with reqwest's default client settings.
///
/// Non-success statuses are not errors: their body is returned like any other.
#[cfg(feature = "http")]
#[derive(Clone, Default)]
pub struct HttpPageSource {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (timeouts, proxies, headers).
    pub fn with_client(client: reqwest::Client) -> Self {
        HttpPageSource { client }
    }
}

#[cfg(feature = "http")]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        debug!("✓ HTTP GET {} -> {}", url, response.status());
        Ok(response.text().await?)
    }
}

// ============================================================================
// In-Memory Page Source
// ============================================================================

/// Fixed set of pages for testing, counting every fetch it serves.
///
/// Clones share pages and the fetch counter.
#[derive(Clone, Default)]
pub struct InMemoryPageSource {
    pages: Arc<DashMap<String, String>>,
    fetches: Arc<AtomicUsize>,
}

impl InMemoryPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the body served for `url`.
    pub fn insert(&self, url: impl Into<String>, body: impl Into<String>) {
        self.pages.insert(url.into(), body.into());
    }

    /// Number of fetches served so far, including failed ones.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl PageSource for InMemoryPageSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .map(|body| body.clone())
            .ok_or_else(|| Error::FetchError(format!("no page for {}", url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use std::time::Duration;

    const URL: &str = "http://example.com/";

    fn fetcher() -> PageFetcher<InMemoryBackend, InMemoryPageSource> {
        let source = InMemoryPageSource::new();
        source.insert(URL, "<html>v1</html>");
        PageFetcher::new(InMemoryBackend::new(), source)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_fetches_and_counts() {
        let fetcher = fetcher();

        let body = fetcher.get_page(URL).await.expect("get_page failed");
        assert_eq!(body, "<html>v1</html>");
        assert_eq!(fetcher.access_count(URL).await.expect("count failed"), 1);
        assert_eq!(fetcher.source().fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl_does_not_count() {
        let fetcher = fetcher();

        let first = fetcher.get_page(URL).await.expect("get_page failed");
        fetcher.source().insert(URL, "<html>v2</html>");
        tokio::time::advance(Duration::from_secs(5)).await;
        let second = fetcher.get_page(URL).await.expect("get_page failed");

        assert_eq!(first, second);
        assert_eq!(fetcher.access_count(URL).await.expect("count failed"), 1);
        assert_eq!(fetcher.source().fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_after_expiry() {
        let fetcher = fetcher();

        fetcher.get_page(URL).await.expect("get_page failed");
        fetcher.source().insert(URL, "<html>v2</html>");
        tokio::time::advance(Duration::from_secs(11)).await;

        let body = fetcher.get_page(URL).await.expect("get_page failed");
        assert_eq!(body, "<html>v2</html>");
        assert_eq!(fetcher.access_count(URL).await.expect("count failed"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_survives_body_expiry() {
        let fetcher = fetcher();

        fetcher.get_page(URL).await.expect("get_page failed");
        tokio::time::advance(Duration::from_secs(60)).await;

        let body_key = CacheKeyBuilder::page_body(URL);
        assert!(fetcher
            .backend()
            .get(&body_key)
            .await
            .expect("get failed")
            .is_none());
        assert_eq!(fetcher.access_count(URL).await.expect("count failed"), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_still_counts_and_caches_nothing() {
        let fetcher = fetcher();
        let missing = "http://example.com/missing";

        let result = fetcher.get_page(missing).await;
        assert!(matches!(result, Err(Error::FetchError(_))));
        assert_eq!(fetcher.access_count(missing).await.expect("count failed"), 1);
        assert!(fetcher
            .backend()
            .get(&CacheKeyBuilder::page_body(missing))
            .await
            .expect("get failed")
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_cached_body_is_refetched() {
        let fetcher = fetcher();
        let url = "http://example.com/empty";
        fetcher.source().insert(url, "");

        fetcher.get_page(url).await.expect("get_page failed");
        fetcher.get_page(url).await.expect("get_page failed");
        assert_eq!(fetcher.access_count(url).await.expect("count failed"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_infinite_ttl_never_expires() {
        let fetcher = fetcher().with_ttl_policy(TtlPolicy::Infinite);

        fetcher.get_page(URL).await.expect("get_page failed");
        tokio::time::advance(Duration::from_secs(3600)).await;
        fetcher.get_page(URL).await.expect("get_page failed");

        assert_eq!(fetcher.access_count(URL).await.expect("count failed"), 1);
    }

    #[tokio::test]
    async fn test_access_count_for_unknown_url() {
        let fetcher = fetcher();
        assert_eq!(
            fetcher
                .access_count("http://never.example/")
                .await
                .expect("count failed"),
            0
        );
    }
}

//! # cache-ledger
//!
//! Thin, instrumented clients over external stores.
//!
//! ## Components
//!
//! - **[`Cache`]:** stores typed values under random keys in a key-value store
//!   and records every `store` call (count, inputs, outputs) for replay
//! - **[`PageFetcher`]:** caches fetched page bodies with a fixed TTL and counts
//!   origin fetches per URL
//! - **[`LogStatsReporter`]:** read-only statistics over an nginx access-log
//!   collection
//!
//! Stores are reached through the [`CacheBackend`], [`PageSource`] and
//! [`LogSource`] traits. Redis, HTTP and MongoDB implementations sit behind
//! the `redis`, `http` and `mongodb` features; in-memory implementations are
//! always available.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cache_ledger::{Cache, backend::InMemoryBackend, cache::STORE};
//!
//! let cache = Cache::new(InMemoryBackend::new()).await?;  // flushes the store
//!
//! let key = cache.store("abc").await?;
//! assert_eq!(cache.get_str(&key).await?, Some("abc".to_string()));
//!
//! let n = cache.store(123).await?;
//! assert_eq!(cache.get_int(&n).await?, Some(123));
//!
//! cache.replay(&STORE).await?;
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod instrument;
pub mod key;
pub mod logstats;
pub mod observability;
pub mod page;
pub mod value;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use cache::Cache;
pub use config::Settings;
pub use error::{Error, Result};
pub use instrument::{CallHistory, CallInterceptor, Instrumented, OperationId};
pub use logstats::{LogReport, LogSource, LogStatsReporter};
pub use page::{PageFetcher, PageSource};
pub use value::{CacheValue, ValueKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

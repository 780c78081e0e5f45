//! Runtime settings for the binaries.
//!
//! All values come from environment variables with defaults matching a local
//! development setup.

use crate::error::{Error, Result};
use crate::observability::{TtlPolicy, DEFAULT_PAGE_TTL};
use std::env;
use std::time::Duration;

pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";
pub const DEFAULT_MONGO_URI: &str = "mongodb://127.0.0.1:27017";
pub const DEFAULT_LOG_DATABASE: &str = "logs";
pub const DEFAULT_LOG_COLLECTION: &str = "nginx";

/// Connection and cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub redis_url: String,
    pub mongo_uri: String,
    pub log_database: String,
    pub log_collection: String,
    pub page_ttl: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            mongo_uri: DEFAULT_MONGO_URI.to_string(),
            log_database: DEFAULT_LOG_DATABASE.to_string(),
            log_collection: DEFAULT_LOG_COLLECTION.to_string(),
            page_ttl: DEFAULT_PAGE_TTL,
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Redis connection string (default: `redis://localhost:6379/0`)
    /// - `MONGO_URI` - MongoDB connection string (default: `mongodb://127.0.0.1:27017`)
    /// - `LOG_DATABASE` - database holding access logs (default: `logs`)
    /// - `LOG_COLLECTION` - access-log collection (default: `nginx`)
    /// - `PAGE_TTL_SECS` - page cache TTL in seconds (default: 10)
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if `PAGE_TTL_SECS` is not a whole number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if `PAGE_TTL_SECS` is not a whole number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let page_ttl = match lookup("PAGE_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| {
                    Error::ConfigError(format!("PAGE_TTL_SECS={:?} is not valid: {}", raw, e))
                })?,
            None => defaults.page_ttl,
        };

        Ok(Settings {
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            mongo_uri: lookup("MONGO_URI").unwrap_or(defaults.mongo_uri),
            log_database: lookup("LOG_DATABASE").unwrap_or(defaults.log_database),
            log_collection: lookup("LOG_COLLECTION").unwrap_or(defaults.log_collection),
            page_ttl,
        })
    }

    /// TTL policy for the page cache.
    pub fn page_ttl_policy(&self) -> TtlPolicy {
        TtlPolicy::Fixed(self.page_ttl)
    }
}

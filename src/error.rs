//! Error types for cache-ledger.

use std::fmt;

/// Result type for all store, source and fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache-ledger.
///
/// None of the components recover from errors locally: every failure is
/// propagated to the caller unchanged, and the binaries abort on the first one.
#[derive(Debug, Clone)]
pub enum Error {
    /// Stored bytes could not be decoded into the requested value kind.
    ///
    /// Common causes:
    /// - `get_int` on a key holding non-numeric text
    /// - `get_str` on a key holding invalid UTF-8
    DeserializationError(String),

    /// Key-value store error (Redis, in-memory stand-in).
    ///
    /// Common causes:
    /// - Redis connection lost or pool exhausted
    /// - INCR on a value that is not an integer
    /// - List operation against a key holding a plain value (WRONGTYPE)
    BackendError(String),

    /// Document store error while reading access logs.
    ///
    /// Common causes:
    /// - MongoDB unreachable
    /// - Aggregation pipeline rejected by the server
    SourceError(String),

    /// Origin fetch failed in the page fetcher.
    FetchError(String),

    /// Configuration error during startup.
    ///
    /// Common causes:
    /// - Malformed connection string
    /// - Non-numeric value in a numeric environment variable
    ConfigError(String),

    /// Operation not supported by this backend or source.
    NotImplemented(String),

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::SourceError(msg) => write!(f, "Source error: {}", msg),
            Error::FetchError(msg) => write!(f, "Fetch error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::SourceError(e.to_string())
        } else {
            Error::DeserializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for Error {
    fn from(e: mongodb::error::Error) -> Self {
        Error::SourceError(format!("MongoDB error: {}", e))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::FetchError(e.to_string())
    }
}

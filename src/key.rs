//! Store key layout.
//!
//! Every key the crate writes is built here:
//!
//! | key | holds |
//! |-----|-------|
//! | `<uuid>` | a value written by `Cache::store` |
//! | `<operation>` | call counter of an instrumented operation |
//! | `<operation>:inputs` / `<operation>:outputs` | call history lists |
//! | `cache:<url>` | cached page body (expires) |
//! | `count:<url>` | page access counter (never expires) |

use uuid::Uuid;

/// Prefix of cached page bodies.
pub const PAGE_BODY_PREFIX: &str = "cache";

/// Prefix of page access counters.
pub const PAGE_COUNT_PREFIX: &str = "count";

const INPUTS_SUFFIX: &str = "inputs";
const OUTPUTS_SUFFIX: &str = "outputs";

/// Builder for store keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Fresh random key for a stored value (UUIDv4, hyphenated).
    pub fn random() -> String {
        Uuid::new_v4().to_string()
    }

    /// Build key with custom prefix.
    pub fn build_with_prefix(prefix: &str, id: &dyn std::fmt::Display) -> String {
        format!("{}:{}", prefix, id)
    }

    /// Build composite key from multiple parts.
    pub fn build_composite(parts: &[&str]) -> String {
        parts.join(":")
    }

    /// List key holding the recorded inputs of `operation`.
    pub fn history_inputs(operation: &str) -> String {
        Self::build_composite(&[operation, INPUTS_SUFFIX])
    }

    /// List key holding the recorded outputs of `operation`.
    pub fn history_outputs(operation: &str) -> String {
        Self::build_composite(&[operation, OUTPUTS_SUFFIX])
    }

    /// Key of the cached body for `url`.
    pub fn page_body(url: &str) -> String {
        Self::build_with_prefix(PAGE_BODY_PREFIX, &url)
    }

    /// Key of the access counter for `url`.
    pub fn page_count(url: &str) -> String {
        Self::build_with_prefix(PAGE_COUNT_PREFIX, &url)
    }
}

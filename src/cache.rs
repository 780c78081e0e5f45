//! Instrumented key-value cache.
//!
//! [`Cache`] stores typed values under fresh random keys and reads them back
//! with explicit conversions. Every `store` call is counted and logged into
//! the store itself through the [`crate::instrument`] interceptor chain, so
//! [`Cache::replay`] can print what was stored and under which key.
//!
//! **Constructing a `Cache` wipes the backend's current database.**
//!
//! ```ignore
//! let cache = Cache::new(RedisBackend::new(RedisConfig::default()).await?).await?;
//!
//! let key = cache.store("abc").await?;
//! assert_eq!(cache.get_str(&key).await?, Some("abc".to_string()));
//!
//! cache.replay(&STORE).await?;
//! // Cache.store was called 1 times:
//! // Cache.store(*("abc",)) -> 0f6c...
//! ```

use crate::backend::CacheBackend;
use crate::error::Result;
use crate::instrument::{
    CallHistory, CallSite, CountCalls, Instrumented, OperationId, RecordHistory,
};
use crate::key::CacheKeyBuilder;
use crate::value::{self, CacheValue, ValueKind};

/// Identifier of [`Cache::store`]; names its counter and history keys.
pub const STORE: OperationId = OperationId::new("Cache.store");

type StoreChain<B> = (CountCalls<B>, RecordHistory<B>);

/// Key-value cache with call-instrumented writes.
///
/// Cloning is cheap when the backend is (both shipped backends are
/// Arc/pool-backed); clones share the same store.
#[derive(Clone)]
pub struct Cache<B: CacheBackend> {
    backend: B,
    instrumented: Instrumented<StoreChain<B>>,
}

impl<B: CacheBackend> Cache<B> {
    /// Create a cache over `backend`, flushing its current database first.
    ///
    /// # Errors
    /// Returns `Err` if the flush fails.
    pub async fn new(backend: B) -> Result<Self> {
        backend.clear_all().await?;
        info!("✓ Cache initialized (store flushed)");

        let instrumented = Instrumented::new((
            CountCalls::new(backend.clone()),
            RecordHistory::new(backend.clone()),
        ));

        Ok(Cache {
            backend,
            instrumented,
        })
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Store `value` under a fresh random key and return the key.
    ///
    /// Counted and recorded under [`STORE`]: the counter is bumped before the
    /// write, the input literal and returned key are appended after it.
    ///
    /// # Errors
    /// Returns `Err` if any store command fails.
    pub async fn store(&self, value: impl Into<CacheValue>) -> Result<String> {
        let value = value.into();
        let call = CallSite::new(&STORE, &[value.literal()]);
        self.instrumented.invoke(call, self.write(value)).await
    }

    async fn write(&self, value: CacheValue) -> Result<String> {
        let key = CacheKeyBuilder::random();
        self.backend.set(&key, value.encode(), None).await?;
        Ok(key)
    }

    /// Raw bytes stored under `key`, or `None` if the key is absent.
    ///
    /// # Errors
    /// Returns `Err` if the backend fails.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.backend.get(key).await
    }

    /// Bytes under `key` passed through `convert`.
    ///
    /// An absent key yields `Ok(None)` without calling `convert`.
    ///
    /// # Errors
    /// Returns `Err` if the backend fails or `convert` does.
    pub async fn get_with<T, F>(&self, key: &str, convert: F) -> Result<Option<T>>
    where
        F: FnOnce(Vec<u8>) -> Result<T>,
    {
        self.get(key).await?.map(convert).transpose()
    }

    /// Value under `key` decoded as `kind`.
    ///
    /// # Errors
    /// Returns `Err` if the backend fails or the bytes do not decode as `kind`.
    pub async fn get_value(&self, key: &str, kind: ValueKind) -> Result<Option<CacheValue>> {
        self.get_with(key, |bytes| CacheValue::decode(kind, bytes))
            .await
    }

    /// Value under `key` as opaque bytes. Same as [`Cache::get`].
    ///
    /// # Errors
    /// Returns `Err` if the backend fails.
    pub async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.get_with(key, Ok).await
    }

    /// Value under `key` as UTF-8 text.
    ///
    /// # Errors
    /// Returns `Err` if the backend fails or the bytes are not UTF-8.
    pub async fn get_str(&self, key: &str) -> Result<Option<String>> {
        self.get_with(key, value::decode_text).await
    }

    /// Value under `key` as a decimal integer.
    ///
    /// # Errors
    /// Returns `Err` if the backend fails or the bytes are not an integer.
    pub async fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.get_with(key, |bytes| value::decode_int(&bytes)).await
    }

    /// Value under `key` as a float.
    ///
    /// # Errors
    /// Returns `Err` if the backend fails or the bytes are not a number.
    pub async fn get_float(&self, key: &str) -> Result<Option<f64>> {
        self.get_with(key, |bytes| value::decode_float(&bytes)).await
    }

    /// Current value of the call counter of `operation` (0 if never called).
    ///
    /// # Errors
    /// Returns `Err` if the backend fails or the counter is corrupt.
    pub async fn call_count(&self, operation: &OperationId) -> Result<u64> {
        let count = self
            .get_with(operation.name(), |bytes| value::decode_int(&bytes))
            .await?;
        Ok(count.map_or(0, |n| u64::try_from(n).unwrap_or(0)))
    }

    /// Recorded inputs and outputs of `operation`, in call order.
    ///
    /// # Errors
    /// Returns `Err` if the backend fails.
    pub async fn history(&self, operation: &OperationId) -> Result<CallHistory> {
        CallHistory::load(&self.backend, operation).await
    }

    /// Print the recorded history of `operation` to stdout and return it.
    ///
    /// ```text
    /// Cache.store was called 2 times:
    /// Cache.store(*("foo",)) -> 7a1c...
    /// Cache.store(*(42,)) -> 93be...
    /// ```
    ///
    /// # Errors
    /// Returns `Err` if the backend fails.
    pub async fn replay(&self, operation: &OperationId) -> Result<CallHistory> {
        let history = self.history(operation).await?;
        print!("{}", history);
        Ok(history)
    }
}

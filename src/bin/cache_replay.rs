//! Store a few values in Redis, read them back, and replay the store history.
//!
//! Flushes the configured Redis database on startup.

use cache_ledger::backend::RedisBackend;
use cache_ledger::cache::STORE;
use cache_ledger::{Cache, Result, Settings};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init()
        .ok();

    let settings = Settings::from_env()?;
    let backend = RedisBackend::from_connection_string(&settings.redis_url).await?;
    let cache = Cache::new(backend).await?;

    let text = cache.store("foo").await?;
    let bytes = cache.store(b"bar".as_slice()).await?;
    let int = cache.store(42).await?;
    let float = cache.store(3.5).await?;

    println!("{} -> {:?}", text, cache.get_str(&text).await?);
    println!("{} -> {:?}", bytes, cache.get(&bytes).await?);
    println!("{} -> {:?}", int, cache.get_int(&int).await?);
    println!("{} -> {:?}", float, cache.get_float(&float).await?);
    println!("{} calls recorded", cache.call_count(&STORE).await?);

    cache.replay(&STORE).await?;
    Ok(())
}

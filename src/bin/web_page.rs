//! Fetch a page through the Redis page cache and report its access count.
//!
//! Usage: `web_page [URL]`

use cache_ledger::backend::RedisBackend;
use cache_ledger::observability::LogMetrics;
use cache_ledger::page::HttpPageSource;
use cache_ledger::{PageFetcher, Result, Settings};

const DEFAULT_URL: &str = "http://slowwly.robertomurray.co.uk/delay/5000/url/http://www.example.com";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init()
        .ok();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_URL.to_string());

    let settings = Settings::from_env()?;
    let backend = RedisBackend::from_connection_string(&settings.redis_url).await?;
    let fetcher = PageFetcher::new(backend, HttpPageSource::new())
        .with_ttl_policy(settings.page_ttl_policy())
        .with_metrics(Box::new(LogMetrics));

    println!("{}", fetcher.get_page(&url).await?);
    println!("URL accessed {} times.", fetcher.access_count(&url).await?);
    Ok(())
}

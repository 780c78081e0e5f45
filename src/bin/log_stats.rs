//! Print access-log statistics for the `logs.nginx` collection.

use cache_ledger::logstats::{LogStatsReporter, MongoLogSource};
use cache_ledger::{Result, Settings};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init()
        .ok();

    let settings = Settings::from_env()?;
    let source = MongoLogSource::connect(
        &settings.mongo_uri,
        &settings.log_database,
        &settings.log_collection,
    )
    .await?;

    LogStatsReporter::new(source).print().await?;
    Ok(())
}

//! MongoDB access-log source.

use super::{LogField, LogFilter, LogSource, ValueCount, MISSING_VALUE};
use crate::error::{Error, Result};
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Collection};

/// Reads access logs from a MongoDB collection.
///
/// # Example
///
/// ```no_run
/// # use cache_ledger::logstats::{LogStatsReporter, MongoLogSource};
/// # async fn example() -> cache_ledger::Result<()> {
/// let source = MongoLogSource::connect("mongodb://127.0.0.1:27017", "logs", "nginx").await?;
/// LogStatsReporter::new(source).print().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MongoLogSource {
    collection: Collection<Document>,
}

impl MongoLogSource {
    /// Connect to `uri` and read `database.collection`.
    ///
    /// The driver connects lazily; an unreachable server surfaces on the
    /// first query.
    ///
    /// # Errors
    /// Returns `Err` if the URI cannot be parsed.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| Error::ConfigError(format!("Invalid MongoDB URI {}: {}", uri, e)))?;

        info!("✓ MongoDB log source: {}.{}", database, collection);
        Ok(Self::from_client(&client, database, collection))
    }

    /// Use an existing client handle.
    pub fn from_client(client: &Client, database: &str, collection: &str) -> Self {
        MongoLogSource {
            collection: client.database(database).collection(collection),
        }
    }
}

/// Query document for a count filter.
fn filter_document(filter: &LogFilter) -> Document {
    match filter {
        LogFilter::All => doc! {},
        LogFilter::Method(method) => doc! { "method": method.as_str() },
        LogFilter::Path(path) => doc! { "path": path.as_str() },
    }
}

/// `$group` / `$sort` / `$limit` pipeline ranking `field` values.
fn ranking_pipeline(field: LogField, limit: usize) -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": format!("${}", field.as_str()), "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1 } },
        doc! { "$limit": limit as i64 },
    ]
}

/// Parse one `{ _id, count }` group document.
fn value_count(group: &Document) -> Result<ValueCount> {
    let value = match group.get("_id") {
        None | Some(Bson::Null) => MISSING_VALUE.to_string(),
        Some(Bson::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    let count = match group.get("count") {
        Some(Bson::Int32(n)) => u64::try_from(*n).ok(),
        Some(Bson::Int64(n)) => u64::try_from(*n).ok(),
        _ => None,
    }
    .ok_or_else(|| Error::SourceError(format!("Malformed group document: {}", group)))?;

    Ok(ValueCount { value, count })
}

impl LogSource for MongoLogSource {
    async fn count(&self, filter: &LogFilter) -> Result<u64> {
        let count = self.collection.count_documents(filter_document(filter)).await?;
        debug!("✓ MongoDB count {:?} -> {}", filter, count);
        Ok(count)
    }

    async fn top_values(&self, field: LogField, limit: usize) -> Result<Vec<ValueCount>> {
        let mut cursor = self
            .collection
            .aggregate(ranking_pipeline(field, limit))
            .await?;

        let mut groups = Vec::new();
        while let Some(group) = cursor.try_next().await? {
            groups.push(value_count(&group)?);
        }

        debug!("✓ MongoDB ranking by {} -> {} groups", field.as_str(), groups.len());
        Ok(groups)
    }
}

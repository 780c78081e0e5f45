//! Access-log statistics.
//!
//! [`LogStatsReporter`] reads an nginx access-log collection through a
//! [`LogSource`] and produces a [`LogReport`]: total documents, counts per HTTP
//! method, the number of `/status` checks, and the ten most frequent client
//! IPs. The source is read-only; nothing here writes to it.
//!
//! # Implementing LogSource
//!
//! - MongoDB: `MongoLogSource` (feature `mongodb`)
//! - In-memory: [`InMemoryLogSource`], for tests and fixtures

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "mongodb")]
pub mod mongo;

#[cfg(feature = "mongodb")]
pub use mongo::MongoLogSource;

/// Path counted as a status check.
pub const STATUS_PATH: &str = "/status";

/// Number of IPs in the ranking.
pub const TOP_IPS: usize = 10;

/// Label used for a grouped value that is missing or null.
pub const MISSING_VALUE: &str = "None";

/// HTTP methods reported, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One access-log document. Fields absent from the document read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

impl LogRecord {
    pub fn new(method: &str, path: &str, ip: &str) -> Self {
        LogRecord {
            method: Some(method.to_string()),
            path: Some(path.to_string()),
            ip: Some(ip.to_string()),
        }
    }

    fn field(&self, field: LogField) -> Option<&str> {
        match field {
            LogField::Method => self.method.as_deref(),
            LogField::Path => self.path.as_deref(),
            LogField::Ip => self.ip.as_deref(),
        }
    }
}

/// Document field a ranking groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogField {
    Method,
    Path,
    Ip,
}

impl LogField {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogField::Method => "method",
            LogField::Path => "path",
            LogField::Ip => "ip",
        }
    }
}

/// Equality filter for counting documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFilter {
    All,
    Method(HttpMethod),
    Path(String),
}

impl LogFilter {
    /// Whether `record` passes this filter.
    pub fn matches(&self, record: &LogRecord) -> bool {
        match self {
            LogFilter::All => true,
            LogFilter::Method(m) => record.method.as_deref() == Some(m.as_str()),
            LogFilter::Path(p) => record.path.as_deref() == Some(p.as_str()),
        }
    }
}

/// A grouped value and how many documents carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: u64,
}

/// Read-only access to an access-log collection.
#[allow(async_fn_in_trait)]
pub trait LogSource: Send + Sync {
    /// Count documents passing `filter`.
    ///
    /// # Errors
    /// Returns `Err` if the source is unavailable
    async fn count(&self, filter: &LogFilter) -> Result<u64>;

    /// Group documents by `field`, most frequent first, at most `limit` groups.
    ///
    /// Order among equal counts is whatever the source produces natively.
    ///
    /// # Errors
    /// Returns `Err` if the source is unavailable or returns malformed groups
    async fn top_values(&self, field: LogField, limit: usize) -> Result<Vec<ValueCount>>;
}

/// Aggregate statistics over an access-log collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogReport {
    pub total: u64,
    /// Per-method counts in [`HttpMethod::ALL`] order.
    pub methods: Vec<(HttpMethod, u64)>,
    pub status_checks: u64,
    pub top_ips: Vec<ValueCount>,
}

impl fmt::Display for LogReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} logs", self.total)?;
        writeln!(f, "Methods:")?;
        for (method, count) in &self.methods {
            writeln!(f, "\tmethod {}: {}", method, count)?;
        }
        writeln!(f, "{} status check", self.status_checks)?;
        writeln!(f, "IPs:")?;
        for ip in &self.top_ips {
            writeln!(f, "\t{}: {}", ip.value, ip.count)?;
        }
        Ok(())
    }
}

/// Collects a [`LogReport`] from a [`LogSource`].
pub struct LogStatsReporter<S: LogSource> {
    source: S,
}

impl<S: LogSource> LogStatsReporter<S> {
    pub fn new(source: S) -> Self {
        LogStatsReporter { source }
    }

    /// Run all queries and assemble the report.
    ///
    /// # Errors
    /// Returns the first source error; no partial report is produced.
    pub async fn collect(&self) -> Result<LogReport> {
        let total = self.source.count(&LogFilter::All).await?;

        let mut methods = Vec::with_capacity(HttpMethod::ALL.len());
        for method in HttpMethod::ALL {
            let count = self.source.count(&LogFilter::Method(method)).await?;
            methods.push((method, count));
        }

        let status_checks = self
            .source
            .count(&LogFilter::Path(STATUS_PATH.to_string()))
            .await?;
        let top_ips = self.source.top_values(LogField::Ip, TOP_IPS).await?;

        debug!(
            "✓ Log report collected: {} logs, {} ranked IPs",
            total,
            top_ips.len()
        );

        Ok(LogReport {
            total,
            methods,
            status_checks,
            top_ips,
        })
    }

    /// Collect the report and print it to stdout.
    ///
    /// # Errors
    /// Returns the first source error.
    pub async fn print(&self) -> Result<LogReport> {
        let report = self.collect().await?;
        print!("{}", report);
        Ok(report)
    }
}

// ============================================================================
// In-Memory Log Source
// ============================================================================

/// Access logs held in memory, for tests and fixtures.
///
/// Ties in [`LogSource::top_values`] keep first-seen order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogSource {
    records: Vec<LogRecord>,
}

impl InMemoryLogSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<LogRecord>) -> Self {
        InMemoryLogSource { records }
    }

    /// Load records from a JSON array of log documents.
    ///
    /// # Errors
    /// Returns `Error::DeserializationError` if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<LogRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    pub fn push(&mut self, record: LogRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl LogSource for InMemoryLogSource {
    async fn count(&self, filter: &LogFilter) -> Result<u64> {
        Ok(self.records.iter().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn top_values(&self, field: LogField, limit: usize) -> Result<Vec<ValueCount>> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<ValueCount> = Vec::new();

        for record in &self.records {
            let value = record.field(field).unwrap_or(MISSING_VALUE);
            match index.get(value) {
                Some(&i) => groups[i].count += 1,
                None => {
                    index.insert(value, groups.len());
                    groups.push(ValueCount {
                        value: value.to_string(),
                        count: 1,
                    });
                }
            }
        }

        // Stable sort keeps first-seen order among ties
        groups.sort_by(|a, b| b.count.cmp(&a.count));
        groups.truncate(limit);
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_source() -> InMemoryLogSource {
        InMemoryLogSource::from_records(vec![
            LogRecord::new("GET", "/status", "10.0.0.1"),
            LogRecord::new("GET", "/", "10.0.0.2"),
            LogRecord::new("POST", "/login", "10.0.0.1"),
            LogRecord::new("DELETE", "/item/1", "10.0.0.3"),
            LogRecord::new("GET", "/status", "10.0.0.2"),
            LogRecord::new("GET", "/status", "10.0.0.1"),
        ])
    }

    #[tokio::test]
    async fn test_empty_collection_report() {
        let reporter = LogStatsReporter::new(InMemoryLogSource::new());
        let report = reporter.collect().await.expect("collect failed");

        assert_eq!(
            report.to_string(),
            "0 logs\n\
             Methods:\n\
             \tmethod GET: 0\n\
             \tmethod POST: 0\n\
             \tmethod PUT: 0\n\
             \tmethod PATCH: 0\n\
             \tmethod DELETE: 0\n\
             0 status check\n\
             IPs:\n"
        );
        assert!(report.top_ips.is_empty());
    }

    #[tokio::test]
    async fn test_report_counts() {
        let reporter = LogStatsReporter::new(sample_source());
        let report = reporter.collect().await.expect("collect failed");

        assert_eq!(report.total, 6);
        assert_eq!(
            report.methods,
            vec![
                (HttpMethod::Get, 4),
                (HttpMethod::Post, 1),
                (HttpMethod::Put, 0),
                (HttpMethod::Patch, 0),
                (HttpMethod::Delete, 1),
            ]
        );
        assert_eq!(report.status_checks, 3);
        assert_eq!(
            report.top_ips,
            vec![
                ValueCount {
                    value: "10.0.0.1".to_string(),
                    count: 3
                },
                ValueCount {
                    value: "10.0.0.2".to_string(),
                    count: 2
                },
                ValueCount {
                    value: "10.0.0.3".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_top_values_limit_and_tie_order() {
        let records = (0..15)
            .map(|i| LogRecord::new("GET", "/", &format!("192.168.0.{}", i)))
            .collect();
        let source = InMemoryLogSource::from_records(records);

        let top = source
            .top_values(LogField::Ip, TOP_IPS)
            .await
            .expect("top_values failed");

        assert_eq!(top.len(), 10);
        assert_eq!(top[0].value, "192.168.0.0");
        assert_eq!(top[9].value, "192.168.0.9");
    }

    #[tokio::test]
    async fn test_missing_ip_groups_as_none() {
        let mut source = InMemoryLogSource::new();
        source.push(LogRecord {
            method: Some("GET".to_string()),
            path: Some("/".to_string()),
            ip: None,
        });

        let top = source
            .top_values(LogField::Ip, TOP_IPS)
            .await
            .expect("top_values failed");
        assert_eq!(top[0].value, MISSING_VALUE);
    }

    #[test]
    fn test_method_filter_is_case_sensitive() {
        let record = LogRecord::new("get", "/", "1.1.1.1");
        assert!(!LogFilter::Method(HttpMethod::Get).matches(&record));
        assert!(LogFilter::All.matches(&record));
    }

    #[test]
    fn test_from_json_ignores_extra_fields() {
        let source = InMemoryLogSource::from_json(
            r#"[{"method": "GET", "path": "/status", "ip": "1.2.3.4", "status": 200},
                {"path": "/"}]"#,
        )
        .expect("from_json failed");

        assert_eq!(source.len(), 2);
    }

    #[test]
    fn test_report_display_lists_ips() {
        let report = LogReport {
            total: 2,
            methods: HttpMethod::ALL.iter().map(|m| (*m, 0)).collect(),
            status_checks: 1,
            top_ips: vec![ValueCount {
                value: "8.8.8.8".to_string(),
                count: 2,
            }],
        };

        assert!(report.to_string().ends_with("IPs:\n\t8.8.8.8: 2\n"));
    }
}

//! Record sink trait and implementations.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::io::Write;
use tracing::info;

use crate::errors::SinkError;
use crate::models::JobRecord;

/// Receives emitted job records one at a time.
///
/// Records arrive in extraction order within a page; across pages they arrive
/// in page completion order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Delivers one record.
    async fn push(&self, record: &JobRecord) -> Result<(), SinkError>;
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RwLock<Vec<JobRecord>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected records.
    #[must_use]
    pub fn records(&self) -> Vec<JobRecord> {
        self.records.read().clone()
    }

    /// Returns the number of collected records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Takes the collected records, leaving the sink empty.
    pub fn take(&self) -> Vec<JobRecord> {
        std::mem::take(&mut *self.records.write())
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn push(&self, record: &JobRecord) -> Result<(), SinkError> {
        self.records.write().push(record.clone());
        Ok(())
    }
}

/// Writes each record as one JSON line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    async fn push(&self, record: &JobRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}

/// Logs each record through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

#[async_trait]
impl RecordSink for LoggingSink {
    async fn push(&self, record: &JobRecord) -> Result<(), SinkError> {
        info!(
            job_id = %record.id,
            title = record.title.as_deref().unwrap_or_default(),
            company = record.company.as_deref().unwrap_or_default(),
            "Job record"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{BufRead, BufReader, Seek, SeekFrom};

    fn sample(id: &str) -> JobRecord {
        JobRecord::new(id)
            .with_title("Rust Engineer")
            .with_company("Acme")
    }

    #[tokio::test]
    async fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        for id in ["1", "2", "3"] {
            sink.push(&sample(id)).await.unwrap();
        }

        assert_eq!(sink.len(), 3);
        let ids: Vec<_> = sink.records().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        assert_eq!(sink.take().len(), 3);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_json_lines_sink_in_memory() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.push(&sample("1")).await.unwrap();
        sink.push(&sample("2")).await.unwrap();

        let bytes = sink.into_inner();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["id"], "1");
        assert_eq!(value["title"], "Rust Engineer");
        assert!(value.get("scrapedAt").is_some());
    }

    #[tokio::test]
    async fn test_json_lines_sink_to_file() {
        let file = tempfile::tempfile().unwrap();
        let sink = JsonLinesSink::new(file);
        sink.push(&sample("42")).await.unwrap();

        let mut file = sink.into_inner();
        file.seek(SeekFrom::Start(0)).unwrap();
        let lines: Vec<String> = BufReader::new(file).lines().map(Result::unwrap).collect();
        assert_eq!(lines.len(), 1);

        let record: JobRecord = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.company.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn test_logging_sink_accepts_everything() {
        assert!(LoggingSink.push(&JobRecord::new("7")).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_sink_failure() {
        let mut mock = MockRecordSink::new();
        mock.expect_push()
            .times(1)
            .returning(|_| Err(SinkError::new("disk full")));

        let err = mock.push(&sample("1")).await.unwrap_err();
        assert_eq!(err.message, "disk full");
    }
}

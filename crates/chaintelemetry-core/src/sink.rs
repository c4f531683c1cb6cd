//! Append-only telemetry sinks.
//!
//! Every record becomes exactly one line. Implementations must serialize
//! their writes so that concurrent enrichments never interleave bytes of
//! two records.

use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::SinkError;
use crate::record::TelemetryRecord;

/// Destination for serialized telemetry records.
#[async_trait]
pub trait TelemetrySink: Send + Sync + 'static {
    /// Append one record followed by a line terminator.
    async fn append(&self, record: &TelemetryRecord) -> Result<(), SinkError>;

    /// Human-readable identifier used in logs.
    fn describe(&self) -> &str;
}

/// Appends records to a file or named pipe.
///
/// The handle is opened on first use and kept open. A failed write drops
/// it so the next append reopens the path.
pub struct FileSink {
    path: PathBuf,
    display: String,
    file: Mutex<Option<File>>,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            display: path.display().to_string(),
            path,
            file: Mutex::new(None),
        }
    }

    async fn open(&self) -> Result<File, SinkError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| SinkError::Open {
                path: self.display.clone(),
                source,
            })
    }
}

#[async_trait]
impl TelemetrySink for FileSink {
    async fn append(&self, record: &TelemetryRecord) -> Result<(), SinkError> {
        let line = record.to_line()?;

        let mut guard = self.file.lock().await;
        let mut file = match guard.take() {
            Some(file) => file,
            None => {
                tracing::debug!(path = %self.display, "opening telemetry sink");
                self.open().await?
            }
        };

        let written = match file.write_all(line.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };

        match written {
            Ok(()) => {
                *guard = Some(file);
                Ok(())
            }
            Err(source) => Err(SinkError::Write {
                path: self.display.clone(),
                source,
            }),
        }
    }

    fn describe(&self) -> &str {
        &self.display
    }
}

/// Keeps serialized lines in memory.
#[derive(Default)]
pub struct MemorySink {
    lines: StdMutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything appended so far, terminators included.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Parse every line back into a record.
    pub fn records(&self) -> Result<Vec<TelemetryRecord>, serde_json::Error> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TelemetrySink for MemorySink {
    async fn append(&self, record: &TelemetryRecord) -> Result<(), SinkError> {
        let line = record.to_line()?;
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line);
        Ok(())
    }

    fn describe(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::block::RawBlock;

    fn record(n: u64) -> TelemetryRecord {
        let block = RawBlock {
            number: n,
            hash: format!("0x{n:x}"),
            timestamp: 1,
            transactions: vec![],
            gas_limit: 30_000_000,
            gas_used: 0,
        };
        TelemetryRecord::assemble(&block, None, None, 1_700_000_000_000)
    }

    #[tokio::test]
    async fn file_sink_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.log");
        let sink = FileSink::new(&path);

        for n in 0..3 {
            sink.append(&record(n)).await.unwrap();
        }

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(text.ends_with('\n'));
        for (n, line) in lines.iter().enumerate() {
            let rec: TelemetryRecord = serde_json::from_str(line).unwrap();
            assert_eq!(rec.block_num, n as u64);
        }
    }

    #[tokio::test]
    async fn file_sink_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.log");
        std::fs::write(&path, "previous\n").unwrap();

        FileSink::new(&path).append(&record(7)).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("previous\n"));
        assert_eq!(text.lines().count(), 2);
    }

    #[tokio::test]
    async fn concurrent_appends_do_not_tear_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.log");
        let sink = Arc::new(FileSink::new(&path));

        let mut handles = Vec::new();
        for n in 0..50 {
            let sink = Arc::clone(&sink);
            handles.push(tokio::spawn(async move { sink.append(&record(n)).await }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let text = std::fs::read_to_string(&path).unwrap();
        let mut seen: Vec<u64> = text
            .lines()
            .map(|l| serde_json::from_str::<TelemetryRecord>(l).unwrap().block_num)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn unopenable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("missing").join("telemetry.log"));
        let err = sink.append(&record(1)).await.unwrap_err();
        assert!(matches!(err, SinkError::Open { .. }));
    }

    #[test]
    fn file_sink_describes_its_path() {
        let sink = FileSink::new("/tmp/telemetry.log");
        assert_eq!(sink.describe(), "/tmp/telemetry.log");
    }

    #[tokio::test]
    async fn memory_sink_collects_lines() {
        let sink = MemorySink::new();
        sink.append(&record(1)).await.unwrap();
        sink.append(&record(2)).await.unwrap();
        assert_eq!(sink.len(), 2);
        assert!(sink.lines().iter().all(|l| l.ends_with('\n')));
        assert_eq!(sink.records().unwrap()[1].block_num, 2);
    }
}

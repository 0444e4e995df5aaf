//! Append-only CSV result store.

use crate::error::{SinkError, SinkResult};
use crate::sink::RecordSink;
use async_trait::async_trait;
use gavel_core::ScoreRecord;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Column order of the output table.
const COLUMNS: [&str; 11] = [
    "row_id",
    "metric",
    "score",
    "revised_score",
    "revision_delta",
    "critique",
    "self_conf",
    "agree_conf",
    "status",
    "error",
    "timestamp",
];

/// Append-only CSV sink.
///
/// The header is written only when the file is new or empty, so repeated
/// runs accumulate rows without clobbering prior results. Every append is
/// flushed before returning, and the writer sits behind an async mutex:
/// the single-writer discipline that keeps concurrent completions from
/// interleaving.
pub struct CsvSink {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
}

impl std::fmt::Debug for CsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSink").field("path", &self.path).finish()
    }
}

impl CsvSink {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> SinkResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;
        let is_new = file
            .metadata()
            .map(|m| m.len() == 0)
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(COLUMNS)?;
            writer.flush()?;
        }

        debug!(path = %path.display(), new = is_new, "opened csv result store");
        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    /// Where the store lives.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSink for CsvSink {
    async fn append(&self, record: &ScoreRecord) -> SinkResult<()> {
        let row = [
            record.row_id.clone(),
            record.metric.clone(),
            opt_float(record.score),
            opt_float(record.revised_score),
            opt_float(record.revision_delta),
            record.critique.clone().unwrap_or_default(),
            opt_float(record.self_conf),
            opt_float(record.agree_conf),
            record.status.as_str().to_string(),
            record.error.clone().unwrap_or_default(),
            record.timestamp.to_rfc3339(),
        ];

        let mut writer = self.writer.lock().await;
        writer.write_record(&row)?;
        writer.flush()?;
        Ok(())
    }
}

/// Absent values serialize as empty cells, never as `0`.
fn opt_float(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_core::PairStatus;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn record(row_id: &str, score: Option<f64>) -> ScoreRecord {
        let mut record = ScoreRecord::new(row_id, "accuracy");
        record.score = score;
        record.status = if score.is_some() {
            PairStatus::Done
        } else {
            PairStatus::ScoreFailed
        };
        record
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[tokio::test]
    async fn test_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.csv");

        let sink = CsvSink::open(&path).unwrap();
        sink.append(&record("r1", Some(7.0))).await.unwrap();
        sink.append(&record("r2", None)).await.unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("row_id,metric,score"));
        assert!(lines[1].starts_with("r1,accuracy,7,"));
        // absent score is an empty cell, not zero
        assert!(lines[2].starts_with("r2,accuracy,,"));
        assert!(lines[2].contains("SCORE_FAILED"));
    }

    #[tokio::test]
    async fn test_reopening_appends_without_second_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.csv");

        {
            let sink = CsvSink::open(&path).unwrap();
            sink.append(&record("r1", Some(5.0))).await.unwrap();
        }
        {
            let sink = CsvSink::open(&path).unwrap();
            sink.append(&record("r2", Some(6.0))).await.unwrap();
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().filter(|l| l.starts_with("row_id,")).count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.csv");
        let sink = Arc::new(CsvSink::open(&path).unwrap());

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let sink = sink.clone();
                tokio::spawn(async move {
                    sink.append(&record(&format!("r{i}"), Some(i as f64 % 10.0)))
                        .await
                        .unwrap();
                })
            })
            .collect();
        futures::future::join_all(tasks).await;

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 33);
        // every data line is a complete 11-column row
        for line in &lines[1..] {
            assert_eq!(line.split(',').count(), 11, "malformed row: {line}");
        }
    }

    #[tokio::test]
    async fn test_open_failure() {
        let err = CsvSink::open("/nonexistent/dir/scores.csv").unwrap_err();
        assert!(matches!(err, SinkError::Open { .. }));
    }
}

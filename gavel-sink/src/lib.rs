//! # gavel-sink
//!
//! Durable, appendable stores for [`ScoreRecord`]s:
//!
//! - [`RecordSink`]: the append contract the orchestrator writes through
//! - [`CsvSink`]: append-only CSV file, one flush per record, single-writer
//! - [`MemorySink`]: in-memory collector for tests
//!
//! The sink is the one piece of mutable state shared by concurrent
//! evaluation tasks; implementations serialize writes internally so
//! out-of-order completions never interleave a partial row.
//!
//! [`ScoreRecord`]: gavel_core::ScoreRecord

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod csv;
pub mod error;
pub mod sink;

pub use crate::csv::CsvSink;
pub use error::{SinkError, SinkResult};
pub use sink::{MemorySink, RecordSink, SharedSink};

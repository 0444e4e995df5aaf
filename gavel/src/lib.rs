//! # gavel - LLM-as-judge evaluation harness
//!
//! gavel grades free-text model outputs against a panel of YAML-declared
//! rubrics, using an external language model as the grader. A run turns a
//! dataset of (question, answer, context) rows and a registry of metric
//! specifications into an append-only table of scores, self-reflection
//! revisions, and confidence/agreement statistics, while tolerating an
//! unreliable, rate-limited, non-deterministic grader.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gavel::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = MetricRegistry::load("rubrics")?;
//!     let dataset = Dataset::from_csv("qa_rows.csv")?;
//!
//!     let grader = Arc::new(ChatGrader::new(
//!         GraderConfig::from_env("gpt-4-turbo-preview")?,
//!     )?);
//!     let sink = Arc::new(CsvSink::open("scores.csv")?);
//!
//!     let report = EvalRunner::new(grader, sink)
//!         .options(RunOptions::new().concurrency(8))
//!         .run(&registry, &dataset)
//!         .await?;
//!     report.print_summary();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! gavel is organized as a workspace of focused crates:
//!
//! - [`gavel_core`] - Shared types: messages, rows, score records, stats
//! - [`gavel_metrics`] - Metric specs, YAML registry, templates, parsing
//! - [`gavel_grader`] - Retrying grader client and mocks
//! - [`gavel_sink`] - Append-only result stores
//! - [`gavel_runner`] - The four-phase evaluation orchestrator

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub use gavel_core as core;
pub use gavel_grader as grader;
pub use gavel_metrics as metrics;
pub use gavel_runner as runner;
pub use gavel_sink as sink;

// Top-level re-exports of the main API surface.
pub use gavel_core::{ChatMessage, EvalRow, PairStatus, Role, ScoreRecord};
pub use gavel_grader::{
    ChatGrader, FnGrader, GraderClient, GraderConfig, GraderError, MockGrader, RetryConfig,
};
pub use gavel_metrics::{MetricRegistry, MetricSpec, PromptTemplate, ScoreRule};
pub use gavel_runner::{Dataset, EvalRunner, RunOptions, RunReport, RunSummary, RunnerError};
pub use gavel_sink::{CsvSink, MemorySink, RecordSink};

/// Prelude for common imports.
pub mod prelude {
    pub use gavel_core::{ChatMessage, EvalRow, PairStatus, ScoreRecord};
    pub use gavel_grader::{ChatGrader, GraderClient, GraderConfig, RetryConfig};
    pub use gavel_metrics::{MetricRegistry, MetricSpec};
    pub use gavel_runner::{Dataset, EvalRunner, RunOptions, RunReport};
    pub use gavel_sink::{CsvSink, MemorySink, RecordSink};
}

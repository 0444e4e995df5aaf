//! Sink errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the durable result store.
///
/// Unlike per-pair grader or parse failures, a sink failure means durability
/// is broken and the run should stop.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The store file could not be opened.
    #[error("failed to open result store '{path}': {source}")]
    Open {
        /// Store path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A record could not be written.
    #[error("failed to append record: {0}")]
    Write(#[from] ::csv::Error),

    /// Flushing the store failed.
    #[error("failed to flush result store: {0}")]
    Flush(#[from] std::io::Error),
}

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

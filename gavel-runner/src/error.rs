//! Run-level errors.
//!
//! Everything here is fatal for the run. Failures local to one (row, metric)
//! pair never surface as a `RunnerError`; they are recorded in the pair's
//! [`ScoreRecord`](gavel_core::ScoreRecord) and the run continues.

use gavel_metrics::RegistryError;
use gavel_sink::SinkError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an evaluation run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The dataset could not be loaded.
    #[error("failed to load dataset '{path}': {message}")]
    Dataset {
        /// Dataset path.
        path: PathBuf,
        /// What was wrong.
        message: String,
    },

    /// The metric registry failed to load or validate.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The result store failed; durability is broken.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Every grader call failed authorization before any succeeded;
    /// the credentials are bad globally, not for one pair.
    #[error("grader rejected credentials on the first call; check API key and model")]
    BadCredentials,
}

impl RunnerError {
    /// Create a dataset error.
    pub fn dataset(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Dataset {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for run-level operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

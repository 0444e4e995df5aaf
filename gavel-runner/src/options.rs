//! Run configuration.

use std::time::Duration;

/// Rows kept in quick mode.
pub const QUICK_ROWS: usize = 3;
/// Metrics kept in quick mode.
pub const QUICK_METRICS: usize = 2;

/// Options for an evaluation run.
///
/// Retry ceiling and backoff live on the grader's own configuration; these
/// options only steer the orchestrator.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum pairs evaluated concurrently.
    pub concurrency: usize,
    /// Evaluate only the first few rows and metrics, for fast iteration.
    pub quick: bool,
    /// Run the self-reflection phase.
    pub reflection: bool,
    /// Run the confidence self-report and agreement resampling phases.
    pub confidence: bool,
    /// Independent resamples per pair for the agreement statistic.
    pub resamples: u32,
    /// A resample agrees when within this distance of the original score.
    pub tolerance: f64,
    /// Wall-clock budget for the run; pairs not started in time are skipped.
    pub deadline: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            quick: false,
            reflection: true,
            confidence: true,
            resamples: 3,
            tolerance: 1.0,
            deadline: None,
        }
    }
}

impl RunOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency limit.
    #[must_use]
    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Enable quick mode.
    #[must_use]
    pub fn quick(mut self) -> Self {
        self.quick = true;
        self
    }

    /// Toggle the self-reflection phase.
    #[must_use]
    pub fn reflection(mut self, enabled: bool) -> Self {
        self.reflection = enabled;
        self
    }

    /// Toggle the confidence and agreement phases.
    #[must_use]
    pub fn confidence(mut self, enabled: bool) -> Self {
        self.confidence = enabled;
        self
    }

    /// Set the resample count.
    #[must_use]
    pub fn resamples(mut self, n: u32) -> Self {
        self.resamples = n;
        self
    }

    /// Set the agreement tolerance.
    #[must_use]
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set a wall-clock deadline for the run.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

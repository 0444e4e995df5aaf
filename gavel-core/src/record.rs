//! Per-pair evaluation outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of one (row, metric) pair as it moves through the pipeline.
///
/// `Pending → Scored → (Reflected | ReflectFailed) →
/// (ConfidenceRecorded | ConfidenceFailed) → (Resampled | ResampleFailed) →
/// Done`. `ScoreFailed` is terminal and short-circuits the later phases;
/// `Skipped` marks pairs that were never attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PairStatus {
    /// Not yet evaluated.
    Pending,
    /// Initial score obtained.
    Scored,
    /// Initial scoring failed (grader, render, or parse). Terminal.
    ScoreFailed,
    /// Self-reflection produced a revised score.
    Reflected,
    /// Self-reflection failed; initial score preserved.
    ReflectFailed,
    /// Confidence self-report obtained.
    ConfidenceRecorded,
    /// Confidence self-report failed.
    ConfidenceFailed,
    /// Agreement resampling completed with at least one successful resample.
    Resampled,
    /// No resample succeeded.
    ResampleFailed,
    /// Pipeline finished.
    Done,
    /// Pair was never attempted (deadline exceeded or duplicate key).
    Skipped,
}

impl PairStatus {
    /// Stable string form used in the output table.
    pub fn as_str(&self) -> &'static str {
        match self {
            PairStatus::Pending => "PENDING",
            PairStatus::Scored => "SCORED",
            PairStatus::ScoreFailed => "SCORE_FAILED",
            PairStatus::Reflected => "REFLECTED",
            PairStatus::ReflectFailed => "REFLECT_FAILED",
            PairStatus::ConfidenceRecorded => "CONFIDENCE_RECORDED",
            PairStatus::ConfidenceFailed => "CONFIDENCE_FAILED",
            PairStatus::Resampled => "RESAMPLED",
            PairStatus::ResampleFailed => "RESAMPLE_FAILED",
            PairStatus::Done => "DONE",
            PairStatus::Skipped => "SKIPPED",
        }
    }

    /// Whether no further phase may run after this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PairStatus::Done | PairStatus::ScoreFailed | PairStatus::Skipped
        )
    }
}

/// Outcome of evaluating one (row, metric) pair.
///
/// Created once by the orchestrator and never mutated after being handed to
/// the sink. Absent fields mean the producing phase was disabled or failed;
/// they are never defaulted (zero is a valid score).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Identifier of the evaluated row.
    pub row_id: String,
    /// Name of the metric applied.
    pub metric: String,
    /// Initial score, expected in 0–10. Absent when scoring failed.
    pub score: Option<f64>,
    /// Score after self-reflection.
    pub revised_score: Option<f64>,
    /// `revised_score - score`; absent whenever either side is absent.
    pub revision_delta: Option<f64>,
    /// Free-text critique from the reflection pass.
    pub critique: Option<String>,
    /// Self-reported confidence in 0–100.
    pub self_conf: Option<f64>,
    /// Percentage of successful resamples within tolerance of `score`.
    pub agree_conf: Option<f64>,
    /// Final pipeline state for this pair.
    pub status: PairStatus,
    /// Categorized message for the most recent phase failure, if any.
    pub error: Option<String>,
    /// Creation time; immutable once written.
    pub timestamp: DateTime<Utc>,
}

impl ScoreRecord {
    /// Create an empty record for a pair about to be evaluated.
    pub fn new(row_id: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            metric: metric.into(),
            score: None,
            revised_score: None,
            revision_delta: None,
            critique: None,
            self_conf: None,
            agree_conf: None,
            status: PairStatus::Pending,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a record for a pair that was never attempted.
    pub fn skipped(
        row_id: impl Into<String>,
        metric: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let mut record = Self::new(row_id, metric);
        record.status = PairStatus::Skipped;
        record.error = Some(reason.into());
        record
    }

    /// Record the revised score and derive the delta from the initial score.
    pub fn set_revision(&mut self, revised: f64, critique: impl Into<String>) {
        self.revised_score = Some(revised);
        self.revision_delta = self.score.map(|s| revised - s);
        self.critique = Some(critique.into());
    }

    /// Every enabled phase succeeded.
    pub fn is_fully_scored(&self) -> bool {
        self.status == PairStatus::Done && self.error.is_none()
    }

    /// Initial score exists but some later phase failed or was cut off.
    pub fn is_partially_scored(&self) -> bool {
        self.status == PairStatus::Done && self.error.is_some()
    }
}

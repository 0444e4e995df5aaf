//! Run reports and summaries.

use gavel_core::{PairStatus, ScoreRecord};
use std::time::Duration;
use uuid::Uuid;

/// Aggregate counts over a run's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Pairs attempted or skipped.
    pub total: usize,
    /// Every enabled phase succeeded.
    pub fully_scored: usize,
    /// Initial score present but a later phase failed or was cut off.
    pub partially_scored: usize,
    /// Initial scoring failed.
    pub failed: usize,
    /// Never attempted (deadline or duplicate key).
    pub skipped: usize,
}

impl RunSummary {
    /// Tally a set of records.
    pub fn from_records(records: &[ScoreRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            fully_scored: 0,
            partially_scored: 0,
            failed: 0,
            skipped: 0,
        };
        for record in records {
            match record.status {
                PairStatus::ScoreFailed => summary.failed += 1,
                PairStatus::Skipped => summary.skipped += 1,
                _ if record.is_fully_scored() => summary.fully_scored += 1,
                _ => summary.partially_scored += 1,
            }
        }
        summary
    }
}

/// Outcome of one evaluation run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Unique id for this run.
    pub run_id: Uuid,
    /// One record per (row, metric) pair.
    pub records: Vec<ScoreRecord>,
    /// Wall-clock duration.
    pub elapsed: Duration,
    /// Aggregate counts.
    pub summary: RunSummary,
}

impl RunReport {
    /// Build a report from emitted records.
    pub fn new(records: Vec<ScoreRecord>, elapsed: Duration) -> Self {
        let summary = RunSummary::from_records(&records);
        Self {
            run_id: Uuid::new_v4(),
            records,
            elapsed,
            summary,
        }
    }

    /// Mean of the initial scores that exist.
    pub fn average_score(&self) -> Option<f64> {
        let scores: Vec<f64> = self.records.iter().filter_map(|r| r.score).collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }

    /// Print a human-readable summary.
    ///
    /// Per-pair failures appear as categorized one-line messages, never
    /// stack traces.
    pub fn print_summary(&self) {
        println!("\n\u{1F4CA} Evaluation Summary");
        println!("═══════════════════");
        println!("Run: {}", self.run_id);
        println!("Pairs: {}", self.summary.total);
        println!("✅ Fully scored: {}", self.summary.fully_scored);
        if self.summary.partially_scored > 0 {
            println!("◑ Partially scored: {}", self.summary.partially_scored);
        }
        if self.summary.failed > 0 {
            println!("❌ Failed: {}", self.summary.failed);
        }
        if self.summary.skipped > 0 {
            println!("⏭ Skipped: {}", self.summary.skipped);
        }
        if let Some(avg) = self.average_score() {
            println!("Average score: {:.2}", avg);
        }
        println!("Duration: {:?}", self.elapsed);

        for record in &self.records {
            if let Some(error) = &record.error {
                println!(
                    "  {} × {} [{}]: {}",
                    record.row_id,
                    record.metric,
                    record.status.as_str(),
                    error
                );
            }
        }
    }
}

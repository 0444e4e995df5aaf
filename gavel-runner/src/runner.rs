//! The evaluation orchestrator.

use crate::dataset::Dataset;
use crate::error::{RunnerError, RunnerResult};
use crate::options::{RunOptions, QUICK_METRICS, QUICK_ROWS};
use crate::report::RunReport;
use futures::future::join_all;
use gavel_core::{ChatMessage, EvalRow, PairStatus, ScoreRecord};
use gavel_grader::{GraderClient, GraderResult};
use gavel_metrics::{
    parse_confidence, parse_revision, parse_score, MetricRegistry, MetricSpec, RenderContext,
};
use gavel_sink::RecordSink;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Cross-task observations used to tell "one bad pair" from "bad global
/// configuration".
#[derive(Debug, Default)]
struct RunFlags {
    any_success: AtomicBool,
    auth_failure: AtomicBool,
}

/// Orchestrates a run: (rows × metrics) pairs through the four-phase
/// pipeline, bounded fan-out, one durable record per pair.
pub struct EvalRunner {
    grader: Arc<dyn GraderClient>,
    sink: Arc<dyn RecordSink>,
    options: RunOptions,
}

impl EvalRunner {
    /// Create a runner with default options.
    pub fn new(grader: Arc<dyn GraderClient>, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            grader,
            sink,
            options: RunOptions::default(),
        }
    }

    /// Set run options.
    #[must_use]
    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Evaluate every (row, metric) pair, appending each record to the sink
    /// as soon as its pipeline settles.
    ///
    /// Failures local to a pair are recorded, not raised; only registry
    /// validation, sink writes, and globally bad credentials abort the run.
    pub async fn run(
        &self,
        registry: &MetricRegistry,
        dataset: &Dataset,
    ) -> RunnerResult<RunReport> {
        let started = Instant::now();

        registry.validate_columns(&dataset.covariate_columns())?;
        if registry.is_empty() {
            warn!("metric registry is empty; nothing to evaluate");
        }

        let rows: Vec<&EvalRow> = if self.options.quick {
            dataset.rows().iter().take(QUICK_ROWS).collect()
        } else {
            dataset.rows().iter().collect()
        };
        let metrics: Vec<&MetricSpec> = if self.options.quick {
            registry.iter().take(QUICK_METRICS).collect()
        } else {
            registry.iter().collect()
        };

        // Enumerate pairs exactly once; a duplicate key must not be scored
        // (and billed) twice.
        let mut pairs: Vec<(&EvalRow, &MetricSpec)> = Vec::new();
        let mut records: Vec<ScoreRecord> = Vec::new();
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        for &row in &rows {
            for &spec in &metrics {
                if seen.insert((row.id.as_str(), spec.name.as_str())) {
                    pairs.push((row, spec));
                } else {
                    warn!(row = %row.id, metric = %spec.name, "duplicate pair skipped");
                    records.push(ScoreRecord::skipped(
                        &row.id,
                        &spec.name,
                        "duplicate (row, metric) pair",
                    ));
                }
            }
        }
        for record in &records {
            self.sink.append(record).await?;
        }

        info!(
            rows = rows.len(),
            metrics = metrics.len(),
            pairs = pairs.len(),
            concurrency = self.options.concurrency,
            "starting evaluation run"
        );

        let deadline = self.options.deadline.map(|budget| started + budget);
        let flags = RunFlags::default();
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));

        let tasks: Vec<_> = pairs
            .iter()
            .map(|&(row, spec)| {
                let semaphore = semaphore.clone();
                let flags = &flags;
                async move {
                    let _permit = semaphore.acquire().await.expect("semaphore closed");
                    let record = if past(deadline) {
                        ScoreRecord::skipped(&row.id, &spec.name, "run deadline exceeded")
                    } else {
                        self.evaluate_pair(row, spec, deadline, flags).await
                    };
                    self.sink.append(&record).await.map(|_| record)
                }
            })
            .collect();

        for outcome in join_all(tasks).await {
            records.push(outcome?);
        }

        if flags.auth_failure.load(Ordering::SeqCst) && !flags.any_success.load(Ordering::SeqCst) {
            return Err(RunnerError::BadCredentials);
        }

        let report = RunReport::new(records, started.elapsed());
        info!(
            fully = report.summary.fully_scored,
            partial = report.summary.partially_scored,
            failed = report.summary.failed,
            skipped = report.summary.skipped,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "evaluation run finished"
        );
        Ok(report)
    }

    /// The four-phase pipeline for one pair. Phases are sequential; each
    /// later phase degrades the record on failure without touching what the
    /// earlier phases already produced.
    async fn evaluate_pair(
        &self,
        row: &EvalRow,
        spec: &MetricSpec,
        deadline: Option<Instant>,
        flags: &RunFlags,
    ) -> ScoreRecord {
        let mut record = ScoreRecord::new(&row.id, &spec.name);

        // Phase 1: initial scoring. Failure here is terminal for the pair.
        let prompt = match spec.prompt.render(&RenderContext::new(row)) {
            Ok(prompt) => prompt,
            Err(error) => return fail_scoring(record, format!("render: {error}")),
        };
        let reply = match self.grade(&prompt, flags).await {
            Ok(reply) => reply,
            Err(error) => return fail_scoring(record, format!("grader: {error}")),
        };
        let score = match parse_score(&reply, &spec.parser) {
            Ok(score) => score,
            Err(error) => return fail_scoring(record, format!("parse: {error}")),
        };
        record.score = Some(score);
        record.status = PairStatus::Scored;
        debug!(row = %row.id, metric = %spec.name, score, "scored");

        let mut cut_off = false;

        // Phase 2: self-reflection.
        if self.options.reflection {
            if let Some(reflection) = &spec.reflection {
                if past(deadline) {
                    record.error = Some("run deadline exceeded before reflection".to_string());
                    cut_off = true;
                } else {
                    let ctx = RenderContext::new(row).with_extra("score", fmt_number(score));
                    let outcome = match reflection.render(&ctx) {
                        Ok(prompt) => match self.grade(&prompt, flags).await {
                            Ok(reply) => parse_revision(&reply)
                                .map_err(|e| format!("reflection parse: {e}")),
                            Err(e) => Err(format!("reflection grader: {e}")),
                        },
                        Err(e) => Err(format!("reflection render: {e}")),
                    };
                    match outcome {
                        Ok(revision) => {
                            record.set_revision(revision.score, revision.critique);
                            record.status = PairStatus::Reflected;
                        }
                        Err(message) => {
                            warn!(row = %row.id, metric = %spec.name, %message, "reflection failed");
                            record.status = PairStatus::ReflectFailed;
                            record.error = Some(message);
                        }
                    }
                }
            }
        }

        // Phase 3: confidence self-report.
        if !cut_off && self.options.confidence {
            if let Some(confidence) = &spec.confidence {
                if past(deadline) {
                    record.error = Some("run deadline exceeded before confidence".to_string());
                    cut_off = true;
                } else {
                    let ctx = RenderContext::new(row).with_extra("score", fmt_number(score));
                    let outcome = match confidence.render(&ctx) {
                        Ok(prompt) => match self.grade(&prompt, flags).await {
                            Ok(reply) => parse_confidence(&reply)
                                .map_err(|e| format!("confidence parse: {e}")),
                            Err(e) => Err(format!("confidence grader: {e}")),
                        },
                        Err(e) => Err(format!("confidence render: {e}")),
                    };
                    match outcome {
                        Ok(level) => {
                            record.self_conf = Some(level);
                            record.status = PairStatus::ConfidenceRecorded;
                        }
                        Err(message) => {
                            warn!(row = %row.id, metric = %spec.name, %message, "confidence failed");
                            record.status = PairStatus::ConfidenceFailed;
                            record.error = Some(message);
                        }
                    }
                }
            }
        }

        // Phase 4: agreement resampling. Fresh scoring calls, not a reuse
        // of the phase-1 result.
        if !cut_off && self.options.confidence && self.options.resamples > 0 {
            if past(deadline) {
                record.error = Some("run deadline exceeded before resampling".to_string());
            } else {
                let mut resamples: Vec<f64> = Vec::with_capacity(self.options.resamples as usize);
                for attempt in 1..=self.options.resamples {
                    match self.grade(&prompt, flags).await {
                        Ok(reply) => match parse_score(&reply, &spec.parser) {
                            Ok(value) => resamples.push(value),
                            Err(error) => {
                                debug!(row = %row.id, metric = %spec.name, attempt, %error, "resample unparseable")
                            }
                        },
                        Err(error) => {
                            debug!(row = %row.id, metric = %spec.name, attempt, %error, "resample failed")
                        }
                    }
                }
                // Failed resamples leave both numerator and denominator.
                if resamples.is_empty() {
                    record.status = PairStatus::ResampleFailed;
                    record.error = Some(format!(
                        "resample: all {} resamples failed",
                        self.options.resamples
                    ));
                } else {
                    let within = resamples
                        .iter()
                        .filter(|value| (**value - score).abs() <= self.options.tolerance)
                        .count();
                    let agreement = within as f64 / resamples.len() as f64 * 100.0;
                    record.agree_conf = Some(round_tenth(agreement));
                    record.status = PairStatus::Resampled;
                }
            }
        }

        record.status = PairStatus::Done;
        record
    }

    /// One grader invocation, recording global auth/success observations.
    async fn grade(&self, prompt: &str, flags: &RunFlags) -> GraderResult<String> {
        let messages = [ChatMessage::user(prompt)];
        match self.grader.complete(&messages).await {
            Ok(reply) => {
                flags.any_success.store(true, Ordering::SeqCst);
                Ok(reply)
            }
            Err(error) => {
                if error.is_auth() {
                    flags.auth_failure.store(true, Ordering::SeqCst);
                }
                Err(error)
            }
        }
    }
}

fn fail_scoring(mut record: ScoreRecord, message: String) -> ScoreRecord {
    warn!(row = %record.row_id, metric = %record.metric, %message, "initial scoring failed");
    record.status = PairStatus::ScoreFailed;
    record.error = Some(message);
    record
}

fn past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// Interpolate scores without trailing `.0` noise.
fn fmt_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

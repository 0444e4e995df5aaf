//! Full-pipeline scenario: 2 rows × 2 metrics with one permanently failing
//! pair, plus CSV durability across runs.

use gavel_core::{ChatMessage, EvalRow, PairStatus};
use gavel_grader::{FnGrader, GraderError, GraderResult};
use gavel_metrics::{MetricRegistry, MetricSpec};
use gavel_runner::{Dataset, EvalRunner, RunOptions};
use gavel_sink::{CsvSink, MemorySink};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("gavel_runner=debug")
        .with_test_writer()
        .try_init();
}

fn metric(name: &str) -> MetricSpec {
    let yaml = format!(
        r#"
name: {name}
description: test metric {name}
prompt_template: "[{name}] Rate the answer '{{answer}}' to '{{question}}' (row {{id}}) from 0-10."
parser: number
rai_category: quality
reflection_prompt: "[{name}] You scored {{score}}/10 for row {{id}}. Reconsider and reply as \"Revised score: X\"."
confidence_prompt: "[{name}] You scored {{score}}/10 for row {{id}}. How confident are you, 0-100?"
"#
    );
    MetricSpec::from_yaml_str(&yaml, Path::new("test.yaml")).unwrap()
}

fn registry() -> MetricRegistry {
    MetricRegistry::from_specs(vec![metric("m1"), metric("m2")]).unwrap()
}

fn dataset() -> Dataset {
    Dataset::new(vec![
        EvalRow::new("r1", "What is the boiling point of water?", "100C at sea level."),
        EvalRow::new("r2", "Who wrote Hamlet?", "Shakespeare."),
    ])
}

/// Grader that answers every prompt sensibly, except that the (r2, m2)
/// scoring prompt always fails as if retries were already exhausted.
fn scripted_grader() -> FnGrader<impl Fn(&[ChatMessage]) -> GraderResult<String> + Send + Sync> {
    FnGrader::new(|messages: &[ChatMessage]| {
        let prompt = &messages[0].content;
        if prompt.contains("[m2]") && prompt.contains("row r2") && !prompt.contains("scored") {
            return Err(GraderError::Exhausted {
                attempts: 3,
                last: Box::new(GraderError::transient_status(503, "permanently down")),
            });
        }
        if prompt.contains("How confident") {
            Ok("I'd say 85 out of 100.".to_string())
        } else if prompt.contains("Revised score") {
            Ok("The phrasing is fine. Revised score: 8".to_string())
        } else {
            Ok("7".to_string())
        }
    })
}

#[tokio::test]
async fn two_rows_two_metrics_with_one_failing_pair() {
    init_tracing();

    let grader = Arc::new(scripted_grader());
    let sink = Arc::new(MemorySink::new());
    let runner = EvalRunner::new(grader, sink.clone())
        .options(RunOptions::new().concurrency(4).resamples(3));

    let report = runner.run(&registry(), &dataset()).await.unwrap();

    // all four pairs attempted, exactly one terminal failure
    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.fully_scored, 3);
    assert_eq!(report.summary.skipped, 0);
    assert_eq!(sink.len(), 4);

    let records = sink.records();
    let failed = records
        .iter()
        .find(|r| r.row_id == "r2" && r.metric == "m2")
        .unwrap();
    assert_eq!(failed.status, PairStatus::ScoreFailed);
    assert_eq!(failed.score, None);
    assert!(failed.error.as_deref().unwrap().contains("exhausted"));

    for record in records.iter().filter(|r| r.status == PairStatus::Done) {
        assert_eq!(record.score, Some(7.0));
        assert_eq!(record.revised_score, Some(8.0));
        assert_eq!(record.revision_delta, Some(1.0));
        assert_eq!(record.critique.as_deref(), Some("The phrasing is fine."));
        assert_eq!(record.self_conf, Some(85.0));
        // identical resample replies all agree with the original score
        assert_eq!(record.agree_conf, Some(100.0));
        assert!(record.error.is_none());
    }
}

#[tokio::test]
async fn csv_store_accumulates_across_runs() {
    init_tracing();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scores.csv");

    for _ in 0..2 {
        let grader = Arc::new(scripted_grader());
        let sink = Arc::new(CsvSink::open(&path).unwrap());
        let runner = EvalRunner::new(grader, sink)
            .options(RunOptions::new().concurrency(2).resamples(3));
        runner.run(&registry(), &dataset()).await.unwrap();
    }

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    // one header plus 4 pairs per run, nothing clobbered
    assert_eq!(lines.len(), 9);
    assert!(lines[0].starts_with("row_id,metric,score"));
    assert_eq!(
        lines.iter().filter(|l| l.contains("SCORE_FAILED")).count(),
        2
    );
}

#[tokio::test]
async fn deadline_skips_unstarted_pairs() {
    init_tracing();

    let grader = Arc::new(FnGrader::new(|_: &[ChatMessage]| Ok("7".to_string())));
    let sink = Arc::new(MemorySink::new());
    let runner = EvalRunner::new(grader, sink.clone()).options(
        RunOptions::new()
            .concurrency(1)
            .reflection(false)
            .confidence(false)
            .deadline(std::time::Duration::ZERO),
    );

    let report = runner.run(&registry(), &dataset()).await.unwrap();

    // the deadline was already spent before any pair started
    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.skipped, 4);
    for record in sink.records() {
        assert_eq!(record.status, PairStatus::Skipped);
        assert!(record.error.as_deref().unwrap().contains("deadline"));
    }
}

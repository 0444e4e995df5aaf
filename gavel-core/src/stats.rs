//! Fairness and calibration statistics.
//!
//! These are the numeric covariates injected into prompt templates alongside
//! row fields: group-wise gaps computed over a dataset's label vectors. All
//! functions are pure and operate on parallel slices; inputs shorter than
//! their partners are truncated to the common length.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Demographic parity gap: max − min positive prediction rate across groups.
///
/// Returns 0.0 when there are no samples or a single group.
pub fn demographic_parity_gap<G: Eq + Hash>(y_pred: &[bool], groups: &[G]) -> f64 {
    let mut counts: HashMap<&G, (usize, usize)> = HashMap::new();
    for (pred, group) in y_pred.iter().zip(groups) {
        let entry = counts.entry(group).or_insert((0, 0));
        entry.0 += 1;
        if *pred {
            entry.1 += 1;
        }
    }
    gap(counts.values().map(|&(n, pos)| pos as f64 / n as f64))
}

/// True-positive-rate gap: max − min recall across groups.
///
/// Groups with no actual positives contribute a rate of 0.0, matching the
/// convention of the source statistics.
pub fn true_positive_rate_gap<G: Eq + Hash>(
    y_true: &[bool],
    y_pred: &[bool],
    groups: &[G],
) -> f64 {
    let mut counts: HashMap<&G, (usize, usize)> = HashMap::new();
    let mut seen: HashSet<&G> = HashSet::new();
    for ((truth, pred), group) in y_true.iter().zip(y_pred).zip(groups) {
        seen.insert(group);
        if *truth {
            let entry = counts.entry(group).or_insert((0, 0));
            entry.0 += 1;
            if *pred {
                entry.1 += 1;
            }
        }
    }
    gap(seen.iter().map(|g| {
        counts
            .get(*g)
            .map(|&(n, tp)| tp as f64 / n as f64)
            .unwrap_or(0.0)
    }))
}

/// Per-group calibration gap.
///
/// Probabilities are bucketed into `n_bins` equal-width reliability bins on
/// [0, 1]; each group's gap is the max over its non-empty bins of
/// |bin accuracy − bin confidence|, and the result is the max over groups.
pub fn calibration_gap<G: Eq + Hash>(
    y_true: &[bool],
    y_prob: &[f64],
    groups: &[G],
    n_bins: usize,
) -> f64 {
    if n_bins == 0 {
        return 0.0;
    }

    // (prob sum, correct count, total) per (group, bin)
    let mut bins: HashMap<(&G, usize), (f64, usize, usize)> = HashMap::new();
    for ((truth, prob), group) in y_true.iter().zip(y_prob).zip(groups) {
        let idx = ((prob * n_bins as f64) as usize).min(n_bins - 1);
        let entry = bins.entry((group, idx)).or_insert((0.0, 0, 0));
        entry.0 += prob;
        if *truth {
            entry.1 += 1;
        }
        entry.2 += 1;
    }

    let mut group_gaps: HashMap<&G, f64> = HashMap::new();
    for ((group, _), (prob_sum, correct, total)) in &bins {
        let confidence = prob_sum / *total as f64;
        let accuracy = *correct as f64 / *total as f64;
        let bin_gap = (accuracy - confidence).abs();
        let entry = group_gaps.entry(group).or_insert(0.0);
        if bin_gap > *entry {
            *entry = bin_gap;
        }
    }

    group_gaps.into_values().fold(0.0, f64::max)
}

fn gap(rates: impl Iterator<Item = f64>) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for rate in rates {
        min = min.min(rate);
        max = max.max(rate);
    }
    if min.is_finite() {
        max - min
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_demographic_parity_gap() {
        // male: 2/3 positive, female: 1/3 positive -> gap 1/3
        let y_pred = [true, false, false, false, true, true];
        let groups = ["m", "m", "f", "f", "m", "f"];
        let gap = demographic_parity_gap(&y_pred, &groups);
        assert!((gap - 1.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_demographic_parity_single_group() {
        let y_pred = [true, false, true];
        let groups = ["only", "only", "only"];
        assert!(demographic_parity_gap(&y_pred, &groups).abs() < EPS);
    }

    #[test]
    fn test_demographic_parity_empty() {
        let gap = demographic_parity_gap::<&str>(&[], &[]);
        assert_eq!(gap, 0.0);
    }

    #[test]
    fn test_tpr_gap() {
        // m positives: 2, predicted 2 -> tpr 1.0
        // f positives: 1, predicted 0 -> tpr 0.0
        let y_true = [true, false, true, false, true, false];
        let y_pred = [true, false, false, false, true, true];
        let groups = ["m", "m", "f", "f", "m", "f"];
        let gap = true_positive_rate_gap(&y_true, &y_pred, &groups);
        assert!((gap - 1.0).abs() < EPS);
    }

    #[test]
    fn test_tpr_gap_group_without_positives() {
        let y_true = [true, false];
        let y_pred = [true, false];
        let groups = ["a", "b"];
        // group b has no positives: rate 0.0 vs a's 1.0
        let gap = true_positive_rate_gap(&y_true, &y_pred, &groups);
        assert!((gap - 1.0).abs() < EPS);
    }

    #[test]
    fn test_calibration_gap_perfectly_calibrated() {
        // probability 0.95 bin, all correct: confidence 0.95, accuracy 1.0
        let y_true = [true, true, true, true];
        let y_prob = [0.95, 0.95, 0.95, 0.95];
        let groups = ["g", "g", "g", "g"];
        let gap = calibration_gap(&y_true, &y_prob, &groups, 10);
        assert!((gap - 0.05).abs() < EPS);
    }

    #[test]
    fn test_calibration_gap_overconfident_group() {
        // group a: prob 0.9 but half correct -> gap 0.4
        // group b: prob 0.55, half correct -> gap 0.05
        let y_true = [true, false, true, false];
        let y_prob = [0.9, 0.9, 0.55, 0.55];
        let groups = ["a", "a", "b", "b"];
        let gap = calibration_gap(&y_true, &y_prob, &groups, 10);
        assert!((gap - 0.4).abs() < EPS);
    }

    #[test]
    fn test_calibration_gap_empty() {
        assert_eq!(calibration_gap::<&str>(&[], &[], &[], 10), 0.0);
        assert_eq!(calibration_gap(&[true], &[0.5], &["g"], 0), 0.0);
    }

    #[test]
    fn test_probability_one_lands_in_last_bin() {
        let y_true = [true];
        let y_prob = [1.0];
        let groups = ["g"];
        // confidence 1.0, accuracy 1.0 -> gap 0
        let gap = calibration_gap(&y_true, &y_prob, &groups, 10);
        assert!(gap.abs() < EPS);
    }
}

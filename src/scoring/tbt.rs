use serde::Serialize;

use super::config::TbtNormalization;
use super::factors::{finite_or_zero, percent_change};

/// Total Blocking Time readings (milliseconds) for one site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TbtSample {
    pub current: f64,
    pub previous: f64,
}

impl TbtSample {
    pub fn delta(&self) -> f64 {
        finite_or_zero(self.current) - finite_or_zero(self.previous)
    }
}

/// Scored TBT change for one site.
///
/// A falling TBT is an improvement, so a negative `delta` yields a positive
/// `score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TbtMetric {
    pub current: f64,
    pub previous: f64,
    pub delta: f64,
    /// In `[-1, 1]`
    pub normalized_delta: f64,
    /// Display only, never feeds `score`.
    pub percent_change: f64,
    pub score: f64,
}

/// Score every sample of a batch.
///
/// With [`TbtNormalization::BatchRelative`] each site's result depends on the
/// other sites in `samples`: deltas are divided by the largest absolute delta
/// of the batch. Output order matches input order.
pub fn score_tbt(samples: &[TbtSample], strategy: TbtNormalization, weight: f64) -> Vec<TbtMetric> {
    match strategy {
        TbtNormalization::BatchRelative => score_batch_relative(samples, weight),
        TbtNormalization::FixedThreshold {
            acceptable_limit_ms,
            max_considered_ms,
        } => samples
            .iter()
            .map(|s| score_fixed_threshold(s, acceptable_limit_ms, max_considered_ms, weight))
            .collect(),
    }
}

fn score_batch_relative(samples: &[TbtSample], weight: f64) -> Vec<TbtMetric> {
    let deltas: Vec<f64> = samples.iter().map(TbtSample::delta).collect();

    let min_delta = deltas.iter().copied().fold(f64::INFINITY, f64::min);
    let max_delta = deltas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let max_abs_delta = if deltas.is_empty() {
        0.0
    } else {
        min_delta.abs().max(max_delta.abs())
    };

    log::debug!(
        "TBT batch of {}: min delta {}, max delta {}",
        samples.len(),
        min_delta,
        max_delta
    );

    samples
        .iter()
        .zip(deltas)
        .map(|(sample, delta)| {
            let normalized_delta = if max_abs_delta == 0.0 {
                0.0
            } else {
                (delta / max_abs_delta).clamp(-1.0, 1.0)
            };
            build_metric(sample, delta, normalized_delta, emphasize(normalized_delta) * weight)
        })
        .collect()
}

fn score_fixed_threshold(
    sample: &TbtSample,
    acceptable_limit_ms: f64,
    max_considered_ms: f64,
    weight: f64,
) -> TbtMetric {
    let delta = sample.delta();
    let current = finite_or_zero(sample.current);
    let span = max_considered_ms - acceptable_limit_ms;

    let normalized_score = if span > 0.0 {
        ((max_considered_ms - current.min(max_considered_ms)) / span).max(0.0)
    } else {
        0.0
    };
    let normalized_delta = if max_considered_ms > 0.0 {
        (delta / max_considered_ms).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    build_metric(sample, delta, normalized_delta, normalized_score * weight)
}

// -sign(n) * n^2: large relative changes count super-linearly, and a
// decrease in TBT contributes positively.
fn emphasize(normalized_delta: f64) -> f64 {
    if normalized_delta == 0.0 {
        0.0
    } else {
        -normalized_delta.signum() * normalized_delta.powi(2)
    }
}

fn build_metric(sample: &TbtSample, delta: f64, normalized_delta: f64, score: f64) -> TbtMetric {
    let previous = finite_or_zero(sample.previous);
    TbtMetric {
        current: finite_or_zero(sample.current),
        previous,
        delta,
        normalized_delta: finite_or_zero(normalized_delta),
        percent_change: percent_change(delta, previous),
        score: finite_or_zero(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(previous: f64, current: f64) -> TbtSample {
        TbtSample { current, previous }
    }

    #[test]
    fn test_normalized_delta_in_range() {
        let samples = vec![
            sample(300.0, 250.0),
            sample(300.0, 1200.0),
            sample(5000.0, 100.0),
            sample(0.0, 0.0),
            sample(40.0, 90.0),
        ];
        let scored = score_tbt(&samples, TbtNormalization::BatchRelative, 1.0);
        assert_eq!(scored.len(), samples.len());
        for metric in &scored {
            assert!(metric.normalized_delta >= -1.0 && metric.normalized_delta <= 1.0);
        }
        // Largest absolute delta maps to an extreme of the range
        assert_eq!(scored[2].normalized_delta, -1.0);
    }

    #[test]
    fn test_degenerate_batch_scores_zero() {
        let samples = vec![sample(300.0, 300.0), sample(0.0, 0.0), sample(120.0, 120.0)];
        let scored = score_tbt(&samples, TbtNormalization::BatchRelative, 1.0);
        for metric in scored {
            assert_eq!(metric.normalized_delta, 0.0);
            assert_eq!(metric.score, 0.0);
        }
    }

    #[test]
    fn test_decrease_scores_positive() {
        let samples = vec![sample(300.0, 250.0), sample(300.0, 400.0)];
        let scored = score_tbt(&samples, TbtNormalization::BatchRelative, 1.0);

        // maxAbs = 100: -0.5 -> +0.25, +1.0 -> -1.0
        assert!((scored[0].normalized_delta + 0.5).abs() < 1e-9);
        assert!((scored[0].score - 0.25).abs() < 1e-9);
        assert!((scored[1].normalized_delta - 1.0).abs() < 1e-9);
        assert!((scored[1].score + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_applied() {
        let samples = vec![sample(300.0, 200.0)];
        let scored = score_tbt(&samples, TbtNormalization::BatchRelative, 2.5);
        assert!((scored[0].score - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_batch_membership_changes_score() {
        let alone = score_tbt(&[sample(300.0, 250.0)], TbtNormalization::BatchRelative, 1.0);
        let with_outlier = score_tbt(
            &[sample(300.0, 250.0), sample(300.0, 800.0)],
            TbtNormalization::BatchRelative,
            1.0,
        );
        assert!(alone[0].score > with_outlier[0].score);
    }

    #[test]
    fn test_percent_change_display() {
        let scored = score_tbt(
            &[sample(200.0, 100.0), sample(0.0, 150.0)],
            TbtNormalization::BatchRelative,
            1.0,
        );
        assert!((scored[0].percent_change + 50.0).abs() < 1e-9);
        assert_eq!(scored[1].percent_change, 0.0);
    }

    #[test]
    fn test_empty_batch() {
        assert!(score_tbt(&[], TbtNormalization::BatchRelative, 1.0).is_empty());
    }

    #[test]
    fn test_fixed_threshold() {
        let strategy = TbtNormalization::FixedThreshold {
            acceptable_limit_ms: 200.0,
            max_considered_ms: 10_000.0,
        };
        let scored = score_tbt(
            &[sample(300.0, 200.0), sample(300.0, 20_000.0)],
            strategy,
            1.0,
        );
        // (10000 - 200) / 9800 = 1.0
        assert!((scored[0].score - 1.0).abs() < 1e-9);
        // Beyond max considered
        assert_eq!(scored[1].score, 0.0);
        assert_eq!(scored[1].normalized_delta, 1.0);
    }

    #[test]
    fn test_fixed_threshold_independent_of_batch() {
        let strategy = TbtNormalization::FixedThreshold {
            acceptable_limit_ms: 200.0,
            max_considered_ms: 10_000.0,
        };
        let alone = score_tbt(&[sample(300.0, 250.0)], strategy, 1.0);
        let with_outlier = score_tbt(&[sample(300.0, 250.0), sample(300.0, 800.0)], strategy, 1.0);
        assert_eq!(alone[0], with_outlier[0]);
    }
}

use serde::{Deserialize, Serialize};

use super::factors::Metric;

/// Leaderboard scoring configuration.
///
/// Both sections are optional; omitted values fall back to the defaults.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   weights:
///     performance: 1.4
///     seo: 1.1
///     total_blocking_time: 1.0
///   tbt_normalization: batch_relative
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: WeightConfig,

    #[serde(default)]
    pub tbt_normalization: TbtNormalization,
}

/// Per-metric weights applied to score deltas.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WeightConfig {
    pub performance: f64,
    pub seo: f64,
    pub accessibility: f64,
    #[serde(alias = "best-practices")]
    pub best_practices: f64,
    pub total_blocking_time: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            performance: 1.4,
            seo: 1.1,
            accessibility: 1.0,
            best_practices: 1.0,
            total_blocking_time: 1.0,
        }
    }
}

impl WeightConfig {
    pub fn weight(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Performance => self.performance,
            Metric::Seo => self.seo,
            Metric::Accessibility => self.accessibility,
            Metric::BestPractices => self.best_practices,
        }
    }
}

/// How Total Blocking Time is folded into a dimensionless score.
///
/// ```yaml
/// tbt_normalization: batch_relative
/// # or
/// tbt_normalization:
///   fixed_threshold:
///     acceptable_limit_ms: 200
///     max_considered_ms: 10000
/// ```
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TbtNormalization {
    /// Deltas scaled by the largest absolute delta in the same batch.
    #[default]
    BatchRelative,
    /// Current TBT scored against fixed limits, independent of the batch.
    FixedThreshold {
        #[serde(default = "default_acceptable_limit_ms")]
        acceptable_limit_ms: f64,
        #[serde(default = "default_max_considered_ms")]
        max_considered_ms: f64,
    },
}

pub const DEFAULT_TBT_ACCEPTABLE_LIMIT_MS: f64 = 200.0;
pub const DEFAULT_TBT_MAX_CONSIDERED_MS: f64 = 10_000.0;

fn default_acceptable_limit_ms() -> f64 {
    DEFAULT_TBT_ACCEPTABLE_LIMIT_MS
}

fn default_max_considered_ms() -> f64 {
    DEFAULT_TBT_MAX_CONSIDERED_MS
}

//! Chart- and table-ready shapes derived from the latest audits.

pub mod distribution;
pub mod series;
pub mod table;

pub use distribution::{score_distribution, DistributionRow, SCORE_RANGES};
pub use series::{
    delta_series, performance_pairs, performance_tbt_points, DeltaPoint, PerformancePair,
    PerformanceTbtPoints, TbtPoint,
};
pub use table::sort_by_column;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::audit::AuditResult;
use crate::scoring::Metric;

/// A category score or Total Blocking Time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum MetricKey {
    Score(Metric),
    TotalBlockingTime,
}

impl MetricKey {
    /// Raw value from one audit result: score in `[0, 1]` or TBT in milliseconds.
    pub fn value(&self, result: &AuditResult) -> Option<f64> {
        match self {
            MetricKey::Score(metric) => result.scores.as_ref()?.get(*metric),
            MetricKey::TotalBlockingTime => result.total_blocking_time,
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKey::Score(metric) => write!(f, "{}", metric),
            MetricKey::TotalBlockingTime => f.write_str("totalBlockingTime"),
        }
    }
}

impl From<MetricKey> for String {
    fn from(key: MetricKey) -> Self {
        key.to_string()
    }
}

impl FromStr for MetricKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "totalBlockingTime" | "total-blocking-time" | "tbt" => Ok(MetricKey::TotalBlockingTime),
            other => other.parse::<Metric>().map(MetricKey::Score).map_err(|_| {
                format!(
                    "unknown metric '{}' (expected performance, seo, accessibility, best-practices or totalBlockingTime)",
                    other
                )
            }),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four PSI categories scored on a `[0, 1]` scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    Performance,
    Seo,
    Accessibility,
    BestPractices,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Performance,
        Metric::Seo,
        Metric::Accessibility,
        Metric::BestPractices,
    ];

    /// Wire name, as used in the API's `scores` object.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Performance => "performance",
            Metric::Seo => "seo",
            Metric::Accessibility => "accessibility",
            Metric::BestPractices => "best-practices",
        }
    }

    /// Short column label
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Performance => "Perf",
            Metric::Seo => "SEO",
            Metric::Accessibility => "A11Y",
            Metric::BestPractices => "BP",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| format!("unknown metric '{}'", s))
    }
}

/// Change of one category score between the previous and current audit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDelta {
    pub current: f64,
    pub previous: f64,
    pub delta: f64,
    pub percent_change: f64,
    /// `delta` scaled by the metric weight
    pub score: f64,
}

impl MetricDelta {
    pub fn calculate(current: f64, previous: f64, weight: f64) -> Self {
        let current = finite_or_zero(current);
        let previous = finite_or_zero(previous);
        let delta = current - previous;

        MetricDelta {
            current,
            previous,
            delta,
            percent_change: percent_change(delta, previous),
            score: finite_or_zero(delta * weight),
        }
    }
}

/// `delta / previous * 100`, or 0 when there is no previous value to compare to.
pub fn percent_change(delta: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        finite_or_zero(delta / previous * 100.0)
    }
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_wire_names() {
        assert_eq!(Metric::BestPractices.as_str(), "best-practices");
        assert_eq!(
            serde_json::to_value(Metric::BestPractices).unwrap(),
            serde_json::json!("best-practices")
        );
        assert_eq!("seo".parse::<Metric>(), Ok(Metric::Seo));
        assert!("pwa".parse::<Metric>().is_err());
    }

    #[test]
    fn test_delta_and_percent_change() {
        let m = MetricDelta::calculate(0.8, 0.6, 1.0);
        assert!((m.delta - 0.2).abs() < 1e-9);
        assert!((m.percent_change - 33.333).abs() < 0.01);
        assert!((m.score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_negative_delta() {
        let m = MetricDelta::calculate(0.5, 0.75, 1.4);
        assert!((m.delta + 0.25).abs() < 1e-9);
        assert!((m.percent_change + 33.333).abs() < 0.01);
        assert!((m.score + 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_zero_previous_guard() {
        let m = MetricDelta::calculate(0.9, 0.0, 1.1);
        assert_eq!(m.percent_change, 0.0);
        assert!((m.delta - 0.9).abs() < 1e-9);
        assert!(m.score.is_finite());
    }

    #[test]
    fn test_weight_scales_score_only() {
        let plain = MetricDelta::calculate(0.7, 0.5, 1.0);
        let heavy = MetricDelta::calculate(0.7, 0.5, 2.0);
        assert_eq!(plain.delta, heavy.delta);
        assert_eq!(plain.percent_change, heavy.percent_change);
        assert!((heavy.score - 2.0 * plain.score).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_inputs_coerced() {
        let m = MetricDelta::calculate(f64::NAN, 0.5, 1.0);
        assert_eq!(m.current, 0.0);
        assert!(m.score.is_finite());
        assert!(m.percent_change.is_finite());
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(MetricDelta::calculate(0.8, 0.6, 1.0)).unwrap();
        assert!(value.get("percentChange").is_some());
        assert!(value.get("score").is_some());
    }
}

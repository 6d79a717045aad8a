use serde::Serialize;

use crate::audit::Site;
use crate::scoring::Metric;

/// Bucket labels, lowest first. Upper bounds are inclusive.
pub const SCORE_RANGES: [&str; 5] = ["0-0.2", "0.2-0.4", "0.4-0.6", "0.6-0.8", "0.8-1.0"];

/// Number of sites per metric whose current score falls in one range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionRow {
    pub name: &'static str,
    pub performance: usize,
    pub seo: usize,
    pub accessibility: usize,
    #[serde(rename = "best-practices")]
    pub best_practices: usize,
}

impl DistributionRow {
    fn empty(name: &'static str) -> Self {
        DistributionRow {
            name,
            performance: 0,
            seo: 0,
            accessibility: 0,
            best_practices: 0,
        }
    }

    pub fn count(&self, metric: Metric) -> usize {
        match metric {
            Metric::Performance => self.performance,
            Metric::Seo => self.seo,
            Metric::Accessibility => self.accessibility,
            Metric::BestPractices => self.best_practices,
        }
    }

    fn bump(&mut self, metric: Metric) {
        match metric {
            Metric::Performance => self.performance += 1,
            Metric::Seo => self.seo += 1,
            Metric::Accessibility => self.accessibility += 1,
            Metric::BestPractices => self.best_practices += 1,
        }
    }
}

fn range_index(score: f64) -> usize {
    if score <= 0.2 {
        0
    } else if score <= 0.4 {
        1
    } else if score <= 0.6 {
        2
    } else if score <= 0.8 {
        3
    } else {
        4
    }
}

/// Histogram of current category scores, one row per range.
///
/// Sites without a current result and missing or non-finite scores are not
/// counted.
pub fn score_distribution(sites: &[Site]) -> Vec<DistributionRow> {
    let mut rows: Vec<DistributionRow> = SCORE_RANGES.into_iter().map(DistributionRow::empty).collect();

    let current_scores = sites
        .iter()
        .filter_map(|site| site.latest_audit()?.audit_result.as_ref()?.scores.as_ref());

    for scores in current_scores {
        for metric in Metric::ALL {
            if let Some(score) = scores.get(metric).filter(|s| s.is_finite()) {
                rows[range_index(score)].bump(metric);
            }
        }
    }

    rows
}

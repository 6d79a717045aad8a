use serde::Serialize;
use std::cmp::Ordering;

use super::config::ScoringConfig;
use super::factors::{finite_or_zero, Metric, MetricDelta};
use super::tbt::{score_tbt, TbtMetric, TbtSample};
use crate::audit::{DeltaPair, Site};

/// Leaderboard ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Winners first: highest total score at the top.
    #[default]
    Descending,
    /// Losers first.
    Ascending,
}

impl Direction {
    pub fn from_show_winners(show_winners: bool) -> Self {
        if show_winners {
            Direction::Descending
        } else {
            Direction::Ascending
        }
    }
}

/// Per-metric changes and the combined weighted score for one site.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardMetrics {
    pub performance: MetricDelta,
    pub seo: MetricDelta,
    pub accessibility: MetricDelta,
    #[serde(rename = "best-practices")]
    pub best_practices: MetricDelta,
    pub total_blocking_time: TbtMetric,
    pub total_score: f64,
}

impl LeaderboardMetrics {
    pub fn metric(&self, metric: Metric) -> &MetricDelta {
        match metric {
            Metric::Performance => &self.performance,
            Metric::Seo => &self.seo,
            Metric::Accessibility => &self.accessibility,
            Metric::BestPractices => &self.best_practices,
        }
    }
}

/// A site annotated with its leaderboard metrics. Serializes as the site's
/// own fields plus a `metrics` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    #[serde(flatten)]
    pub site: Site,
    pub metrics: LeaderboardMetrics,
}

/// Rank sites by how much their audit scores changed since the previous run.
///
/// Sites without both a current and previous `scores` object are left out.
/// TBT is normalized across all remaining sites, so adding or removing a site
/// can change every other site's TBT score. Equal totals keep input order.
pub fn compute_leaderboard(
    sites: &[Site],
    direction: Direction,
    config: &ScoringConfig,
) -> Vec<LeaderboardEntry> {
    let eligible: Vec<(&Site, DeltaPair<'_>)> = sites
        .iter()
        .filter_map(|site| {
            site.latest_audit()
                .and_then(|audit| audit.delta_pair())
                .map(|pair| (site, pair))
        })
        .collect();

    log::debug!(
        "Leaderboard: {} of {} sites have a current and previous audit",
        eligible.len(),
        sites.len()
    );

    let samples: Vec<TbtSample> = eligible
        .iter()
        .map(|(_, pair)| TbtSample {
            current: pair.current.total_blocking_time,
            previous: pair.previous.total_blocking_time,
        })
        .collect();
    let tbt_metrics = score_tbt(
        &samples,
        config.tbt_normalization,
        config.weights.total_blocking_time,
    );

    let mut entries: Vec<LeaderboardEntry> = eligible
        .into_iter()
        .zip(tbt_metrics)
        .map(|((site, pair), tbt)| LeaderboardEntry {
            site: site.clone(),
            metrics: build_metrics(&pair, tbt, config),
        })
        .collect();

    // sort_by is stable
    entries.sort_by(|a, b| compare_entries(a, b, direction));
    entries
}

fn build_metrics(pair: &DeltaPair<'_>, tbt: TbtMetric, config: &ScoringConfig) -> LeaderboardMetrics {
    let delta = |metric: Metric| {
        MetricDelta::calculate(
            pair.current.scores.get(metric).unwrap_or(0.0),
            pair.previous.scores.get(metric).unwrap_or(0.0),
            config.weights.weight(metric),
        )
    };

    let performance = delta(Metric::Performance);
    let seo = delta(Metric::Seo);
    let accessibility = delta(Metric::Accessibility);
    let best_practices = delta(Metric::BestPractices);

    let total_score = finite_or_zero(
        performance.score + seo.score + accessibility.score + best_practices.score + tbt.score,
    );

    LeaderboardMetrics {
        performance,
        seo,
        accessibility,
        best_practices,
        total_blocking_time: tbt,
        total_score,
    }
}

fn compare_entries(a: &LeaderboardEntry, b: &LeaderboardEntry, direction: Direction) -> Ordering {
    let (a, b) = (a.metrics.total_score, b.metrics.total_score);
    match direction {
        Direction::Descending => b.total_cmp(&a),
        Direction::Ascending => a.total_cmp(&b),
    }
}

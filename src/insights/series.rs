use serde::Serialize;
use std::collections::HashMap;

use super::MetricKey;
use crate::audit::{has_audits, AuditResult, Site};
use crate::scoring::Metric;

/// Previous, current and delta of one metric for one site.
///
/// Scores stay on the `[0, 1]` scale; TBT is converted to seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaPoint {
    #[serde(rename = "baseURL")]
    pub base_url: String,
    pub index: usize,
    pub current: Option<f64>,
    pub previous: Option<f64>,
    pub delta: Option<f64>,
}

/// Per-site change of `key` for every audited site, in input order.
pub fn delta_series(sites: &[Site], key: MetricKey) -> Vec<DeltaPoint> {
    let read = |result: Option<&AuditResult>| -> Option<f64> {
        let value = key.value(result?)?;
        Some(match key {
            MetricKey::TotalBlockingTime => value / 1000.0,
            MetricKey::Score(_) => value,
        })
    };

    sites
        .iter()
        .filter(|site| has_audits(site))
        .enumerate()
        .filter_map(|(index, site)| {
            let audit = site.latest_audit()?;
            let current = read(audit.audit_result.as_ref());
            let previous = read(audit.previous_audit_result.as_ref());
            let delta = current.zip(previous).map(|(c, p)| c - p);
            Some(DeltaPoint {
                base_url: site.base_url.clone(),
                index,
                current,
                previous,
                delta,
            })
        })
        .collect()
}

/// Latest performance score of one site on both strategies, as whole percents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePair {
    pub name: String,
    pub mobile_score: u32,
    pub desktop_score: u32,
}

fn performance_percent(site: &Site) -> Option<u32> {
    let score = site
        .latest_audit()?
        .audit_result
        .as_ref()?
        .scores
        .as_ref()?
        .get(Metric::Performance)?;
    score
        .is_finite()
        .then(|| (score * 100.0).round().clamp(0.0, 100.0) as u32)
}

/// Join mobile and desktop results by base URL. Sites audited on only one
/// strategy are dropped; output follows the mobile order.
pub fn performance_pairs(mobile: &[Site], desktop: &[Site]) -> Vec<PerformancePair> {
    let desktop_scores: HashMap<&str, u32> = desktop
        .iter()
        .filter(|site| has_audits(site))
        .filter_map(|site| Some((site.base_url.as_str(), performance_percent(site)?)))
        .collect();

    mobile
        .iter()
        .filter(|site| has_audits(site))
        .filter_map(|site| {
            let desktop_score = *desktop_scores.get(site.base_url.as_str())?;
            Some(PerformancePair {
                name: site.base_url.clone(),
                mobile_score: performance_percent(site)?,
                desktop_score,
            })
        })
        .collect()
}

/// One site's performance (percent) against its TBT (seconds).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TbtPoint {
    pub name: String,
    pub index: usize,
    pub performance: f64,
    pub total_blocking_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceTbtPoints {
    pub current_data: Vec<TbtPoint>,
    pub previous_data: Vec<TbtPoint>,
}

fn tbt_point(name: &str, index: usize, result: &AuditResult) -> Option<TbtPoint> {
    let performance = result.scores.as_ref()?.get(Metric::Performance)?;
    Some(TbtPoint {
        name: name.to_string(),
        index,
        performance: (performance * 100.0).round(),
        total_blocking_time: result.total_blocking_time.unwrap_or(0.0) / 1000.0,
    })
}

/// Performance/TBT scatter points for the current and previous runs.
///
/// `index` is the site's position in `sites`, so current and previous points
/// of the same site can be matched up.
pub fn performance_tbt_points(sites: &[Site]) -> PerformanceTbtPoints {
    let mut points = PerformanceTbtPoints::default();

    for (index, site) in sites.iter().enumerate() {
        if !has_audits(site) {
            continue;
        }
        let Some(audit) = site.latest_audit() else {
            continue;
        };
        if let Some(point) = audit
            .audit_result
            .as_ref()
            .and_then(|r| tbt_point(&site.base_url, index, r))
        {
            points.current_data.push(point);
        }
        if let Some(point) = audit
            .previous_audit_result
            .as_ref()
            .and_then(|r| tbt_point(&site.base_url, index, r))
        {
            points.previous_data.push(point);
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{Audit, AuditConfig, Scores};

    fn result(performance: f64, tbt: Option<f64>) -> AuditResult {
        AuditResult {
            scores: Some(Scores {
                performance: Some(performance),
                ..Scores::default()
            }),
            total_blocking_time: tbt,
            runtime_error: None,
        }
    }

    fn site(url: &str, current: Option<AuditResult>, previous: Option<AuditResult>) -> Site {
        Site {
            id: url.to_string(),
            base_url: url.to_string(),
            is_live: true,
            organization_id: None,
            github_url: None,
            audit_config: AuditConfig::default(),
            extra: Default::default(),
            audits: vec![Audit {
                audit_type: None,
                audited_at: None,
                is_error: false,
                audit_result: current,
                previous_audit_result: previous,
            }],
        }
    }

    #[test]
    fn test_delta_series_scores() {
        let mut never_audited = site("https://skipped.test", None, None);
        never_audited.audits.clear();
        let sites = vec![
            site("https://a.test", Some(result(0.9, None)), Some(result(0.7, None))),
            never_audited,
            site("https://pending.test", None, None),
            site("https://b.test", Some(result(0.5, None)), None),
        ];
        let series = delta_series(&sites, MetricKey::Score(Metric::Performance));

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].index, 0);
        assert!((series[0].delta.unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(series[1].base_url, "https://pending.test");
        assert_eq!(series[1].current, None);
        assert_eq!(series[2].base_url, "https://b.test");
        assert_eq!(series[2].index, 2);
        assert_eq!(series[2].previous, None);
        assert_eq!(series[2].delta, None);
    }

    #[test]
    fn test_delta_series_tbt_in_seconds() {
        let sites = vec![site(
            "https://a.test",
            Some(result(0.9, Some(250.0))),
            Some(result(0.9, Some(400.0))),
        )];
        let series = delta_series(&sites, MetricKey::TotalBlockingTime);
        assert_eq!(series[0].current, Some(0.25));
        assert_eq!(series[0].previous, Some(0.4));
        assert!((series[0].delta.unwrap() + 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_performance_pairs_join_by_url() {
        let mobile = vec![
            site("https://a.test", Some(result(0.456, None)), None),
            site("https://mobile-only.test", Some(result(0.5, None)), None),
        ];
        let desktop = vec![
            site("https://desktop-only.test", Some(result(0.9, None)), None),
            site("https://a.test", Some(result(0.91, None)), None),
        ];
        let pairs = performance_pairs(&mobile, &desktop);
        assert_eq!(
            pairs,
            vec![PerformancePair {
                name: "https://a.test".to_string(),
                mobile_score: 46,
                desktop_score: 91,
            }]
        );
    }

    #[test]
    fn test_performance_tbt_points() {
        let sites = vec![
            site("https://a.test", Some(result(0.8, Some(300.0))), Some(result(0.7, None))),
            site("https://b.test", Some(result(0.6, Some(1200.0))), None),
        ];
        let points = performance_tbt_points(&sites);

        assert_eq!(points.current_data.len(), 2);
        assert_eq!(points.previous_data.len(), 1);
        assert_eq!(points.current_data[0].performance, 80.0);
        assert_eq!(points.current_data[1].total_blocking_time, 1.2);
        assert_eq!(points.previous_data[0].total_blocking_time, 0.0);
        assert_eq!(points.previous_data[0].index, 0);
    }
}

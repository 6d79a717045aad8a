use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::scoring::Metric;

/// Audit types the platform runs against a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuditType {
    #[serde(rename = "404")]
    NotFound,
    #[serde(rename = "cwv")]
    CoreWebVitals,
    #[serde(rename = "lhs-desktop")]
    LighthouseDesktop,
    #[serde(rename = "lhs-mobile")]
    LighthouseMobile,
}

impl AuditType {
    pub const ALL: [AuditType; 4] = [
        AuditType::NotFound,
        AuditType::CoreWebVitals,
        AuditType::LighthouseDesktop,
        AuditType::LighthouseMobile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditType::NotFound => "404",
            AuditType::CoreWebVitals => "cwv",
            AuditType::LighthouseDesktop => "lhs-desktop",
            AuditType::LighthouseMobile => "lhs-mobile",
        }
    }
}

impl fmt::Display for AuditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| {
                format!(
                    "unknown audit type '{}' (expected one of: 404, cwv, lhs-desktop, lhs-mobile)",
                    s
                )
            })
    }
}

/// A site as returned by `sites/with-latest-audit/{auditType}`.
///
/// Only the latest audit (index 0) matters for scoring; it carries both the
/// current and the previous audit result.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    #[serde(rename = "baseURL")]
    pub base_url: String,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(rename = "gitHubURL", default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default)]
    pub audit_config: AuditConfig,
    pub audits: Vec<Audit>,
    /// Fields this crate does not interpret (`createdAt`, `deliveryType`, ...),
    /// kept so they survive a round trip to JSON output.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Site {
    /// The most recent audit, if the site has been audited at all.
    pub fn latest_audit(&self) -> Option<&Audit> {
        self.audits.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    #[serde(default)]
    pub audits_disabled: bool,
    #[serde(default)]
    pub audit_type_configs: BTreeMap<String, AuditTypeConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AuditTypeConfig {
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_result: Option<AuditResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_audit_result: Option<AuditResult>,
}

/// Scores and blocking time of one run, borrowed out of an [`AuditResult`].
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub scores: &'a Scores,
    /// Milliseconds; absent values read as zero.
    pub total_blocking_time: f64,
}

/// The current/previous pair a leaderboard delta is computed from.
#[derive(Debug, Clone, Copy)]
pub struct DeltaPair<'a> {
    pub current: Snapshot<'a>,
    pub previous: Snapshot<'a>,
}

impl Audit {
    /// Both results with a `scores` object, or `None` when the site has no
    /// basis for a delta yet.
    pub fn delta_pair(&self) -> Option<DeltaPair<'_>> {
        let current = self.audit_result.as_ref()?.snapshot()?;
        let previous = self.previous_audit_result.as_ref()?.snapshot()?;
        Some(DeltaPair { current, previous })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    #[serde(
        default,
        deserialize_with = "object_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub scores: Option<Scores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_blocking_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_error: Option<serde_json::Value>,
}

impl AuditResult {
    pub fn snapshot(&self) -> Option<Snapshot<'_>> {
        self.scores.as_ref().map(|scores| Snapshot {
            scores,
            total_blocking_time: self.total_blocking_time.unwrap_or(0.0),
        })
    }
}

/// PSI category scores in `[0, 1]`. Keys outside the four categories are
/// dropped on input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Scores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<f64>,
    #[serde(
        rename = "best-practices",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub best_practices: Option<f64>,
}

impl Scores {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Performance => self.performance,
            Metric::Seo => self.seo,
            Metric::Accessibility => self.accessibility,
            Metric::BestPractices => self.best_practices,
        }
    }
}

// A `scores` value that is not an object (null, a bare number, a string) means
// the run produced no usable scores; it must not fail the whole site list.
fn object_or_none<'de, D>(deserializer: D) -> Result<Option<Scores>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(value @ serde_json::Value::Object(_)) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

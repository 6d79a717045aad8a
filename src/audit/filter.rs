use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::types::{AuditType, Site};

/// Live-status filter applied before the dashboard splits sites into tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiveStatus {
    #[default]
    All,
    Live,
    NonLive,
}

impl FromStr for LiveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(LiveStatus::All),
            "live" => Ok(LiveStatus::Live),
            "non-live" => Ok(LiveStatus::NonLive),
            other => Err(format!(
                "unknown live status '{}' (expected all, live or non-live)",
                other
            )),
        }
    }
}

/// True when the site has been audited at all, whether or not the latest run
/// produced a result.
pub fn has_audits(site: &Site) -> bool {
    !site.audits.is_empty()
}

pub fn has_live_status(site: &Site, status: LiveStatus) -> bool {
    match status {
        LiveStatus::All => true,
        LiveStatus::Live => site.is_live,
        LiveStatus::NonLive => !site.is_live,
    }
}

/// True when every audit is switched off for the site, or just this type.
pub fn is_audit_disabled(site: &Site, audit_type: AuditType) -> bool {
    let config = &site.audit_config;
    config.audits_disabled
        || config
            .audit_type_configs
            .get(audit_type.as_str())
            .is_some_and(|c| c.disabled)
}

/// Keep only sites matching the live-status filter.
pub fn filter_live(sites: &[Site], status: LiveStatus) -> Vec<Site> {
    sites
        .iter()
        .filter(|site| has_live_status(site, status))
        .cloned()
        .collect()
}

/// Sites split the way the Lighthouse dashboard presents them.
#[derive(Debug, Clone, Default)]
pub struct SiteBuckets {
    /// Audited without error; the leaderboard input.
    pub scored: Vec<Site>,
    pub errors: Vec<Site>,
    pub disabled: Vec<Site>,
}

/// Split sites into scored, errored and disabled sets.
///
/// A site whose audit type is disabled may still carry an older audit, so it
/// can show up in `disabled` and in one of the other two sets.
pub fn partition_sites(sites: &[Site], audit_type: AuditType, status: LiveStatus) -> SiteBuckets {
    let mut buckets = SiteBuckets::default();

    for site in sites.iter().filter(|s| has_live_status(s, status)) {
        if has_audits(site) {
            let is_error = site.latest_audit().is_some_and(|a| a.is_error);
            if is_error {
                buckets.errors.push(site.clone());
            } else {
                buckets.scored.push(site.clone());
            }
        }
        if is_audit_disabled(site, audit_type) {
            buckets.disabled.push(site.clone());
        }
    }

    log::debug!(
        "Partitioned {} sites ({:?}): {} scored, {} errors, {} disabled",
        sites.len(),
        status,
        buckets.scored.len(),
        buckets.errors.len(),
        buckets.disabled.len()
    );

    buckets
}

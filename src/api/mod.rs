pub mod client;
pub mod types;

pub use client::{ApiClient, ApiConfig, AuthError, Environment, DEFAULT_BASE_URL};
pub use types::Organization;

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeMap;

use crate::audit::{AuditType, Site};

/// Fetch the latest-audit site lists for several audit types in parallel.
///
/// Fails on the first audit type that cannot be loaded; a dashboard comparing
/// strategies is meaningless with one side missing.
pub async fn fetch_sites_by_audit_type(
    client: &ApiClient,
    audit_types: &[AuditType],
) -> Result<BTreeMap<AuditType, Vec<Site>>> {
    let mut futures = FuturesUnordered::new();
    for &audit_type in audit_types {
        futures.push(async move {
            let result = client.sites_with_latest_audits(audit_type).await;
            (audit_type, result)
        });
    }

    let mut by_type = BTreeMap::new();
    while let Some((audit_type, result)) = futures.next().await {
        let sites = result.map_err(|e| e.context(format!("Loading {} sites failed", audit_type)))?;
        by_type.insert(audit_type, sites);
    }

    Ok(by_type)
}

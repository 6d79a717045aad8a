pub mod filter;
pub mod storage;
pub mod types;

pub use filter::{
    filter_live, has_audits, has_live_status, is_audit_disabled, partition_sites, LiveStatus,
    SiteBuckets,
};
pub use storage::{load_audits, load_sites, parse_audits, parse_sites};
pub use types::{
    Audit, AuditConfig, AuditResult, AuditType, AuditTypeConfig, DeltaPair, Scores, Site, Snapshot,
};

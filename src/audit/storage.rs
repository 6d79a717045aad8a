use super::types::{Audit, Site};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Load a site list (JSON array, as the API returns it) from a file.
pub fn load_sites(path: &Path) -> Result<Vec<Site>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open site list at {}", path.display()))?;

    parse_sites(BufReader::new(file))
        .with_context(|| format!("Failed to load site list from {}", path.display()))
}

/// Parse a site list from any reader.
pub fn parse_sites<R: Read>(reader: R) -> Result<Vec<Site>> {
    let sites: Vec<Site> =
        serde_json::from_reader(reader).context("Invalid site list: expected a JSON array of sites")?;
    log::debug!("Parsed {} sites", sites.len());
    Ok(sites)
}

/// Load one site's audit history (JSON array, newest first) from a file.
pub fn load_audits(path: &Path) -> Result<Vec<Audit>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open audit history at {}", path.display()))?;

    parse_audits(BufReader::new(file))
        .with_context(|| format!("Failed to load audit history from {}", path.display()))
}

pub fn parse_audits<R: Read>(reader: R) -> Result<Vec<Audit>> {
    let audits: Vec<Audit> = serde_json::from_reader(reader)
        .context("Invalid audit history: expected a JSON array of audits")?;
    log::debug!("Parsed {} audits", audits.len());
    Ok(audits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const SITES: &str = r#"[
        {
            "id": "a",
            "baseURL": "https://a.test",
            "isLive": true,
            "audits": [
                {
                    "auditResult": { "scores": { "performance": 0.9 }, "totalBlockingTime": 80 },
                    "previousAuditResult": { "scores": { "performance": 0.8 }, "totalBlockingTime": 90 }
                }
            ]
        },
        { "id": "b", "baseURL": "https://b.test", "audits": [] }
    ]"#;

    #[test]
    fn test_parse_sites() {
        let sites = parse_sites(SITES.as_bytes()).unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].id, "a");
        assert!(sites[1].audits.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let result = parse_sites(r#"{ "id": "a" }"#.as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_audit_history() {
        let audits = parse_audits(
            r#"[
                {
                    "siteId": "a",
                    "auditType": "lhs-mobile",
                    "auditedAt": "2024-03-02T06:00:00.000Z",
                    "isLive": true,
                    "isError": false,
                    "auditResult": {
                        "finalUrl": "https://a.test/",
                        "scores": { "performance": 0.91, "seo": 1 },
                        "totalBlockingTime": 40
                    }
                },
                { "auditedAt": "2024-03-01T06:00:00Z", "isError": true }
            ]"#
            .as_bytes(),
        )
        .unwrap();

        assert_eq!(audits.len(), 2);
        assert_eq!(audits[0].audit_type.as_deref(), Some("lhs-mobile"));
        assert!(audits[0].audited_at.is_some());
        assert!(audits[1].is_error);
        assert!(audits[1].audit_result.is_none());
    }

    #[test]
    fn test_load_missing_file_errors() {
        let path = env::temp_dir().join("psi_board_test_missing_sites.json");
        let _ = std::fs::remove_file(&path);
        let err = load_sites(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to open site list"));
    }

    #[test]
    fn test_load_from_file() {
        let path = env::temp_dir().join("psi_board_test_sites.json");
        std::fs::write(&path, SITES).unwrap();

        let sites = load_sites(&path).unwrap();
        assert_eq!(sites.len(), 2);

        let _ = std::fs::remove_file(&path);
    }
}

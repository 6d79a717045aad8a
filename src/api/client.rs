use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};

use super::types::Organization;
use crate::audit::{Audit, AuditType, Site};

pub const DEFAULT_BASE_URL: &str = "https://spacecat.experiencecloud.live/api";

/// API deployment to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Ci,
}

impl Environment {
    fn path_prefix(&self) -> &'static str {
        match self {
            Environment::Production => "v1",
            Environment::Ci => "ci",
        }
    }
}

/// Everything needed to reach the API. Built by the caller; nothing is read
/// from ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub environment: Environment,
    pub base_url: String,
    pub api_key: String,
}

/// The API rejected the key (401/403). Never retried; a new key is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    pub status: StatusCode,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Authentication failed ({}). Check the API key for this environment.",
            self.status
        )
    }
}

impl std::error::Error for AuthError {}

fn check_status(status: StatusCode, url: &str) -> Result<()> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError { status }.into()),
        status if !status.is_success() => Err(anyhow!("HTTP error! Status: {} for {}", status, url)),
        _ => Ok(()),
    }
}

fn audits_path(site_id: &str, audit_type: AuditType) -> String {
    format!("sites/{}/audits/{}?ascending=false", site_id, audit_type)
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&config.api_key)
            .context("API key contains characters not allowed in an HTTP header")?;
        headers.insert("x-api-key", key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http, config })
    }

    /// Full URL for an API path, e.g. `sites` -> `{base}/v1/sites`.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.environment.path_prefix(),
            path.trim_start_matches('/')
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);

        // Retry strategy: exponential backoff with 3 attempts
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(3);

        let http = &self.http;
        let url = url.as_str();
        let response = RetryIf::spawn(
            retry_strategy,
            || async move {
                let response = http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| anyhow!("Request to {} failed: {}", url, e))?;
                check_status(response.status(), url)?;
                Ok::<_, anyhow::Error>(response)
            },
            |e: &anyhow::Error| e.downcast_ref::<AuthError>().is_none(),
        )
        .await?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to decode response from {}", url))
    }

    /// Sites together with their latest audit of `audit_type`.
    pub async fn sites_with_latest_audits(&self, audit_type: AuditType) -> Result<Vec<Site>> {
        log::debug!("Fetching sites with latest {} audit", audit_type);
        let sites: Vec<Site> = self
            .get_json(&format!("sites/with-latest-audit/{}", audit_type))
            .await?;
        log::debug!("  received {} sites for {}", sites.len(), audit_type);
        Ok(sites)
    }

    /// Every audit of `audit_type` for one site, newest first.
    pub async fn audits_for_site(&self, site_id: &str, audit_type: AuditType) -> Result<Vec<Audit>> {
        log::debug!("Fetching {} audits for site {}", audit_type, site_id);
        let audits: Vec<Audit> = self.get_json(&audits_path(site_id, audit_type)).await?;
        log::debug!("  received {} audits", audits.len());
        Ok(audits)
    }

    pub async fn organizations(&self) -> Result<Vec<Organization>> {
        log::debug!("Fetching organizations");
        self.get_json("organizations").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer every request with the same status line and body; returns the
    /// base URL and a request counter.
    async fn serve(status_line: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{}/api", addr), hits)
    }

    fn local_client(base_url: String) -> ApiClient {
        let mut cfg = config(Environment::Production);
        cfg.base_url = base_url;
        ApiClient::new(cfg).unwrap()
    }

    fn config(environment: Environment) -> ApiConfig {
        // Same provider main installs
        let _ = rustls::crypto::ring::default_provider().install_default();
        ApiConfig {
            environment,
            base_url: "https://api.example.com/api/".to_string(),
            api_key: "secret".to_string(),
        }
    }

    #[test]
    fn test_production_url() {
        let client = ApiClient::new(config(Environment::Production)).unwrap();
        assert_eq!(
            client.url("sites/with-latest-audit/lhs-mobile"),
            "https://api.example.com/api/v1/sites/with-latest-audit/lhs-mobile"
        );
    }

    #[test]
    fn test_ci_url() {
        let client = ApiClient::new(config(Environment::Ci)).unwrap();
        assert_eq!(client.url("/sites"), "https://api.example.com/api/ci/sites");
    }

    #[test]
    fn test_audits_url() {
        let client = ApiClient::new(config(Environment::Production)).unwrap();
        assert_eq!(
            client.url(&audits_path("site-1", AuditType::LighthouseDesktop)),
            "https://api.example.com/api/v1/sites/site-1/audits/lhs-desktop?ascending=false"
        );
        assert_eq!(
            client.url("organizations"),
            "https://api.example.com/api/v1/organizations"
        );
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK, "u").is_ok());

        let err = check_status(StatusCode::FORBIDDEN, "u").unwrap_err();
        assert_eq!(
            err.downcast_ref::<AuthError>(),
            Some(&AuthError { status: StatusCode::FORBIDDEN })
        );

        let err = check_status(StatusCode::BAD_GATEWAY, "u").unwrap_err();
        assert!(err.downcast_ref::<AuthError>().is_none());
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let (base_url, hits) = serve("401 Unauthorized", "{}").await;
        let client = local_client(base_url);

        let err = client.organizations().await.unwrap_err();
        assert!(err.downcast_ref::<AuthError>().is_some());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_audit_history() {
        let (base_url, hits) = serve(
            "200 OK",
            r#"[{"auditedAt":"2024-03-02T06:00:00Z","isError":false,"auditResult":{"scores":{"performance":0.9},"totalBlockingTime":120}},{"auditedAt":"2024-03-01T06:00:00Z","isError":true}]"#,
        )
        .await;
        let client = local_client(base_url);

        let audits = client
            .audits_for_site("site-1", AuditType::LighthouseMobile)
            .await
            .unwrap();
        assert_eq!(audits.len(), 2);
        assert!(audits[1].is_error);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_organizations() {
        let (base_url, _) = serve("200 OK", r#"[{"id":"org-1","name":"Example Corp"}]"#).await;
        let client = local_client(base_url);

        let orgs = client.organizations().await.unwrap();
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, "Example Corp");
    }

    #[test]
    fn test_invalid_api_key_rejected() {
        let mut cfg = config(Environment::Production);
        cfg.api_key = "bad\nkey".to_string();
        assert!(ApiClient::new(cfg).is_err());
    }

    #[test]
    fn test_environment_parse() {
        let env: Environment = serde_saphyr::from_str("ci").unwrap();
        assert_eq!(env, Environment::Ci);
    }
}

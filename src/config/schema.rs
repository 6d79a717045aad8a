use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ApiConfig, Environment, DEFAULT_BASE_URL};
use crate::scoring::ScoringConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub scoring: Option<ScoringConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ApiSettings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Prefer the `PSI_BOARD_API_KEY` environment variable over storing the key here.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ApiSettings {
    /// Resolve the client configuration. A key passed in (typically from the
    /// environment) wins over one in the file.
    pub fn resolve(&self, env_api_key: Option<String>) -> Result<ApiConfig> {
        let api_key = env_api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
            .filter(|k| !k.trim().is_empty());

        let Some(api_key) = api_key else {
            bail!(
                "No API key for the {:?} environment. Set PSI_BOARD_API_KEY or api.api_key in the config file.",
                self.environment
            );
        };

        Ok(ApiConfig {
            environment: self.environment,
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
        })
    }
}

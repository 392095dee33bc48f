//! Provider settings: credentials and HTTP behaviour
//!
//! Read from the `[provider]` table of the manifest. The token and
//! organization can also come from the environment, which wins over the file.

use anyhow::{Context, Result};
use contentful::{Backend, DEFAULT_BASE_URL, HttpBackend, HttpConfig, RetryConfig, RetryingBackend};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the content management token
pub const ENV_ACCESS_TOKEN: &str = "CONTENTFUL_MANAGEMENT_TOKEN";

/// Environment variable holding the organization id
pub const ENV_ORGANIZATION_ID: &str = "CONTENTFUL_ORGANIZATION_ID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Content management token; prefer the environment variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Organization new spaces are created in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient failures (network, 5xx, rate limits)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            organization_id: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl ProviderConfig {
    /// Apply environment overrides for the credentials
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_ACCESS_TOKEN).ok(),
            std::env::var(ENV_ORGANIZATION_ID).ok(),
        )
    }

    /// Replace credentials with non-empty override values
    pub fn with_overrides(
        mut self,
        access_token: Option<String>,
        organization_id: Option<String>,
    ) -> Self {
        if let Some(token) = access_token.filter(|t| !t.trim().is_empty()) {
            self.access_token = Some(token);
        }
        if let Some(org) = organization_id.filter(|o| !o.trim().is_empty()) {
            self.organization_id = Some(org);
        }
        self
    }

    /// HTTP client settings
    pub fn http_config(&self) -> Result<HttpConfig> {
        let token = self
            .access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .with_context(|| {
                format!("No Contentful management token: set {ENV_ACCESS_TOKEN} or provider.access_token")
            })?;

        Ok(HttpConfig::new(token)
            .base_url(self.base_url.clone())
            .organization_id(self.organization_id.clone())
            .timeout(Duration::from_secs(self.timeout_secs)))
    }

    /// Retry policy for the backend
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::with_attempts(self.max_retries.saturating_add(1))
    }

    /// Build the backend every controller shares
    pub fn backend(&self) -> Result<Arc<dyn Backend>> {
        let http = HttpBackend::new(self.http_config()?)
            .context("Failed to create Contentful client")?;
        log::debug!(
            "Using {} with up to {} retries",
            http.base_url(),
            self.max_retries
        );
        Ok(Arc::new(RetryingBackend::new(http, self.retry_config())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: ProviderConfig = toml::from_str("").unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert_eq!(config.base_url, "https://api.contentful.com");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.retry_config().max_attempts, 4);
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let config = ProviderConfig {
            access_token: Some("from-file".into()),
            organization_id: Some("org-file".into()),
            ..Default::default()
        }
        .with_overrides(Some("from-env".into()), Some(String::new()));

        assert_eq!(config.access_token.as_deref(), Some("from-env"));
        // Empty values do not override
        assert_eq!(config.organization_id.as_deref(), Some("org-file"));
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let err = ProviderConfig::default().http_config().unwrap_err();
        assert!(err.to_string().contains(ENV_ACCESS_TOKEN));
    }

    #[test]
    fn test_http_config_carries_settings() {
        let config = ProviderConfig {
            access_token: Some("CFPAT-x".into()),
            organization_id: Some("org1".into()),
            base_url: "http://localhost:8080/".into(),
            timeout_secs: 5,
            max_retries: 0,
        };

        let http = config.http_config().unwrap();
        assert_eq!(http.base_url, "http://localhost:8080");
        assert_eq!(http.organization_id.as_deref(), Some("org1"));
        assert_eq!(http.timeout, Duration::from_secs(5));
        assert_eq!(config.retry_config().max_attempts, 1);
        assert!(config.backend().is_ok());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(toml::from_str::<ProviderConfig>("tokn = \"x\"").is_err());
    }
}

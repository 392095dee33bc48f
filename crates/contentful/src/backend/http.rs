//! Management API backend over HTTPS.
//!
//! This module provides the [`HttpBackend`] implementation, a blocking
//! `ureq` client for the Contentful Management API.
//!
//! # Versioning
//!
//! Updates and deletes send the entity's current `sys.version` in the
//! `X-Contentful-Version` header; the API rejects stale versions with 409.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{ApiKey, Space};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use ureq::Body;
use ureq::http::Response;

/// Default Management API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.contentful.com";

/// Media type required by the Management API.
const CONTENT_TYPE: &str = "application/vnd.contentful.management.v1+json";

const USER_AGENT: &str = concat!("cfprov/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// API base URL, without trailing slash.
    pub base_url: String,
    /// Content management token.
    pub access_token: String,
    /// Organization new spaces are created in.
    pub organization_id: Option<String>,
    /// Global timeout for a single request.
    pub timeout: Duration,
}

impl HttpConfig {
    /// Settings for the public API endpoint.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: access_token.into(),
            organization_id: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Use a different API base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Create spaces in the given organization.
    pub fn organization_id(mut self, organization_id: Option<String>) -> Self {
        self.organization_id = organization_id.filter(|id| !id.is_empty());
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Management API backend.
///
/// # Example
///
/// ```no_run
/// use contentful::{Backend, HttpBackend, HttpConfig};
///
/// let backend = HttpBackend::new(HttpConfig::new("CFPAT-...")).unwrap();
/// let space = backend.get_space("abc123").unwrap();
/// println!("{} is at version {}", space.name, space.sys.version);
/// ```
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    config: HttpConfig,
}

impl HttpBackend {
    /// Create a backend from connection settings.
    ///
    /// Fails with [`Error::Config`] when no access token is set.
    pub fn new(config: HttpConfig) -> Result<Self> {
        if config.access_token.trim().is_empty() {
            return Err(Error::Config(
                "no content management token configured".to_string(),
            ));
        }

        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .user_agent(USER_AGENT)
            .build();

        Ok(Self {
            agent: ureq::Agent::new_with_config(agent_config),
            config,
        })
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn spaces_url(&self) -> String {
        format!("{}/spaces", self.config.base_url)
    }

    fn space_url(&self, id: &str) -> String {
        format!("{}/spaces/{}", self.config.base_url, id)
    }

    fn api_keys_url(&self, space_id: &str) -> String {
        format!("{}/spaces/{}/api_keys", self.config.base_url, space_id)
    }

    fn api_key_url(&self, space_id: &str, id: &str) -> String {
        format!("{}/spaces/{}/api_keys/{}", self.config.base_url, space_id, id)
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        request
            .header(
                "Authorization",
                format!("Bearer {}", self.config.access_token),
            )
            .header("Content-Type", CONTENT_TYPE)
    }

    fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        log::debug!("GET {url}");
        let response = self.authorize(self.agent.get(url)).call()?;
        read_entity(response)
    }

    fn delete(&self, url: &str, version: u64) -> Result<()> {
        log::debug!("DELETE {url} (version {version})");
        let response = self
            .authorize(self.agent.delete(url))
            .header("X-Contentful-Version", version.to_string())
            .call()?;
        check_status(response).map(|_| ())
    }
}

impl Backend for HttpBackend {
    fn upsert_space(&self, space: &Space) -> Result<Space> {
        let response = if space.sys.is_new() {
            let url = self.spaces_url();
            log::debug!("POST {url}");
            let body = serde_json::to_string(&NewSpacePayload {
                name: &space.name,
                default_locale: &space.default_locale,
            })?;
            let mut request = self.authorize(self.agent.post(&url));
            if let Some(org) = &self.config.organization_id {
                request = request.header("X-Contentful-Organization", org.as_str());
            }
            request.send(body)?
        } else {
            let url = self.space_url(&space.sys.id);
            log::debug!("PUT {url} (version {})", space.sys.version);
            let body = serde_json::to_string(&SpaceNamePayload { name: &space.name })?;
            self.authorize(self.agent.put(&url))
                .header("X-Contentful-Version", space.sys.version.to_string())
                .send(body)?
        };

        read_entity(response)
    }

    fn get_space(&self, id: &str) -> Result<Space> {
        self.get(&self.space_url(id))
    }

    fn delete_space(&self, space: &Space) -> Result<()> {
        self.delete(&self.space_url(&space.sys.id), space.sys.version)
    }

    fn upsert_api_key(&self, space_id: &str, api_key: &ApiKey) -> Result<ApiKey> {
        // The access token is generated by the API and never submitted.
        let body = serde_json::to_string(&ApiKeyPayload {
            name: &api_key.name,
            description: &api_key.description,
        })?;

        let response = if api_key.sys.is_new() {
            let url = self.api_keys_url(space_id);
            log::debug!("POST {url}");
            self.authorize(self.agent.post(&url)).send(body)?
        } else {
            let url = self.api_key_url(space_id, &api_key.sys.id);
            log::debug!("PUT {url} (version {})", api_key.sys.version);
            self.authorize(self.agent.put(&url))
                .header("X-Contentful-Version", api_key.sys.version.to_string())
                .send(body)?
        };

        read_entity(response)
    }

    fn get_api_key(&self, space_id: &str, id: &str) -> Result<ApiKey> {
        self.get(&self.api_key_url(space_id, id))
    }

    fn delete_api_key(&self, space_id: &str, api_key: &ApiKey) -> Result<()> {
        self.delete(
            &self.api_key_url(space_id, &api_key.sys.id),
            api_key.sys.version,
        )
    }
}

/// Turn non-success responses into typed errors.
fn check_status(mut response: Response<Body>) -> Result<Response<Body>> {
    let status = response.status().as_u16();
    if (200..300).contains(&status) {
        return Ok(response);
    }

    let reset_secs = response
        .headers()
        .get("X-Contentful-RateLimit-Reset")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok());
    let body = response.body_mut().read_to_string().unwrap_or_default();

    Err(error_from_response(status, reset_secs, &body))
}

fn read_entity<T: DeserializeOwned>(response: Response<Body>) -> Result<T> {
    let mut response = check_status(response)?;
    let body = response.body_mut().read_to_string()?;
    Ok(serde_json::from_str(&body)?)
}

/// Map an error response to an [`Error`].
fn error_from_response(status: u16, reset_secs: Option<u64>, body: &str) -> Error {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = if parsed.message.is_empty() {
        format!("HTTP {status}")
    } else {
        parsed.message
    };

    match status {
        404 => Error::NotFound {
            message,
            request_id: parsed.request_id,
        },
        409 => Error::VersionMismatch {
            message,
            request_id: parsed.request_id,
        },
        401 | 403 => Error::AccessDenied { status, message },
        422 => Error::Validation { message },
        429 => Error::RateLimited { reset_secs },
        _ => Error::Api {
            status,
            error_id: if parsed.sys.id.is_empty() {
                "Unknown".to_string()
            } else {
                parsed.sys.id
            },
            message,
        },
    }
}

// =============================================================================
// Wire payloads
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewSpacePayload<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    default_locale: &'a str,
}

#[derive(Debug, Serialize)]
struct SpaceNamePayload<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiKeyPayload<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    sys: ErrorSys,
    #[serde(default)]
    message: String,
    #[serde(default)]
    request_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorSys {
    #[serde(default)]
    id: String,
}

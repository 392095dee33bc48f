//! Manifest schema: the desired state, written by the user
//!
//! ```toml
//! [provider]
//! organization_id = "0abc"
//!
//! [spaces.marketing]
//! name = "Marketing"
//! default_locale = "en-US"
//!
//! [api_keys.website]
//! space = "marketing"
//! name = "Website"
//! description = "Delivery key for the public site"
//! ```

use crate::config::ProviderConfig;
use anyhow::{Context, Result, bail};
use contentful::DEFAULT_LOCALE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The complete manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Spaces by local name
    #[serde(default)]
    pub spaces: BTreeMap<String, SpaceConfig>,

    /// API keys by local name
    #[serde(default)]
    pub api_keys: BTreeMap<String, ApiKeyConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpaceConfig {
    pub name: String,

    /// Only honoured when the space is created
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiKeyConfig {
    /// Local name of a space in this manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<String>,

    /// Literal id of a space managed elsewhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub description: String,
}

/// Where an API key lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceRef<'a> {
    /// A space declared in this manifest, by local name
    Managed(&'a str),
    /// A remote space id
    Literal(&'a str),
}

impl ApiKeyConfig {
    /// The owning space; valid after [`Manifest::validate`]
    pub fn space_ref(&self) -> SpaceRef<'_> {
        match (&self.space, &self.space_id) {
            (Some(name), _) => SpaceRef::Managed(name),
            (None, Some(id)) => SpaceRef::Literal(id),
            (None, None) => SpaceRef::Literal(""),
        }
    }
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl Manifest {
    /// Load and validate a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest: {}", path.display()))?;
        let manifest = Self::parse(&content)
            .with_context(|| format!("Invalid manifest: {}", path.display()))?;
        log::debug!(
            "Loaded {} spaces and {} api keys from {}",
            manifest.spaces.len(),
            manifest.api_keys.len(),
            path.display()
        );
        Ok(manifest)
    }

    /// Parse and validate manifest text
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(content).context("Invalid TOML format")?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate the manifest
    pub fn validate(&self) -> Result<()> {
        for (key, space) in &self.spaces {
            validate_local_name(key).with_context(|| format!("Invalid space '{key}'"))?;
            if space.name.trim().is_empty() {
                bail!("Invalid space '{key}': name must not be empty");
            }
        }

        for (key, api_key) in &self.api_keys {
            validate_local_name(key).with_context(|| format!("Invalid api key '{key}'"))?;
            if api_key.name.trim().is_empty() {
                bail!("Invalid api key '{key}': name must not be empty");
            }
            match (&api_key.space, &api_key.space_id) {
                (Some(_), Some(_)) => {
                    bail!("Invalid api key '{key}': set either space or space_id, not both")
                }
                (None, None) => bail!("Invalid api key '{key}': space or space_id is required"),
                (Some(space), None) if !self.spaces.contains_key(space) => {
                    bail!("Invalid api key '{key}': no space named '{space}' in the manifest")
                }
                (None, Some(id)) if id.trim().is_empty() => {
                    bail!("Invalid api key '{key}': space_id must not be empty")
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Whether an address ("space.x" or "api_key.y") is declared
    pub fn declares(&self, resource_type: &str, name: &str) -> bool {
        match resource_type {
            "space" => self.spaces.contains_key(name),
            "api_key" => self.api_keys.contains_key(name),
            _ => false,
        }
    }
}

fn validate_local_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("name must not be empty");
    }
    if name.contains('.') {
        bail!("name must not contain '.'");
    }
    Ok(())
}

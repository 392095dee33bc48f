//! Space resource: the top-level content container

use super::ProviderError;
use contentful::{Backend, DEFAULT_LOCALE, Space};
use declarative::{Controller, LifecycleError, Record};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Recorded state of one space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRecord {
    /// Remote id, absent until created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Remote version, read back after every call
    #[serde(default)]
    pub version: u64,
    /// Display name
    pub name: String,
    /// Locale the space was created with
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl SpaceRecord {
    /// Desired state for a space that may not exist yet
    pub fn desired(name: impl Into<String>, default_locale: impl Into<String>) -> Self {
        Self {
            id: None,
            version: 0,
            name: name.into(),
            default_locale: default_locale.into(),
        }
    }

    /// Whether the recorded locale differs from the desired one
    ///
    /// The API only honours the locale at creation, so this drift is reported
    /// and never planned.
    pub fn locale_drift<'a>(&'a self, desired: &'a Self) -> Option<(&'a str, &'a str)> {
        (self.id.is_some() && self.default_locale != desired.default_locale)
            .then(|| (self.default_locale.as_str(), desired.default_locale.as_str()))
    }
}

impl Record for SpaceRecord {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn clear_id(&mut self) {
        self.id = None;
    }

    fn settings_match(&self, desired: &Self) -> bool {
        self.name == desired.name
    }
}

/// Maps [`SpaceRecord`] onto the spaces endpoints
pub struct SpaceController {
    backend: Arc<dyn Backend>,
}

impl SpaceController {
    /// Create a controller over `backend`
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

impl Controller for SpaceController {
    type Record = SpaceRecord;
    type Remote = Space;
    type Error = ProviderError;

    fn resource_type(&self) -> &'static str {
        "space"
    }

    fn build(&self, desired: &SpaceRecord) -> Space {
        Space::new(desired.name.clone(), desired.default_locale.clone())
    }

    fn fetch(&self, _record: &SpaceRecord, id: &str) -> Result<Space, ProviderError> {
        Ok(self.backend.get_space(id)?)
    }

    fn apply_desired(&self, remote: &mut Space, desired: &SpaceRecord) {
        remote.name = desired.name.clone();
    }

    fn submit(&self, _record: &SpaceRecord, remote: &Space) -> Result<Space, ProviderError> {
        Ok(self.backend.upsert_space(remote)?)
    }

    fn remove(&self, _record: &SpaceRecord, remote: &Space) -> Result<(), ProviderError> {
        Ok(self.backend.delete_space(remote)?)
    }

    fn map_back(&self, record: &mut SpaceRecord, remote: &Space) {
        record.id = Some(remote.sys.id.clone());
        record.version = remote.sys.version;
        record.name = remote.name.clone();
        if !remote.default_locale.is_empty() {
            record.default_locale = remote.default_locale.clone();
        }
    }

    fn seed_import(&self, import_id: &str) -> Result<SpaceRecord, LifecycleError> {
        let id = import_id.trim();
        if id.is_empty() || id.contains('/') {
            return Err(LifecycleError::ImportFormat {
                input: import_id.to_string(),
                expected: "spaceId",
            });
        }

        Ok(SpaceRecord {
            id: Some(id.to_string()),
            ..SpaceRecord::desired("", DEFAULT_LOCALE)
        })
    }
}

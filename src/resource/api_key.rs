//! API key resource: a delivery key scoped to one space
//!
//! Every remote call is addressed by `(space_id, key)`. The space is fixed at
//! creation; a different `space_id` means a new key.

use super::ProviderError;
use contentful::{ApiKey, Backend};
use declarative::{Controller, LifecycleError, Record};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Import id format for API keys
pub const IMPORT_FORMAT: &str = "spaceId/keyId";

/// Recorded state of one API key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    /// Remote id, absent until created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Remote version, read back after every call
    #[serde(default)]
    pub version: u64,
    /// Owning space
    pub space_id: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Delivery token generated by the API; never sent
    #[serde(default)]
    pub access_token: String,
}

impl ApiKeyRecord {
    /// Desired state for a key that may not exist yet
    pub fn desired(
        space_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            version: 0,
            space_id: space_id.into(),
            name: name.into(),
            description: description.into(),
            access_token: String::new(),
        }
    }
}

impl Record for ApiKeyRecord {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn clear_id(&mut self) {
        self.id = None;
    }

    fn settings_match(&self, desired: &Self) -> bool {
        self.space_id == desired.space_id
            && self.name == desired.name
            && self.description == desired.description
    }

    fn requires_replacement(&self, desired: &Self) -> bool {
        self.space_id != desired.space_id
    }
}

/// Maps [`ApiKeyRecord`] onto the api_keys endpoints of a space
pub struct ApiKeyController {
    backend: Arc<dyn Backend>,
}

impl ApiKeyController {
    /// Create a controller over `backend`
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

impl Controller for ApiKeyController {
    type Record = ApiKeyRecord;
    type Remote = ApiKey;
    type Error = ProviderError;

    fn resource_type(&self) -> &'static str {
        "api_key"
    }

    fn build(&self, desired: &ApiKeyRecord) -> ApiKey {
        ApiKey::new(desired.name.clone(), desired.description.clone())
    }

    fn fetch(&self, record: &ApiKeyRecord, id: &str) -> Result<ApiKey, ProviderError> {
        Ok(self.backend.get_api_key(&record.space_id, id)?)
    }

    fn apply_desired(&self, remote: &mut ApiKey, desired: &ApiKeyRecord) {
        remote.name = desired.name.clone();
        remote.description = desired.description.clone();
    }

    fn submit(&self, record: &ApiKeyRecord, remote: &ApiKey) -> Result<ApiKey, ProviderError> {
        Ok(self.backend.upsert_api_key(&record.space_id, remote)?)
    }

    fn remove(&self, record: &ApiKeyRecord, remote: &ApiKey) -> Result<(), ProviderError> {
        Ok(self.backend.delete_api_key(&record.space_id, remote)?)
    }

    fn map_back(&self, record: &mut ApiKeyRecord, remote: &ApiKey) {
        record.id = Some(remote.sys.id.clone());
        record.version = remote.sys.version;
        record.name = remote.name.clone();
        record.description = remote.description.clone();
        record.access_token = remote.access_token.clone();
        if let Some(space_id) = remote.space_id() {
            record.space_id = space_id.to_string();
        }
    }

    fn seed_import(&self, import_id: &str) -> Result<ApiKeyRecord, LifecycleError> {
        match import_id.split_once('/') {
            Some((space_id, key_id)) if !space_id.is_empty() && !key_id.is_empty() => {
                Ok(ApiKeyRecord {
                    id: Some(key_id.to_string()),
                    ..ApiKeyRecord::desired(space_id, "", "")
                })
            }
            _ => Err(LifecycleError::ImportFormat {
                input: import_id.to_string(),
                expected: IMPORT_FORMAT,
            }),
        }
    }
}

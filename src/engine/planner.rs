//! Execution planner - turns manifest and recorded state into plans

use crate::resource::{ApiKeyRecord, SpaceRecord};
use crate::schema::{Manifest, SpaceRef};
use crate::state::StateFile;
use declarative::{DiffSummary, Plan};
use std::collections::BTreeMap;

/// Plans for every resource type, plus things worth telling the user
#[derive(Debug, Default)]
pub struct ProviderPlan {
    pub spaces: Plan<SpaceRecord>,
    pub api_keys: Plan<ApiKeyRecord>,
    /// Drift that is reported but never acted on
    pub warnings: Vec<String>,
}

impl ProviderPlan {
    /// Plan the changes that take recorded state to the manifest
    pub fn build(manifest: &Manifest, state: &StateFile, target: Option<&str>) -> Self {
        let desired_spaces = desired_spaces(manifest);
        let spaces =
            Plan::from_states("space", &state.spaces, &desired_spaces).filter_by_target(target);

        let warnings = spaces
            .changes
            .iter()
            .filter_map(|change| {
                let (prior, desired) = (change.prior.as_ref()?, change.desired.as_ref()?);
                let (recorded, wanted) = prior.locale_drift(desired)?;
                Some(format!(
                    "{}: default_locale is {recorded:?} remotely but {wanted:?} in the manifest; \
                     the locale of an existing space cannot be changed",
                    change.address
                ))
            })
            .collect();

        Self {
            spaces,
            api_keys: api_key_plan(manifest, state, target),
            warnings,
        }
    }

    /// Plan deleting everything recorded (or just the target)
    pub fn destroy(state: &StateFile, target: Option<&str>) -> Self {
        Self {
            spaces: Plan::from_states("space", &state.spaces, &BTreeMap::new())
                .filter_by_target(target),
            api_keys: Plan::from_states("api_key", &state.api_keys, &BTreeMap::new())
                .filter_by_target(target),
            warnings: Vec::new(),
        }
    }

    /// Check if anything would change remotely
    pub fn has_changes(&self) -> bool {
        self.spaces.has_changes() || self.api_keys.has_changes()
    }

    /// Combined summary
    pub fn summary(&self) -> DiffSummary {
        let mut summary = self.spaces.summary();
        summary.merge(&self.api_keys.summary());
        summary
    }
}

/// API key plan against the current state
///
/// Computed again after spaces are applied, so references to freshly
/// created spaces resolve.
pub fn api_key_plan(
    manifest: &Manifest,
    state: &StateFile,
    target: Option<&str>,
) -> Plan<ApiKeyRecord> {
    let desired = desired_api_keys(manifest, state);
    Plan::from_states("api_key", &state.api_keys, &desired).filter_by_target(target)
}

/// Desired spaces, keyed by local name
pub fn desired_spaces(manifest: &Manifest) -> BTreeMap<String, SpaceRecord> {
    manifest
        .spaces
        .iter()
        .map(|(name, space)| {
            (
                name.clone(),
                SpaceRecord::desired(space.name.clone(), space.default_locale.clone()),
            )
        })
        .collect()
}

/// Desired API keys, keyed by local name
///
/// A key that names a managed space gets that space's recorded id; an empty
/// `space_id` means the space does not exist yet.
pub fn desired_api_keys(
    manifest: &Manifest,
    state: &StateFile,
) -> BTreeMap<String, ApiKeyRecord> {
    manifest
        .api_keys
        .iter()
        .map(|(name, key)| {
            let space_id = match key.space_ref() {
                SpaceRef::Managed(space) => state.space_id(space).unwrap_or_default(),
                SpaceRef::Literal(id) => id,
            };
            (
                name.clone(),
                ApiKeyRecord::desired(space_id, key.name.clone(), key.description.clone()),
            )
        })
        .collect()
}

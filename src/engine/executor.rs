//! Execution engine - applies provider plans in dependency order
//!
//! Order for apply:
//! 1. API key deletions
//! 2. Space creates and updates
//! 3. API key creates, updates and replacements (planned again, so new
//!    spaces resolve)
//! 4. Space deletions
//!
//! State is handed to `persist` after every successful change. If it cannot
//! be saved, the run halts there: later changes would otherwise exist
//! remotely without a record.

use anyhow::{Context as AnyhowContext, Result, bail};
use declarative::{
    ApplyResult, Controller, ExecuteOptions, ExecuteSummary, Lifecycle, Plan, ProgressCallback,
    execute,
};
use std::collections::{BTreeMap, BTreeSet};

use super::Provider;
use super::planner::{ProviderPlan, api_key_plan};
use crate::resource::SpaceRecord;
use crate::schema::Manifest;
use crate::state::StateFile;

/// Callback that writes state to disk
pub type Persist<'a> = dyn FnMut(&mut StateFile) -> Result<()> + 'a;

/// Outcome of a refresh
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Records still present remotely
    pub refreshed: usize,
    /// Addresses of records that vanished and were dropped
    pub dropped: Vec<String>,
}

/// Read every recorded entity; drop the ones that no longer exist
pub fn refresh(provider: &Provider, state: &mut StateFile) -> Result<RefreshReport> {
    let mut report = RefreshReport::default();
    refresh_records(&provider.spaces, &mut state.spaces, &mut report)?;
    refresh_records(&provider.api_keys, &mut state.api_keys, &mut report)?;
    Ok(report)
}

fn refresh_records<C>(
    controller: &C,
    records: &mut BTreeMap<String, C::Record>,
    report: &mut RefreshReport,
) -> Result<()>
where
    C: Controller,
    C::Error: std::error::Error + Send + Sync + 'static,
{
    let mut vanished = Vec::new();
    for (name, record) in records.iter_mut() {
        let address = format!("{}.{name}", controller.resource_type());
        let found = controller
            .read(record)
            .with_context(|| format!("Failed to refresh {address}"))?;
        if found.is_present() {
            report.refreshed += 1;
        } else {
            vanished.push(name.clone());
            report.dropped.push(address);
        }
    }
    for name in vanished {
        records.remove(&name);
    }
    Ok(())
}

/// Apply the manifest
pub fn apply<P: ProgressCallback>(
    provider: &Provider,
    manifest: &Manifest,
    state: &mut StateFile,
    target: Option<&str>,
    opts: &ExecuteOptions,
    progress: &mut P,
    persist: &mut Persist<'_>,
) -> ExecuteSummary {
    let plan = ProviderPlan::build(manifest, state, target);
    let (key_deletions, _) = plan.api_keys.split_deletions();
    let (space_deletions, space_changes) = plan.spaces.split_deletions();
    let mut summary = ExecuteSummary::default();

    // 1. Keys that are going away
    summary.merge(&run(
        &provider.api_keys,
        &key_deletions,
        opts,
        progress,
        state,
        persist,
        |s| &mut s.api_keys,
    ));
    if summary.halted {
        return summary;
    }

    // 2. Spaces before the keys that live in them
    summary.merge(&run(
        &provider.spaces,
        &space_changes,
        opts,
        progress,
        state,
        persist,
        |s| &mut s.spaces,
    ));
    if summary.halted {
        return summary;
    }

    // 3. Keys, now that new spaces have ids
    let (_, key_changes) = api_key_plan(manifest, state, target).split_deletions();
    let (unresolved, ready): (Vec<_>, Vec<_>) =
        key_changes.changes.into_iter().partition(|change| {
            change.action.is_change()
                && change
                    .desired
                    .as_ref()
                    .is_some_and(|key| key.space_id.is_empty())
        });
    for change in &unresolved {
        progress.on_change_start(&change.address, change.action);
        let result = if opts.dry_run {
            ApplyResult::Skipped {
                reason: "Dry run".into(),
            }
        } else {
            log::error!("{}: its space does not exist", change.address);
            ApplyResult::Failed {
                error: format!("{}: its space does not exist", change.address),
            }
        };
        progress.on_change_complete(&change.address, &result);
        summary.add_result(&result);
    }
    summary.merge(&run(
        &provider.api_keys,
        &Plan::new(ready),
        opts,
        progress,
        state,
        persist,
        |s| &mut s.api_keys,
    ));
    if summary.halted {
        return summary;
    }

    // 4. Spaces that are going away
    summary.merge(&delete_spaces(
        provider,
        &space_deletions,
        opts,
        progress,
        state,
        persist,
    ));

    summary
}

/// Delete every recorded entity matching `target`
pub fn destroy<P: ProgressCallback>(
    provider: &Provider,
    state: &mut StateFile,
    target: Option<&str>,
    opts: &ExecuteOptions,
    progress: &mut P,
    persist: &mut Persist<'_>,
) -> ExecuteSummary {
    let plan = ProviderPlan::destroy(state, target);
    let mut summary = run(
        &provider.api_keys,
        &plan.api_keys,
        opts,
        progress,
        state,
        persist,
        |s| &mut s.api_keys,
    );
    if summary.halted {
        return summary;
    }
    summary.merge(&delete_spaces(
        provider,
        &plan.spaces,
        opts,
        progress,
        state,
        persist,
    ));
    summary
}

/// Adopt an existing remote entity under a declared address
///
/// Returns the address the record was stored under.
pub fn import(
    provider: &Provider,
    manifest: &Manifest,
    state: &mut StateFile,
    address: &str,
    import_id: &str,
) -> Result<String> {
    let Some((resource_type, name)) = address.split_once('.') else {
        bail!("Invalid address '{address}': expected \"space.<name>\" or \"api_key.<name>\"");
    };
    if !manifest.declares(resource_type, name) {
        bail!("{address} is not declared in the manifest");
    }

    match resource_type {
        "space" => {
            if state.space_id(name).is_some() {
                bail!("{address} is already managed");
            }
            let record = provider
                .spaces
                .import(import_id)
                .with_context(|| format!("Failed to import {address}"))?;
            if let Some(id) = &record.id
                && state.spaces.values().any(|s| s.id.as_ref() == Some(id))
            {
                bail!("space {id} is already managed under another name");
            }
            state.spaces.insert(name.to_string(), record);
        }
        "api_key" => {
            if state.api_keys.get(name).is_some_and(|k| k.id.is_some()) {
                bail!("{address} is already managed");
            }
            let record = provider
                .api_keys
                .import(import_id)
                .with_context(|| format!("Failed to import {address}"))?;
            if state
                .api_keys
                .values()
                .any(|k| k.id == record.id && k.space_id == record.space_id)
            {
                bail!("api key {import_id} is already managed under another name");
            }
            state.api_keys.insert(name.to_string(), record);
        }
        other => bail!("Unknown resource type '{other}'"),
    }

    log::info!("Imported {import_id} as {address}");
    Ok(address.to_string())
}

/// Execute one plan and mirror every result into state
fn run<C, P>(
    controller: &C,
    plan: &Plan<C::Record>,
    opts: &ExecuteOptions,
    progress: &mut P,
    state: &mut StateFile,
    persist: &mut Persist<'_>,
    records: fn(&mut StateFile) -> &mut BTreeMap<String, C::Record>,
) -> ExecuteSummary
where
    C: Controller,
    P: ProgressCallback,
{
    execute(controller, plan, opts, progress, |name, record| {
        let map = records(state);
        match record {
            Some(record) => {
                map.insert(name.to_string(), record);
            }
            None => {
                map.remove(name);
            }
        }
        persist(state).map_err(|e| format!("{e:#}"))
    })
}

/// Delete spaces, then forget recorded keys that went with them
fn delete_spaces<P: ProgressCallback>(
    provider: &Provider,
    plan: &Plan<SpaceRecord>,
    opts: &ExecuteOptions,
    progress: &mut P,
    state: &mut StateFile,
    persist: &mut Persist<'_>,
) -> ExecuteSummary {
    let before: BTreeSet<String> = state.spaces.values().filter_map(|s| s.id.clone()).collect();
    let mut summary = run(
        &provider.spaces,
        plan,
        opts,
        progress,
        state,
        persist,
        |s| &mut s.spaces,
    );
    let after: BTreeSet<String> = state.spaces.values().filter_map(|s| s.id.clone()).collect();

    let gone: BTreeSet<&String> = before.difference(&after).collect();
    if gone.is_empty() {
        return summary;
    }

    let orphaned: Vec<String> = state
        .api_keys
        .iter()
        .filter(|(_, key)| gone.contains(&key.space_id))
        .map(|(name, _)| name.clone())
        .collect();
    if !orphaned.is_empty() {
        for name in &orphaned {
            log::info!("Forgetting api_key.{name}: its space was deleted");
            state.api_keys.remove(name);
        }
        if let Err(e) = persist(state) {
            log::error!("Failed to save state: {e:#}");
            summary.halted = true;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ApiKeyRecord;
    use contentful::{Backend, MockBackend};
    use declarative::NoProgress;
    use std::sync::Arc;

    const MANIFEST: &str = r#"
[spaces.marketing]
name = "Marketing"
default_locale = "en-US"

[api_keys.website]
space = "marketing"
name = "Website"
description = "Public site"
"#;

    fn provider() -> (MockBackend, Provider) {
        let mock = MockBackend::new();
        (mock.clone(), Provider::new(Arc::new(mock)))
    }

    fn apply_all(provider: &Provider, manifest: &Manifest, state: &mut StateFile) -> ExecuteSummary {
        apply(
            provider,
            manifest,
            state,
            None,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut |_| Ok(()),
        )
    }

    #[test]
    fn test_apply_creates_space_then_key() {
        let (mock, provider) = provider();
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut state = StateFile::default();

        let summary = apply_all(&provider, &manifest, &mut state);

        assert_eq!(summary.created, 2);
        assert!(summary.is_success());
        let space_id = state.space_id("marketing").unwrap().to_string();
        let key = &state.api_keys["website"];
        assert_eq!(key.space_id, space_id);
        assert!(!key.access_token.is_empty());
        assert!(mock.api_key(&space_id, key.id.as_deref().unwrap()).is_some());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let (mock, provider) = provider();
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut state = StateFile::default();
        apply_all(&provider, &manifest, &mut state);
        let calls = mock.calls().len();

        refresh(&provider, &mut state).unwrap();
        let summary = apply_all(&provider, &manifest, &mut state);

        assert_eq!(summary.total(), 0);
        // Only the refresh reads happened
        assert_eq!(mock.calls().len(), calls + 2);
    }

    #[test]
    fn test_apply_updates_in_place() {
        let (_, provider) = provider();
        let mut state = StateFile::default();
        apply_all(&provider, &Manifest::parse(MANIFEST).unwrap(), &mut state);
        let key_id = state.api_keys["website"].id.clone();

        let renamed = Manifest::parse(&MANIFEST.replace("\"Website\"", "\"Website v2\"")).unwrap();
        let summary = apply_all(&provider, &renamed, &mut state);

        assert_eq!(summary.modified, 1);
        assert_eq!(state.api_keys["website"].name, "Website v2");
        assert_eq!(state.api_keys["website"].id, key_id);
        assert_eq!(state.api_keys["website"].version, 2);
    }

    #[test]
    fn test_apply_removes_undeclared_keys_before_spaces() {
        let (mock, provider) = provider();
        let mut state = StateFile::default();
        apply_all(&provider, &Manifest::parse(MANIFEST).unwrap(), &mut state);

        let summary = apply_all(&provider, &Manifest::default(), &mut state);

        assert_eq!(summary.removed, 2);
        assert!(state.is_empty());
        let deletes: Vec<String> = mock
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("delete_"))
            .collect();
        assert_eq!(deletes.len(), 2);
        assert!(deletes[0].starts_with("delete_api_key:"));
        assert!(deletes[1].starts_with("delete_space:"));
    }

    #[test]
    fn test_apply_recreates_vanished_space() {
        let (mock, provider) = provider();
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut state = StateFile::default();
        apply_all(&provider, &manifest, &mut state);

        let old_space = state.space_id("marketing").unwrap().to_string();
        mock.remove_space(&old_space);
        let report = refresh(&provider, &mut state).unwrap();
        assert_eq!(report.dropped.len(), 2);

        let summary = apply_all(&provider, &manifest, &mut state);
        assert_eq!(summary.created, 2);
        assert_ne!(state.space_id("marketing").unwrap(), old_space);
        assert_eq!(
            state.api_keys["website"].space_id,
            state.space_id("marketing").unwrap()
        );
    }

    #[test]
    fn test_apply_replaces_moved_key() {
        let (mock, provider) = provider();
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut state = StateFile::default();
        apply_all(&provider, &manifest, &mut state);
        let old = state.api_keys["website"].clone();

        let other = mock
            .upsert_space(&contentful::Space::new("Other", "en"))
            .unwrap();
        let moved = Manifest::parse(&format!(
            r#"
[spaces.marketing]
name = "Marketing"
default_locale = "en-US"

[api_keys.website]
space_id = "{}"
name = "Website"
"#,
            other.sys.id
        ))
        .unwrap();

        let summary = apply_all(&provider, &moved, &mut state);
        assert_eq!(summary.replaced, 1);
        let new = &state.api_keys["website"];
        assert_eq!(new.space_id, other.sys.id);
        assert_ne!(new.id, old.id);
        assert!(
            mock.api_key(&old.space_id, old.id.as_deref().unwrap())
                .is_none()
        );
    }

    #[test]
    fn test_failed_space_fails_its_keys() {
        let (mock, provider) = provider();
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut state = StateFile::default();
        mock.fail_next(contentful::Error::Validation {
            message: "name taken".into(),
        });

        let summary = apply_all(&provider, &manifest, &mut state);

        assert_eq!(summary.failed, 2);
        assert!(state.is_empty());
        assert!(mock.submitted_api_keys().is_empty());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let (mock, provider) = provider();
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut state = StateFile::default();
        let mut saves = 0;

        let summary = apply(
            &provider,
            &manifest,
            &mut state,
            None,
            &ExecuteOptions { dry_run: true },
            &mut NoProgress,
            &mut |_| {
                saves += 1;
                Ok(())
            },
        );

        assert_eq!(summary.skipped, 2);
        assert!(state.is_empty());
        assert!(mock.calls().is_empty());
        assert_eq!(saves, 0);
    }

    #[test]
    fn test_state_saved_after_each_change() {
        let (_, provider) = provider();
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut state = StateFile::default();
        let mut snapshots = Vec::new();

        apply(
            &provider,
            &manifest,
            &mut state,
            None,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut |s| {
                snapshots.push((s.spaces.len(), s.api_keys.len()));
                Ok(())
            },
        );

        assert_eq!(snapshots, vec![(1, 0), (1, 1)]);
    }

    #[test]
    fn test_failed_state_save_stops_apply() {
        let (mock, provider) = provider();
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut state = StateFile::default();

        let summary = apply(
            &provider,
            &manifest,
            &mut state,
            None,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut |_| anyhow::bail!("disk full"),
        );

        assert_eq!(summary.created, 0);
        assert_eq!(summary.failed, 1);
        assert!(summary.halted);
        assert!(!summary.is_success());
        // The key is never created, so nothing exists remotely unrecorded
        assert_eq!(mock.submitted_spaces().len(), 1);
        assert!(mock.submitted_api_keys().is_empty());
    }

    #[test]
    fn test_failed_state_save_stops_destroy() {
        let (mock, provider) = provider();
        let mut state = StateFile::default();
        apply_all(&provider, &Manifest::parse(MANIFEST).unwrap(), &mut state);

        let summary = destroy(
            &provider,
            &mut state,
            None,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut |_| anyhow::bail!("disk full"),
        );

        assert_eq!(summary.failed, 1);
        assert!(!summary.is_success());
        let space_id = state.space_id("marketing").unwrap();
        assert!(mock.space(space_id).is_some());
    }

    #[test]
    fn test_targeted_apply() {
        let (_, provider) = provider();
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut state = StateFile::default();

        let summary = apply(
            &provider,
            &manifest,
            &mut state,
            Some("space"),
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut |_| Ok(()),
        );

        assert_eq!(summary.created, 1);
        assert!(state.api_keys.is_empty());
    }

    #[test]
    fn test_refresh_keeps_present_records() {
        let (_, provider) = provider();
        let mut state = StateFile::default();
        apply_all(&provider, &Manifest::parse(MANIFEST).unwrap(), &mut state);
        let before = state.clone();

        let report = refresh(&provider, &mut state).unwrap();
        assert_eq!(report.refreshed, 2);
        assert!(report.dropped.is_empty());
        assert_eq!(state.spaces, before.spaces);
        assert_eq!(state.api_keys, before.api_keys);
    }

    #[test]
    fn test_refresh_propagates_remote_errors() {
        let (mock, provider) = provider();
        let mut state = StateFile::default();
        apply_all(&provider, &Manifest::parse(MANIFEST).unwrap(), &mut state);
        mock.fail_next(contentful::Error::AccessDenied {
            status: 401,
            message: "expired".into(),
        });

        let err = refresh(&provider, &mut state).unwrap_err();
        assert!(format!("{err:#}").contains("space.marketing"));
        assert_eq!(state.spaces.len(), 1);
    }

    #[test]
    fn test_destroy_everything() {
        let (mock, provider) = provider();
        let mut state = StateFile::default();
        apply_all(&provider, &Manifest::parse(MANIFEST).unwrap(), &mut state);
        let space_id = state.space_id("marketing").unwrap().to_string();

        let summary = destroy(
            &provider,
            &mut state,
            None,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut |_| Ok(()),
        );

        assert_eq!(summary.removed, 2);
        assert!(state.is_empty());
        assert!(mock.space(&space_id).is_none());
    }

    #[test]
    fn test_destroy_space_forgets_its_keys() {
        let (_, provider) = provider();
        let mut state = StateFile::default();
        apply_all(&provider, &Manifest::parse(MANIFEST).unwrap(), &mut state);

        let summary = destroy(
            &provider,
            &mut state,
            Some("space.marketing"),
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut |_| Ok(()),
        );

        assert_eq!(summary.removed, 1);
        assert!(state.is_empty());
    }

    #[test]
    fn test_destroy_already_deleted_succeeds() {
        let (mock, provider) = provider();
        let mut state = StateFile::default();
        apply_all(&provider, &Manifest::parse(MANIFEST).unwrap(), &mut state);
        mock.remove_space(state.space_id("marketing").unwrap());

        let summary = destroy(
            &provider,
            &mut state,
            None,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut |_| Ok(()),
        );

        assert!(summary.is_success());
        assert!(state.is_empty());
    }

    #[test]
    fn test_import_declared_key() {
        let (mock, provider) = provider();
        let manifest = Manifest::parse(
            r#"
[api_keys.legacy]
space_id = "placeholder"
name = "Legacy"
"#,
        )
        .unwrap();
        let space = mock
            .upsert_space(&contentful::Space::new("Old", "en"))
            .unwrap();
        let key = mock
            .upsert_api_key(&space.sys.id, &contentful::ApiKey::new("Legacy", ""))
            .unwrap();
        let mut state = StateFile::default();

        import(
            &provider,
            &manifest,
            &mut state,
            "api_key.legacy",
            &format!("{}/{}", space.sys.id, key.sys.id),
        )
        .unwrap();

        let record: &ApiKeyRecord = &state.api_keys["legacy"];
        assert_eq!(record.space_id, space.sys.id);
        assert_eq!(record.access_token, key.access_token);
    }

    #[test]
    fn test_import_rejects_undeclared_and_duplicates() {
        let (mock, provider) = provider();
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let space = mock
            .upsert_space(&contentful::Space::new("Marketing", "en"))
            .unwrap();
        let mut state = StateFile::default();

        assert!(import(&provider, &manifest, &mut state, "space.nope", &space.sys.id).is_err());
        assert!(import(&provider, &manifest, &mut state, "marketing", &space.sys.id).is_err());

        import(&provider, &manifest, &mut state, "space.marketing", &space.sys.id).unwrap();
        let recorded: &SpaceRecord = &state.spaces["marketing"];
        assert_eq!(recorded.id.as_deref(), Some(space.sys.id.as_str()));

        let err = import(&provider, &manifest, &mut state, "space.marketing", &space.sys.id)
            .unwrap_err();
        assert!(err.to_string().contains("already managed"));
    }

    #[test]
    fn test_import_bad_key_id_reports_format() {
        let (_, provider) = provider();
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut state = StateFile::default();

        let err = import(&provider, &manifest, &mut state, "api_key.website", "noslash")
            .unwrap_err();
        assert!(format!("{err:#}").contains("spaceId/keyId"));
        assert!(state.is_empty());
    }
}

//! Command implementations
//!
//! Shared loading helpers live here; each command module owns one
//! subcommand.

pub mod apply;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod refresh;
pub mod show;

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use declarative::{ConfirmCallback, ExecuteSummary};
use std::path::{Path, PathBuf};

use crate::Context;
use crate::engine::Provider;
use crate::paths;
use crate::progress::TerminalConfirm;
use crate::schema::Manifest;
use crate::state::StateFile;
use crate::ui;

/// Manifest and state loaded for one command
pub struct Session {
    pub manifest: Manifest,
    pub state: StateFile,
    pub state_path: PathBuf,
}

impl Session {
    /// Load the manifest (which must exist) and the state
    pub fn load(ctx: &Context) -> Result<Self> {
        let manifest_path = paths::manifest_path(ctx.manifest.as_deref())?;
        if !manifest_path.exists() {
            bail!(
                "Manifest not found: {}\n  Create it or pass --manifest",
                manifest_path.display()
            );
        }
        let manifest = Manifest::load(&manifest_path)?;
        Self::with_manifest(ctx, manifest)
    }

    /// Load the manifest if there is one; state-only commands work without it
    pub fn load_lenient(ctx: &Context) -> Result<Self> {
        let manifest_path = paths::manifest_path(ctx.manifest.as_deref())?;
        let manifest = if manifest_path.exists() {
            Manifest::load(&manifest_path)?
        } else {
            log::debug!(
                "No manifest at {}, using provider settings from the environment",
                manifest_path.display()
            );
            Manifest::default()
        };
        Self::with_manifest(ctx, manifest)
    }

    fn with_manifest(ctx: &Context, manifest: Manifest) -> Result<Self> {
        let state_path = paths::state_path(ctx.state.as_deref())?;
        let state = StateFile::load(&state_path)?;
        Ok(Self {
            manifest,
            state,
            state_path,
        })
    }

    /// Controllers over the configured backend
    pub fn connect(&self) -> Result<Provider> {
        let backend = self.manifest.provider.clone().with_env().backend()?;
        Ok(Provider::new(backend))
    }

    /// Save state with a fresh timestamp
    pub fn save(&mut self) -> Result<()> {
        save_state(&mut self.state, &self.state_path)
    }
}

pub(crate) fn save_state(state: &mut StateFile, path: &Path) -> Result<()> {
    state
        .touch(path)
        .with_context(|| format!("Failed to save state to {}", path.display()))
}

/// Ask before touching the remote, unless `yes` was given
pub(crate) fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    TerminalConfirm
        .confirm(prompt)
        .context("Failed to read confirmation")
}

/// Print the result of an execution and turn failures into an error
pub(crate) fn finish(summary: &ExecuteSummary, verb: &str) -> Result<()> {
    println!();
    let line = format!(
        "{} created, {} updated, {} replaced, {} destroyed",
        summary.created, summary.modified, summary.replaced, summary.removed
    );
    if summary.skipped > 0 {
        ui::dim(&format!("{} skipped", summary.skipped));
    }

    if summary.halted {
        ui::error(&format!("{verb} stopped: state could not be saved: {line}"));
        bail!("State could not be saved; changes after the last save were not attempted")
    }

    if summary.is_success() {
        ui::success(&format!("{verb} complete: {line}"));
        Ok(())
    } else {
        ui::error(&format!(
            "{verb} finished with {} {}: {line}",
            summary.failed.to_string().red(),
            if summary.failed == 1 { "failure" } else { "failures" }
        ));
        bail!("{} changes failed", summary.failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_success() {
        let summary = ExecuteSummary {
            created: 2,
            ..Default::default()
        };
        assert!(finish(&summary, "Apply").is_ok());
    }

    #[test]
    fn test_finish_fails_on_failed_changes() {
        let summary = ExecuteSummary {
            created: 1,
            failed: 1,
            ..Default::default()
        };
        let err = finish(&summary, "Apply").unwrap_err();
        assert!(err.to_string().contains("1 changes failed"));
    }

    #[test]
    fn test_finish_fails_when_state_not_saved() {
        let summary = ExecuteSummary {
            failed: 1,
            halted: true,
            ..Default::default()
        };
        let err = finish(&summary, "Apply").unwrap_err();
        assert!(err.to_string().contains("State could not be saved"));
    }
}

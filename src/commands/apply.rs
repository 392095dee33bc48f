//! `apply` - make remote objects match the manifest

use anyhow::Result;
use declarative::ExecuteOptions;

use super::{Session, confirm, finish, save_state};
use crate::Context;
use crate::engine::{self, ProviderPlan, differ};
use crate::progress::SpinnerProgress;
use crate::ui;

pub fn run(ctx: &Context, target: Option<&str>, dry_run: bool, yes: bool) -> Result<()> {
    ui::header("Applying Manifest");

    if dry_run {
        ui::warn("Dry run - no changes will be made");
    }

    let mut session = Session::load(ctx)?;
    if ctx.verbose > 0 {
        ui::kv("state", &session.state_path.display().to_string());
    }
    let provider = session.connect()?;

    if !session.state.is_empty() {
        let report = engine::refresh(&provider, &mut session.state)?;
        for address in &report.dropped {
            ui::warn(&format!("{address} no longer exists remotely"));
        }
        if !report.dropped.is_empty() && !dry_run {
            session.save()?;
        }
    }

    let plan = ProviderPlan::build(&session.manifest, &session.state, target);
    differ::display_plan(&plan);
    if !plan.has_changes() {
        return Ok(());
    }

    println!();
    if !dry_run && !confirm("Apply these changes?", yes)? {
        ui::info("Apply cancelled");
        return Ok(());
    }

    let opts = ExecuteOptions { dry_run };
    let mut progress = SpinnerProgress::new(ctx.quiet);
    let state_path = session.state_path.clone();
    let summary = engine::apply(
        &provider,
        &session.manifest,
        &mut session.state,
        target,
        &opts,
        &mut progress,
        &mut |state| save_state(state, &state_path),
    );

    finish(&summary, if dry_run { "Dry run" } else { "Apply" })
}

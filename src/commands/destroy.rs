//! `destroy` - delete recorded objects

use anyhow::Result;
use declarative::ExecuteOptions;

use super::{Session, confirm, finish, save_state};
use crate::Context;
use crate::engine::{self, ProviderPlan, differ};
use crate::progress::SpinnerProgress;
use crate::ui;

pub fn run(ctx: &Context, target: Option<&str>, yes: bool) -> Result<()> {
    ui::header("Destroy");

    let mut session = Session::load_lenient(ctx)?;
    let plan = ProviderPlan::destroy(&session.state, target);
    if !plan.has_changes() {
        ui::info("Nothing to destroy");
        return Ok(());
    }
    differ::display_plan(&plan);

    println!();
    let count = plan.summary().removals;
    if !confirm(
        &format!("Permanently delete {count} remote objects?"),
        yes,
    )? {
        ui::info("Destroy cancelled");
        return Ok(());
    }

    let provider = session.connect()?;
    let mut progress = SpinnerProgress::new(ctx.quiet);
    let state_path = session.state_path.clone();
    let summary = engine::destroy(
        &provider,
        &mut session.state,
        target,
        &ExecuteOptions::default(),
        &mut progress,
        &mut |state| save_state(state, &state_path),
    );

    finish(&summary, "Destroy")
}

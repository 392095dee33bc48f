//! `plan` - preview what apply would change

use anyhow::Result;

use super::Session;
use crate::Context;
use crate::engine::{self, ProviderPlan, differ};
use crate::ui;

pub fn run(ctx: &Context, target: Option<&str>) -> Result<()> {
    ui::header("Plan");

    let mut session = Session::load(ctx)?;
    if ctx.verbose > 0 {
        ui::kv("state", &session.state_path.display().to_string());
    }
    if !session.state.is_empty() {
        let provider = session.connect()?;
        let report = engine::refresh(&provider, &mut session.state)?;
        for address in &report.dropped {
            ui::warn(&format!("{address} no longer exists remotely"));
        }
    }

    let plan = ProviderPlan::build(&session.manifest, &session.state, target);
    differ::display_plan(&plan);

    if plan.has_changes() && !ctx.quiet {
        println!();
        ui::dim("Run `cfprov apply` to make these changes.");
    }
    Ok(())
}

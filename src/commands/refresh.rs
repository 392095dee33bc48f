//! `refresh` - re-read recorded objects and forget vanished ones

use anyhow::Result;

use super::Session;
use crate::Context;
use crate::engine;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let mut session = Session::load_lenient(ctx)?;
    if session.state.is_empty() {
        ui::info("Nothing recorded in state");
        return Ok(());
    }

    let provider = session.connect()?;
    let report = engine::refresh(&provider, &mut session.state)?;
    session.save()?;

    for address in &report.dropped {
        ui::warn(&format!("Forgot {address}: it no longer exists remotely"));
    }
    ui::success(&format!(
        "Refreshed {} {}",
        report.refreshed,
        if report.refreshed == 1 { "object" } else { "objects" }
    ));
    Ok(())
}

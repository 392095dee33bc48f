//! `import` - adopt an existing remote object

use anyhow::Result;

use super::Session;
use crate::Context;
use crate::engine;
use crate::ui;

pub fn run(ctx: &Context, address: &str, id: &str) -> Result<()> {
    let mut session = Session::load(ctx)?;
    let provider = session.connect()?;

    let stored = engine::import(
        &provider,
        &session.manifest,
        &mut session.state,
        address,
        id,
    )?;
    session.save()?;

    ui::success(&format!("Imported {id} as {stored}"));
    if !ctx.quiet {
        ui::dim("Run `cfprov plan` to compare it with the manifest.");
    }
    Ok(())
}

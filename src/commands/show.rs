//! `show` - print recorded state

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;

use super::Session;
use crate::Context;
use crate::state::StateFile;
use crate::ui;

pub fn run(ctx: &Context, address: Option<&str>, show_secrets: bool, json: bool) -> Result<()> {
    let session = Session::load_lenient(ctx)?;
    let view = redact(select(&session.state, address)?, show_secrets);

    if json {
        let out = serde_json::to_string_pretty(&view).context("Failed to serialize state")?;
        println!("{out}");
        return Ok(());
    }

    if view.is_empty() {
        ui::info("Nothing recorded in state");
        return Ok(());
    }

    ui::header("State");
    ui::dim(&format!(
        "{} (updated {})",
        session.state_path.display(),
        view.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for (name, space) in &view.spaces {
        ui::section(&format!("space.{name}"));
        ui::kv("id", space.id.as_deref().unwrap_or("-"));
        ui::kv("name", &space.name);
        ui::kv("default_locale", &space.default_locale);
        ui::kv("version", &space.version.to_string());
    }

    for (name, key) in &view.api_keys {
        ui::section(&format!("api_key.{name}"));
        ui::kv("id", key.id.as_deref().unwrap_or("-"));
        ui::kv("space_id", &key.space_id);
        ui::kv("name", &key.name);
        if !key.description.is_empty() {
            ui::kv("description", &key.description);
        }
        ui::kv("access_token", &key.access_token.yellow().to_string());
        ui::kv("version", &key.version.to_string());
    }

    if !show_secrets && !view.api_keys.is_empty() && !ctx.quiet {
        println!();
        ui::dim("Access tokens are masked; pass --show-secrets to print them.");
    }
    Ok(())
}

/// The part of state an address points at (everything when `None`)
fn select(state: &StateFile, address: Option<&str>) -> Result<StateFile> {
    let Some(address) = address else {
        return Ok(state.clone());
    };

    let mut view = StateFile {
        last_updated: state.last_updated,
        ..StateFile::default()
    };
    let missing = || format!("{address} is not in state");
    match address.split_once('.') {
        Some(("space", name)) => {
            let space = state.spaces.get(name).with_context(missing)?;
            view.spaces.insert(name.to_string(), space.clone());
        }
        Some(("api_key", name)) => {
            let key = state.api_keys.get(name).with_context(missing)?;
            view.api_keys.insert(name.to_string(), key.clone());
        }
        _ => bail!("Invalid address '{address}': expected \"space.<name>\" or \"api_key.<name>\""),
    }
    Ok(view)
}

fn redact(mut state: StateFile, show_secrets: bool) -> StateFile {
    if !show_secrets {
        for key in state.api_keys.values_mut() {
            key.access_token = ui::mask_secret(&key.access_token);
        }
    }
    state
}

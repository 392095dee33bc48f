//! Progress indicators and prompts for cfprov CLI.

use colored::Colorize;
use declarative::{Action, ApplyResult, ConfirmCallback, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::time::Duration;

/// Spinner with one line per finished change
pub struct SpinnerProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl SpinnerProgress {
    pub fn new(quiet: bool) -> Self {
        Self { bar: None, quiet }
    }

    fn print(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }
}

impl ProgressCallback for SpinnerProgress {
    fn on_batch_start(&mut self, count: usize, resource_type: &str) {
        if self.quiet {
            return;
        }
        let bar = ProgressBar::new(count as u64);
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{pos}/{len}] {prefix}: {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix(resource_type.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    fn on_change_start(&mut self, address: &str, action: Action) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{action} {address}"));
        }
    }

    fn on_change_complete(&mut self, address: &str, result: &ApplyResult) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
        if self.quiet && result.is_success() {
            return;
        }
        self.print(&result_line(address, result));
    }

    fn on_batch_complete(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn result_line(address: &str, result: &ApplyResult) -> String {
    match result {
        ApplyResult::Created => format!("  {} {address} created", "+".green()),
        ApplyResult::Modified => format!("  {} {address} updated", "~".yellow()),
        ApplyResult::Replaced => format!("  {} {address} replaced", "±".yellow()),
        ApplyResult::Removed => format!("  {} {address} destroyed", "-".red()),
        ApplyResult::NoChange => format!("  {} {address}", "✓".green()),
        ApplyResult::Skipped { reason } => {
            format!("  {} {address} ({reason})", "○".dimmed())
        }
        ApplyResult::Failed { error } => format!("  {} {address}: {error}", "✗".red()),
    }
}

/// Terminal yes/no prompt
pub struct TerminalConfirm;

impl ConfirmCallback for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(io::Error::other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_lines() {
        colored::control::set_override(false);
        assert_eq!(
            result_line("space.docs", &ApplyResult::Created),
            "  + space.docs created"
        );
        assert_eq!(
            result_line(
                "api_key.site",
                &ApplyResult::Failed {
                    error: "boom".into()
                }
            ),
            "  ✗ api_key.site: boom"
        );
    }

    #[test]
    fn test_quiet_progress_draws_nothing() {
        let mut progress = SpinnerProgress::new(true);
        progress.on_batch_start(2, "space");
        assert!(progress.bar.is_none());
        progress.on_change_start("space.docs", Action::Create);
        progress.on_batch_complete();
    }
}

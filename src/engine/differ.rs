//! Plan display - cfprov-specific UI

use super::planner::ProviderPlan;
use crate::resource::{ApiKeyRecord, SpaceRecord};
use colored::{ColoredString, Colorize};
use declarative::{Action, Change, DiffSummary};

/// Display a plan in a user-friendly format
pub fn display_plan(plan: &ProviderPlan) {
    for warning in &plan.warnings {
        println!("  {} {}", "⚠".yellow(), warning);
    }

    if !plan.has_changes() {
        println!();
        println!("  {} No changes. Remote objects match the manifest.", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Execution Plan".bold()
    );
    println!("│");

    print_section("Spaces", plan.spaces.pending().map(space_lines));
    print_section("API keys", plan.api_keys.pending().map(api_key_lines));

    println!("├─────────────────────────────────────────────────────┤");
    println!("│ {}", summary_line(&plan.summary()));
    println!("└─────────────────────────────────────────────────────┘");
}

fn print_section(title: &str, entries: impl Iterator<Item = Vec<String>>) {
    let entries: Vec<Vec<String>> = entries.collect();
    if entries.is_empty() {
        return;
    }

    println!("│ {}", title.bold());
    for lines in entries {
        for line in lines {
            println!("│   {line}");
        }
    }
    println!("│");
}

/// One-line plan totals
pub fn summary_line(summary: &DiffSummary) -> String {
    format!(
        "Plan: {} to add, {} to change, {} to replace, {} to destroy.",
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.replacements.to_string().yellow(),
        summary.removals.to_string().red()
    )
}

fn symbol(action: Action) -> ColoredString {
    match action {
        Action::Create => action.symbol().green(),
        Action::Update => action.symbol().yellow(),
        Action::Replace => action.symbol().yellow().bold(),
        Action::Delete => action.symbol().red(),
        Action::NoChange => action.symbol().dimmed(),
    }
}

fn header<R>(change: &Change<R>) -> String {
    let note = match change.action {
        Action::Replace => " (must be replaced)".red().to_string(),
        Action::Delete => " (will be destroyed)".dimmed().to_string(),
        _ => String::new(),
    };
    format!("{} {}{}", symbol(change.action), change.address, note)
}

/// Attribute line: unchanged, set, or changed from one value to another
fn attribute(key: &str, before: Option<&str>, after: Option<&str>) -> Option<String> {
    match (before, after) {
        (Some(from), Some(to)) if from != to => {
            Some(format!("    {key}: {from:?} → {to:?}"))
        }
        (Some(_), Some(_)) => None,
        (None, Some(to)) => Some(format!("    {key}: {to:?}")),
        (Some(from), None) => Some(format!("    {key}: {from:?}").dimmed().to_string()),
        (None, None) => None,
    }
}

fn space_lines(change: &Change<SpaceRecord>) -> Vec<String> {
    let prior = change.prior.as_ref();
    let desired = change.desired.as_ref();

    let mut lines = vec![header(change)];
    lines.extend(attribute(
        "name",
        prior.map(|s| s.name.as_str()),
        desired.map(|s| s.name.as_str()),
    ));
    if change.action == Action::Create {
        lines.extend(attribute(
            "default_locale",
            None,
            desired.map(|s| s.default_locale.as_str()),
        ));
    }
    lines
}

fn api_key_lines(change: &Change<ApiKeyRecord>) -> Vec<String> {
    let prior = change.prior.as_ref();
    let desired = change.desired.as_ref();

    let mut lines = vec![header(change)];
    match desired {
        Some(key) if key.space_id.is_empty() => {
            lines.push(format!("    space_id: {}", "(known after apply)".dimmed()));
        }
        _ => lines.extend(attribute(
            "space_id",
            prior.map(|k| k.space_id.as_str()),
            desired.map(|k| k.space_id.as_str()),
        )),
    }
    lines.extend(attribute(
        "name",
        prior.map(|k| k.name.as_str()),
        desired.map(|k| k.name.as_str()),
    ));
    lines.extend(attribute(
        "description",
        prior.map(|k| k.description.as_str()),
        desired.map(|k| k.description.as_str()),
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: Option<&str>, space_id: &str, name: &str) -> ApiKeyRecord {
        ApiKeyRecord {
            id: id.map(Into::into),
            ..ApiKeyRecord::desired(space_id, name, "")
        }
    }

    #[test]
    fn test_attribute_lines() {
        assert!(attribute("name", Some("a"), Some("a")).is_none());
        assert!(
            attribute("name", Some("a"), Some("b"))
                .unwrap()
                .contains("\"a\" → \"b\"")
        );
        assert!(attribute("name", None, Some("b")).unwrap().contains("\"b\""));
        assert!(attribute("name", None, None).is_none());
    }

    #[test]
    fn test_unresolved_space_shown_as_pending() {
        let change = Change::between("api_key.website", None, Some(key(None, "", "Website")));
        let lines = api_key_lines(&change);

        assert!(lines[0].contains("api_key.website"));
        assert!(lines.iter().any(|l| l.contains("known after apply")));
    }

    #[test]
    fn test_replacement_shows_space_move() {
        let change = Change::between(
            "api_key.website",
            Some(key(Some("key1"), "space1", "Website")),
            Some(key(None, "space2", "Website")),
        );
        let lines = api_key_lines(&change);

        assert!(lines[0].contains("must be replaced"));
        assert!(lines.iter().any(|l| l.contains("\"space1\" → \"space2\"")));
        // Unchanged name is not listed
        assert!(!lines.iter().any(|l| l.contains("name:")));
    }

    #[test]
    fn test_summary_line_counts() {
        colored::control::set_override(false);
        let summary = DiffSummary {
            additions: 2,
            removals: 1,
            modifications: 0,
            replacements: 1,
        };
        assert_eq!(
            summary_line(&summary),
            "Plan: 2 to add, 0 to change, 1 to replace, 1 to destroy."
        );
    }
}

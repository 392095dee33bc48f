//! Execution planner - groups and filters planned changes

use crate::diff::{Action, Change, DiffSummary, compute_changes};
use crate::resource::Record;
use std::collections::BTreeMap;

/// Planned changes for one resource type
#[derive(Debug, Clone)]
pub struct Plan<R> {
    /// Changes in address order, including no-ops
    pub changes: Vec<Change<R>>,
}

impl<R: Record> Plan<R> {
    /// Create a plan from explicit changes
    pub fn new(changes: Vec<Change<R>>) -> Self {
        Self { changes }
    }

    /// Plan the changes that take `prior` to `desired`
    pub fn from_states(
        resource_type: &str,
        prior: &BTreeMap<String, R>,
        desired: &BTreeMap<String, R>,
    ) -> Self {
        Self::new(compute_changes(resource_type, prior, desired))
    }

    /// Filter plan to only include changes matching a target pattern
    ///
    /// Target format: "type" or "type.name"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                Self {
                    changes: self
                        .changes
                        .into_iter()
                        .filter(|c| matches_filter(&c.address, resource_type.as_deref(), name.as_deref()))
                        .collect(),
                }
            }
        }
    }

    /// Split into (deletions, everything else)
    pub fn split_deletions(self) -> (Self, Self) {
        let (deletions, rest) = self
            .changes
            .into_iter()
            .partition(|c| c.action == Action::Delete);
        (Self::new(deletions), Self::new(rest))
    }

    /// Changes that touch the remote
    pub fn pending(&self) -> impl Iterator<Item = &Change<R>> {
        self.changes.iter().filter(|c| c.action.is_change())
    }

    /// Check if any change touches the remote
    pub fn has_changes(&self) -> bool {
        self.pending().next().is_some()
    }

    /// Summary statistics
    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_changes(&self.changes)
    }
}

impl<R> Default for Plan<R> {
    fn default() -> Self {
        Self {
            changes: Vec::new(),
        }
    }
}

/// Parse a target string like "type.name" into (type, name)
pub fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<&str> = target.split('.').collect();
    match parts.len() {
        1 => (Some(parts[0].to_string()), None),
        2 => (Some(parts[0].to_string()), Some(parts[1].to_string())),
        _ => (None, Some(target.to_string())),
    }
}

/// Check if an address matches the filter criteria
fn matches_filter(address: &str, resource_type: Option<&str>, name: Option<&str>) -> bool {
    let (addr_type, addr_name) = address.split_once('.').unwrap_or((address, ""));

    if let Some(rt) = resource_type {
        // Allow common aliases
        let matches_type = match rt {
            "spaces" => addr_type == "space",
            "api_keys" | "keys" => addr_type == "api_key",
            _ => addr_type == rt,
        };
        if !matches_type {
            return false;
        }
    }

    if let Some(n) = name
        && addr_name != n
    {
        return false;
    }

    true
}

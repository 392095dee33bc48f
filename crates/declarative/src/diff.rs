//! Diff computation between recorded and desired state

use crate::resource::Record;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// What applying a change will do to the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Create a new remote entity
    Create,
    /// Update the existing entity in place
    Update,
    /// Delete the entity and create it again
    Replace,
    /// Delete the entity
    Delete,
    /// Nothing to do
    NoChange,
}

impl Action {
    /// Check if the action touches the remote
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoChange)
    }

    /// Plan marker, e.g. "+" for create
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Create => "+",
            Self::Update => "~",
            Self::Replace => "-/+",
            Self::Delete => "-",
            Self::NoChange => " ",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::NoChange => "no change",
        };
        write!(f, "{verb}")
    }
}

/// One planned change for one addressed record
#[derive(Debug, Clone)]
pub struct Change<R> {
    /// Address of the record, "type.name"
    pub address: String,
    /// What will happen
    pub action: Action,
    /// Recorded state, if any
    pub prior: Option<R>,
    /// Desired state, if still declared
    pub desired: Option<R>,
}

impl<R: Record> Change<R> {
    /// Decide the action that takes `prior` to `desired`
    ///
    /// A prior record without an id was deleted remotely, so a still-desired
    /// record is created again.
    pub fn between(address: impl Into<String>, prior: Option<R>, desired: Option<R>) -> Self {
        let action = match (&prior, &desired) {
            (None, None) => Action::NoChange,
            (None, Some(_)) => Action::Create,
            (Some(p), None) => {
                if p.id().is_some() {
                    Action::Delete
                } else {
                    Action::NoChange
                }
            }
            (Some(p), Some(d)) => {
                if p.id().is_none() {
                    Action::Create
                } else if p.requires_replacement(d) {
                    Action::Replace
                } else if p.settings_match(d) {
                    Action::NoChange
                } else {
                    Action::Update
                }
            }
        };

        Self {
            address: address.into(),
            action,
            prior,
            desired,
        }
    }

    /// Name part of the address
    pub fn name(&self) -> &str {
        self.address
            .split_once('.')
            .map_or(self.address.as_str(), |(_, name)| name)
    }
}

/// Compute changes for every name in either map
///
/// Addresses are `"{resource_type}.{name}"`, ordered by name.
pub fn compute_changes<R: Record>(
    resource_type: &str,
    prior: &BTreeMap<String, R>,
    desired: &BTreeMap<String, R>,
) -> Vec<Change<R>> {
    let names: BTreeSet<&String> = prior.keys().chain(desired.keys()).collect();

    names
        .into_iter()
        .map(|name| {
            Change::between(
                format!("{resource_type}.{name}"),
                prior.get(name).cloned(),
                desired.get(name).cloned(),
            )
        })
        .collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// Number of records to create
    pub additions: usize,
    /// Number of records to delete
    pub removals: usize,
    /// Number of records to update in place
    pub modifications: usize,
    /// Number of records to replace
    pub replacements: usize,
}

impl DiffSummary {
    /// Create a summary from a list of changes
    pub fn from_changes<R>(changes: &[Change<R>]) -> Self {
        let mut summary = Self::default();
        for change in changes {
            match change.action {
                Action::Create => summary.additions += 1,
                Action::Delete => summary.removals += 1,
                Action::Update => summary.modifications += 1,
                Action::Replace => summary.replacements += 1,
                Action::NoChange => {}
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications + self.replacements
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &DiffSummary) {
        self.additions += other.additions;
        self.removals += other.removals;
        self.modifications += other.modifications;
        self.replacements += other.replacements;
    }
}

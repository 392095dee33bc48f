//! Execution engine - applies planned changes through a controller

use crate::context::ProgressCallback;
use crate::diff::{Action, Change};
use crate::planner::Plan;
use crate::resource::{Controller, Lifecycle};
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use std::fmt::Display;

/// Execute a plan with the given options and callbacks
///
/// Changes are applied one at a time, in plan order. A failed change is
/// counted and execution moves on to the next one.
///
/// `sink` receives the resulting record for every successful change, keyed by
/// name: `Some(record)` to store, `None` when the record was deleted. Failed
/// and skipped changes never reach the sink, so recorded state keeps the
/// prior record.
///
/// If the sink fails, the change that produced the record counts as failed
/// and execution halts: the remaining changes are counted as skipped and
/// never attempted.
pub fn execute<C, P, F, E>(
    controller: &C,
    plan: &Plan<C::Record>,
    opts: &ExecuteOptions,
    progress: &mut P,
    mut sink: F,
) -> ExecuteSummary
where
    C: Controller + ?Sized,
    P: ProgressCallback,
    F: FnMut(&str, Option<C::Record>) -> Result<(), E>,
    E: Display,
{
    let pending: Vec<&Change<C::Record>> = plan.pending().collect();
    let mut summary = ExecuteSummary::default();

    if pending.is_empty() {
        return summary;
    }

    progress.on_batch_start(pending.len(), controller.resource_type());
    for (index, change) in pending.iter().enumerate() {
        progress.on_change_start(&change.address, change.action);

        let result = if opts.dry_run {
            ApplyResult::Skipped {
                reason: "Dry run".into(),
            }
        } else {
            match apply_change(controller, change) {
                Ok((result, record)) => match sink(change.name(), record) {
                    Ok(()) => result,
                    Err(e) => {
                        log::error!(
                            "{} {} was not recorded: {}",
                            change.action,
                            change.address,
                            e
                        );
                        summary.halted = true;
                        ApplyResult::Failed {
                            error: format!("applied but not recorded: {e}"),
                        }
                    }
                },
                Err(e) => {
                    log::error!("{} {} failed: {}", change.action, change.address, e);
                    ApplyResult::Failed {
                        error: e.to_string(),
                    }
                }
            }
        };

        progress.on_change_complete(&change.address, &result);
        summary.add_result(&result);

        if summary.halted {
            summary.skipped += pending.len() - index - 1;
            break;
        }
    }
    progress.on_batch_complete();

    summary
}

/// Apply a single change
///
/// Returns the outcome and the record to keep; `None` means the record is
/// gone.
pub fn apply_change<C>(
    controller: &C,
    change: &Change<C::Record>,
) -> Result<(ApplyResult, Option<C::Record>), C::Error>
where
    C: Controller + ?Sized,
{
    match (change.action, &change.prior, &change.desired) {
        (Action::Create, _, Some(desired)) => {
            let record = controller.create(desired)?;
            Ok((ApplyResult::Created, Some(record)))
        }
        (Action::Update, Some(prior), Some(desired)) => {
            let mut record = prior.clone();
            controller.update(&mut record, desired)?;
            Ok((ApplyResult::Modified, Some(record)))
        }
        (Action::Replace, Some(prior), Some(desired)) => {
            let mut old = prior.clone();
            controller.delete(&mut old)?;
            let record = controller.create(desired)?;
            Ok((ApplyResult::Replaced, Some(record)))
        }
        (Action::Delete, Some(prior), _) => {
            let mut record = prior.clone();
            controller.delete(&mut record)?;
            Ok((ApplyResult::Removed, None))
        }
        _ => Ok((ApplyResult::NoChange, change.prior.clone())),
    }
}

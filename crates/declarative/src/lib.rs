//! # Declarative
//!
//! A framework for managing remote entities declaratively.
//!
//! This crate provides the core abstractions for recording what exists
//! remotely, planning the changes that reach a desired state, and applying
//! them through a per-type controller.
//!
//! ## Core Concepts
//!
//! - **Record**: Local state of one remote entity, keyed by its remote id
//! - **Controller**: Field mapping between a record type and a remote API
//! - **Lifecycle**: Create, read, update, delete and import, written once
//!   for every controller
//! - **Plan**: Changes computed from recorded and desired state
//! - **Executor**: Applies a plan through a controller
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecuteOptions, NoProgress, Plan, execute};
//!
//! let plan = Plan::from_states("space", &recorded, &desired);
//! let summary = execute(&controller, &plan, &ExecuteOptions::default(), &mut NoProgress,
//!     |name, record| {
//!         match record {
//!             Some(r) => { recorded.insert(name.to_string(), r); }
//!             None => { recorded.remove(name); }
//!         }
//!         save(&recorded)
//!     });
//! ```
//!
//! ## Provider Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This allows the crate to be used without hard dependencies on
//! specific UI frameworks.

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use diff::{Action, Change, DiffSummary, compute_changes};
pub use error::{LifecycleError, RemoteFailure};
pub use executor::{apply_change, execute};
pub use planner::{Plan, parse_target};
pub use resource::{Controller, Lifecycle, Record};
pub use types::{ApplyResult, ExecuteOptions, ExecuteSummary, ResourceState};

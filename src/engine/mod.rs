//! Execution engine for cfprov
//!
//! The engine orchestrates:
//! 1. Planning - Compare recorded state with the manifest
//! 2. Display - Show the plan
//! 3. Executing - Apply changes in dependency order, saving state as it goes

pub mod differ;
pub mod executor;
pub mod planner;

pub use executor::{apply, destroy, import, refresh};
pub use planner::ProviderPlan;

use crate::resource::{ApiKeyController, SpaceController};
use contentful::Backend;
use std::sync::Arc;

/// Every controller, sharing one backend
pub struct Provider {
    pub spaces: SpaceController,
    pub api_keys: ApiKeyController,
}

impl Provider {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            spaces: SpaceController::new(Arc::clone(&backend)),
            api_keys: ApiKeyController::new(backend),
        }
    }
}

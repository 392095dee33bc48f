//! Contentful resources managed by cfprov
//!
//! Each resource type is a [`declarative::Controller`] over the injected
//! [`contentful::Backend`]; create, read, update, delete and import come from
//! the shared [`declarative::Lifecycle`].

pub mod api_key;
pub mod space;

pub use api_key::{ApiKeyController, ApiKeyRecord};
pub use space::{SpaceController, SpaceRecord};

use declarative::{LifecycleError, RemoteFailure};

/// Error surfaced by every controller operation
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport or API failure, propagated unchanged
    #[error(transparent)]
    Remote(#[from] contentful::Error),

    /// Misuse of the lifecycle (bad import id, missing remote id, ...)
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl RemoteFailure for ProviderError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_not_found())
    }
}

//! Records, controllers and the shared lifecycle
//!
//! A [`Record`] is the local representation of one remote entity. A
//! [`Controller`] knows how to move one record type to and from its remote
//! representation. [`Lifecycle`] implements create, read, update, delete and
//! import once, on top of any controller.

use crate::error::{LifecycleError, RemoteFailure};
use crate::types::ResourceState;
use std::fmt;

/// Local state of one remote entity
pub trait Record: Clone + fmt::Debug {
    /// Remote identifier, absent until the first successful create
    fn id(&self) -> Option<&str>;

    /// Forget the remote identifier (the entity is gone)
    fn clear_id(&mut self);

    /// Present if the record has a remote id
    fn state(&self) -> ResourceState {
        if self.id().is_some() {
            ResourceState::Present
        } else {
            ResourceState::Absent
        }
    }

    /// Whether every user-settable field already matches `desired`
    fn settings_match(&self, desired: &Self) -> bool;

    /// Whether reaching `desired` needs a delete and a fresh create
    fn requires_replacement(&self, _desired: &Self) -> bool {
        false
    }
}

/// Maps one record type onto a remote API
///
/// Implementations hold the typed remote client; they translate fields and
/// issue single calls. Control flow lives in [`Lifecycle`].
pub trait Controller {
    /// Local representation
    type Record: Record;
    /// Remote representation
    type Remote;
    /// Error surfaced by the remote client
    type Error: RemoteFailure + From<LifecycleError>;

    /// Resource type name, e.g. "space"
    fn resource_type(&self) -> &'static str;

    /// Build a not-yet-created remote entity from desired settings
    fn build(&self, desired: &Self::Record) -> Self::Remote;

    /// Fetch the current remote entity
    fn fetch(&self, record: &Self::Record, id: &str) -> Result<Self::Remote, Self::Error>;

    /// Overwrite the user-managed fields of `remote` with desired values
    fn apply_desired(&self, remote: &mut Self::Remote, desired: &Self::Record);

    /// Submit the whole entity, returning the remote's response
    fn submit(
        &self,
        record: &Self::Record,
        remote: &Self::Remote,
    ) -> Result<Self::Remote, Self::Error>;

    /// Delete the entity
    fn remove(&self, record: &Self::Record, remote: &Self::Remote) -> Result<(), Self::Error>;

    /// Copy id, version and every remote-reported field into the record
    fn map_back(&self, record: &mut Self::Record, remote: &Self::Remote);

    /// Parse an import identifier into a record carrying just enough to read it
    fn seed_import(&self, import_id: &str) -> Result<Self::Record, LifecycleError>;
}

/// Lifecycle operations shared by every controller
///
/// Not-found handling is uniform: a read that finds nothing clears the id
/// and succeeds, and a delete that finds nothing (on fetch or on delete)
/// succeeds.
pub trait Lifecycle: Controller {
    /// Create the entity; absent -> present
    fn create(&self, desired: &Self::Record) -> Result<Self::Record, Self::Error>;

    /// Refresh the record from the remote
    fn read(&self, record: &mut Self::Record) -> Result<ResourceState, Self::Error>;

    /// Fetch current remote, apply desired fields, submit, map back
    fn update(&self, record: &mut Self::Record, desired: &Self::Record)
    -> Result<(), Self::Error>;

    /// Delete the entity; present -> absent
    fn delete(&self, record: &mut Self::Record) -> Result<(), Self::Error>;

    /// Adopt an existing remote entity; absent -> present
    fn import(&self, import_id: &str) -> Result<Self::Record, Self::Error>;
}

impl<C: Controller + ?Sized> Lifecycle for C {
    fn create(&self, desired: &Self::Record) -> Result<Self::Record, Self::Error> {
        let remote = self.build(desired);
        let created = self.submit(desired, &remote)?;

        let mut record = desired.clone();
        self.map_back(&mut record, &created);
        log::info!(
            "Created {} {}",
            self.resource_type(),
            record.id().unwrap_or_default()
        );
        Ok(record)
    }

    fn read(&self, record: &mut Self::Record) -> Result<ResourceState, Self::Error> {
        let Some(id) = record.id().map(str::to_string) else {
            return Ok(ResourceState::Absent);
        };

        match self.fetch(record, &id) {
            Ok(remote) => {
                self.map_back(record, &remote);
                log::debug!("Refreshed {} {}", self.resource_type(), id);
                Ok(ResourceState::Present)
            }
            Err(e) if e.is_not_found() => {
                log::warn!(
                    "{} {} no longer exists remotely, forgetting it",
                    self.resource_type(),
                    id
                );
                record.clear_id();
                Ok(ResourceState::Absent)
            }
            Err(e) => Err(e),
        }
    }

    fn update(
        &self,
        record: &mut Self::Record,
        desired: &Self::Record,
    ) -> Result<(), Self::Error> {
        let Some(id) = record.id().map(str::to_string) else {
            return Err(LifecycleError::MissingId {
                resource_type: self.resource_type(),
                operation: "update",
            }
            .into());
        };

        let mut remote = self.fetch(record, &id)?;
        self.apply_desired(&mut remote, desired);
        let submitted = self.submit(record, &remote)?;
        self.map_back(record, &submitted);
        log::info!("Updated {} {}", self.resource_type(), id);
        Ok(())
    }

    fn delete(&self, record: &mut Self::Record) -> Result<(), Self::Error> {
        let Some(id) = record.id().map(str::to_string) else {
            return Ok(());
        };

        let outcome = self
            .fetch(record, &id)
            .and_then(|remote| self.remove(record, &remote));
        match outcome {
            Ok(()) => log::info!("Deleted {} {}", self.resource_type(), id),
            Err(e) if e.is_not_found() => {
                log::info!("{} {} was already deleted", self.resource_type(), id);
            }
            Err(e) => return Err(e),
        }

        record.clear_id();
        Ok(())
    }

    fn import(&self, import_id: &str) -> Result<Self::Record, Self::Error> {
        let mut record = self.seed_import(import_id)?;

        if self.read(&mut record)?.is_absent() {
            return Err(LifecycleError::ImportMissing {
                resource_type: self.resource_type(),
                id: import_id.to_string(),
            }
            .into());
        }

        log::info!("Imported {} {}", self.resource_type(), import_id);
        Ok(record)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A toy controller over an in-memory map, shared by the crate's tests.

    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum TestError {
        NotFound,
        Down,
        Lifecycle(LifecycleError),
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::NotFound => write!(f, "not found"),
                Self::Down => write!(f, "service down"),
                Self::Lifecycle(e) => write!(f, "{e}"),
            }
        }
    }

    impl std::error::Error for TestError {}

    impl RemoteFailure for TestError {
        fn is_not_found(&self) -> bool {
            matches!(self, Self::NotFound)
        }
    }

    impl From<LifecycleError> for TestError {
        fn from(e: LifecycleError) -> Self {
            Self::Lifecycle(e)
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct Widget {
        pub id: Option<String>,
        pub version: u64,
        pub name: String,
        pub color: String,
    }

    impl Widget {
        pub fn named(name: &str) -> Self {
            Self {
                name: name.to_string(),
                color: "red".to_string(),
                ..Default::default()
            }
        }
    }

    impl Record for Widget {
        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn clear_id(&mut self) {
            self.id = None;
        }

        fn settings_match(&self, desired: &Self) -> bool {
            self.name == desired.name && self.color == desired.color
        }

        fn requires_replacement(&self, desired: &Self) -> bool {
            self.color != desired.color
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RemoteWidget {
        pub id: String,
        pub version: u64,
        pub name: String,
        pub color: String,
    }

    #[derive(Default)]
    pub struct WidgetController {
        pub remote: RefCell<HashMap<String, RemoteWidget>>,
        pub next_id: RefCell<u64>,
        pub fail_with: RefCell<Option<TestError>>,
        pub remove_error: RefCell<Option<TestError>>,
        pub delete_calls: RefCell<usize>,
    }

    impl WidgetController {
        fn check(&self) -> Result<(), TestError> {
            match self.fail_with.borrow_mut().take() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
    }

    impl Controller for WidgetController {
        type Record = Widget;
        type Remote = RemoteWidget;
        type Error = TestError;

        fn resource_type(&self) -> &'static str {
            "widget"
        }

        fn build(&self, desired: &Widget) -> RemoteWidget {
            RemoteWidget {
                id: String::new(),
                version: 0,
                name: desired.name.clone(),
                color: desired.color.clone(),
            }
        }

        fn fetch(&self, _record: &Widget, id: &str) -> Result<RemoteWidget, TestError> {
            self.check()?;
            self.remote
                .borrow()
                .get(id)
                .cloned()
                .ok_or(TestError::NotFound)
        }

        fn apply_desired(&self, remote: &mut RemoteWidget, desired: &Widget) {
            remote.name = desired.name.clone();
        }

        fn submit(&self, _record: &Widget, remote: &RemoteWidget) -> Result<RemoteWidget, TestError> {
            self.check()?;
            let mut stored = remote.clone();
            if stored.id.is_empty() {
                *self.next_id.borrow_mut() += 1;
                stored.id = format!("w{}", self.next_id.borrow());
            }
            stored.version += 1;
            self.remote
                .borrow_mut()
                .insert(stored.id.clone(), stored.clone());
            Ok(stored)
        }

        fn remove(&self, _record: &Widget, remote: &RemoteWidget) -> Result<(), TestError> {
            *self.delete_calls.borrow_mut() += 1;
            if let Some(e) = self.remove_error.borrow_mut().take() {
                return Err(e);
            }
            self.remote
                .borrow_mut()
                .remove(&remote.id)
                .map(|_| ())
                .ok_or(TestError::NotFound)
        }

        fn map_back(&self, record: &mut Widget, remote: &RemoteWidget) {
            record.id = Some(remote.id.clone());
            record.version = remote.version;
            record.name = remote.name.clone();
            record.color = remote.color.clone();
        }

        fn seed_import(&self, import_id: &str) -> Result<Widget, LifecycleError> {
            if import_id.is_empty() {
                return Err(LifecycleError::ImportFormat {
                    input: import_id.to_string(),
                    expected: "widgetId",
                });
            }
            Ok(Widget {
                id: Some(import_id.to_string()),
                ..Default::default()
            })
        }
    }
}

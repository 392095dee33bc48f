//! Backend trait and implementations for talking to the Management API.
//!
//! [`Backend`] is the remote-client seam every resource controller is built
//! on. The production implementation is [`http::HttpBackend`];
//! [`retry::RetryingBackend`](crate::retry::RetryingBackend) can wrap any
//! backend to retry transient failures.
//!
//! # Testing
//!
//! Use [`MockBackend`] for testing without network access:
//!
//! ```
//! use contentful::{Backend, MockBackend, Space};
//!
//! let mock = MockBackend::new();
//! let created = mock.upsert_space(&Space::new("Docs", "en")).unwrap();
//! assert_eq!(created.sys.version, 1);
//!
//! let fetched = mock.get_space(&created.sys.id).unwrap();
//! assert_eq!(fetched.name, "Docs");
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{ApiKey, DEFAULT_LOCALE, Link, Space, Sys};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Typed create/read/update/delete operations over the Management API.
///
/// Upserts create the entity when `sys.id` is empty and replace it otherwise;
/// replacing requires the current `sys.version`. Missing entities are
/// reported as [`Error::NotFound`].
pub trait Backend: Send + Sync {
    /// Create or replace a space, returning the remote representation.
    fn upsert_space(&self, space: &Space) -> Result<Space>;

    /// Fetch a space by id.
    fn get_space(&self, id: &str) -> Result<Space>;

    /// Delete a space.
    fn delete_space(&self, space: &Space) -> Result<()>;

    /// Create or replace an API key inside a space.
    fn upsert_api_key(&self, space_id: &str, api_key: &ApiKey) -> Result<ApiKey>;

    /// Fetch an API key by space and key id.
    fn get_api_key(&self, space_id: &str, id: &str) -> Result<ApiKey>;

    /// Delete an API key.
    fn delete_api_key(&self, space_id: &str, api_key: &ApiKey) -> Result<()>;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn upsert_space(&self, space: &Space) -> Result<Space> {
        (**self).upsert_space(space)
    }

    fn get_space(&self, id: &str) -> Result<Space> {
        (**self).get_space(id)
    }

    fn delete_space(&self, space: &Space) -> Result<()> {
        (**self).delete_space(space)
    }

    fn upsert_api_key(&self, space_id: &str, api_key: &ApiKey) -> Result<ApiKey> {
        (**self).upsert_api_key(space_id, api_key)
    }

    fn get_api_key(&self, space_id: &str, id: &str) -> Result<ApiKey> {
        (**self).get_api_key(space_id, id)
    }

    fn delete_api_key(&self, space_id: &str, api_key: &ApiKey) -> Result<()> {
        (**self).delete_api_key(space_id, api_key)
    }
}

#[derive(Debug, Default)]
struct MockState {
    spaces: HashMap<String, Space>,
    api_keys: HashMap<(String, String), ApiKey>,
    next_id: u64,
    failures: VecDeque<Error>,
    submitted_spaces: Vec<Space>,
    submitted_api_keys: Vec<(String, ApiKey)>,
    calls: Vec<String>,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn begin(&mut self, call: String) -> Result<()> {
        self.calls.push(call);
        match self.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory backend for testing without network access.
///
/// Behaves like the real API where it matters to callers: ids are assigned
/// on create, versions start at 1 and increase on every upsert, stale
/// versions are rejected, access tokens are generated server-side, and
/// missing entities produce [`Error::NotFound`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next backend call fail with `error`. Calls queue up.
    pub fn fail_next(&self, error: Error) {
        self.state().failures.push_back(error);
    }

    /// Delete a space (and its keys) behind the caller's back.
    pub fn remove_space(&self, id: &str) -> bool {
        let mut state = self.state();
        state.api_keys.retain(|(space_id, _), _| space_id != id);
        state.spaces.remove(id).is_some()
    }

    /// Delete an API key behind the caller's back.
    pub fn remove_api_key(&self, space_id: &str, id: &str) -> bool {
        self.state()
            .api_keys
            .remove(&(space_id.to_string(), id.to_string()))
            .is_some()
    }

    /// Current remote copy of a space.
    #[must_use]
    pub fn space(&self, id: &str) -> Option<Space> {
        self.state().spaces.get(id).cloned()
    }

    /// Current remote copy of an API key.
    #[must_use]
    pub fn api_key(&self, space_id: &str, id: &str) -> Option<ApiKey> {
        self.state()
            .api_keys
            .get(&(space_id.to_string(), id.to_string()))
            .cloned()
    }

    /// Every space payload submitted through `upsert_space`, in order.
    #[must_use]
    pub fn submitted_spaces(&self) -> Vec<Space> {
        self.state().submitted_spaces.clone()
    }

    /// Every `(space_id, payload)` submitted through `upsert_api_key`, in order.
    #[must_use]
    pub fn submitted_api_keys(&self) -> Vec<(String, ApiKey)> {
        self.state().submitted_api_keys.clone()
    }

    /// Names of the backend calls made so far, e.g. `"get_space:space1"`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }
}

impl Backend for MockBackend {
    fn upsert_space(&self, space: &Space) -> Result<Space> {
        let mut state = self.state();
        state.begin(format!("upsert_space:{}", space.sys.id))?;
        state.submitted_spaces.push(space.clone());

        if space.sys.is_new() {
            let id = state.next_id("space");
            let locale = if space.default_locale.is_empty() {
                DEFAULT_LOCALE.to_string()
            } else {
                space.default_locale.clone()
            };
            let created = Space {
                sys: Sys {
                    id: id.clone(),
                    kind: "Space".to_string(),
                    version: 1,
                    ..Sys::default()
                },
                name: space.name.clone(),
                default_locale: locale,
            };
            state.spaces.insert(id, created.clone());
            return Ok(created);
        }

        let existing = state
            .spaces
            .get_mut(&space.sys.id)
            .ok_or_else(|| Error::not_found(format!("space {}", space.sys.id)))?;
        if existing.sys.version != space.sys.version {
            return Err(Error::VersionMismatch {
                message: format!(
                    "space {} is at version {}, got {}",
                    space.sys.id, existing.sys.version, space.sys.version
                ),
                request_id: None,
            });
        }
        existing.name = space.name.clone();
        existing.sys.version += 1;
        Ok(existing.clone())
    }

    fn get_space(&self, id: &str) -> Result<Space> {
        let mut state = self.state();
        state.begin(format!("get_space:{id}"))?;
        state
            .spaces
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("space {id}")))
    }

    fn delete_space(&self, space: &Space) -> Result<()> {
        let mut state = self.state();
        state.begin(format!("delete_space:{}", space.sys.id))?;
        if state.spaces.remove(&space.sys.id).is_none() {
            return Err(Error::not_found(format!("space {}", space.sys.id)));
        }
        let id = space.sys.id.clone();
        state.api_keys.retain(|(space_id, _), _| *space_id != id);
        Ok(())
    }

    fn upsert_api_key(&self, space_id: &str, api_key: &ApiKey) -> Result<ApiKey> {
        let mut state = self.state();
        state.begin(format!("upsert_api_key:{space_id}/{}", api_key.sys.id))?;
        state
            .submitted_api_keys
            .push((space_id.to_string(), api_key.clone()));

        if !state.spaces.contains_key(space_id) {
            return Err(Error::not_found(format!("space {space_id}")));
        }

        if api_key.sys.is_new() {
            let id = state.next_id("key");
            let created = ApiKey {
                sys: Sys {
                    id: id.clone(),
                    kind: "ApiKey".to_string(),
                    version: 1,
                    space: Some(Link::space(space_id)),
                    ..Sys::default()
                },
                name: api_key.name.clone(),
                description: api_key.description.clone(),
                access_token: format!("token-{id}"),
            };
            state
                .api_keys
                .insert((space_id.to_string(), id), created.clone());
            return Ok(created);
        }

        let key = (space_id.to_string(), api_key.sys.id.clone());
        let existing = state
            .api_keys
            .get_mut(&key)
            .ok_or_else(|| Error::not_found(format!("api key {space_id}/{}", api_key.sys.id)))?;
        if existing.sys.version != api_key.sys.version {
            return Err(Error::VersionMismatch {
                message: format!(
                    "api key {} is at version {}, got {}",
                    api_key.sys.id, existing.sys.version, api_key.sys.version
                ),
                request_id: None,
            });
        }
        existing.name = api_key.name.clone();
        existing.description = api_key.description.clone();
        existing.sys.version += 1;
        Ok(existing.clone())
    }

    fn get_api_key(&self, space_id: &str, id: &str) -> Result<ApiKey> {
        let mut state = self.state();
        state.begin(format!("get_api_key:{space_id}/{id}"))?;
        state
            .api_keys
            .get(&(space_id.to_string(), id.to_string()))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("api key {space_id}/{id}")))
    }

    fn delete_api_key(&self, space_id: &str, api_key: &ApiKey) -> Result<()> {
        let mut state = self.state();
        state.begin(format!("delete_api_key:{space_id}/{}", api_key.sys.id))?;
        state
            .api_keys
            .remove(&(space_id.to_string(), api_key.sys.id.clone()))
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("api key {space_id}/{}", api_key.sys.id)))
    }
}

//! # contentful
//!
//! Blocking client for the parts of the Contentful Management API that
//! `cfprov` manages: spaces and their delivery API keys.
//!
//! ## Example
//!
//! ```no_run
//! use contentful::{Backend, HttpBackend, HttpConfig, RetryConfig, RetryingBackend, Space};
//!
//! let http = HttpBackend::new(HttpConfig::new("CFPAT-...")).expect("token");
//! let backend = RetryingBackend::new(http, RetryConfig::default());
//!
//! let space = backend.upsert_space(&Space::new("Docs", "en")).unwrap();
//! println!("created {} (version {})", space.sys.id, space.sys.version);
//! ```
//!
//! ## Entities
//!
//! | Entity | Create            | Read / Update / Delete              |
//! |--------|-------------------|-------------------------------------|
//! | Space  | `POST /spaces`    | `/spaces/{id}`                      |
//! | ApiKey | `POST /spaces/{space}/api_keys` | `/spaces/{space}/api_keys/{id}` |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod retry;
pub mod types;

pub use backend::http::{DEFAULT_BASE_URL, HttpBackend, HttpConfig};
pub use backend::{Backend, MockBackend};
pub use error::{Error, ErrorCategory, Result};
pub use retry::{RetryConfig, RetryingBackend, with_retry, with_retry_if};
pub use types::{ApiKey, DEFAULT_LOCALE, Link, LinkSys, Space, Sys};

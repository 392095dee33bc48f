//! Error types for Contentful Management API operations.
//!
//! Errors are categorized so callers can tell a missing entity apart from a
//! transport failure, and so the retry layer knows what is worth retrying.

use std::fmt;

/// Result type alias for Contentful operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related or server-side errors (transient, retryable).
    Network,
    /// Entity does not exist.
    NotFound,
    /// Optimistic-concurrency conflict.
    Conflict,
    /// Missing or invalid credentials.
    Auth,
    /// The API rejected the payload.
    Validation,
    /// Too many requests.
    RateLimit,
    /// Response could not be decoded.
    Format,
    /// Client configuration problem.
    Config,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::RateLimit)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network or server issue",
            Self::NotFound => "Entity not found",
            Self::Conflict => "Version conflict",
            Self::Auth => "Access denied",
            Self::Validation => "Invalid request",
            Self::RateLimit => "Rate limit exceeded",
            Self::Format => "Invalid response format",
            Self::Config => "Client misconfigured",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and try again",
            Self::NotFound => "The entity may have been deleted outside of cfprov; run a refresh",
            Self::Conflict => "The entity changed remotely; refresh and apply again",
            Self::Auth => "Check CONTENTFUL_MANAGEMENT_TOKEN and the token's permissions",
            Self::Validation => "Check the values in your manifest",
            Self::RateLimit => "Wait a moment before retrying, or lower the request rate",
            Self::Format => "The API returned an unexpected payload, try again",
            Self::Config => "Check the [provider] section of your manifest",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors returned by a [`crate::Backend`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The requested entity does not exist.
    #[error("not found: {message}")]
    NotFound {
        /// Error message from the API.
        message: String,
        /// Request id for support, when the API returned one.
        request_id: Option<String>,
    },

    /// The submitted version is stale.
    #[error("version mismatch: {message}")]
    VersionMismatch {
        /// Error message from the API.
        message: String,
        /// Request id for support.
        request_id: Option<String>,
    },

    /// Credentials were rejected.
    #[error("access denied (HTTP {status}): {message}")]
    AccessDenied {
        /// HTTP status code (401 or 403).
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// The payload failed validation.
    #[error("validation failed: {message}")]
    Validation {
        /// Error message from the API.
        message: String,
    },

    /// Too many requests.
    #[error("rate limited (reset in {reset_secs:?}s)")]
    RateLimited {
        /// Seconds until the rate limit resets, from `X-Contentful-RateLimit-Reset`.
        reset_secs: Option<u64>,
    },

    /// Any other non-success API response.
    #[error("API error {status} ({error_id}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Contentful error id (e.g. "ServerError").
        error_id: String,
        /// Error message from the API.
        message: String,
    },

    /// HTTP transport failed.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Client configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an HTTP transport error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Create a not-found error without a request id.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            request_id: None,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::VersionMismatch { .. } => ErrorCategory::Conflict,
            Error::AccessDenied { .. } => ErrorCategory::Auth,
            Error::Validation { .. } => ErrorCategory::Validation,
            Error::RateLimited { .. } => ErrorCategory::RateLimit,
            Error::Api { status, .. } => {
                if *status >= 500 {
                    ErrorCategory::Network
                } else {
                    ErrorCategory::Other
                }
            }
            Error::Http { .. } => ErrorCategory::Network,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Config(_) => ErrorCategory::Config,
            Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether the remote reported the entity as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

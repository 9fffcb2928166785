//! Huginn error types

use std::time::Duration;

/// Failure of a single tag lookup.
///
/// Cloneable so that every caller coalesced onto one in-flight lookup
/// receives the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Network failure, timeout or server-side (5xx) error.
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Whether retrying the same lookup may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transient(_))
    }

    /// Server-provided back-off hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// A record could not receive its metadata field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectionError {
    /// An existing value on the insertion path is not an object.
    #[error("insertion path segment '{segment}' holds a {found}, not an object")]
    PathConflict { segment: String, found: &'static str },
}

/// Huginn error types
#[derive(Debug, thiserror::Error)]
pub enum HuginnError {
    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Lookup errors
    #[error("tag fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("injection failed: {0}")]
    Injection(#[from] InjectionError),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;

//! Error types for hubview.
//!
//! Two layers:
//! - [`NetworkError`] is the taxonomy every network call is reclassified into.
//!   Controllers only ever see (and publish) these.
//! - [`HubViewError`] covers everything else the crate can fail at: the cache
//!   database, file system access and configuration.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Underlying cause carried by a [`NetworkError`].
///
/// Shared so that errors can be cloned into published controller state.
pub type ErrorCause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a network operation, after transport/decoder errors have been
/// reclassified.
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("The requested URL is invalid: {0}")]
    InvalidUrl(String),

    #[error("Max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },

    #[error("Network request failed: {0}")]
    NetworkFailure(#[source] ErrorCause),

    #[error("Failed to decode data: {0}")]
    DecodingFailure(#[source] ErrorCause),

    #[error("An unknown error occurred: {0}")]
    Unknown(String),
}

/// Discriminant of a [`NetworkError`], for matching without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkErrorKind {
    InvalidUrl,
    MaxRetriesExceeded,
    NetworkFailure,
    DecodingFailure,
    Unknown,
}

/// Non-success HTTP status returned by the API.
#[derive(Debug, Clone, Error)]
#[error("HTTP {status} from {url}")]
pub struct HttpStatusError {
    pub status: u16,
    pub url: String,
}

impl NetworkError {
    /// Wrap any error as a network failure.
    pub fn network_failure<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        NetworkError::NetworkFailure(Arc::new(err))
    }

    /// Wrap any error as a decoding failure.
    pub fn decoding_failure<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        NetworkError::DecodingFailure(Arc::new(err))
    }

    pub fn kind(&self) -> NetworkErrorKind {
        match self {
            NetworkError::InvalidUrl(_) => NetworkErrorKind::InvalidUrl,
            NetworkError::MaxRetriesExceeded { .. } => NetworkErrorKind::MaxRetriesExceeded,
            NetworkError::NetworkFailure(_) => NetworkErrorKind::NetworkFailure,
            NetworkError::DecodingFailure(_) => NetworkErrorKind::DecodingFailure,
            NetworkError::Unknown(_) => NetworkErrorKind::Unknown,
        }
    }

    /// Stable identifier, used in analytics payloads.
    pub fn id(&self) -> &'static str {
        match self {
            NetworkError::InvalidUrl(_) => "invalid_url",
            NetworkError::MaxRetriesExceeded { .. } => "max_retries_exceeded",
            NetworkError::NetworkFailure(_) => "network_failure",
            NetworkError::DecodingFailure(_) => "decoding_failure",
            NetworkError::Unknown(_) => "unknown_error",
        }
    }

    /// Check if this error should trigger a retry.
    ///
    /// Only transport failures and invalid URLs are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NetworkError::NetworkFailure(_) | NetworkError::InvalidUrl(_)
        )
    }

    /// The wrapped cause, if this error carries one.
    pub fn cause(&self) -> Option<&ErrorCause> {
        match self {
            NetworkError::NetworkFailure(cause) | NetworkError::DecodingFailure(cause) => {
                Some(cause)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            NetworkError::InvalidUrl(err.to_string())
        } else if err.is_decode() {
            NetworkError::decoding_failure(err)
        } else {
            NetworkError::network_failure(err)
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        NetworkError::decoding_failure(err)
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        NetworkError::InvalidUrl(err.to_string())
    }
}

/// Result type alias for network operations.
pub type NetworkResult<T> = std::result::Result<T, NetworkError>;

/// Main error type for the hubview library.
#[derive(Debug, Error)]
pub enum HubViewError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for hubview operations.
pub type Result<T> = std::result::Result<T, HubViewError>;

impl From<std::io::Error> for HubViewError {
    fn from(err: std::io::Error) -> Self {
        HubViewError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for HubViewError {
    fn from(err: serde_json::Error) -> Self {
        HubViewError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for HubViewError {
    fn from(err: rusqlite::Error) -> Self {
        HubViewError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

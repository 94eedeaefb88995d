//! Typed errors for the job-watch pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Each collaborator of a
//! run has its own error type so the coordinator can tag the outcome with the
//! stage that failed.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while obtaining the current snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Server answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },

    /// The configured listing URL cannot be parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// The page was fetched but its content could not be understood
    #[error("unparseable listing page: {reason}")]
    Parse { reason: String },
}

/// Errors produced while delivering the new-jobs message.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport-level failure talking to the relay endpoint
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Relay endpoint refused the message
    #[error("delivery rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Could not connect to or secure a session with the mail server
    #[error("SMTP connection to {server} failed: {source}")]
    Connect {
        server: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Mail server refused the login
    #[error("SMTP login rejected ({code}): {source}")]
    Auth {
        code: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Mail server refused the message after login
    #[error("SMTP server refused message ({code}): {source}")]
    Refused {
        code: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Message could not be built (bad address, invalid headers)
    #[error("failed to render message: {0}")]
    Render(String),

    /// Writing the message to a local stream failed
    #[error("failed to write message: {0}")]
    Output(#[source] std::io::Error),
}

/// Errors produced by the snapshot store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading, writing or renaming the state file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file exists but is not a valid snapshot
    #[error("corrupt snapshot in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot could not be serialized
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    /// Backend-specific failure (non-file stores)
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for notify operations.
pub type NotifyResult<T> = std::result::Result<T, NotifyError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

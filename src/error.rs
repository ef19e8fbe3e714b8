//! Common error types used throughout remuxd.
//!
//! One enum covers the failure classes the pipeline distinguishes: remote
//! host API refusals, transport failures, external tool failures, ledger
//! write failures, and missing content.

use std::time::Duration;

/// Common error type for remuxd.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote file-hosting API reported a non-ok status.
    #[error("remote host error: {0}")]
    RemoteHost(String),

    /// A network call failed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A streaming transfer exceeded its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    /// An external tool exited non-zero, could not be spawned, or was
    /// force-killed at its deadline.
    #[error("{tool} failed: {message}")]
    Process { tool: String, message: String },

    /// A ledger operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// No usable content was found.
    #[error("not found: {0}")]
    NotFound(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new RemoteHost error.
    pub fn remote_host<S: Into<String>>(msg: S) -> Self {
        Self::RemoteHost(msg.into())
    }

    /// Create a new Timeout error.
    pub fn timeout<S: Into<String>>(operation: S, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after,
        }
    }

    /// Create a new Process error.
    pub fn process<S: Into<String>, M: Into<String>>(tool: S, message: M) -> Self {
        Self::Process {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

//! Sync engine error types.

use tasksync_providers::ProviderError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while synchronizing.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The source rejected the credential, or its expiry hint has passed.
    #[error("Source credential expired")]
    CredentialExpired,

    /// The token endpoint refused to issue a new credential.
    #[error("Credential refresh denied: {message}")]
    RefreshDenied { message: String },

    /// Reading the source or the mirror failed for a non-auth reason.
    #[error("Transient fetch failure: {0}")]
    TransientFetch(#[source] ProviderError),

    /// Creating one mirror item failed.
    #[error("Failed to mirror task {task_id}: {source}")]
    RemoteWrite {
        task_id: String,
        #[source]
        source: ProviderError,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl SyncError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a refresh denied error.
    pub fn refresh_denied(message: impl Into<String>) -> Self {
        Self::RefreshDenied {
            message: message.into(),
        }
    }

    /// Creates a remote write error for `task_id`.
    pub fn remote_write(task_id: impl Into<String>, source: ProviderError) -> Self {
        Self::RemoteWrite {
            task_id: task_id.into(),
            source,
        }
    }

    /// Returns true if polling cannot continue without a new credential or
    /// a configuration change.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RefreshDenied { .. } | Self::Config { .. })
    }
}

//! Client error types.

use std::fmt;

use tasksync_providers::ProviderError;
use tasksync_server::SyncError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the `tasksync` binary.
#[derive(Debug)]
pub enum ClientError {
    /// Missing or invalid configuration.
    Config(String),
    /// An adapter could not be built.
    Provider(ProviderError),
    /// A sync operation failed.
    Sync(SyncError),
    /// The sync loop stopped polling on its own.
    Suspended(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(err) => write!(f, "provider error: {}", err),
            Self::Sync(err) => write!(f, "sync failed: {}", err),
            Self::Suspended(msg) => write!(f, "polling suspended: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::Sync(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<SyncError> for ClientError {
    fn from(err: SyncError) -> Self {
        Self::Sync(err)
    }
}

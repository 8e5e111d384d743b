//! Credential renewal.

use std::sync::Arc;

use tasksync_providers::{Credential, CredentialRefresher};
use tracing::{info, warn};

use crate::error::{SyncError, SyncResult};

/// Obtains a replacement credential when the source reports expiry.
///
/// Denials are final; anything retryable is reported as
/// [`SyncError::TransientFetch`] so the caller can try again later.
#[derive(Clone)]
pub struct CredentialSupervisor {
    refresher: Arc<dyn CredentialRefresher>,
}

impl CredentialSupervisor {
    /// Creates a supervisor around `refresher`.
    pub fn new(refresher: Arc<dyn CredentialRefresher>) -> Self {
        Self { refresher }
    }

    /// Exchanges the refresh token of `credential` for a new credential.
    pub async fn refresh(&self, credential: &Credential) -> SyncResult<Credential> {
        let Some(refresh_token) = credential.refresh_token.as_deref().filter(|t| !t.is_empty())
        else {
            warn!("credential expired and no refresh token is available");
            return Err(SyncError::refresh_denied("no refresh token available"));
        };

        match self.refresher.refresh(refresh_token).await {
            Ok(mut refreshed) => {
                if refreshed.refresh_token.is_none() {
                    refreshed.refresh_token = Some(refresh_token.to_string());
                }
                info!(
                    refresher = self.refresher.name(),
                    expires_at = ?refreshed.expires_at,
                    "Credential refreshed"
                );
                Ok(refreshed)
            }
            Err(e) if e.is_retryable() => {
                warn!(refresher = self.refresher.name(), error = %e, "Credential refresh failed, will retry");
                Err(SyncError::TransientFetch(e))
            }
            Err(e) => {
                warn!(refresher = self.refresher.name(), error = %e, "Credential refresh denied");
                Err(SyncError::refresh_denied(e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for CredentialSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSupervisor")
            .field("refresher", &self.refresher.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasksync_providers::memory::{InMemoryRefresher, RefreshResponse};

    fn supervisor() -> (CredentialSupervisor, Arc<InMemoryRefresher>) {
        let refresher = Arc::new(InMemoryRefresher::new());
        (CredentialSupervisor::new(refresher.clone()), refresher)
    }

    #[tokio::test]
    async fn refresh_without_token_is_denied_locally() {
        let (supervisor, refresher) = supervisor();

        let err = supervisor.refresh(&Credential::new("stale")).await.unwrap_err();

        assert!(matches!(err, SyncError::RefreshDenied { .. }));
        assert_eq!(refresher.calls(), 0);
    }

    #[tokio::test]
    async fn refresh_keeps_refresh_token() {
        let (supervisor, refresher) = supervisor();
        let credential = Credential::new("stale").with_refresh_token("r-1");

        let refreshed = supervisor.refresh(&credential).await.unwrap();

        assert_eq!(refreshed.access_token, "refreshed-1");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("r-1"));
        assert!(refreshed.expires_at.is_some());
        assert_eq!(refresher.calls(), 1);
    }

    #[tokio::test]
    async fn denial_and_outage_are_distinguished() {
        let (supervisor, refresher) = supervisor();
        refresher.push_response(RefreshResponse::Unavailable);
        refresher.push_response(RefreshResponse::Deny);
        let credential = Credential::new("stale").with_refresh_token("r-1");

        let first = supervisor.refresh(&credential).await.unwrap_err();
        assert!(matches!(first, SyncError::TransientFetch(_)));

        let second = supervisor.refresh(&credential).await.unwrap_err();
        assert!(second.is_fatal());
    }
}

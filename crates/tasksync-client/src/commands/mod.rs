//! Subcommand implementations.

pub mod config;
pub mod once;
pub mod run;

use std::sync::Arc;

use tasksync_providers::Credential;
use tasksync_providers::google::{GoogleTasksSource, OAuthClient};
use tasksync_providers::notion::NotionMirror;
use tasksync_server::{CredentialSupervisor, SyncSession};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Builds a session wired to Google Tasks and Notion, plus the credential
/// to start it with.
pub(crate) fn build_session(config: &ClientConfig) -> ClientResult<(SyncSession, Credential)> {
    let google = config.google().map_err(ClientError::Config)?;
    let notion = config.notion().map_err(ClientError::Config)?;
    config.sync.validate().map_err(ClientError::Config)?;

    let google_config = google.to_provider_config().map_err(ClientError::Config)?;
    let notion_config = notion.to_provider_config().map_err(ClientError::Config)?;
    let credential = google.credential().map_err(ClientError::Config)?;

    debug!(
        tasklist = %google_config.tasklist_id,
        database = %notion_config.database_id,
        "Building sync session"
    );

    let refresher = OAuthClient::new(&google_config)?;
    let source = GoogleTasksSource::new(google_config)?;
    let mirror = NotionMirror::new(notion_config)?;

    let session = SyncSession::new(
        Arc::new(source),
        Arc::new(mirror),
        CredentialSupervisor::new(Arc::new(refresher)),
        config.sync.reconciler_config(),
    )
    .with_credential(credential.clone());

    Ok((session, credential))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[google]
client_id = "id.apps.googleusercontent.com"
client_secret = "secret"
refresh_token = "1//refresh"

[notion]
token = "secret_abc"
database_id = "db-123"
"#;

    #[test]
    fn builds_session_with_refresh_only_credential() {
        let config: ClientConfig = toml::from_str(CONFIG).unwrap();

        let (session, credential) = build_session(&config).unwrap();

        assert!(credential.is_expired());
        assert_eq!(session.credential(), Some(&credential));
    }

    #[test]
    fn missing_notion_section_is_a_config_error() {
        let mut config: ClientConfig = toml::from_str(CONFIG).unwrap();
        config.notion = None;

        let err = build_session(&config).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config: ClientConfig = toml::from_str(CONFIG).unwrap();
        config.sync.poll_interval_secs = 0;

        assert!(build_session(&config).is_err());
    }

    #[test]
    fn zero_interval_override_is_rejected() {
        let config: ClientConfig = toml::from_str(CONFIG).unwrap();
        assert!(build_session(&config).is_ok());

        let err = config.sync.poller_config(Some(0)).unwrap_err();
        assert!(err.contains("at least 1"));
        assert!(config.sync.poller_config(Some(1)).is_ok());
    }
}

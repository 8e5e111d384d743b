//! Client configuration.
//!
//! Everything lives in one `config.toml`, by default
//! `~/.config/tasksync/config.toml`:
//!
//! ```toml
//! [google]
//! client_id = "123.apps.googleusercontent.com"
//! client_secret = "pass::google/tasksync"
//! refresh_token = "env::TASKSYNC_REFRESH_TOKEN"
//!
//! [notion]
//! token = "env::NOTION_TOKEN"
//! database_id = "0123456789abcdef"
//!
//! [sync]
//! poll_interval_secs = 10
//! deletion_policy = "recreate"
//! ```
//!
//! Credential values accept the references described in [`crate::secret`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasksync_core::{MirrorDeletionPolicy, ReconcilerConfig};
use tasksync_providers::Credential;
use tasksync_providers::google::{GoogleConfig, OAuthCredentials};
use tasksync_providers::notion::{NotionConfig, PropertyNames};
use tasksync_server::PollerConfig;

use crate::secret;

/// Configuration for the `tasksync` binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug logging.
    pub debug: bool,

    /// Google Tasks settings.
    pub google: Option<GoogleSettings>,

    /// Notion settings.
    pub notion: Option<NotionSettings>,

    /// Polling and reconciliation settings.
    pub sync: SyncSettings,
}

impl ClientConfig {
    /// Loads the default file, or the defaults when it does not exist.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from `path`.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tasksync")
    }

    /// Returns the `[google]` section or a hint on how to add it.
    pub fn google(&self) -> Result<&GoogleSettings, String> {
        self.google.as_ref().ok_or_else(|| {
            format!(
                "missing [google] section in {}:\n  \
                 [google]\n  \
                 client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                 client_secret = \"YOUR_SECRET\"\n  \
                 refresh_token = \"YOUR_REFRESH_TOKEN\"",
                Self::default_path().display()
            )
        })
    }

    /// Returns the `[notion]` section or a hint on how to add it.
    pub fn notion(&self) -> Result<&NotionSettings, String> {
        self.notion.as_ref().ok_or_else(|| {
            format!(
                "missing [notion] section in {}:\n  \
                 [notion]\n  \
                 token = \"secret_...\"\n  \
                 database_id = \"YOUR_DATABASE_ID\"",
                Self::default_path().display()
            )
        })
    }
}

/// Google Tasks settings.
///
/// `client_id`, `client_secret`, `access_token` and `refresh_token` accept
/// secret references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client ID.
    pub client_id: Option<String>,

    /// OAuth client secret.
    pub client_secret: Option<String>,

    /// Client secret JSON downloaded from the Cloud console, used when
    /// `client_id` is not set.
    pub credentials_file: Option<PathBuf>,

    /// Current access token, if one is at hand.
    pub access_token: Option<String>,

    /// Refresh token used to obtain access tokens.
    pub refresh_token: Option<String>,

    /// Task list to mirror.
    pub tasklist_id: String,

    /// Include completed tasks.
    pub show_completed: bool,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            credentials_file: None,
            access_token: None,
            refresh_token: None,
            tasklist_id: GoogleConfig::DEFAULT_TASKLIST.to_string(),
            show_completed: true,
            timeout_secs: GoogleConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GoogleSettings {
    /// Builds the provider configuration, resolving secret references.
    pub fn to_provider_config(&self) -> Result<GoogleConfig, String> {
        let credentials = self.resolve_credentials()?;
        credentials.validate().map_err(|e| e.to_string())?;

        let config = GoogleConfig::new(credentials)
            .map_err(|e| e.to_string())?
            .with_tasklist(&self.tasklist_id)
            .with_show_completed(self.show_completed)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        config.validate()?;
        Ok(config)
    }

    /// Resolves the OAuth client from inline fields or `credentials_file`.
    pub(crate) fn resolve_credentials(&self) -> Result<OAuthCredentials, String> {
        let Some(raw_id) = self.client_id.as_deref() else {
            return match &self.credentials_file {
                Some(path) => OAuthCredentials::from_file(path),
                None => Err("Google client_id (or credentials_file) is not set".to_string()),
            };
        };

        let raw_secret = self
            .client_secret
            .as_deref()
            .ok_or_else(|| "client_secret is missing from the [google] section".to_string())?;

        let client_id =
            secret::resolve(raw_id).map_err(|e| format!("failed to resolve client_id: {}", e))?;
        let client_secret = secret::resolve(raw_secret)
            .map_err(|e| format!("failed to resolve client_secret: {}", e))?;

        Ok(OAuthCredentials::new(client_id, client_secret))
    }

    /// Builds the starting credential.
    ///
    /// With only a refresh token the credential is born expired, so the
    /// first cycle refreshes it before calling the API.
    pub fn credential(&self) -> Result<Credential, String> {
        let access = secret::resolve_optional(self.access_token.as_deref())
            .map_err(|e| format!("failed to resolve access_token: {}", e))?
            .filter(|token| !token.is_empty());
        let refresh = secret::resolve_optional(self.refresh_token.as_deref())
            .map_err(|e| format!("failed to resolve refresh_token: {}", e))?
            .filter(|token| !token.is_empty());

        let credential = match (access, refresh) {
            (Some(access), refresh) => {
                let credential = Credential::new(access);
                match refresh {
                    Some(refresh) => credential.with_refresh_token(refresh),
                    None => credential,
                }
            }
            (None, Some(refresh)) => Credential::new("")
                .with_refresh_token(refresh)
                .with_expires_at(DateTime::<Utc>::MIN_UTC),
            (None, None) => {
                return Err(
                    "set access_token or refresh_token in the [google] section".to_string(),
                );
            }
        };
        Ok(credential)
    }
}

/// Notion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionSettings {
    /// Integration token; accepts secret references.
    pub token: Option<String>,

    /// Database holding the mirrored pages.
    pub database_id: Option<String>,

    /// Rich-text property with the Google task id.
    pub task_id_property: String,

    /// Title property.
    pub title_property: String,

    /// Date property with the task's update time.
    pub created_at_property: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NotionSettings {
    fn default() -> Self {
        let names = PropertyNames::default();
        Self {
            token: None,
            database_id: None,
            task_id_property: names.task_id,
            title_property: names.title,
            created_at_property: names.created_at,
            timeout_secs: NotionConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl NotionSettings {
    /// Builds the provider configuration, resolving the token reference.
    pub fn to_provider_config(&self) -> Result<NotionConfig, String> {
        let raw_token = self
            .token
            .as_deref()
            .ok_or_else(|| "token is missing from the [notion] section".to_string())?;
        let token =
            secret::resolve(raw_token).map_err(|e| format!("failed to resolve token: {}", e))?;
        let database_id = self
            .database_id
            .as_deref()
            .ok_or_else(|| "database_id is missing from the [notion] section".to_string())?;

        let config = NotionConfig::new(token, database_id)
            .map_err(|e| e.to_string())?
            .with_properties(PropertyNames {
                task_id: self.task_id_property.clone(),
                title: self.title_property.clone(),
                created_at: self.created_at_property.clone(),
            })
            .with_timeout(Duration::from_secs(self.timeout_secs));
        config.validate()?;
        Ok(config)
    }
}

/// Polling and reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Seconds between cycles.
    pub poll_interval_secs: u64,

    /// What to do when a mirrored page is deleted by hand.
    pub deletion_policy: MirrorDeletionPolicy,

    /// Mirror queries a created page may be missing from before it is
    /// created again; at least 1, as Notion queries lag behind writes.
    pub confirm_grace: u32,

    /// Consecutive failed cycles before polling suspends; 0 never suspends.
    pub max_consecutive_failures: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            deletion_policy: MirrorDeletionPolicy::default(),
            confirm_grace: ReconcilerConfig::default().confirm_grace,
            max_consecutive_failures: 0,
        }
    }
}

impl SyncSettings {
    /// Builds the poller configuration; `interval` overrides the file.
    pub fn poller_config(&self, interval: Option<u64>) -> Result<PollerConfig, String> {
        let secs = interval.unwrap_or(self.poll_interval_secs);
        if secs == 0 {
            return Err("poll interval must be at least 1 second".to_string());
        }
        Ok(PollerConfig::new(Duration::from_secs(secs))
            .with_max_consecutive_failures(self.max_consecutive_failures))
    }

    /// Builds the reconciler configuration.
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig::default()
            .with_deletion_policy(self.deletion_policy)
            .with_confirm_grace(self.confirm_grace)
    }

    /// Validates the settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_secs == 0 {
            return Err("poll_interval_secs must be at least 1".to_string());
        }
        if self.confirm_grace == 0 {
            return Err("confirm_grace must be at least 1".to_string());
        }
        Ok(())
    }
}

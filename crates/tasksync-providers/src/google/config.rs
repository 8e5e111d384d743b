//! Google Tasks provider configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{ProviderResult, parse_url};

/// OAuth 2.0 client credentials, needed to exchange refresh tokens.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret from Google Cloud Console.
    pub client_secret: String,
}

/// Structure of Google's OAuth credentials JSON file.
///
/// Accepts the Cloud Console download (`installed` or `web` section) and the
/// flat `{client_id, client_secret}` form.
#[derive(Debug, Deserialize)]
struct GoogleCredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads OAuth credentials from a Google Cloud Console JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("failed to read credentials file: {}", e))?;
        Self::from_json(&content)
    }

    /// Parses OAuth credentials from a Google credentials JSON string.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: GoogleCredentialsFile = serde_json::from_str(json)
            .map_err(|e| format!("failed to parse credentials JSON: {}", e))?;

        if let Some(creds) = file.installed.or(file.web) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        match (file.client_id, file.client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(Self::new(client_id, client_secret)),
            _ => Err("credentials file must contain an 'installed'/'web' section or \
                      'client_id'/'client_secret' at root level"
                .to_string()),
        }
    }

    /// Checks that the credentials look like Google OAuth client credentials.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Configuration for the Google Tasks source and token refresh.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth client credentials for the refresh exchange.
    pub credentials: OAuthCredentials,

    /// Task list to read. `@default` is the user's default list.
    pub tasklist_id: String,

    /// Whether completed tasks are part of the source snapshot.
    pub show_completed: bool,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,

    /// Base URL of the Tasks API.
    pub api_base: Url,

    /// OAuth token endpoint.
    pub token_url: Url,
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// The user's default task list.
    pub const DEFAULT_TASKLIST: &'static str = "@default";

    /// Scope the access token must carry.
    pub const SCOPE: &'static str = "https://www.googleapis.com/auth/tasks";

    const API_BASE: &'static str = "https://tasks.googleapis.com/";
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Creates a new Google configuration with the given credentials.
    pub fn new(credentials: OAuthCredentials) -> ProviderResult<Self> {
        Ok(Self {
            credentials,
            tasklist_id: Self::DEFAULT_TASKLIST.to_string(),
            show_completed: true,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("tasksync/{}", env!("CARGO_PKG_VERSION")),
            api_base: parse_url(Self::API_BASE)?,
            token_url: parse_url(Self::TOKEN_URL)?,
        })
    }

    /// Sets the task list.
    pub fn with_tasklist(mut self, tasklist_id: impl Into<String>) -> Self {
        self.tasklist_id = tasklist_id.into();
        self
    }

    /// Sets whether completed tasks are listed.
    pub fn with_show_completed(mut self, show: bool) -> Self {
        self.show_completed = show;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Points the API at another base URL (proxies, test servers).
    pub fn with_api_base(mut self, base: Url) -> Self {
        self.api_base = base;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.credentials.validate().map_err(str::to_string)?;
        if self.tasklist_id.trim().is_empty() {
            return Err("tasklist_id must not be empty".to_string());
        }
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> OAuthCredentials {
        OAuthCredentials::new("test.apps.googleusercontent.com", "secret")
    }

    #[test]
    fn credentials_from_installed_json() {
        let json = r#"{"installed": {"client_id": "x.apps.googleusercontent.com", "client_secret": "s", "project_id": "p"}}"#;
        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "x.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "s");
    }

    #[test]
    fn credentials_from_flat_json() {
        let json = r#"{"client_id": "y.apps.googleusercontent.com", "client_secret": "t"}"#;
        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "y.apps.googleusercontent.com");
    }

    #[test]
    fn credentials_json_without_ids_errors() {
        let err = OAuthCredentials::from_json(r#"{"client_id": "only"}"#).unwrap_err();
        assert!(err.contains("client_secret"));
    }

    #[test]
    fn credentials_validation() {
        assert!(credentials().validate().is_ok());
        assert!(OAuthCredentials::new("bad", "s").validate().is_err());
        assert!(OAuthCredentials::new("x.apps.googleusercontent.com", "").validate().is_err());
    }

    #[test]
    fn config_defaults() {
        let config = GoogleConfig::new(credentials()).unwrap();
        assert_eq!(config.tasklist_id, "@default");
        assert!(config.show_completed);
        assert_eq!(config.api_base.as_str(), "https://tasks.googleapis.com/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_blank_tasklist() {
        let config = GoogleConfig::new(credentials()).unwrap().with_tasklist("  ");
        assert!(config.validate().is_err());
    }
}

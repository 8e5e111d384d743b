//! Notion mirror configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ProviderResult, parse_url};

/// Names of the database properties holding each mirror field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNames {
    /// Rich-text property holding the source task id.
    pub task_id: String,
    /// Title property.
    pub title: String,
    /// Date property holding the task's last update time; the query sorts on it.
    pub created_at: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            task_id: "Task ID".to_string(),
            title: "Title".to_string(),
            created_at: "Created at".to_string(),
        }
    }
}

/// Configuration for the Notion mirror.
#[derive(Debug, Clone)]
pub struct NotionConfig {
    /// Integration token (`secret_...` or `ntn_...`).
    pub token: String,
    /// Database the pages live in.
    pub database_id: String,
    /// Property names in that database.
    pub properties: PropertyNames,
    /// Value of the `Notion-Version` header.
    pub notion_version: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for API requests.
    pub user_agent: String,
    /// Base URL of the Notion API.
    pub api_base: Url,
}

impl NotionConfig {
    /// API version the request and response shapes follow.
    pub const DEFAULT_VERSION: &'static str = "2022-06-28";

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    const API_BASE: &'static str = "https://api.notion.com/";

    /// Creates a configuration for `database_id` accessed with `token`.
    pub fn new(token: impl Into<String>, database_id: impl Into<String>) -> ProviderResult<Self> {
        Ok(Self {
            token: token.into(),
            database_id: database_id.into(),
            properties: PropertyNames::default(),
            notion_version: Self::DEFAULT_VERSION.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("tasksync/{}", env!("CARGO_PKG_VERSION")),
            api_base: parse_url(Self::API_BASE)?,
        })
    }

    /// Sets the property names.
    pub fn with_properties(mut self, properties: PropertyNames) -> Self {
        self.properties = properties;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Points the API at another base URL.
    pub fn with_api_base(mut self, base: Url) -> Self {
        self.api_base = base;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("notion token is required".to_string());
        }
        if self.database_id.trim().is_empty() {
            return Err("notion database_id is required".to_string());
        }
        let names = [
            &self.properties.task_id,
            &self.properties.title,
            &self.properties.created_at,
        ];
        if names.iter().any(|name| name.trim().is_empty()) {
            return Err("notion property names must not be empty".to_string());
        }
        if self.properties.task_id == self.properties.title
            || self.properties.task_id == self.properties.created_at
            || self.properties.title == self.properties.created_at
        {
            return Err("notion property names must be distinct".to_string());
        }
        Ok(())
    }
}

//! [`TaskSource`] implementation for Google Tasks.

use tasksync_core::TaskItem;
use tracing::debug;

use crate::credential::Credential;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, TaskSource};

use super::client::GoogleTasksClient;
use super::config::GoogleConfig;

/// Google Tasks source.
///
/// Stateless apart from the HTTP client: the credential arrives with every
/// call and renewal is left to the caller.
#[derive(Debug)]
pub struct GoogleTasksSource {
    config: GoogleConfig,
    client: GoogleTasksClient,
}

impl GoogleTasksSource {
    /// Creates a new source from the configuration.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;
        let client = GoogleTasksClient::new(config.api_base.clone(), config.timeout, &config.user_agent)?;
        Ok(Self { config, client })
    }

    /// Returns the configured task list.
    pub fn tasklist_id(&self) -> &str {
        &self.config.tasklist_id
    }
}

impl TaskSource for GoogleTasksSource {
    fn name(&self) -> &str {
        "google-tasks"
    }

    fn list_tasks<'a>(
        &'a self,
        credential: &'a Credential,
    ) -> BoxFuture<'a, ProviderResult<Vec<TaskItem>>> {
        Box::pin(async move {
            debug!(tasklist = %self.config.tasklist_id, "listing Google tasks");
            self.client
                .list_tasks(
                    &credential.access_token,
                    &self.config.tasklist_id,
                    self.config.show_completed,
                )
                .await
                .map_err(|e| e.with_provider(self.name()))
        })
    }
}

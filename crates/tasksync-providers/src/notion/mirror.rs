//! [`MirrorStore`] implementation backed by a Notion database.

use tasksync_core::{MirrorItem, TaskItem};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, MirrorStore};

use super::client::{NotionClient, create_page_body, pages_to_items};
use super::config::NotionConfig;

/// Notion database mirror.
///
/// One page per mirrored task; the task id lives in a rich-text property
/// and the database is listed in ascending created-at order.
#[derive(Debug)]
pub struct NotionMirror {
    config: NotionConfig,
    client: NotionClient,
}

impl NotionMirror {
    /// Creates a new mirror from the configuration.
    pub fn new(config: NotionConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;
        let client = NotionClient::new(&config)?;
        Ok(Self { config, client })
    }

    /// Returns the database id.
    pub fn database_id(&self) -> &str {
        &self.config.database_id
    }

    async fn list(&self) -> ProviderResult<Vec<MirrorItem>> {
        let pages = self
            .client
            .query_database(&self.config.database_id, &self.config.properties.created_at)
            .await?;
        Ok(pages_to_items(&pages, &self.config.properties))
    }

    async fn create(&self, task: &TaskItem) -> ProviderResult<MirrorItem> {
        let body = create_page_body(&self.config.database_id, &self.config.properties, task);
        let page = self.client.create_page(&body).await?;

        info!(task_id = %task.id, page_id = %page.id, "Created Notion page");

        // The response echoes the properties; fall back to the request data
        // if the integration cannot read them back.
        Ok(page
            .to_mirror_item(&self.config.properties)
            .unwrap_or_else(|| {
                debug!(page_id = %page.id, "created page lacks readable properties");
                MirrorItem::for_task(task)
            }))
    }
}

impl MirrorStore for NotionMirror {
    fn name(&self) -> &str {
        "notion"
    }

    fn list_mirrored(&self) -> BoxFuture<'_, ProviderResult<Vec<MirrorItem>>> {
        Box::pin(async move { self.list().await.map_err(|e| e.with_provider("notion")) })
    }

    fn create_mirrored<'a>(&'a self, task: &'a TaskItem) -> BoxFuture<'a, ProviderResult<MirrorItem>> {
        Box::pin(async move { self.create(task).await.map_err(|e| e.with_provider("notion")) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_rejects_missing_database() {
        let config = NotionConfig::new("secret_abc", "").unwrap();
        let err = NotionMirror::new(config).unwrap_err();
        assert_eq!(err.code(), crate::ProviderErrorCode::ConfigurationError);
    }

    #[test]
    fn mirror_from_valid_config() {
        let config = NotionConfig::new("secret_abc", "db-123").unwrap();
        let mirror = NotionMirror::new(config).unwrap();
        assert_eq!(mirror.database_id(), "db-123");
        assert_eq!(mirror.name(), "notion");
    }
}

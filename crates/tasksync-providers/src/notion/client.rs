//! Notion API client.
//!
//! Covers the two calls the mirror needs: querying a database and creating a
//! page in it.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tasksync_core::{MirrorItem, TaskItem};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ProviderError, ProviderResult};

use super::config::{NotionConfig, PropertyNames};

/// Page size requested from the API (its maximum).
const PAGE_SIZE: u32 = 100;

/// Longest text Notion accepts in a single rich-text object.
const MAX_TEXT_LEN: usize = 2000;

/// Notion API client.
#[derive(Debug)]
pub struct NotionClient {
    http_client: reqwest::Client,
    api_base: Url,
    token: String,
    notion_version: String,
}

impl NotionClient {
    /// Creates a new client.
    pub fn new(config: &NotionConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ProviderError::internal("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            http_client,
            api_base: config.api_base.clone(),
            token: config.token.clone(),
            notion_version: config.notion_version.clone(),
        })
    }

    /// Returns every page of `database_id`, sorted ascending on `sort_property`.
    pub async fn query_database(
        &self,
        database_id: &str,
        sort_property: &str,
    ) -> ProviderResult<Vec<NotionPage>> {
        let url = self.endpoint(&format!(
            "v1/databases/{}/query",
            urlencoding::encode(database_id)
        ))?;

        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let request = QueryRequest {
                sorts: vec![QuerySort {
                    property: sort_property,
                    direction: "ascending",
                }],
                page_size: PAGE_SIZE,
                start_cursor: cursor.as_deref(),
            };

            let body = self.post(&url, &request, "query database").await?;
            let response: QueryResponse = serde_json::from_str(&body).map_err(|e| {
                ProviderError::invalid_response(format!("failed to parse query response: {}", e))
            })?;

            pages.extend(response.results);

            match (response.has_more, response.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        debug!(count = pages.len(), database = %database_id, "Queried Notion database");
        Ok(pages)
    }

    /// Creates a page from a body built by [`create_page_body`].
    pub async fn create_page(&self, body: &Value) -> ProviderResult<NotionPage> {
        let url = self.endpoint("v1/pages")?;
        let response = self.post(&url, body, "create page").await?;
        serde_json::from_str(&response).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse created page: {}", e))
        })
    }

    fn endpoint(&self, path: &str) -> ProviderResult<Url> {
        self.api_base
            .join(path)
            .map_err(|e| ProviderError::configuration(format!("invalid Notion URL: {}", e)))
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: &Url,
        body: &B,
        context: &str,
    ) -> ProviderResult<String> {
        let response = self
            .http_client
            .post(url.clone())
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.notion_version)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::network(format!("{}: request timeout", context))
                } else {
                    ProviderError::network(format!("{}: request failed: {}", context, e))
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(ProviderError::rate_limited(format!(
                "{}: rate limit exceeded{}",
                context,
                retry_after
                    .map(|s| format!(", retry after {} seconds", s))
                    .unwrap_or_default()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| format!("{}: {}", e.code, e.message))
                .unwrap_or(body);
            return Err(ProviderError::from_status(status.as_u16(), context, &message));
        }

        Ok(body)
    }
}

/// A page as returned by the Notion API, reduced to what the mirror reads.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionPage {
    /// Notion page id.
    pub id: String,
    /// When the page itself was created.
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    properties: HashMap<String, PropertyValue>,
}

impl NotionPage {
    /// Reads the mirror fields of the page.
    ///
    /// Returns `None` when the task id property is missing or empty. A
    /// missing date falls back to the page's creation time.
    pub fn to_mirror_item(&self, names: &PropertyNames) -> Option<MirrorItem> {
        let task_id = self
            .properties
            .get(&names.task_id)
            .and_then(|p| p.rich_text.as_deref())
            .map(plain_text)
            .filter(|id| !id.is_empty())?;

        let title = self
            .properties
            .get(&names.title)
            .and_then(|p| p.title.as_deref())
            .map(plain_text)
            .unwrap_or_default();

        let created_at = self
            .properties
            .get(&names.created_at)
            .and_then(|p| p.date.as_ref())
            .and_then(|d| parse_date(&d.start))
            .or(self.created_time)
            .unwrap_or_default();

        Some(MirrorItem::new(task_id, title, created_at))
    }
}

/// Converts pages to mirror items, skipping pages without a task id.
pub fn pages_to_items(pages: &[NotionPage], names: &PropertyNames) -> Vec<MirrorItem> {
    pages
        .iter()
        .filter_map(|page| {
            let item = page.to_mirror_item(names);
            if item.is_none() {
                warn!(page_id = %page.id, property = %names.task_id, "skipping page without task id");
            }
            item
        })
        .collect()
}

/// Builds the `POST /v1/pages` body for `task`.
pub fn create_page_body(database_id: &str, names: &PropertyNames, task: &TaskItem) -> Value {
    let mut properties = Map::new();
    properties.insert(
        names.task_id.clone(),
        json!({ "rich_text": [{ "text": { "content": truncate(&task.id) } }] }),
    );
    properties.insert(
        names.title.clone(),
        json!({ "title": [{ "text": { "content": truncate(&task.title) } }] }),
    );
    properties.insert(
        names.created_at.clone(),
        json!({ "date": { "start": task.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true) } }),
    );

    json!({
        "parent": { "database_id": database_id },
        "properties": properties,
    })
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_TEXT_LEN) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn plain_text(parts: &[RichText]) -> String {
    parts.iter().map(|part| part.plain_text.as_str()).collect()
}

/// Parses a Notion date start, which is either RFC 3339 or a bare date.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    sorts: Vec<QuerySort<'a>>,
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct QuerySort<'a> {
    property: &'a str,
    direction: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<NotionPage>,
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

/// A property value; only the shapes the mirror reads are modelled.
#[derive(Debug, Clone, Default, Deserialize)]
struct PropertyValue {
    #[serde(default)]
    title: Option<Vec<RichText>>,
    #[serde(default)]
    rich_text: Option<Vec<RichText>>,
    #[serde(default)]
    date: Option<DateValue>,
}

#[derive(Debug, Clone, Deserialize)]
struct RichText {
    #[serde(default)]
    plain_text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DateValue {
    start: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    message: String,
}

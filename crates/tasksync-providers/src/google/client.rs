//! Google Tasks API client.
//!
//! Low-level HTTP access to `tasks.list`, with pagination and response
//! conversion to [`TaskItem`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tasksync_core::TaskItem;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Page size requested from the API (its maximum).
const PAGE_SIZE: u32 = 100;

/// Google Tasks API client.
#[derive(Debug)]
pub struct GoogleTasksClient {
    http_client: reqwest::Client,
    api_base: Url,
}

impl GoogleTasksClient {
    /// Creates a new client.
    pub fn new(api_base: Url, timeout: Duration, user_agent: &str) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProviderError::internal("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            http_client,
            api_base,
        })
    }

    /// Lists every task of `tasklist_id`, following `nextPageToken`.
    pub async fn list_tasks(
        &self,
        access_token: &str,
        tasklist_id: &str,
        show_completed: bool,
    ) -> ProviderResult<Vec<TaskItem>> {
        let url = tasks_url(&self.api_base, tasklist_id)?;
        let mut tasks = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_tasks_page(&url, access_token, show_completed, page_token.as_deref())
                .await?;

            tasks.extend(page.items.into_iter().filter_map(convert_task));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = tasks.len(), tasklist = %tasklist_id, "Fetched tasks");
        Ok(tasks)
    }

    async fn list_tasks_page(
        &self,
        url: &Url,
        access_token: &str,
        show_completed: bool,
        page_token: Option<&str>,
    ) -> ProviderResult<TaskListResponse> {
        let mut request = self
            .http_client
            .get(url.clone())
            .bearer_auth(access_token)
            .query(&[
                ("maxResults", PAGE_SIZE.to_string()),
                ("showCompleted", show_completed.to_string()),
                ("showHidden", show_completed.to_string()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::network("request timeout")
            } else if e.is_connect() {
                ProviderError::network(format!("connection failed: {}", e))
            } else {
                ProviderError::network(format!("request failed: {}", e))
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
                "rate limit exceeded{}",
                retry_after
                    .map(|s| format!(", retry after {} seconds", s))
                    .unwrap_or_default()
            )));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::authentication("access token expired or invalid"));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), "list tasks", &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse task list: {}", e))
        })
    }
}

/// Builds `{base}/tasks/v1/lists/{tasklist}/tasks`.
fn tasks_url(base: &Url, tasklist_id: &str) -> ProviderResult<Url> {
    let path = format!("tasks/v1/lists/{}/tasks", urlencoding::encode(tasklist_id));
    base.join(&path)
        .map_err(|e| ProviderError::configuration(format!("invalid task list URL: {}", e)))
}

/// Converts an API task, dropping deleted entries and entries that lack an
/// id or a parsable `updated` timestamp.
fn convert_task(task: ApiTask) -> Option<TaskItem> {
    if task.deleted.unwrap_or(false) {
        return None;
    }

    let Some(id) = task.id.filter(|id| !id.is_empty()) else {
        warn!("skipping task without id");
        return None;
    };

    let updated_at = match task.updated.as_deref().map(DateTime::parse_from_rfc3339) {
        Some(Ok(updated)) => updated.with_timezone(&Utc),
        Some(Err(e)) => {
            warn!(task_id = %id, error = %e, "skipping task with invalid updated time");
            return None;
        }
        None => {
            warn!(task_id = %id, "skipping task without updated time");
            return None;
        }
    };

    Some(TaskItem::new(id, task.title.unwrap_or_default(), updated_at))
}

/// Response from the tasks.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskListResponse {
    #[serde(default)]
    items: Vec<ApiTask>,
    next_page_token: Option<String>,
}

/// A single task from the Google Tasks API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTask {
    id: Option<String>,
    title: Option<String>,
    updated: Option<String>,
    deleted: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_task_list_response() {
        let json = r#"{
            "kind": "tasks#tasks",
            "etag": "\"abc\"",
            "nextPageToken": "page-2",
            "items": [
                {
                    "kind": "tasks#task",
                    "id": "task1",
                    "title": "Buy milk",
                    "updated": "2024-03-15T10:00:00.000Z",
                    "status": "needsAction"
                },
                {
                    "id": "task2",
                    "title": "Call mom",
                    "updated": "2024-03-16T08:30:00.000Z",
                    "status": "completed",
                    "completed": "2024-03-16T08:30:00.000Z"
                }
            ]
        }"#;

        let response: TaskListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.next_page_token.as_deref(), Some("page-2"));

        let tasks: Vec<TaskItem> = response.items.into_iter().filter_map(convert_task).collect();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "task1");
        assert_eq!(tasks[0].title, "Buy milk");
        assert_eq!(
            tasks[0].updated_at,
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn parse_empty_task_list() {
        let response: TaskListResponse = serde_json::from_str(r#"{"kind": "tasks#tasks"}"#).unwrap();
        assert!(response.items.is_empty());
        assert!(response.next_page_token.is_none());
    }

    #[test]
    fn convert_skips_deleted_and_malformed() {
        let json = r#"[
            {"id": "gone", "title": "Deleted", "updated": "2024-03-15T10:00:00Z", "deleted": true},
            {"title": "No id", "updated": "2024-03-15T10:00:00Z"},
            {"id": "bad-time", "title": "Bad", "updated": "yesterday"},
            {"id": "no-time", "title": "Missing"},
            {"id": "untitled", "updated": "2024-03-15T10:00:00Z"}
        ]"#;
        let tasks: Vec<ApiTask> = serde_json::from_str(json).unwrap();

        let converted: Vec<TaskItem> = tasks.into_iter().filter_map(convert_task).collect();
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].id, "untitled");
        assert_eq!(converted[0].title, "");
    }

    #[test]
    fn tasks_url_encodes_list_id() {
        let base = Url::parse("https://tasks.googleapis.com/").unwrap();
        let url = tasks_url(&base, "@default").unwrap();
        assert_eq!(
            url.as_str(),
            "https://tasks.googleapis.com/tasks/v1/lists/%40default/tasks"
        );
    }
}

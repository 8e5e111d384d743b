//! In-memory adapters.
//!
//! These implement the collaborator traits without any network access, so
//! the engine can be driven through scripted provider behavior: expired
//! credentials, outages, rejected writes, slow responses.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tasksync_core::{MirrorItem, TaskItem};
use tracing::debug;

use crate::credential::Credential;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CredentialRefresher, MirrorStore, TaskSource};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A scripted outcome for the next source call.
#[derive(Debug, Clone)]
pub enum SourceResponse {
    /// Return these tasks.
    Tasks(Vec<TaskItem>),
    /// Reject the credential.
    Unauthorized,
    /// Fail with a retryable error.
    Unavailable,
}

#[derive(Debug, Default)]
struct SourceState {
    tasks: Vec<TaskItem>,
    script: VecDeque<SourceResponse>,
    rejected_tokens: HashSet<String>,
    seen_tokens: Vec<String>,
    delay: Option<Duration>,
}

/// Task source backed by a vector.
///
/// Scripted responses take precedence over the stored task list; once the
/// script runs out the source returns the stored tasks, unless the
/// credential's access token was marked rejected.
#[derive(Debug, Default)]
pub struct InMemoryTaskSource {
    state: Mutex<SourceState>,
}

impl InMemoryTaskSource {
    /// Creates a source holding `tasks`.
    pub fn new(tasks: Vec<TaskItem>) -> Self {
        Self {
            state: Mutex::new(SourceState {
                tasks,
                ..Default::default()
            }),
        }
    }

    /// Replaces the stored tasks.
    pub fn set_tasks(&self, tasks: Vec<TaskItem>) {
        lock(&self.state).tasks = tasks;
    }

    /// Queues a one-shot response.
    pub fn push_response(&self, response: SourceResponse) {
        lock(&self.state).script.push_back(response);
    }

    /// Makes every call with `access_token` fail as unauthorized.
    pub fn reject_token(&self, access_token: impl Into<String>) {
        lock(&self.state).rejected_tokens.insert(access_token.into());
    }

    /// Makes every call take `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        lock(&self.state).delay = Some(delay);
    }

    /// Returns how many times `list_tasks` was called.
    pub fn calls(&self) -> usize {
        lock(&self.state).seen_tokens.len()
    }

    /// Returns the access tokens used, in call order.
    pub fn seen_tokens(&self) -> Vec<String> {
        lock(&self.state).seen_tokens.clone()
    }

    fn answer(&self, credential: &Credential) -> ProviderResult<Vec<TaskItem>> {
        let mut state = lock(&self.state);
        state.seen_tokens.push(credential.access_token.clone());

        let response = match state.script.pop_front() {
            Some(response) => response,
            None if state.rejected_tokens.contains(&credential.access_token) => {
                SourceResponse::Unauthorized
            }
            None => SourceResponse::Tasks(state.tasks.clone()),
        };

        match response {
            SourceResponse::Tasks(tasks) => Ok(tasks),
            SourceResponse::Unauthorized => {
                Err(ProviderError::authentication("access token expired or invalid")
                    .with_provider("memory"))
            }
            SourceResponse::Unavailable => {
                Err(ProviderError::server("task source unavailable").with_provider("memory"))
            }
        }
    }
}

impl TaskSource for InMemoryTaskSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn list_tasks<'a>(
        &'a self,
        credential: &'a Credential,
    ) -> BoxFuture<'a, ProviderResult<Vec<TaskItem>>> {
        Box::pin(async move {
            let delay = lock(&self.state).delay;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.answer(credential)
        })
    }
}

#[derive(Debug, Default)]
struct MirrorState {
    items: Vec<MirrorItem>,
    failing_tasks: HashSet<String>,
    failing_lists: u32,
    list_calls: usize,
    create_calls: Vec<String>,
}

/// Mirror store backed by a vector.
#[derive(Debug, Default)]
pub struct InMemoryMirror {
    state: Mutex<MirrorState>,
}

impl InMemoryMirror {
    /// Creates an empty mirror.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mirror that already holds `items`.
    pub fn with_items(items: Vec<MirrorItem>) -> Self {
        Self {
            state: Mutex::new(MirrorState {
                items,
                ..Default::default()
            }),
        }
    }

    /// Returns the stored items.
    pub fn items(&self) -> Vec<MirrorItem> {
        lock(&self.state).items.clone()
    }

    /// Removes the item for `task_id`, as a user deleting a page by hand.
    pub fn remove(&self, task_id: &str) {
        lock(&self.state).items.retain(|item| item.task_id != task_id);
    }

    /// Makes creates for `task_id` fail until [`Self::heal`] is called.
    pub fn fail_creates_for(&self, task_id: impl Into<String>) {
        lock(&self.state).failing_tasks.insert(task_id.into());
    }

    /// Makes the next `count` list calls fail with a retryable error.
    pub fn fail_next_lists(&self, count: u32) {
        lock(&self.state).failing_lists = count;
    }

    /// Clears every injected failure.
    pub fn heal(&self) {
        let mut state = lock(&self.state);
        state.failing_tasks.clear();
        state.failing_lists = 0;
    }

    /// Returns how many times the mirror was listed.
    pub fn list_calls(&self) -> usize {
        lock(&self.state).list_calls
    }

    /// Returns the task ids passed to `create_mirrored`, in call order,
    /// including failed attempts.
    pub fn create_calls(&self) -> Vec<String> {
        lock(&self.state).create_calls.clone()
    }
}

impl MirrorStore for InMemoryMirror {
    fn name(&self) -> &str {
        "memory"
    }

    fn list_mirrored(&self) -> BoxFuture<'_, ProviderResult<Vec<MirrorItem>>> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            state.list_calls += 1;
            if state.failing_lists > 0 {
                state.failing_lists -= 1;
                return Err(ProviderError::network("mirror unreachable").with_provider("memory"));
            }
            Ok(state.items.clone())
        })
    }

    fn create_mirrored<'a>(&'a self, task: &'a TaskItem) -> BoxFuture<'a, ProviderResult<MirrorItem>> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            state.create_calls.push(task.id.clone());
            if state.failing_tasks.contains(&task.id) {
                return Err(ProviderError::write_rejected(format!(
                    "refused to store task {}",
                    task.id
                ))
                .with_provider("memory"));
            }
            let item = MirrorItem::new(&task.id, &task.title, Utc::now());
            state.items.push(item.clone());
            debug!(task_id = %task.id, "Stored mirror item in memory");
            Ok(item)
        })
    }
}

/// A scripted outcome for the next refresh.
#[derive(Debug, Clone)]
pub enum RefreshResponse {
    /// Issue a credential with this access token, valid for an hour.
    Grant(String),
    /// Deny the exchange.
    Deny,
    /// Fail with a retryable error.
    Unavailable,
}

/// Token endpoint stand-in.
///
/// Without a script every refresh succeeds with `refreshed-<n>`.
#[derive(Debug, Default)]
pub struct InMemoryRefresher {
    script: Mutex<VecDeque<RefreshResponse>>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryRefresher {
    /// Creates a refresher that grants every exchange.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a one-shot response.
    pub fn push_response(&self, response: RefreshResponse) {
        lock(&self.script).push_back(response);
    }

    /// Returns how many exchanges were attempted.
    pub fn calls(&self) -> usize {
        lock(&self.calls).len()
    }
}

impl CredentialRefresher for InMemoryRefresher {
    fn name(&self) -> &str {
        "memory"
    }

    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, ProviderResult<Credential>> {
        Box::pin(async move {
            let attempt = {
                let mut calls = lock(&self.calls);
                calls.push(refresh_token.to_string());
                calls.len()
            };
            let response = lock(&self.script)
                .pop_front()
                .unwrap_or_else(|| RefreshResponse::Grant(format!("refreshed-{}", attempt)));

            match response {
                RefreshResponse::Grant(access_token) => Ok(Credential::new(access_token)
                    .with_refresh_token(refresh_token)
                    .expiring_in(3600)),
                RefreshResponse::Deny => Err(ProviderError::authentication(
                    "refresh token revoked",
                )
                .with_provider("memory")),
                RefreshResponse::Unavailable => {
                    Err(ProviderError::network("token endpoint unreachable").with_provider("memory"))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> TaskItem {
        TaskItem::new(id, format!("Task {}", id), Utc::now())
    }

    #[tokio::test]
    async fn source_script_precedes_stored_tasks() {
        let source = InMemoryTaskSource::new(vec![task("a")]);
        source.push_response(SourceResponse::Unauthorized);
        let credential = Credential::new("token");

        let first = source.list_tasks(&credential).await;
        assert!(first.unwrap_err().is_unauthorized());

        let second = source.list_tasks(&credential).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn source_rejects_marked_tokens() {
        let source = InMemoryTaskSource::new(vec![task("a")]);
        source.reject_token("old");

        assert!(source.list_tasks(&Credential::new("old")).await.is_err());
        assert!(source.list_tasks(&Credential::new("new")).await.is_ok());
        assert_eq!(source.seen_tokens(), vec!["old", "new"]);
    }

    #[tokio::test]
    async fn mirror_create_and_failure_isolation() {
        let mirror = InMemoryMirror::new();
        mirror.fail_creates_for("b");

        assert!(mirror.create_mirrored(&task("a")).await.is_ok());
        let err = mirror.create_mirrored(&task("b")).await.unwrap_err();
        assert!(!err.is_retryable());

        let items = mirror.list_mirrored().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].task_id, "a");
        assert_eq!(mirror.create_calls(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn mirror_list_failures_are_retryable() {
        let mirror = InMemoryMirror::new();
        mirror.fail_next_lists(1);

        assert!(mirror.list_mirrored().await.unwrap_err().is_retryable());
        assert!(mirror.list_mirrored().await.is_ok());
        assert_eq!(mirror.list_calls(), 2);
    }

    #[tokio::test]
    async fn refresher_grants_by_default() {
        let refresher = InMemoryRefresher::new();
        refresher.push_response(RefreshResponse::Deny);

        assert!(refresher.refresh("r").await.unwrap_err().is_unauthorized());
        let credential = refresher.refresh("r").await.unwrap();
        assert_eq!(credential.access_token, "refreshed-2");
        assert_eq!(credential.refresh_token.as_deref(), Some("r"));
        assert_eq!(refresher.calls(), 2);
    }
}

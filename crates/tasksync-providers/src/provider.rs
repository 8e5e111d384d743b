//! Collaborator traits consumed by the sync engine.
//!
//! - [`TaskSource`] reads the full task list with a bearer credential.
//! - [`MirrorStore`] lists and creates mirror items.
//! - [`CredentialRefresher`] exchanges a refresh token for a new credential.
//!
//! The engine never talks HTTP itself; everything remote goes through these
//! traits so it can run against the Google/Notion adapters or the in-memory
//! ones in [`crate::memory`].

use std::future::Future;
use std::pin::Pin;

use tasksync_core::{MirrorItem, TaskItem};

use crate::credential::Credential;
use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Boxed futures keep the traits object-safe, so the engine can hold
/// `Arc<dyn TaskSource>` and friends.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The external task provider.
///
/// # Implementation Notes
///
/// - Return the complete list on every call; the engine replaces its source
///   snapshot wholesale and never merges partial results
/// - Report a rejected credential as
///   [`ProviderErrorCode::AuthenticationFailed`](crate::ProviderErrorCode::AuthenticationFailed)
///   and nothing else with that code
/// - Handle pagination internally
pub trait TaskSource: Send + Sync {
    /// Returns the adapter name (e.g. "google-tasks").
    fn name(&self) -> &str;

    /// Lists all tasks visible with `credential`, in provider order.
    ///
    /// # Errors
    ///
    /// Authentication failure when the credential is rejected; network,
    /// rate-limit or server errors when the provider is unavailable.
    fn list_tasks<'a>(
        &'a self,
        credential: &'a Credential,
    ) -> BoxFuture<'a, ProviderResult<Vec<TaskItem>>>;
}

/// The external store kept in sync with the task source.
///
/// The store owns its own credential; the engine never sees it.
pub trait MirrorStore: Send + Sync {
    /// Returns the adapter name (e.g. "notion").
    fn name(&self) -> &str;

    /// Lists every mirror item currently in the store.
    fn list_mirrored(&self) -> BoxFuture<'_, ProviderResult<Vec<MirrorItem>>>;

    /// Creates the mirror item for `task`.
    ///
    /// Calling this twice for the same task may produce two items if the
    /// store has no uniqueness constraint; the engine avoids doing so.
    fn create_mirrored<'a>(&'a self, task: &'a TaskItem) -> BoxFuture<'a, ProviderResult<MirrorItem>>;
}

/// Exchanges a refresh token for a fresh source credential.
pub trait CredentialRefresher: Send + Sync {
    /// Returns the adapter name (e.g. "google-oauth").
    fn name(&self) -> &str;

    /// Obtains a new credential.
    ///
    /// # Errors
    ///
    /// Authentication failure (or bad request) when the token endpoint
    /// denies the exchange; retryable codes when it could not be reached.
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, ProviderResult<Credential>>;
}

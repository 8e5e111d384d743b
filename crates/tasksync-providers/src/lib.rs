//! Collaborator traits and their implementations.
//!
//! This crate provides everything the sync engine talks to:
//!
//! - [`TaskSource`] - reads the task list (Google Tasks)
//! - [`MirrorStore`] - lists and creates mirror items (Notion)
//! - [`CredentialRefresher`] - renews the source credential (Google OAuth)
//! - [`Credential`] - bearer credential with refresh token and expiry hint
//! - [`ProviderError`] - error type shared by all adapters
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐
//! │ Google Tasks API │   │ Google token API │   │   Notion API     │
//! └────────┬─────────┘   └────────┬─────────┘   └────────┬─────────┘
//!          │                      │                      │
//!          ▼                      ▼                      ▼
//! ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐
//! │GoogleTasksSource │   │   OAuthClient    │   │  NotionMirror    │
//! └────────┬─────────┘   └────────┬─────────┘   └────────┬─────────┘
//!          │ TaskSource           │ CredentialRefresher  │ MirrorStore
//!          └──────────────────────┼──────────────────────┘
//!                                 ▼
//!                          sync engine
//! ```
//!
//! The [`memory`] module has network-free implementations of all three
//! traits.

pub mod credential;
pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod memory;
#[cfg(feature = "notion")]
pub mod notion;
pub mod provider;

// Re-export main types at crate root
pub use credential::Credential;
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use provider::{BoxFuture, CredentialRefresher, MirrorStore, TaskSource};

//! Google Tasks source and token refresh.
//!
//! - [`GoogleTasksSource`] lists the tasks of one task list through the
//!   Tasks API v1, following pagination.
//! - [`OAuthClient`] renews the access token with a refresh token.
//!
//! Obtaining the first token pair (consent screen, PKCE) is left to the
//! host; this module only consumes tokens.
//!
//! # Example
//!
//! ```ignore
//! use tasksync_providers::google::{GoogleConfig, GoogleTasksSource, OAuthClient, OAuthCredentials};
//!
//! let config = GoogleConfig::new(OAuthCredentials::new(
//!     "your-client-id.apps.googleusercontent.com",
//!     "your-client-secret",
//! ))?;
//!
//! let source = GoogleTasksSource::new(config.clone())?;
//! let refresher = OAuthClient::new(&config)?;
//! ```

mod client;
mod config;
mod oauth;
mod source;

pub use client::GoogleTasksClient;
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::OAuthClient;
pub use source::GoogleTasksSource;

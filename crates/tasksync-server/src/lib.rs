//! Sync engine: poller, session, credential supervisor.
//!
//! This crate drives the one-way sync from a [`TaskSource`] to a
//! [`MirrorStore`]:
//! - [`SyncSession`] runs reconciliation cycles and calls host listeners
//! - [`Poller`] runs the session on a fixed interval, one operation at a time
//! - [`CredentialSupervisor`] renews the source credential on expiry
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tasksync_core::ReconcilerConfig;
//! use tasksync_providers::Credential;
//! use tasksync_providers::memory::{InMemoryMirror, InMemoryRefresher, InMemoryTaskSource};
//! use tasksync_server::{CredentialSupervisor, Poller, PollerConfig, SyncSession};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut session = SyncSession::new(
//!         Arc::new(InMemoryTaskSource::default()),
//!         Arc::new(InMemoryMirror::new()),
//!         CredentialSupervisor::new(Arc::new(InMemoryRefresher::new())),
//!         ReconcilerConfig::default(),
//!     );
//!     session.on_create_completed(|result| println!("{:?}", result));
//!
//!     let poller = Poller::new(PollerConfig::default(), session);
//!     let handle = poller.handle();
//!     tokio::spawn(async move { handle.stop().await });
//!     poller.run(Credential::new("access-token")).await;
//! }
//! ```
//!
//! [`TaskSource`]: tasksync_providers::TaskSource
//! [`MirrorStore`]: tasksync_providers::MirrorStore

mod error;
mod poller;
mod session;
mod signals;
mod supervisor;

pub use error::{SyncError, SyncResult};
pub use poller::{
    Poller, PollerCommand, PollerConfig, PollerHandle, PollerState, PollerStatus,
    SharedPollerStatus,
};
pub use session::{CreateListener, CycleOutcome, CycleReport, SnapshotListener, SyncSession};
pub use signals::forward_signals;
pub use supervisor::CredentialSupervisor;

//! The `tasksync` command-line interface.
//!
//! Reads `config.toml`, wires the Google Tasks source and the Notion mirror
//! into a [`tasksync_server::SyncSession`] and runs it once or on a timer.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};

//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// tasksync - mirror Google Tasks into a Notion database
#[derive(Debug, Parser)]
#[command(name = "tasksync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "TASKSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Seconds between sync cycles (overrides the config file)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll and mirror until interrupted
    ///
    /// SIGINT/SIGTERM stop the loop, SIGHUP triggers an immediate cycle.
    Run,

    /// Run a single sync cycle and exit
    Once {
        /// Print the created pages as JSON
        #[arg(long)]
        json: bool,

        /// Only list the tasks that would be mirrored
        #[arg(long, short = 'n')]
        dry_run: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

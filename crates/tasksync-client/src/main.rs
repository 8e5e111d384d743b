//! tasksync CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use tasksync_client::cli::{Cli, Command, ConfigAction};
use tasksync_client::commands;
use tasksync_client::config::ClientConfig;
use tasksync_client::error::{ClientError, ClientResult};
use tasksync_core::tracing::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(TracingConfig::cli(cli.debug || config.debug)) {
        eprintln!("warning: logging disabled: {}", e);
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> ClientResult<ClientConfig> {
    let loaded = match cli.config {
        Some(ref path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    };
    loaded.map_err(ClientError::Config)
}

async fn run(cli: Cli, config: ClientConfig) -> ClientResult<()> {
    match cli.command {
        Some(Command::Run) => commands::run::run(&config, cli.interval).await,
        Some(Command::Once { json, dry_run }) => {
            commands::once::once(&config, json, dry_run).await
        }
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(cli.config.as_deref()),
        },
        None => {
            println!("tasksync - mirror Google Tasks into a Notion database");
            println!();
            println!("Run 'tasksync --help' for usage information.");
            println!();
            println!("Quick start:");
            println!(
                "  1. Add [google] and [notion] sections to {}",
                ClientConfig::default_path().display()
            );
            println!("  2. Check them:    tasksync config validate");
            println!("  3. Preview:       tasksync once --dry-run");
            println!("  4. Keep in sync:  tasksync run");
            Ok(())
        }
    }
}

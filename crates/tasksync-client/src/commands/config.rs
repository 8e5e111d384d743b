//! Configuration commands.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Prints the effective configuration as TOML.
pub fn dump(config: &ClientConfig) -> ClientResult<()> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", ClientConfig::default_path().display());
    println!("{}", rendered);
    Ok(())
}

/// Checks that every section builds a usable adapter configuration.
///
/// Secret references are resolved, so a broken `pass::` or `env::`
/// reference is reported here.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.sync.validate().map_err(ClientError::Config)?;

    let google = config.google().map_err(ClientError::Config)?;
    google
        .to_provider_config()
        .map_err(|e| ClientError::Config(format!("invalid [google] section: {}", e)))?;
    google
        .credential()
        .map_err(|e| ClientError::Config(format!("invalid [google] tokens: {}", e)))?;
    println!("Google Tasks settings are valid.");

    config
        .notion()
        .map_err(ClientError::Config)?
        .to_provider_config()
        .map_err(|e| ClientError::Config(format!("invalid [notion] section: {}", e)))?;
    println!("Notion settings are valid.");

    println!("Configuration is valid.");
    Ok(())
}

/// Prints the configuration file path.
pub fn path(config_path: Option<&std::path::Path>) -> ClientResult<()> {
    match config_path {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: {}", ClientConfig::default_path().display()),
    }
    Ok(())
}

//! Secret references in `config.toml`.
//!
//! Token and credential values may point outside the file:
//!
//! - `pass::path/in/store`: first line of `pass show path/in/store`
//! - `env::VAR_NAME`: value of `$VAR_NAME`
//! - anything else is used verbatim

use std::process::Command;

/// Resolves a possibly-referenced secret value.
pub fn resolve(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)
    } else if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var)
    } else {
        Ok(value.to_string())
    }
}

/// Resolves an optional value, keeping `None` as is.
pub fn resolve_optional(value: Option<&str>) -> Result<Option<String>, String> {
    value.map(resolve).transpose()
}

fn resolve_pass(path: &str) -> Result<String, String> {
    let output = Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| format!("cannot run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`pass show {}` exited with {}: {}",
            path,
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim_end().to_string())
        .filter(|line| !line.is_empty())
        .ok_or_else(|| format!("`pass show {}` printed nothing", path))
}

fn resolve_env(var: &str) -> Result<String, String> {
    std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
}

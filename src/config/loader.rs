//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::security::HeaderRewriteError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{name} must be a valid port number, got {value:?}")]
    Env { name: &'static str, value: String },
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
    #[error("Invalid header configuration: {0}")]
    Header(#[from] HeaderRewriteError),
    #[error("Failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Overlay the process environment onto `config` and validate the result.
///
/// Called after the file (if any) is parsed and logging is up, so warnings
/// about unparsable variables are visible.
pub fn finalize(mut config: ProxyConfig) -> Result<ProxyConfig, ConfigError> {
    apply_env(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse a TOML file without applying the environment.
pub fn load_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts `std::env::var` so the overlay can be exercised without
/// touching the process environment.
pub fn apply_env<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = non_empty(lookup("PORT")) {
        config.listener.port = port.trim().parse().map_err(|_| ConfigError::Env {
            name: "PORT",
            value: port.clone(),
        })?;
    }

    if let Some(timeout) = non_empty(lookup("TIMEOUT")) {
        match timeout.trim().parse::<u64>() {
            Ok(0) => tracing::warn!(
                fallback = config.timeouts.read_secs,
                "Ignoring TIMEOUT=0; the read timeout must be at least one second"
            ),
            Ok(secs) => config.timeouts.read_secs = secs,
            Err(_) => tracing::warn!(
                value = %timeout,
                fallback = config.timeouts.read_secs,
                "Ignoring unparsable TIMEOUT"
            ),
        }
    }

    if let Some(retries) = non_empty(lookup("RETRIES")) {
        match retries.trim().parse::<u32>() {
            Ok(n) => config.retries.max_retries = n,
            Err(_) => tracing::warn!(
                value = %retries,
                fallback = config.retries.max_retries,
                "Ignoring unparsable RETRIES"
            ),
        }
    }

    // Present-but-empty KEY clears a secret set in the file.
    if let Some(key) = lookup("KEY") {
        config.auth.key = key;
    }

    if let Some(domain) = non_empty(lookup("UPSTREAM_DOMAIN")) {
        config.upstream.domain = domain;
    }

    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// Configuration loader
// Loads providers from ~/.signalscope/config.toml or environment variables

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::{Config, ProviderEntry};
use crate::mcp::DEFAULT_ENDPOINT;

pub const ENDPOINT_ENV: &str = "SIGNALSCOPE_ENDPOINT";
pub const SESSION_TOKEN_ENV: &str = "SIGNALSCOPE_SESSION_TOKEN";

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".signalscope/config.toml"))
}

/// Load configuration from the config file, then the environment, then the
/// built-in endpoint
pub fn load_config() -> Result<Config> {
    if let Some(path) = default_config_path() {
        if path.exists() {
            return load_config_from(&path);
        }
    }

    if let Some(config) = config_from_env() {
        tracing::debug!("Using endpoint from {}", ENDPOINT_ENV);
        return Ok(config);
    }

    tracing::debug!("No configuration found, using {}", DEFAULT_ENDPOINT);
    Ok(Config::default())
}

/// Load and validate a TOML config file
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    tracing::debug!(
        "Loaded {} provider(s) from {}",
        config.providers.len(),
        path.display()
    );

    Ok(config)
}

fn config_from_env() -> Option<Config> {
    let endpoint = std::env::var(ENDPOINT_ENV).ok().filter(|e| !e.is_empty())?;

    let mut entry = ProviderEntry::new("default", endpoint);
    entry.session_token = std::env::var(SESSION_TOKEN_ENV)
        .ok()
        .filter(|t| !t.is_empty());

    Some(Config::new(vec![entry]))
}

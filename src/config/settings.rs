// Configuration structs

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::mcp::{ClientConfig, DEFAULT_ENDPOINT};

/// One upstream signal provider reachable over MCP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// Display name (e.g., "BOKads")
    pub name: String,

    /// MCP endpoint URL
    pub endpoint: String,

    /// Pre-established session id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,

    /// Whether the endpoint needs the initialize handshake first
    #[serde(default)]
    pub require_handshake: bool,

    /// Per-call timeout in seconds (none by default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Whether this provider is queried
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ProviderEntry {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            session_token: None,
            require_handshake: false,
            timeout_seconds: None,
            enabled: true,
        }
    }

    /// Client configuration for this provider
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            session_token: self.session_token.clone(),
            require_handshake: self.require_handshake,
            timeout: self.timeout_seconds.map(Duration::from_secs),
            ..ClientConfig::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Provider entry is missing a name");
        }
        if self.endpoint.trim().is_empty() {
            bail!("Provider '{}': 'endpoint' must not be empty", self.name);
        }
        if self.timeout_seconds == Some(0) {
            bail!("Provider '{}': 'timeout_seconds' must be greater than zero", self.name);
        }
        Ok(())
    }
}

/// REST proxy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3001")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Signals returned per provider when the request has no limit
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

fn default_bind_address() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_limit() -> usize {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            default_limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Upstream providers, queried concurrently
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,

    #[serde(default)]
    pub server: ServerConfig,

    /// Deadline applied to each provider during a fan-out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_seconds: Option<u64>,
}

impl Config {
    pub fn new(providers: Vec<ProviderEntry>) -> Self {
        Self {
            providers,
            server: ServerConfig::default(),
            request_timeout_seconds: None,
        }
    }

    /// Single provider at `endpoint`
    pub fn single(endpoint: impl Into<String>) -> Self {
        Self::new(vec![ProviderEntry::new("default", endpoint)])
    }

    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderEntry> {
        self.providers.iter().filter(|p| p.enabled)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.providers.is_empty() {
            bail!("Config has no providers. Add a [[providers]] entry with an MCP endpoint.");
        }
        for provider in &self.providers {
            provider.validate()?;
        }
        if self.enabled_providers().next().is_none() {
            bail!("All configured providers are disabled");
        }
        if self.server.default_limit == 0 {
            bail!("server.default_limit must be greater than zero");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::single(DEFAULT_ENDPOINT)
    }
}

// Provider factory
//
// Creates signal providers from configuration

use anyhow::{Context, Result};
use std::sync::Arc;

use super::{McpSignalProvider, SignalProvider};
use crate::config::Config;
use crate::mcp::SignalQueryClient;

/// Create one provider per enabled config entry, in config order
pub fn create_providers(config: &Config) -> Result<Vec<Arc<dyn SignalProvider>>> {
    let mut providers: Vec<Arc<dyn SignalProvider>> = Vec::new();

    for entry in config.enabled_providers() {
        let client = SignalQueryClient::new(entry.client_config())
            .with_context(|| format!("Failed to create client for provider '{}'", entry.name))?;

        tracing::debug!(provider = %entry.name, endpoint = %entry.endpoint, "Created provider");
        providers.push(Arc::new(McpSignalProvider::new(entry.name.clone(), client)));
    }

    Ok(providers)
}

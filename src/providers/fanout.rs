// Concurrent fan-out across providers
//
// Every provider is queried at once and settles on its own: one failure
// never cancels or alters another provider's result.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use super::SignalProvider;
use crate::mcp::{ClientError, SignalQuery, SignalsResponse};

/// Result of one provider within a fan-out
#[derive(Debug, Clone)]
pub struct ProviderOutcome {
    pub provider: String,
    pub result: Result<SignalsResponse, ClientError>,
}

impl ProviderOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Take the response, or substitute `placeholder` on failure.
    ///
    /// Placeholder content is a caller decision; nothing in the client
    /// substitutes data on its own.
    pub fn into_response_or(self, placeholder: SignalsResponse) -> SignalsResponse {
        match self.result {
            Ok(response) => response,
            Err(e) => {
                tracing::info!(provider = %self.provider, error = %e, "Using placeholder signals");
                placeholder
            }
        }
    }
}

/// Query every provider concurrently, returning outcomes in provider order
pub async fn discover_all(
    providers: &[Arc<dyn SignalProvider>],
    request: &SignalQuery,
    timeout: Option<Duration>,
) -> Vec<ProviderOutcome> {
    let calls = providers.iter().map(|provider| async move {
        let result = match timeout {
            Some(limit) => match tokio::time::timeout(limit, provider.discover(request)).await {
                Ok(result) => result,
                Err(_) => Err(ClientError::transport(
                    None,
                    format!("request timed out after {}ms", limit.as_millis()),
                )),
            },
            None => provider.discover(request).await,
        };

        match &result {
            Ok(response) => tracing::info!(
                provider = %provider.name(),
                signals = response.signals.len(),
                proposals = response.custom_segment_proposals.len(),
                "Provider answered"
            ),
            Err(e) => tracing::warn!(
                provider = %provider.name(),
                kind = e.kind(),
                error = %e,
                "Provider failed"
            ),
        }

        ProviderOutcome {
            provider: provider.name().to_string(),
            result,
        }
    });

    join_all(calls).await
}

// Multi-provider signal discovery
//
// Each upstream (internal backend, BOKads, ...) sits behind the
// SignalProvider trait so queries can fan out to all of them at once.

use async_trait::async_trait;

use crate::mcp::{ClientError, SignalQuery, SignalsResponse};

pub mod factory;
pub mod fanout;
pub mod mcp;

pub use factory::create_providers;
pub use fanout::{discover_all, ProviderOutcome};
pub use mcp::McpSignalProvider;

/// Source of audience signals
#[async_trait]
pub trait SignalProvider: Send + Sync {
    /// Find signals and custom segment proposals for a free-text query
    async fn discover(&self, request: &SignalQuery) -> Result<SignalsResponse, ClientError>;

    /// Provider name used in logs and results
    fn name(&self) -> &str;
}

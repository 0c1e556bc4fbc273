// Signal provider backed by an MCP endpoint

use async_trait::async_trait;

use super::SignalProvider;
use crate::mcp::{ClientError, SignalQuery, SignalQueryClient, SignalsResponse};

pub struct McpSignalProvider {
    name: String,
    client: SignalQueryClient,
}

impl McpSignalProvider {
    pub fn new(name: impl Into<String>, client: SignalQueryClient) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }

    pub fn client(&self) -> &SignalQueryClient {
        &self.client
    }
}

#[async_trait]
impl SignalProvider for McpSignalProvider {
    async fn discover(&self, request: &SignalQuery) -> Result<SignalsResponse, ClientError> {
        self.client.discover(request).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

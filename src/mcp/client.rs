// Signal discovery client for a single MCP endpoint
//
// JSON-RPC 2.0 over HTTP POST. Synchronous calls only accept JSON responses;
// push messages go through connect_signal_stream().

use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::error::ClientError;
use super::ids::{ClockIds, IdGenerator};
use super::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use super::stream::{ErrorCallback, SignalStream};
use super::types::{DeliveryTarget, SignalQuery, SignalsResponse, ToolList};

pub const DEFAULT_ENDPOINT: &str = "https://audience-agent.fly.dev/mcp";
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const SESSION_HEADER: &str = "mcp-session-id";
pub const GET_SIGNALS_TOOL: &str = "get_signals";

const JSON_CONTENT_TYPE: &str = "application/json";
const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";
const STREAM_PATH: &str = "sse";

/// Configuration for one MCP endpoint
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Endpoint URL (e.g., "https://audience-agent.fly.dev/mcp")
    pub endpoint: String,
    /// Pre-established session id, sent as `Mcp-Session-Id`
    pub session_token: Option<String>,
    /// Run the `initialize` handshake before the first call
    pub require_handshake: bool,
    /// Per-call timeout; None means no client-side deadline
    pub timeout: Option<Duration>,
    /// Identity announced during the handshake
    pub client_name: String,
    pub client_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            session_token: None,
            require_handshake: false,
            timeout: None,
            client_name: env!("CARGO_PKG_NAME").to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn with_handshake(mut self, required: bool) -> Self {
        self.require_handshake = required;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// JSON-RPC client for signal discovery
///
/// Cheap to clone; clones share the session id and the handshake state.
#[derive(Clone)]
pub struct SignalQueryClient {
    http: Client,
    endpoint: Url,
    stream_url: Url,
    config: ClientConfig,
    ids: Arc<dyn IdGenerator>,
    session: Arc<RwLock<Option<String>>>,
    handshake: Arc<OnceCell<()>>,
}

impl SignalQueryClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            ClientError::InvalidConfig(format!("invalid endpoint '{}': {}", config.endpoint, e))
        })?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "endpoint '{}' must use http or https",
                config.endpoint
            )));
        }

        let stream_url = Url::parse(&format!(
            "{}/{}",
            endpoint.as_str().trim_end_matches('/'),
            STREAM_PATH
        ))
        .map_err(|e| ClientError::InvalidConfig(format!("invalid stream url: {}", e)))?;

        let http = Client::builder()
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            stream_url,
            session: Arc::new(RwLock::new(config.session_token.clone())),
            config,
            ids: Arc::new(ClockIds::new()),
            handshake: Arc::new(OnceCell::new()),
        })
    }

    /// Replace the request id source (e.g. `SequentialIds` in tests)
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn stream_url(&self) -> &Url {
        &self.stream_url
    }

    /// Session id currently attached to requests, if any
    pub fn session_id(&self) -> Option<String> {
        self.session.read().ok().and_then(|guard| guard.clone())
    }

    fn set_session_id(&self, id: String) {
        if let Ok(mut guard) = self.session.write() {
            *guard = Some(id);
        }
    }

    /// List the tools the endpoint offers (`tools/list`)
    pub async fn list_tools(&self) -> Result<ToolList, ClientError> {
        let result = self.call("tools/list", None).await?;
        serde_json::from_value(result).map_err(|e| ClientError::decode("tools/list result", e))
    }

    /// Discover signals for a free-text query (`tools/call` of `get_signals`)
    pub async fn get_signals(
        &self,
        query: &str,
        deliver_to: Option<&DeliveryTarget>,
    ) -> Result<SignalsResponse, ClientError> {
        let params = get_signals_params(query, deliver_to)?;
        let result = self.call("tools/call", Some(params)).await?;
        SignalsResponse::from_result(result)
    }

    /// `get_signals` for a full [`SignalQuery`], including its principal
    pub async fn discover(&self, request: &SignalQuery) -> Result<SignalsResponse, ClientError> {
        let params = signal_query_params(request)?;
        let result = self.call("tools/call", Some(params)).await?;
        SignalsResponse::from_result(result)
    }

    /// Issue one JSON-RPC call and return its `result`
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, ClientError> {
        self.ensure_session().await?;
        let (result, _) = self.send_request(method, params).await?;
        Ok(result)
    }

    /// Open the push stream at `<endpoint>/sse`.
    ///
    /// Must be called inside a tokio runtime. Messages that are not valid JSON
    /// are logged and dropped; faults go to `on_error` when supplied.
    pub fn connect_signal_stream<F>(
        &self,
        on_message: F,
        on_error: Option<ErrorCallback>,
    ) -> SignalStream
    where
        F: FnMut(Value) + Send + 'static,
    {
        let mut request = self
            .http
            .get(self.stream_url.clone())
            .header(ACCEPT, EVENT_STREAM_CONTENT_TYPE)
            .header(CACHE_CONTROL, "no-cache");
        if let Some(session) = self.session_id() {
            request = request.header(SESSION_HEADER, session);
        }

        info!(url = %self.stream_url, "Connecting signal stream");
        SignalStream::spawn(request, Box::new(on_message), on_error)
    }

    async fn ensure_session(&self) -> Result<(), ClientError> {
        if !self.config.require_handshake {
            return Ok(());
        }
        self.handshake
            .get_or_try_init(|| self.initialize())
            .await
            .map(|_| ())
    }

    async fn initialize(&self) -> Result<(), ClientError> {
        debug!(endpoint = %self.endpoint, "Initializing MCP session");

        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": self.config.client_name,
                "version": self.config.client_version
            }
        });

        let (result, session_id) = self
            .send_request("initialize", Some(params))
            .await
            .map_err(handshake_failure)?;

        if let Some(id) = session_id {
            debug!(session_id = %id, "MCP session assigned");
            self.set_session_id(id);
        }

        if let Some(server) = result.get("serverInfo") {
            info!(
                endpoint = %self.endpoint,
                server = %server.get("name").and_then(|n| n.as_str()).unwrap_or("unknown"),
                "MCP session initialized"
            );
        }

        let notification = JsonRpcNotification::new("notifications/initialized", None);
        self.post(&notification).await.map_err(handshake_failure)?;

        Ok(())
    }

    /// Send a request, returning the result and any session id the server assigned
    async fn send_request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<(Value, Option<String>), ClientError> {
        let id = self.ids.next_id();
        let request = JsonRpcRequest::new(id.clone(), method, params);

        debug!(method, id = %id, endpoint = %self.endpoint, "MCP request");

        let response = self.post(&request).await?;
        let status = response.status().as_u16();

        let session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        // Body is dropped unread
        if content_type.contains(EVENT_STREAM_CONTENT_TYPE) {
            warn!(method, "Synchronous MCP call answered with an event stream");
            return Err(ClientError::UnexpectedStream { content_type });
        }

        let body = response.bytes().await?;
        let envelope: JsonRpcResponse = serde_json::from_slice(&body).map_err(|e| {
            ClientError::transport(Some(status), format!("failed to parse JSON-RPC response: {}", e))
        })?;

        if envelope.id.as_ref() != Some(&id) {
            warn!(
                method,
                expected = %id,
                received = ?envelope.id,
                "MCP response id does not match request id"
            );
        }

        let result = envelope.into_result(status).map_err(|e| {
            debug!(method, error = %e, "MCP call failed");
            e
        })?;

        Ok((result, session_id))
    }

    async fn post<T: Serialize>(&self, body: &T) -> Result<reqwest::Response, ClientError> {
        let mut request = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(ACCEPT, JSON_CONTENT_TYPE)
            .json(body);

        if let Some(session) = self.session_id() {
            request = request.header(SESSION_HEADER, session);
        }
        if let Some(timeout) = self.config.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();

        // Error bodies are never decoded as envelopes
        if !status.is_success() {
            return Err(ClientError::transport(
                Some(status.as_u16()),
                format!("HTTP error! status: {}", status),
            ));
        }

        Ok(response)
    }
}

/// Build the `tools/call` params for `get_signals`.
///
/// `deliver_to` is left out entirely when no target is given.
pub fn get_signals_params(
    query: &str,
    deliver_to: Option<&DeliveryTarget>,
) -> Result<Value, ClientError> {
    if query.trim().is_empty() {
        return Err(ClientError::InvalidArgument(
            "query must be a non-empty string".to_string(),
        ));
    }

    let mut arguments = Map::new();
    arguments.insert("query".to_string(), Value::String(query.to_string()));
    if let Some(target) = deliver_to {
        let target = serde_json::to_value(target)
            .map_err(|e| ClientError::InvalidArgument(format!("invalid delivery target: {}", e)))?;
        arguments.insert("deliver_to".to_string(), target);
    }

    Ok(json!({
        "name": GET_SIGNALS_TOOL,
        "arguments": arguments
    }))
}

/// `get_signals_params` plus `principal_id` when the query carries one
pub fn signal_query_params(request: &SignalQuery) -> Result<Value, ClientError> {
    let mut params = get_signals_params(&request.query, request.deliver_to.as_ref())?;
    if let (Some(principal), Some(arguments)) = (
        &request.principal_id,
        params.get_mut("arguments").and_then(Value::as_object_mut),
    ) {
        arguments.insert("principal_id".to_string(), Value::String(principal.clone()));
    }
    Ok(params)
}

fn handshake_failure(err: ClientError) -> ClientError {
    let status = err.status();
    let message = match err {
        ClientError::Transport { message, .. } => message,
        other => other.to_string(),
    };
    ClientError::transport(status, format!("session handshake failed: {}", message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::types::PlatformAccount;

    #[test]
    fn test_client_creation() {
        let client = SignalQueryClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.endpoint().as_str(), DEFAULT_ENDPOINT);
        assert_eq!(client.stream_url().as_str(), "https://audience-agent.fly.dev/mcp/sse");
        assert_eq!(client.session_id(), None);
    }

    #[test]
    fn test_stream_url_with_trailing_slash() {
        let client = SignalQueryClient::new(ClientConfig::new("http://localhost:3000/mcp/")).unwrap();
        assert_eq!(client.stream_url().as_str(), "http://localhost:3000/mcp/sse");
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let err = SignalQueryClient::new(ClientConfig::new("not a url")).err().unwrap();
        assert_eq!(err.kind(), "invalid_config");

        let err = SignalQueryClient::new(ClientConfig::new("ftp://example.com/mcp"))
            .err()
            .unwrap();
        assert_eq!(err.kind(), "invalid_config");
    }

    #[test]
    fn test_session_token_seeds_session() {
        let config = ClientConfig::default().with_session_token("sess-1");
        let client = SignalQueryClient::new(config).unwrap();
        assert_eq!(client.session_id().as_deref(), Some("sess-1"));
    }

    #[test]
    fn test_get_signals_params_without_target() {
        let params = get_signals_params("electric bikes", None).unwrap();

        assert_eq!(params["name"], "get_signals");
        assert_eq!(params["arguments"]["query"], "electric bikes");
        assert!(params["arguments"].as_object().unwrap().get("deliver_to").is_none());
    }

    #[test]
    fn test_get_signals_params_keeps_query_verbatim() {
        let query = "  sports fans, 25-34 \u{1F6B2} ";
        let params = get_signals_params(query, None).unwrap();
        assert_eq!(params["arguments"]["query"], query);
    }

    #[test]
    fn test_get_signals_params_with_target() {
        let target = DeliveryTarget::platforms(vec![PlatformAccount::new("the-trade-desk")])
            .with_countries(["US"]);
        let params = get_signals_params("luxury travel", Some(&target)).unwrap();

        assert_eq!(
            params["arguments"]["deliver_to"],
            json!({"platforms": [{"platform": "the-trade-desk"}], "countries": ["US"]})
        );
    }

    #[test]
    fn test_signal_query_params_forwards_principal() {
        let request = SignalQuery::new("golfers").with_principal(Some("buyer-42".to_string()));
        let params = signal_query_params(&request).unwrap();

        assert_eq!(params["arguments"]["query"], "golfers");
        assert_eq!(params["arguments"]["principal_id"], "buyer-42");

        let request = SignalQuery::new("golfers").with_principal(Some("  ".to_string()));
        let params = signal_query_params(&request).unwrap();
        assert!(params["arguments"].get("principal_id").is_none());
    }

    #[test]
    fn test_get_signals_params_rejects_empty_query() {
        assert!(matches!(
            get_signals_params("", None),
            Err(ClientError::InvalidArgument(_))
        ));
        assert!(matches!(
            get_signals_params("   ", None),
            Err(ClientError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_handshake_failure_is_transport() {
        let err = handshake_failure(ClientError::Protocol {
            code: -32600,
            message: "bad init".to_string(),
            data: None,
        });
        assert!(err.is_transport());
        assert!(err.to_string().contains("session handshake failed"));

        let err = handshake_failure(ClientError::transport(Some(503), "HTTP error! status: 503"));
        assert_eq!(err.status(), Some(503));
    }
}

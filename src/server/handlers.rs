// HTTP request handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ProxyServer;
use crate::mcp::{ClientError, CustomSegmentProposal, DeliveryTarget, Signal, SignalQuery};
use crate::providers::{discover_all, ProviderOutcome};

/// Create the main application router
pub fn create_router(server: Arc<ProxyServer>) -> Router {
    Router::new()
        .route("/api/signals/search", get(search_signals))
        .route("/health", get(health_check))
        .with_state(server)
}

/// Query string for GET /api/signals/search
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Free-text signal specification
    #[serde(default)]
    pub spec: Option<String>,
    /// Maximum signals per provider
    #[serde(default)]
    pub limit: Option<usize>,
    /// Comma-separated ISO country codes
    #[serde(default)]
    pub country: Option<String>,
    /// Buyer principal for principal-specific pricing
    #[serde(default)]
    pub principal: Option<String>,
}

impl SearchParams {
    fn delivery_target(&self) -> Option<DeliveryTarget> {
        let countries: Vec<String> = self
            .country
            .as_deref()?
            .split(',')
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .collect();

        if countries.is_empty() {
            None
        } else {
            Some(DeliveryTarget::all().with_countries(countries))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub context_id: String,
    pub providers: Vec<ProviderResult>,
}

/// One provider's share of a search response
#[derive(Debug, Serialize)]
pub struct ProviderResult {
    pub provider: String,
    pub ok: bool,
    pub signals: Vec<Signal>,
    pub custom_segment_proposals: Vec<CustomSegmentProposal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
}

impl From<&ClientError> for ErrorBody {
    fn from(err: &ClientError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            status: err.status(),
            code: err.code(),
        }
    }
}

impl ProviderResult {
    fn from_outcome(outcome: ProviderOutcome, limit: usize) -> Self {
        match outcome.result {
            Ok(mut response) => {
                response.signals.truncate(limit);
                Self {
                    provider: outcome.provider,
                    ok: true,
                    signals: response.signals,
                    custom_segment_proposals: response.custom_segment_proposals,
                    message: response.message,
                    error: None,
                }
            }
            Err(e) => Self {
                provider: outcome.provider,
                ok: false,
                signals: Vec::new(),
                custom_segment_proposals: Vec::new(),
                message: None,
                error: Some(ErrorBody::from(&e)),
            },
        }
    }
}

/// Handle GET /api/signals/search - fan out to every provider
pub async fn search_signals(
    State(server): State<Arc<ProxyServer>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let spec = params
        .spec
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing signal specification"))?;

    let limit = params.limit.unwrap_or(server.config().default_limit);
    if limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than zero"));
    }

    tracing::info!(spec = %spec, limit, "Signal search");

    let request = SignalQuery::new(spec)
        .with_delivery_target(params.delivery_target())
        .with_principal(params.principal.clone());
    let outcomes = discover_all(server.providers(), &request, server.request_timeout()).await;

    let providers = outcomes
        .into_iter()
        .map(|outcome| ProviderResult::from_outcome(outcome, limit))
        .collect();

    Ok(Json(SearchResponse {
        query: spec.to_string(),
        context_id: format!("ctx_{}", chrono::Utc::now().timestamp_millis()),
        providers,
    }))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub providers: Vec<String>,
    pub timestamp: String,
}

/// Handle GET /health - Health check endpoint
pub async fn health_check(State(server): State<Arc<ProxyServer>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        service: "signalscope proxy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers: server
            .providers()
            .iter()
            .map(|p| p.name().to_string())
            .collect(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Error response for rejected requests
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, error = %self.message, "Request rejected");
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::mcp::SignalsResponse;
    use crate::providers::SignalProvider;
    use async_trait::async_trait;
    use serde_json::Value;

    struct FixedProvider {
        name: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl SignalProvider for FixedProvider {
        async fn discover(&self, request: &SignalQuery) -> Result<SignalsResponse, ClientError> {
            if self.fail {
                return Err(ClientError::Protocol {
                    code: -32601,
                    message: "Method not found".to_string(),
                    data: None,
                });
            }
            let countries = request
                .deliver_to
                .as_ref()
                .and_then(|t| t.countries.clone())
                .unwrap_or_default()
                .join(",");
            let principal = request.principal_id.as_deref().unwrap_or("-");
            let signals = (0..10)
                .map(|i| {
                    serde_json::from_value(serde_json::json!({
                        "id": format!("{}-{}", self.name, i),
                        "name": format!("{} [{}] {}", request.query, countries, principal),
                    }))
                    .unwrap()
                })
                .collect();
            Ok(SignalsResponse {
                signals,
                ..Default::default()
            })
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    fn test_server() -> Arc<ProxyServer> {
        let providers: Vec<Arc<dyn SignalProvider>> = vec![
            Arc::new(FixedProvider {
                name: "internal",
                fail: false,
            }),
            Arc::new(FixedProvider {
                name: "BOKads",
                fail: true,
            }),
        ];
        Arc::new(ProxyServer::new(providers, ServerConfig::default(), None))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_search_requires_spec() {
        let response = search_signals(State(test_server()), Query(SearchParams::default()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Missing signal specification");
    }

    #[tokio::test]
    async fn test_search_reports_each_provider() {
        let params = SearchParams {
            spec: Some("electric bikes".to_string()),
            limit: Some(3),
            country: Some("us, uk".to_string()),
            principal: Some("buyer-42".to_string()),
        };

        let response = search_signals(State(test_server()), Query(params))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["query"], "electric bikes");

        let internal = &body["providers"][0];
        assert_eq!(internal["provider"], "internal");
        assert_eq!(internal["ok"], true);
        assert_eq!(internal["signals"].as_array().unwrap().len(), 3);
        assert_eq!(internal["signals"][0]["name"], "electric bikes [US,UK] buyer-42");

        let bokads = &body["providers"][1];
        assert_eq!(bokads["ok"], false);
        assert_eq!(bokads["error"]["kind"], "protocol");
        assert_eq!(bokads["error"]["code"], -32601);
        assert!(bokads["signals"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_lists_providers() {
        let Json(status) = health_check(State(test_server())).await;
        assert_eq!(status.status, "ok");
        assert_eq!(status.providers, vec!["internal", "BOKads"]);
    }

    #[test]
    fn test_delivery_target_from_params() {
        let params = SearchParams {
            country: Some(" , ".to_string()),
            ..Default::default()
        };
        assert!(params.delivery_target().is_none());

        let params = SearchParams {
            country: Some("de".to_string()),
            ..Default::default()
        };
        let target = params.delivery_target().unwrap();
        assert_eq!(target.countries, Some(vec!["DE".to_string()]));
    }
}

// Request parameter and result shapes for signal discovery
//
// Result shapes are upstream-defined; unknown fields are ignored and most
// fields are optional so that a sparse provider still decodes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::error::ClientError;

/// Treat an explicit `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Ad platforms a query is scoped to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Platforms {
    #[default]
    All,
    Selected(Vec<PlatformAccount>),
}

/// One platform, optionally narrowed to an account on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformAccount {
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl PlatformAccount {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            account: None,
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }
}

impl Serialize for Platforms {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::Selected(list) => list.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Platforms {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Keyword(String),
            List(Vec<PlatformAccount>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Keyword(s) if s == "all" => Ok(Self::All),
            Raw::Keyword(s) => Err(serde::de::Error::custom(format!(
                "expected \"all\" or a list of platforms, got \"{}\"",
                s
            ))),
            Raw::List(list) => Ok(Self::Selected(list)),
        }
    }
}

/// Where a discovered signal should be deliverable
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeliveryTarget {
    #[serde(default)]
    pub platforms: Platforms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
}

impl DeliveryTarget {
    /// Every platform, no country restriction
    pub fn all() -> Self {
        Self::default()
    }

    pub fn platforms(platforms: Vec<PlatformAccount>) -> Self {
        Self {
            platforms: Platforms::Selected(platforms),
            countries: None,
        }
    }

    pub fn with_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries = Some(countries.into_iter().map(Into::into).collect());
        self
    }
}

/// One discovery request: the free-text query plus optional scoping
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignalQuery {
    pub query: String,
    pub deliver_to: Option<DeliveryTarget>,
    /// Buyer principal, forwarded as `principal_id` for principal-specific pricing
    pub principal_id: Option<String>,
}

impl SignalQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_delivery_target(mut self, target: Option<DeliveryTarget>) -> Self {
        self.deliver_to = target;
        self
    }

    pub fn with_principal(mut self, principal_id: Option<String>) -> Self {
        self.principal_id = principal_id.filter(|p| !p.trim().is_empty());
        self
    }
}

/// Tool advertised by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tools: Vec<ToolDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default)]
    pub cpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,
}

/// Purchasable audience segment offered by a data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(
        rename = "signals_agent_segment_id",
        alias = "id",
        default,
        deserialize_with = "null_as_default"
    )]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub signal_type: Option<String>,
    #[serde(default)]
    pub data_provider: Option<String>,
    #[serde(default)]
    pub coverage_percentage: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pricing: Pricing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub deployments: Vec<Deployment>,
}

impl Signal {
    /// Coverage clamped to 0–100
    pub fn coverage(&self) -> Option<f64> {
        self.coverage_percentage.map(|c| c.clamp(0.0, 100.0))
    }

    pub fn cpm(&self) -> Option<f64> {
        self.pricing.cpm
    }
}

/// Provider-generated suggestion for a segment not yet in its catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomSegmentProposal {
    #[serde(
        rename = "custom_segment_id",
        alias = "id",
        default,
        deserialize_with = "null_as_default"
    )]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub proposed_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_signals: Option<String>,
    #[serde(default)]
    pub estimated_coverage_percentage: Option<f64>,
    #[serde(default)]
    pub estimated_cpm: Option<f64>,
    #[serde(default)]
    pub creation_rationale: Option<String>,
}

/// Decoded result of a `get_signals` tool call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub signals: Vec<Signal>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_segment_proposals: Vec<CustomSegmentProposal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

impl SignalsResponse {
    /// Decode a `tools/call` result.
    ///
    /// Servers either return the payload directly or wrap it as an MCP tool
    /// result (`structuredContent`, or `content` items whose text is JSON).
    /// A tool result flagged `isError` becomes `ClientError::Tool`.
    pub fn from_result(result: Value) -> Result<Self, ClientError> {
        if let Some(message) = tool_error(&result) {
            return Err(ClientError::Tool(message));
        }
        let payload = unwrap_tool_result(result);
        serde_json::from_value(payload).map_err(|e| ClientError::decode("signals result", e))
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty() && self.custom_segment_proposals.is_empty()
    }
}

fn tool_error(result: &Value) -> Option<String> {
    if result.get("isError").and_then(Value::as_bool) != Some(true) {
        return None;
    }

    let text: Vec<&str> = result
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        Some("tool reported an error without details".to_string())
    } else {
        Some(text.join("\n"))
    }
}

fn unwrap_tool_result(result: Value) -> Value {
    if result.get("signals").is_some() || result.get("custom_segment_proposals").is_some() {
        return result;
    }

    if let Some(structured) = result.get("structuredContent") {
        if structured.is_object() {
            return structured.clone();
        }
    }

    if let Some(items) = result.get("content").and_then(|c| c.as_array()) {
        for item in items {
            let text = item.get("text").and_then(|t| t.as_str());
            if let Some(parsed) = text.and_then(|t| serde_json::from_str::<Value>(t).ok()) {
                if parsed.is_object() {
                    return parsed;
                }
            }
        }
    }

    result
}

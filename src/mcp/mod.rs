// MCP signal discovery client
//
// JSON-RPC 2.0 over HTTP POST, plus the server-sent push stream.

mod client;
mod error;
mod ids;
pub mod protocol;
mod sse;
mod stream;
pub mod types;

pub use client::{
    get_signals_params, signal_query_params, ClientConfig, SignalQueryClient, DEFAULT_ENDPOINT,
    GET_SIGNALS_TOOL, MCP_PROTOCOL_VERSION, SESSION_HEADER,
};
pub use error::ClientError;
pub use ids::{ClockIds, IdGenerator, SequentialIds, UuidIds};
pub use protocol::{JsonRpcRequest, JsonRpcResponse, RequestId};
pub use sse::SseDecoder;
pub use stream::{ErrorCallback, MessageCallback, SignalStream};
pub use types::{
    CustomSegmentProposal, DeliveryTarget, Deployment, PlatformAccount, Platforms, Pricing, Signal,
    SignalQuery, SignalsResponse, ToolDescriptor, ToolList,
};

// Signalscope - Audience signal discovery over MCP
// Library exports

pub mod cli; // Terminal rendering of discovery results
pub mod config;
pub mod mcp; // JSON-RPC client and push stream
pub mod providers; // Multi-provider fan-out
pub mod server; // REST proxy

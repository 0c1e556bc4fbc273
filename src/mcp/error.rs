// Client error type
//
// Transport, protocol and stream-mismatch failures stay separate so callers
// can decide per kind whether to retry, fall back, or abort.

use serde_json::Value;
use thiserror::Error;

/// Failure of a single MCP exchange
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The HTTP exchange itself failed (network fault, non-2xx status,
    /// undecodable body, handshake failure, timeout)
    #[error("transport error{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The endpoint answered with a JSON-RPC error object
    #[error("MCP error: {message} (code: {code})")]
    Protocol {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// A synchronous call received an event-stream response
    #[error("received {content_type} response on a synchronous call; use the signal stream for push messages")]
    UnexpectedStream { content_type: String },

    /// The tool ran but reported failure (`isError` on the tool result)
    #[error("tool error: {0}")]
    Tool(String),

    /// A well-formed result did not have the expected shape
    #[error("failed to decode {what}: {message}")]
    Decode { what: String, message: String },

    /// The caller passed an argument the endpoint can never accept
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The client could not be built from its configuration
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn decode(what: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            what: what.into(),
            message: err.to_string(),
        }
    }

    /// Short, stable name for the error kind (used in logs and proxy responses)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Protocol { .. } => "protocol",
            Self::UnexpectedStream { .. } => "unexpected_stream",
            Self::Tool(_) => "tool",
            Self::Decode { .. } => "decode",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }

    /// HTTP status, when the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// JSON-RPC error code, for protocol failures
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Protocol { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    pub fn is_unexpected_stream(&self) -> bool {
        matches!(self, Self::UnexpectedStream { .. })
    }

    pub fn is_tool(&self) -> bool {
        matches!(self, Self::Tool(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timeout"
        } else if err.is_connect() {
            "connection"
        } else if err.is_body() || err.is_decode() {
            "body"
        } else {
            "request"
        };
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: format!("{} failure: {}", kind, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display_includes_status() {
        let err = ClientError::transport(Some(500), "server exploded");
        assert_eq!(err.to_string(), "transport error (HTTP 500): server exploded");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.kind(), "transport");
    }

    #[test]
    fn test_transport_display_without_status() {
        let err = ClientError::transport(None, "connection refused");
        assert_eq!(err.to_string(), "transport error: connection refused");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_decode_error_display() {
        let err = ClientError::decode("signals result", "missing field `name`");
        assert_eq!(err.kind(), "decode");
        assert_eq!(
            err.to_string(),
            "failed to decode signals result: missing field `name`"
        );
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_protocol_error_accessors() {
        let err = ClientError::Protocol {
            code: -32601,
            message: "Method not found".to_string(),
            data: None,
        };
        assert!(err.is_protocol());
        assert!(!err.is_transport());
        assert_eq!(err.code(), Some(-32601));
        assert_eq!(err.to_string(), "MCP error: Method not found (code: -32601)");
    }

    #[test]
    fn test_kinds_are_distinct() {
        let errors = [
            ClientError::transport(None, "x"),
            ClientError::Protocol {
                code: 1,
                message: "x".into(),
                data: None,
            },
            ClientError::UnexpectedStream {
                content_type: "text/event-stream".into(),
            },
            ClientError::Tool("x".into()),
            ClientError::decode("tools/list result", "x"),
        ];
        let kinds: Vec<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec!["transport", "protocol", "unexpected_stream", "tool", "decode"]
        );
    }
}

//! RPC error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("balancer reported {status}: {message}")]
    Balancing { status: String, message: String },

    #[error("a request is already in flight on this session")]
    RequestInFlight,

    #[error("session closed")]
    Closed,

    #[error("request timed out")]
    Timeout,
}

impl RpcError {
    /// Whether the error means the transport is gone.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            RpcError::Connection(_) | RpcError::WebSocket(_) | RpcError::Closed
        )
    }
}

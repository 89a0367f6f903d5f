//! Caller-facing balancing errors.

use pisa_rpc::RpcError;
use pisa_tx::TxError;
use thiserror::Error;

/// Every failure `Balancer::complete` can return.
#[derive(Debug, Error)]
pub enum BalanceError {
    /// Transport failed to open, or closed underneath the session.
    #[error("connection error: {0}")]
    Connection(String),

    /// Malformed reply, unknown status, or request id mismatch.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The balancer answered `fail` or `error`. Carries its message verbatim.
    #[error("balancer rejected request: {0}")]
    Balancing(String),

    #[error("no wallet attached to builder")]
    MissingWallet,

    #[error("balanced transaction carries no redeemers")]
    MissingRedeemers,

    #[error("could not calculate script integrity hash: {0}")]
    IntegrityHash(String),

    /// Anything else raised inside the pipeline, panics included.
    #[error("balancing runtime error: {0}")]
    Runtime(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BalanceError {
    pub fn is_connection(&self) -> bool {
        matches!(self, BalanceError::Connection(_))
    }
}

impl From<RpcError> for BalanceError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Connection(_)
            | RpcError::WebSocket(_)
            | RpcError::Closed
            | RpcError::Timeout => BalanceError::Connection(err.to_string()),
            RpcError::Protocol(msg) => BalanceError::Protocol(msg),
            RpcError::RequestInFlight => BalanceError::Protocol(err.to_string()),
            RpcError::Balancing { message, .. } => BalanceError::Balancing(message),
            RpcError::Json(_) => BalanceError::Runtime(Box::new(err)),
        }
    }
}

impl From<TxError> for BalanceError {
    fn from(err: TxError) -> Self {
        match err {
            TxError::MissingWallet => BalanceError::MissingWallet,
            TxError::MissingRedeemers => BalanceError::MissingRedeemers,
            TxError::IntegrityHash(msg) => BalanceError::IntegrityHash(msg),
            other => BalanceError::Runtime(Box::new(other)),
        }
    }
}

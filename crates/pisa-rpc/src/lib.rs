//! Pisa balancer RPC.
//!
//! Provides the JSON envelopes exchanged with a Pisa balancer and a
//! persistent websocket session that carries them, one request at a time.
//!
//! # Example
//!
//! ```ignore
//! use pisa_rpc::{parse_success, BalancerSession, SessionConfig};
//!
//! let session = BalancerSession::connect(&SessionConfig::new("ws://localhost:8080")).await?;
//! let raw = session.send(&request).await?;
//! let balanced = parse_success(&raw)?;
//! balanced.check_correlation(request.request_id)?;
//! session.close().await;
//! ```

pub mod error;
pub mod envelope;
pub mod session;

pub use envelope::{
    parse_response, parse_success, BalancePayload, BalanceRequest, BalanceResponse, BalancedTx,
};
pub use error::RpcError;
pub use session::{BalancerSession, SessionConfig, SessionState};
pub use uuid::Uuid;

//! Balancer wire envelopes.
//!
//! Requests are JSON objects `{requestId, requestType, payload}`. Replies
//! are tagged by `status` with the variant body under `data`:
//!
//! ```text
//! { "status": "success", "data": { "balancedCbor": "..", "requestId": ".." } }
//! { "status": "fail",    "data": { "error": "..", "requestId"?: "..", "failedRequest"?: ".." } }
//! { "status": "error",   "data": { "error": "..", "requestId": ".." } }
//! ```
//!
//! Any other `status` is a decode failure.

use crate::error::RpcError;
use pisa_types::{AssetUnit, BalanceMode, OutRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Requests ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancePayload {
    /// `<txHash>#<index>` of the position being acted on.
    pub position_ref: OutRef,
    /// Wire asset ids, `<policy>.<name>`.
    pub swap_assets: Vec<String>,
    pub unbalanced_tx_cbor: String,
    pub user_addresses: Vec<String>,
    pub user_change_address: String,
    /// Serialized as `null` when absent.
    pub user_collateral: Option<OutRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRequest {
    pub request_id: Uuid,
    pub request_type: BalanceMode,
    pub payload: BalancePayload,
}

impl BalanceRequest {
    /// Build a request with a fresh v4 request id.
    pub fn new(
        mode: BalanceMode,
        position: &OutRef,
        swap_assets: &[AssetUnit],
        unbalanced_tx_hex: impl Into<String>,
        wallet_address: impl Into<String>,
        change_address: impl Into<String>,
        collateral: Option<&OutRef>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            request_type: mode,
            payload: BalancePayload {
                position_ref: *position,
                swap_assets: swap_assets.iter().map(AssetUnit::to_wire).collect(),
                unbalanced_tx_cbor: unbalanced_tx_hex.into(),
                user_addresses: vec![wallet_address.into()],
                user_change_address: change_address.into(),
                user_collateral: collateral.copied(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, RpcError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, RpcError> {
        Ok(serde_json::from_str(raw)?)
    }
}

// ─── Responses ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum BalanceResponse {
    #[serde(rename_all = "camelCase")]
    Success {
        balanced_cbor: String,
        request_id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    Fail {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failed_request: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Error { error: String, request_id: Uuid },
}

impl BalanceResponse {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Fail { .. } => "fail",
            Self::Error { .. } => "error",
        }
    }

    /// Request id carried by the reply, if any.
    pub fn request_id(&self) -> Option<Uuid> {
        match self {
            Self::Success { request_id, .. } | Self::Error { request_id, .. } => Some(*request_id),
            Self::Fail { request_id, .. } => *request_id,
        }
    }

    pub fn to_json(&self) -> Result<String, RpcError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A successful balancer reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancedTx {
    pub request_id: Uuid,
    pub balanced_cbor: String,
}

impl BalancedTx {
    /// Fail unless the reply answers `expected`.
    pub fn check_correlation(&self, expected: Uuid) -> Result<(), RpcError> {
        if self.request_id != expected {
            return Err(RpcError::Protocol(format!(
                "request id mismatch: sent {}, got {}",
                expected, self.request_id
            )));
        }
        Ok(())
    }
}

/// Decode a raw reply into one of the three variants.
pub fn parse_response(raw: &str) -> Result<BalanceResponse, RpcError> {
    serde_json::from_str(raw).map_err(|e| RpcError::Protocol(format!("malformed response: {}", e)))
}

/// Decode a raw reply, turning `fail` and `error` into
/// [`RpcError::Balancing`] with the server's message.
pub fn parse_success(raw: &str) -> Result<BalancedTx, RpcError> {
    match parse_response(raw)? {
        BalanceResponse::Success {
            balanced_cbor,
            request_id,
        } => Ok(BalancedTx {
            request_id,
            balanced_cbor,
        }),
        BalanceResponse::Fail { error, .. } => Err(RpcError::Balancing {
            status: "fail".into(),
            message: error,
        }),
        BalanceResponse::Error { error, .. } => Err(RpcError::Balancing {
            status: "error".into(),
            message: error,
        }),
    }
}

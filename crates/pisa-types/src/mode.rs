//! Balancing strategy flag.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the pre-balance skeleton is prepared and what the balancer is asked
/// to do with it. Serializes as the wire `requestType` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BalanceMode {
    /// Local coin selection and script evaluation are disabled; the
    /// balancer selects real inputs and balances from scratch.
    #[serde(rename = "reBalanceCbor")]
    Rebalance,
    /// Local completion runs against one synthetic high-value input; the
    /// balancer swaps it for real inputs and recomputes change.
    #[default]
    #[serde(rename = "balanceWithFakeInCbor")]
    FakeInput,
}

impl BalanceMode {
    /// Resolve an optional caller flag, defaulting to [`BalanceMode::FakeInput`].
    pub fn resolve(mode: Option<BalanceMode>) -> Self {
        mode.unwrap_or_default()
    }

    /// Wire `requestType` tag.
    pub fn request_type(self) -> &'static str {
        match self {
            Self::Rebalance => "reBalanceCbor",
            Self::FakeInput => "balanceWithFakeInCbor",
        }
    }
}

impl fmt::Display for BalanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rebalance => write!(f, "rebalance"),
            Self::FakeInput => write!(f, "fake-input"),
        }
    }
}

impl FromStr for BalanceMode {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rebalance" | "rebalancecbor" => Ok(Self::Rebalance),
            "fake-input" | "fakeinput" | "fake" | "balancewithfakeincbor" => Ok(Self::FakeInput),
            _ => Err(TypesError::UnknownMode(s.to_string())),
        }
    }
}

//! Balancer configuration and per-call options.

use pisa_rpc::SessionConfig;
use pisa_tx::SkeletonParams;
use pisa_types::{BalanceMode, FeeProfile, OutRef};

/// Configuration for a [`Balancer`](crate::Balancer).
#[derive(Debug, Clone, Default)]
pub struct BalancerConfig {
    pub session: SessionConfig,
    pub skeleton: SkeletonParams,
}

impl BalancerConfig {
    pub fn new(url: &str) -> Self {
        Self {
            session: SessionConfig::new(url),
            skeleton: SkeletonParams::default(),
        }
    }

    pub fn with_profile(mut self, profile: FeeProfile) -> Self {
        self.skeleton = SkeletonParams::with_profile(profile);
        self
    }
}

/// Options for one balancing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceOptions {
    /// Defaults to [`BalanceMode::FakeInput`].
    pub mode: Option<BalanceMode>,
    /// Defaults to the wallet address.
    pub change_address: Option<String>,
    /// Forwarded to the balancer as-is.
    pub collateral: Option<OutRef>,
}

impl BalanceOptions {
    pub fn with_mode(mut self, mode: BalanceMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_change_address(mut self, address: impl Into<String>) -> Self {
        self.change_address = Some(address.into());
        self
    }

    pub fn with_collateral(mut self, collateral: OutRef) -> Self {
        self.collateral = Some(collateral);
        self
    }
}

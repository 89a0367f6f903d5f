//! Pisa balancing client.
//!
//! Balances Cardano transactions through a remote Pisa balancer: the local
//! builder prepares a skeleton, the balancer supplies real inputs and
//! change, and the returned transaction gets its script-data and
//! auxiliary-data hashes recomputed before it is handed back sign-ready.
//!
//! # Example
//!
//! ```ignore
//! use pisa_client::{Balancer, BalancerConfig, BalanceOptions};
//!
//! let mut balancer = Balancer::connect(BalancerConfig::new("ws://localhost:8080")).await?;
//! let signable = balancer
//!     .complete(&builder, &position, &swap_assets, BalanceOptions::default())
//!     .await?;
//! let signed = signable.sign_with_wallet().await?.complete().await?;
//! balancer.finalize().await;
//! ```

pub mod balancer;
pub mod config;
pub mod error;

pub use balancer::{Balancer, BalancerState};
pub use config::{BalanceOptions, BalancerConfig};
pub use error::BalanceError;

pub use pisa_rpc::SessionConfig;
pub use pisa_tx::{SkeletonParams, TxBuilder, TxSignBuilder, Wallet};
pub use pisa_types::{AssetUnit, BalanceMode, FeeProfile, OutRef};

//! Core types and constants for Pisa transaction balancing.
//!
//! This crate provides the value types used across all Pisa crates:
//! output references, asset units and asset bags, UTxOs, the balancing
//! mode flag, and the protocol constants used to size skeleton inputs.

pub mod asset;
pub mod constants;
pub mod mode;
pub mod utxo;

pub use asset::{AssetUnit, Assets};
pub use constants::FeeProfile;
pub use mode::BalanceMode;
pub use utxo::{OutRef, Utxo};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid output reference: {0}")]
    InvalidOutRef(String),

    #[error("invalid asset unit: {0}")]
    InvalidUnit(String),

    #[error("unknown balance mode: {0}")]
    UnknownMode(String),

    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}

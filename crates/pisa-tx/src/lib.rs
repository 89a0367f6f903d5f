//! Pisa transaction handling.
//!
//! Provides a CBOR transaction model with typed access to the fields the
//! balancing protocol touches, the traits through which an external
//! transaction builder and wallet are driven, skeleton (pre-balance)
//! preparation for both balancing modes, and the post-balance hash repair
//! that recomputes script-data and auxiliary-data hashes.

pub mod types;
pub mod hash;
pub mod builder;
pub mod sign;
pub mod skeleton;
pub mod repair;

pub use types::{Transaction, TransactionBody, WitnessSet, VKeyWitness};
pub use hash::{CostModels, Language};
pub use builder::{CompleteOptions, TxBuilder, Wallet};
pub use sign::TxSignBuilder;
pub use skeleton::{prepare_skeleton, Skeleton, SkeletonParams};
pub use repair::repair_hashes;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxError {
    #[error("CBOR decode error: {0}")]
    Decode(String),

    #[error("CBOR encode error: {0}")]
    Encode(String),

    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid transaction: {0}")]
    Invalid(String),

    #[error("no wallet attached to builder")]
    MissingWallet,

    #[error("no redeemers in balanced transaction")]
    MissingRedeemers,

    #[error("could not calculate script integrity hash: {0}")]
    IntegrityHash(String),

    #[error("transaction builder error: {0}")]
    Builder(String),

    #[error("wallet error: {0}")]
    Wallet(String),

    #[error("{0}")]
    Other(String),
}

impl From<ciborium::de::Error<std::io::Error>> for TxError {
    fn from(err: ciborium::de::Error<std::io::Error>) -> Self {
        TxError::Decode(err.to_string())
    }
}

impl From<ciborium::ser::Error<std::io::Error>> for TxError {
    fn from(err: ciborium::ser::Error<std::io::Error>) -> Self {
        TxError::Encode(err.to_string())
    }
}

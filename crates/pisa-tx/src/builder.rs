//! Seams to the external transaction builder and wallet.
//!
//! Balancing never assembles transactions itself. It drives a builder
//! through [`TxBuilder`] and reads the caller's addresses through
//! [`Wallet`]. Coin selection, fee computation, script evaluation and
//! signing all stay on the implementor's side.

use crate::hash::CostModels;
use crate::types::{Transaction, VKeyWitness};
use crate::TxError;
use async_trait::async_trait;
use pisa_types::{Assets, OutRef, Utxo};
use std::sync::Arc;

/// Options for a builder completion pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteOptions {
    /// Where change goes. Defaults to the wallet address on the builder side.
    pub change_address: Option<String>,
    /// UTxO to use as collateral.
    pub collateral: Option<OutRef>,
    /// Lovelace amount to reserve as collateral.
    pub set_collateral: Option<u64>,
    /// Inputs the builder must use instead of querying the wallet.
    pub preset_wallet_inputs: Vec<Utxo>,
    pub coin_selection: bool,
    pub local_uplc_eval: bool,
    pub canonical: bool,
    pub include_leftover_lovelace_as_fee: bool,
}

impl Default for CompleteOptions {
    fn default() -> Self {
        Self {
            change_address: None,
            collateral: None,
            set_collateral: None,
            preset_wallet_inputs: Vec::new(),
            coin_selection: true,
            local_uplc_eval: true,
            canonical: false,
            include_leftover_lovelace_as_fee: false,
        }
    }
}

/// A wallet bound to a builder.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Primary address (bech32).
    async fn address(&self) -> Result<String, TxError>;

    /// Produce verification-key witnesses for `tx`.
    async fn sign_tx(&self, tx: &Transaction) -> Result<Vec<VKeyWitness>, TxError>;
}

/// A mutable transaction-builder configuration.
///
/// Balancing only ever calls the mutating methods on snapshots, so the
/// caller's configuration is left exactly as it was handed in.
#[async_trait]
pub trait TxBuilder: Send + Sync {
    /// Wallet attached to this configuration, if any.
    fn wallet(&self) -> Option<Arc<dyn Wallet>>;

    /// Protocol cost models used for the script-data hash.
    fn cost_models(&self) -> &CostModels;

    /// Independent copy of this configuration.
    ///
    /// The copy must own a fresh assembly handle bound to the same network
    /// parameters: nothing done to the snapshot may be observable through
    /// `self`, and vice versa.
    fn snapshot(&self) -> Self
    where
        Self: Sized;

    /// Run the pending programs and return the total value of all outputs.
    async fn evaluate_outputs(&mut self) -> Result<Assets, TxError>;

    /// Complete the transaction with `options`.
    async fn complete(&mut self, options: CompleteOptions) -> Result<Transaction, TxError>;
}

/// The builder's wallet, or [`TxError::MissingWallet`].
pub fn require_wallet<B: TxBuilder + ?Sized>(builder: &B) -> Result<Arc<dyn Wallet>, TxError> {
    builder.wallet().ok_or(TxError::MissingWallet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_options_default() {
        let opts = CompleteOptions::default();
        assert!(opts.coin_selection);
        assert!(opts.local_uplc_eval);
        assert!(opts.preset_wallet_inputs.is_empty());
        assert!(opts.change_address.is_none());
        assert!(opts.set_collateral.is_none());
    }
}

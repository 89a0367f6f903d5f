//! Pre-balance skeleton preparation.
//!
//! Produces the intentionally incomplete transaction handed to the
//! balancer. Both modes complete on snapshots of the caller's builder, so
//! the caller's configuration is never mutated.
//!
//! - [`BalanceMode::FakeInput`]: total output value is learned by
//!   evaluating a snapshot, then a second snapshot is completed against a
//!   single skeleton input worth
//!   `max(collateral_reserve, output_lovelace) + fee_buffer` lovelace plus
//!   every non-lovelace output asset. Local coin selection, script
//!   evaluation and fee estimation all run as usual.
//! - [`BalanceMode::Rebalance`]: a snapshot is completed with coin
//!   selection and local script evaluation disabled and no preset inputs.

use crate::builder::{require_wallet, CompleteOptions, TxBuilder, Wallet};
use crate::types::Transaction;
use crate::TxError;
use pisa_types::constants::DEFAULT_COLLATERAL_RESERVE;
use pisa_types::{Assets, BalanceMode, FeeProfile, Utxo};
use std::fmt;
use std::sync::Arc;

/// Sizing of the skeleton input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkeletonParams {
    /// Lovelace reserved as collateral.
    pub collateral_reserve: u64,
    /// Lovelace added on top to cover the locally estimated fee.
    pub fee_buffer: u64,
}

impl Default for SkeletonParams {
    fn default() -> Self {
        Self::with_profile(FeeProfile::default())
    }
}

impl SkeletonParams {
    pub fn with_profile(profile: FeeProfile) -> Self {
        Self {
            collateral_reserve: DEFAULT_COLLATERAL_RESERVE,
            fee_buffer: profile.fee_buffer(),
        }
    }

    /// Lovelace carried by the skeleton input for outputs totalling
    /// `output_lovelace`.
    pub fn skeleton_lovelace(&self, output_lovelace: u64) -> u64 {
        self.collateral_reserve
            .max(output_lovelace)
            .saturating_add(self.fee_buffer)
    }
}

/// Skeleton input covering `required` plus collateral and fee buffer.
pub fn skeleton_utxo(required: &Assets, wallet_address: &str, params: &SkeletonParams) -> Utxo {
    let mut assets = required.clone();
    assets.lovelace = params.skeleton_lovelace(required.lovelace());
    Utxo::skeleton(wallet_address, assets)
}

/// Completion options for the fake-input pass.
pub fn fake_input_options(
    input: Utxo,
    change_address: &str,
    params: &SkeletonParams,
) -> CompleteOptions {
    CompleteOptions {
        change_address: Some(change_address.to_string()),
        preset_wallet_inputs: vec![input],
        set_collateral: Some(params.collateral_reserve),
        ..Default::default()
    }
}

/// Completion options for the rebalance pass.
pub fn rebalance_options(change_address: &str) -> CompleteOptions {
    CompleteOptions {
        change_address: Some(change_address.to_string()),
        coin_selection: false,
        local_uplc_eval: false,
        ..Default::default()
    }
}

/// A prepared skeleton and the addresses it was prepared for.
pub struct Skeleton {
    pub mode: BalanceMode,
    pub transaction: Transaction,
    pub wallet: Arc<dyn Wallet>,
    pub wallet_address: String,
    pub change_address: String,
    /// The synthetic input, in fake-input mode.
    pub input: Option<Utxo>,
}

impl fmt::Debug for Skeleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Skeleton")
            .field("mode", &self.mode)
            .field("wallet_address", &self.wallet_address)
            .field("change_address", &self.change_address)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

/// Prepare the pre-balance transaction for `mode`.
///
/// Fails with [`TxError::MissingWallet`] before touching the builder when
/// no wallet is attached. `change_address` defaults to the wallet address.
pub async fn prepare_skeleton<B: TxBuilder>(
    builder: &B,
    mode: BalanceMode,
    change_address: Option<&str>,
    params: &SkeletonParams,
) -> Result<Skeleton, TxError> {
    let wallet = require_wallet(builder)?;
    let wallet_address = wallet.address().await?;
    let change_address = change_address.unwrap_or(wallet_address.as_str()).to_string();

    let (transaction, input) = match mode {
        BalanceMode::FakeInput => {
            let mut probe = builder.snapshot();
            let required = probe.evaluate_outputs().await?;
            let input = skeleton_utxo(&required, &wallet_address, params);
            log::debug!(
                "skeleton input: {} lovelace, {} native assets (outputs need {} lovelace)",
                input.assets.lovelace(),
                input.assets.tokens.len(),
                required.lovelace()
            );

            let mut pass = builder.snapshot();
            let tx = pass
                .complete(fake_input_options(input.clone(), &change_address, params))
                .await?;
            (tx, Some(input))
        }
        BalanceMode::Rebalance => {
            let mut pass = builder.snapshot();
            let tx = pass.complete(rebalance_options(&change_address)).await?;
            (tx, None)
        }
    };

    Ok(Skeleton {
        mode,
        transaction,
        wallet,
        wallet_address,
        change_address,
        input,
    })
}

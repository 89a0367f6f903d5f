//! Post-balance hash repair.
//!
//! The balancer rewrites the body, redeemers and possibly the data of a
//! transaction it balances, which leaves the script-data hash and the
//! auxiliary-data hash stale. Repair recomputes both and reassembles the
//! transaction. Nothing but those two body fields changes.

use crate::hash::{auxiliary_data_hash, script_data_hash, CostModels};
use crate::types::Transaction;
use crate::TxError;

/// Recompute the script-data hash and (if auxiliary data is attached) the
/// auxiliary-data hash of `tx`.
///
/// Fails with [`TxError::MissingRedeemers`] before any hashing when the
/// witness set has no redeemers, and with [`TxError::IntegrityHash`] when
/// the script-data hash cannot be computed.
pub fn repair_hashes(tx: &Transaction, cost_models: &CostModels) -> Result<Transaction, TxError> {
    let witness_set = &tx.witness_set;
    let redeemers = witness_set.redeemers().ok_or(TxError::MissingRedeemers)?;
    let datums = witness_set.plutus_data();
    let languages = witness_set.languages();

    let integrity = script_data_hash(redeemers, datums, cost_models, &languages)?;

    let mut body = tx.body.clone();
    body.set_script_data_hash(integrity);
    if let Some(aux) = &tx.auxiliary_data {
        body.set_auxiliary_data_hash(auxiliary_data_hash(aux)?);
    }

    log::debug!(
        "repaired hashes: script data {}, aux data {}",
        hex::encode(integrity),
        body.auxiliary_data_hash()
            .map(hex::encode)
            .unwrap_or_else(|| "none".into())
    );

    Ok(Transaction::new(
        body,
        tx.witness_set.clone(),
        tx.is_valid,
        tx.auxiliary_data.clone(),
    ))
}

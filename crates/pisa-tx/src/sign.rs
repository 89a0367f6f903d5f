//! Sign builder: a transaction bound to the wallet that will sign it.

use crate::builder::Wallet;
use crate::types::{Transaction, VKeyWitness};
use crate::TxError;
use std::fmt;
use std::sync::Arc;

/// A transaction ready for signature collection.
pub struct TxSignBuilder {
    wallet: Arc<dyn Wallet>,
    tx: Transaction,
    witnesses: Vec<VKeyWitness>,
}

impl TxSignBuilder {
    pub fn new(wallet: Arc<dyn Wallet>, tx: Transaction) -> Self {
        Self {
            wallet,
            tx,
            witnesses: Vec::new(),
        }
    }

    pub fn wallet(&self) -> &Arc<dyn Wallet> {
        &self.wallet
    }

    pub fn to_transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn into_transaction(self) -> Transaction {
        self.tx
    }

    pub fn to_cbor_hex(&self) -> Result<String, TxError> {
        self.tx.to_cbor_hex()
    }

    pub fn tx_hash(&self) -> Result<[u8; 32], TxError> {
        self.tx.hash()
    }

    /// Witnesses collected but not yet merged.
    pub fn pending_witnesses(&self) -> &[VKeyWitness] {
        &self.witnesses
    }

    /// Collect the bound wallet's witnesses.
    pub async fn sign_with_wallet(mut self) -> Result<Self, TxError> {
        let witnesses = self.wallet.sign_tx(&self.tx).await?;
        self.witnesses.extend(witnesses);
        Ok(self)
    }

    /// Collect an externally produced witness.
    pub fn sign_with_witness(mut self, witness: VKeyWitness) -> Self {
        self.witnesses.push(witness);
        self
    }

    /// Merge collected witnesses into the witness set. The result stays
    /// bound to the same wallet.
    pub async fn complete(self) -> Result<Self, TxError> {
        let mut tx = self.tx;
        tx.witness_set.add_vkey_witnesses(&self.witnesses);
        Ok(Self {
            wallet: self.wallet,
            tx,
            witnesses: Vec::new(),
        })
    }
}

impl fmt::Debug for TxSignBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxSignBuilder")
            .field("tx", &self.tx)
            .field("witnesses", &self.witnesses.len())
            .finish_non_exhaustive()
    }
}

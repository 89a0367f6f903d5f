//! Output references and unspent outputs.

use crate::asset::Assets;
use crate::constants::{OUT_REF_SEPARATOR, SKELETON_OUTPUT_INDEX, SKELETON_TX_HASH, TX_HASH_SIZE};
use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference to a transaction output: `(tx_hash, output_index)`.
///
/// Renders as `<64-hex tx hash>#<index>`, which is also its serde form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OutRef {
    pub tx_hash: [u8; TX_HASH_SIZE],
    pub output_index: u64,
}

impl OutRef {
    pub fn new(tx_hash: [u8; TX_HASH_SIZE], output_index: u64) -> Self {
        Self { tx_hash, output_index }
    }

    /// Parse from a hex transaction hash and an index.
    pub fn from_hex(tx_hash: &str, output_index: u64) -> Result<Self, TypesError> {
        let bytes = hex::decode(tx_hash)?;
        let tx_hash: [u8; TX_HASH_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            TypesError::InvalidOutRef(format!(
                "tx hash must be {} bytes, got {}",
                TX_HASH_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self { tx_hash, output_index })
    }

    pub fn tx_hash_hex(&self) -> String {
        hex::encode(self.tx_hash)
    }

    /// True for the placeholder reference of a skeleton input.
    pub fn is_skeleton(&self) -> bool {
        self.tx_hash == SKELETON_TX_HASH && self.output_index == SKELETON_OUTPUT_INDEX
    }
}

impl fmt::Display for OutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.tx_hash_hex(), OUT_REF_SEPARATOR, self.output_index)
    }
}

impl FromStr for OutRef {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hash, index) = s
            .split_once(OUT_REF_SEPARATOR)
            .ok_or_else(|| TypesError::InvalidOutRef(format!("missing '#' in {:?}", s)))?;
        let index: u64 = index
            .parse()
            .map_err(|_| TypesError::InvalidOutRef(format!("bad output index in {:?}", s)))?;
        Self::from_hex(hash, index)
    }
}

impl TryFrom<String> for OutRef {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<OutRef> for String {
    fn from(r: OutRef) -> Self {
        r.to_string()
    }
}

/// An unspent transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub out_ref: OutRef,
    /// Bech32 address holding the output.
    pub address: String,
    pub assets: Assets,
}

impl Utxo {
    /// Synthetic input used only to satisfy local balancing arithmetic.
    /// Never persisted; the balancer replaces it with real inputs.
    pub fn skeleton(address: &str, assets: Assets) -> Self {
        Self {
            out_ref: OutRef::new(SKELETON_TX_HASH, SKELETON_OUTPUT_INDEX),
            address: address.to_string(),
            assets,
        }
    }
}

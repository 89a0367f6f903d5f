//! Typed transaction structures.
//!
//! A transaction is the CBOR array `[body, witness_set, is_valid,
//! auxiliary_data]`. Body and witness set are integer-keyed maps; the
//! fields the balancing protocol reads or rewrites get typed accessors and
//! every other field is carried through as an opaque CBOR value.

use crate::TxError;
use ciborium::value::{Integer, Value};
use pisa_types::constants::TX_HASH_SIZE;
use pisa_types::OutRef;
use std::collections::BTreeMap;

// ─── Field Keys ─────────────────────────────────────────────────────────────

pub mod body_key {
    pub const INPUTS: u64 = 0;
    pub const OUTPUTS: u64 = 1;
    pub const FEE: u64 = 2;
    pub const TTL: u64 = 3;
    pub const CERTIFICATES: u64 = 4;
    pub const WITHDRAWALS: u64 = 5;
    pub const AUXILIARY_DATA_HASH: u64 = 7;
    pub const VALIDITY_START: u64 = 8;
    pub const MINT: u64 = 9;
    pub const SCRIPT_DATA_HASH: u64 = 11;
    pub const COLLATERAL: u64 = 13;
    pub const REQUIRED_SIGNERS: u64 = 14;
    pub const NETWORK_ID: u64 = 15;
    pub const COLLATERAL_RETURN: u64 = 16;
    pub const TOTAL_COLLATERAL: u64 = 17;
    pub const REFERENCE_INPUTS: u64 = 18;
}

pub mod witness_key {
    pub const VKEY: u64 = 0;
    pub const NATIVE_SCRIPT: u64 = 1;
    pub const BOOTSTRAP: u64 = 2;
    pub const PLUTUS_V1_SCRIPT: u64 = 3;
    pub const PLUTUS_DATA: u64 = 4;
    pub const REDEEMER: u64 = 5;
    pub const PLUTUS_V2_SCRIPT: u64 = 6;
    pub const PLUTUS_V3_SCRIPT: u64 = 7;
}

/// CBOR tag marking a set.
pub const SET_TAG: u64 = 258;

// ─── Helpers ────────────────────────────────────────────────────────────────

fn decode_int_map(value: Value, what: &str) -> Result<BTreeMap<u64, Value>, TxError> {
    let entries = match value {
        Value::Map(entries) => entries,
        other => {
            return Err(TxError::Invalid(format!(
                "{} must be a map, got {:?}",
                what,
                kind(&other)
            )))
        }
    };

    let mut fields = BTreeMap::new();
    for (key, val) in entries {
        let key = match key {
            Value::Integer(i) => u64::try_from(i)
                .map_err(|_| TxError::Invalid(format!("{} has a negative key", what)))?,
            other => {
                return Err(TxError::Invalid(format!(
                    "{} key must be an integer, got {:?}",
                    what,
                    kind(&other)
                )))
            }
        };
        if fields.insert(key, val).is_some() {
            return Err(TxError::Invalid(format!("{} has duplicate key {}", what, key)));
        }
    }
    Ok(fields)
}

fn encode_int_map(fields: &BTreeMap<u64, Value>) -> Value {
    Value::Map(
        fields
            .iter()
            .map(|(k, v)| (Value::Integer(Integer::from(*k)), v.clone()))
            .collect(),
    )
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Integer(_) => "integer",
        Value::Bytes(_) => "bytes",
        Value::Float(_) => "float",
        Value::Text(_) => "text",
        Value::Bool(_) => "bool",
        Value::Null => "null",
        Value::Tag(..) => "tag",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        _ => "unknown",
    }
}

/// Strip a set tag, if present.
fn untag_set(value: &Value) -> &Value {
    match value {
        Value::Tag(SET_TAG, inner) => inner.as_ref(),
        other => other,
    }
}

/// True for an empty array or map (set tag ignored).
pub(crate) fn is_empty_collection(value: &Value) -> bool {
    match untag_set(value) {
        Value::Array(items) => items.is_empty(),
        Value::Map(entries) => entries.is_empty(),
        _ => false,
    }
}

fn hash32(value: Option<&Value>) -> Option<[u8; 32]> {
    match value {
        Some(Value::Bytes(b)) => b.as_slice().try_into().ok(),
        _ => None,
    }
}

/// Encode a CBOR value to bytes.
pub fn encode_value(value: &Value) -> Result<Vec<u8>, TxError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)?;
    Ok(buf)
}

/// Decode exactly one CBOR value from `bytes`.
pub fn decode_value(bytes: &[u8]) -> Result<Value, TxError> {
    let mut reader = bytes;
    let value: Value = ciborium::from_reader(&mut reader)?;
    if !reader.is_empty() {
        return Err(TxError::Decode(format!(
            "{} trailing bytes after CBOR item",
            reader.len()
        )));
    }
    Ok(value)
}

// ─── Transaction Body ───────────────────────────────────────────────────────

/// Transaction body: integer-keyed field map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionBody {
    fields: BTreeMap<u64, Value>,
}

impl TransactionBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, TxError> {
        Ok(Self {
            fields: decode_int_map(value, "transaction body")?,
        })
    }

    pub fn to_value(&self) -> Value {
        encode_int_map(&self.fields)
    }

    pub fn get(&self, key: u64) -> Option<&Value> {
        self.fields.get(&key)
    }

    pub fn set(&mut self, key: u64, value: Value) {
        self.fields.insert(key, value);
    }

    pub fn remove(&mut self, key: u64) -> Option<Value> {
        self.fields.remove(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.fields.keys().copied()
    }

    pub fn fee(&self) -> Option<u64> {
        match self.fields.get(&body_key::FEE) {
            Some(Value::Integer(i)) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn script_data_hash(&self) -> Option<[u8; 32]> {
        hash32(self.fields.get(&body_key::SCRIPT_DATA_HASH))
    }

    pub fn set_script_data_hash(&mut self, hash: [u8; 32]) {
        self.set(body_key::SCRIPT_DATA_HASH, Value::Bytes(hash.to_vec()));
    }

    pub fn auxiliary_data_hash(&self) -> Option<[u8; 32]> {
        hash32(self.fields.get(&body_key::AUXILIARY_DATA_HASH))
    }

    pub fn set_auxiliary_data_hash(&mut self, hash: [u8; 32]) {
        self.set(body_key::AUXILIARY_DATA_HASH, Value::Bytes(hash.to_vec()));
    }

    /// Spent inputs, in encoded order.
    pub fn inputs(&self) -> Result<Vec<OutRef>, TxError> {
        let Some(value) = self.fields.get(&body_key::INPUTS) else {
            return Ok(Vec::new());
        };
        let items = match untag_set(value) {
            Value::Array(items) => items,
            other => {
                return Err(TxError::Invalid(format!(
                    "inputs must be an array, got {:?}",
                    kind(other)
                )))
            }
        };
        items.iter().map(decode_input).collect()
    }

    /// Number of outputs.
    pub fn output_count(&self) -> usize {
        match self.fields.get(&body_key::OUTPUTS) {
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        }
    }
}

fn decode_input(value: &Value) -> Result<OutRef, TxError> {
    match value {
        Value::Array(pair) if pair.len() == 2 => {
            let tx_hash: [u8; TX_HASH_SIZE] = match &pair[0] {
                Value::Bytes(b) => b
                    .as_slice()
                    .try_into()
                    .map_err(|_| TxError::Invalid("input tx hash must be 32 bytes".into()))?,
                _ => return Err(TxError::Invalid("input tx hash must be bytes".into())),
            };
            let index = match &pair[1] {
                Value::Integer(i) => u64::try_from(*i)
                    .map_err(|_| TxError::Invalid("negative input index".into()))?,
                _ => return Err(TxError::Invalid("input index must be an integer".into())),
            };
            Ok(OutRef::new(tx_hash, index))
        }
        _ => Err(TxError::Invalid("input must be [tx_hash, index]".into())),
    }
}

/// Encode an `OutRef` as a body input.
pub fn encode_input(out_ref: &OutRef) -> Value {
    Value::Array(vec![
        Value::Bytes(out_ref.tx_hash.to_vec()),
        Value::Integer(Integer::from(out_ref.output_index)),
    ])
}

// ─── Witness Set ────────────────────────────────────────────────────────────

/// A verification key witness: `[vkey, signature]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VKeyWitness {
    pub vkey: Vec<u8>,
    pub signature: Vec<u8>,
}

impl VKeyWitness {
    pub fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::Bytes(self.vkey.clone()),
            Value::Bytes(self.signature.clone()),
        ])
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(pair) if pair.len() == 2 => match (&pair[0], &pair[1]) {
                (Value::Bytes(vkey), Value::Bytes(signature)) => Some(Self {
                    vkey: vkey.clone(),
                    signature: signature.clone(),
                }),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Transaction witness set: integer-keyed field map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WitnessSet {
    fields: BTreeMap<u64, Value>,
}

impl WitnessSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, TxError> {
        Ok(Self {
            fields: decode_int_map(value, "witness set")?,
        })
    }

    pub fn to_value(&self) -> Value {
        encode_int_map(&self.fields)
    }

    pub fn get(&self, key: u64) -> Option<&Value> {
        self.fields.get(&key)
    }

    pub fn set(&mut self, key: u64, value: Value) {
        self.fields.insert(key, value);
    }

    /// Redeemers, or `None` when the field is absent or empty.
    pub fn redeemers(&self) -> Option<&Value> {
        self.fields
            .get(&witness_key::REDEEMER)
            .filter(|v| !is_empty_collection(v))
    }

    /// Attached Plutus data, or `None` when absent or empty.
    pub fn plutus_data(&self) -> Option<&Value> {
        self.fields
            .get(&witness_key::PLUTUS_DATA)
            .filter(|v| !is_empty_collection(v))
    }

    /// Plutus languages of the scripts attached to this witness set.
    pub fn languages(&self) -> Vec<crate::hash::Language> {
        use crate::hash::Language;
        [
            (witness_key::PLUTUS_V1_SCRIPT, Language::PlutusV1),
            (witness_key::PLUTUS_V2_SCRIPT, Language::PlutusV2),
            (witness_key::PLUTUS_V3_SCRIPT, Language::PlutusV3),
        ]
        .into_iter()
        .filter(|(key, _)| {
            self.fields
                .get(key)
                .is_some_and(|v| !is_empty_collection(v))
        })
        .map(|(_, lang)| lang)
        .collect()
    }

    pub fn vkey_witnesses(&self) -> Vec<VKeyWitness> {
        match self.fields.get(&witness_key::VKEY).map(untag_set) {
            Some(Value::Array(items)) => items.iter().filter_map(VKeyWitness::from_value).collect(),
            _ => Vec::new(),
        }
    }

    /// Add witnesses, skipping keys already present. Keeps the set tag if
    /// the existing field carried one.
    pub fn add_vkey_witnesses(&mut self, witnesses: &[VKeyWitness]) {
        if witnesses.is_empty() {
            return;
        }
        let tagged = matches!(
            self.fields.get(&witness_key::VKEY),
            Some(Value::Tag(SET_TAG, _))
        );
        let mut all = self.vkey_witnesses();
        for w in witnesses {
            if !all.iter().any(|existing| existing.vkey == w.vkey) {
                all.push(w.clone());
            }
        }
        let list = Value::Array(all.iter().map(VKeyWitness::to_value).collect());
        let value = if tagged {
            Value::Tag(SET_TAG, Box::new(list))
        } else {
            list
        };
        self.fields.insert(witness_key::VKEY, value);
    }
}

// ─── Transaction ────────────────────────────────────────────────────────────

/// Complete transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub body: TransactionBody,
    pub witness_set: WitnessSet,
    pub is_valid: bool,
    pub auxiliary_data: Option<Value>,
}

impl Transaction {
    pub fn new(
        body: TransactionBody,
        witness_set: WitnessSet,
        is_valid: bool,
        auxiliary_data: Option<Value>,
    ) -> Self {
        Self {
            body,
            witness_set,
            is_valid,
            auxiliary_data,
        }
    }

    pub fn from_value(value: Value) -> Result<Self, TxError> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(TxError::Invalid(format!(
                    "transaction must be an array, got {:?}",
                    kind(&other)
                )))
            }
        };

        let mut items = items.into_iter();
        let (body, witness_set, is_valid, auxiliary_data) = match items.len() {
            // Pre-Alonzo: [body, witness_set, auxiliary_data]
            3 => {
                let body = items.next().unwrap_or(Value::Null);
                let witnesses = items.next().unwrap_or(Value::Null);
                (body, witnesses, true, items.next().unwrap_or(Value::Null))
            }
            4 => {
                let body = items.next().unwrap_or(Value::Null);
                let witnesses = items.next().unwrap_or(Value::Null);
                let is_valid = match items.next() {
                    Some(Value::Bool(b)) => b,
                    _ => return Err(TxError::Invalid("is_valid must be a bool".into())),
                };
                (body, witnesses, is_valid, items.next().unwrap_or(Value::Null))
            }
            n => {
                return Err(TxError::Invalid(format!(
                    "transaction must have 3 or 4 elements, got {}",
                    n
                )))
            }
        };

        Ok(Self {
            body: TransactionBody::from_value(body)?,
            witness_set: WitnessSet::from_value(witness_set)?,
            is_valid,
            auxiliary_data: match auxiliary_data {
                Value::Null => None,
                aux => Some(aux),
            },
        })
    }

    pub fn to_value(&self) -> Value {
        Value::Array(vec![
            self.body.to_value(),
            self.witness_set.to_value(),
            Value::Bool(self.is_valid),
            self.auxiliary_data.clone().unwrap_or(Value::Null),
        ])
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, TxError> {
        Self::from_value(decode_value(bytes)?)
    }

    pub fn from_cbor_hex(hex_str: &str) -> Result<Self, TxError> {
        Self::from_cbor(&hex::decode(hex_str.trim())?)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, TxError> {
        encode_value(&self.to_value())
    }

    pub fn to_cbor_hex(&self) -> Result<String, TxError> {
        Ok(hex::encode(self.to_cbor()?))
    }

    /// Transaction id: Blake2b-256 of the encoded body.
    pub fn hash(&self) -> Result<[u8; 32], TxError> {
        Ok(crate::hash::blake2b_256(&encode_value(&self.body.to_value())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_body() -> TransactionBody {
        let mut body = TransactionBody::new();
        body.set(
            body_key::INPUTS,
            Value::Tag(
                SET_TAG,
                Box::new(Value::Array(vec![encode_input(&OutRef::new([7u8; 32], 2))])),
            ),
        );
        body.set(
            body_key::OUTPUTS,
            Value::Array(vec![Value::Array(vec![
                Value::Bytes(vec![0x60; 29]),
                Value::Integer(3_000_000u64.into()),
            ])]),
        );
        body.set(body_key::FEE, Value::Integer(180_000u64.into()));
        body
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let tx = Transaction::new(sample_body(), WitnessSet::new(), true, None);
        let bytes = tx.to_cbor().unwrap();
        let decoded = Transaction::from_cbor(&bytes).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.body.fee(), Some(180_000));
        assert_eq!(decoded.body.output_count(), 1);
        assert_eq!(decoded.body.inputs().unwrap(), vec![OutRef::new([7u8; 32], 2)]);
    }

    #[test]
    fn test_encoding_is_canonical_map_order() {
        let mut body = TransactionBody::new();
        body.set(body_key::FEE, Value::Integer(1u64.into()));
        body.set(body_key::INPUTS, Value::Array(vec![]));
        let bytes = encode_value(&body.to_value()).unwrap();
        // map(2), key 0, [], key 2, 1
        assert_eq!(bytes, vec![0xa2, 0x00, 0x80, 0x02, 0x01]);
    }

    #[test]
    fn test_pre_alonzo_layout() {
        let value = Value::Array(vec![
            sample_body().to_value(),
            Value::Map(vec![]),
            Value::Null,
        ]);
        let tx = Transaction::from_value(value).unwrap();
        assert!(tx.is_valid);
        assert!(tx.auxiliary_data.is_none());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(Transaction::from_value(Value::Map(vec![])).is_err());
        assert!(Transaction::from_value(Value::Array(vec![Value::Null])).is_err());
        let bad_key = Value::Map(vec![(Value::Text("fee".into()), Value::Null)]);
        assert!(TransactionBody::from_value(bad_key).is_err());
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let tx = Transaction::new(sample_body(), WitnessSet::new(), true, None);
        let mut bytes = tx.to_cbor().unwrap();
        bytes.push(0x00);
        assert!(Transaction::from_cbor(&bytes).is_err());
    }

    #[test]
    fn test_hash_fields() {
        let mut body = sample_body();
        assert!(body.script_data_hash().is_none());
        body.set_script_data_hash([1u8; 32]);
        body.set_auxiliary_data_hash([2u8; 32]);
        assert_eq!(body.script_data_hash(), Some([1u8; 32]));
        assert_eq!(body.auxiliary_data_hash(), Some([2u8; 32]));
    }

    #[test]
    fn test_empty_redeemers_count_as_missing() {
        let mut ws = WitnessSet::new();
        assert!(ws.redeemers().is_none());
        ws.set(witness_key::REDEEMER, Value::Array(vec![]));
        assert!(ws.redeemers().is_none());
        ws.set(witness_key::REDEEMER, Value::Map(vec![]));
        assert!(ws.redeemers().is_none());
    }

    #[test]
    fn test_add_vkey_witnesses_dedupes_and_keeps_tag() {
        let mut ws = WitnessSet::new();
        ws.set(witness_key::VKEY, Value::Tag(SET_TAG, Box::new(Value::Array(vec![]))));
        let w = VKeyWitness {
            vkey: vec![1; 32],
            signature: vec![2; 64],
        };
        ws.add_vkey_witnesses(&[w.clone(), w.clone()]);
        ws.add_vkey_witnesses(&[w.clone()]);
        assert_eq!(ws.vkey_witnesses(), vec![w]);
        assert!(matches!(ws.get(witness_key::VKEY), Some(Value::Tag(SET_TAG, _))));
    }

    #[test]
    fn test_languages_from_scripts() {
        use crate::hash::Language;
        let mut ws = WitnessSet::new();
        ws.set(witness_key::PLUTUS_V2_SCRIPT, Value::Array(vec![Value::Bytes(vec![1])]));
        ws.set(witness_key::PLUTUS_V1_SCRIPT, Value::Array(vec![]));
        assert_eq!(ws.languages(), vec![Language::PlutusV2]);
    }
}

//! Script-data and auxiliary-data hashing.
//!
//! The script-data (integrity) hash commits to the redeemers, the attached
//! Plutus data and the cost models of every Plutus language in use:
//!
//! ```text
//! blake2b_256(redeemers || datums || language_views)
//! ```
//!
//! `datums` is omitted when no data is attached. Language views are a CBOR
//! map in canonical key order. PlutusV1 keeps its historical encoding: the
//! key is a byte string holding the encoded language id and the value is a
//! byte string holding an indefinite-length list of costs.

use crate::types::{encode_value, is_empty_collection};
use crate::TxError;
use ciborium::value::Value;
use ciborium_ll::{Encoder, Header};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Output size of every hash in this module.
pub const HASH_SIZE: usize = 32;

/// Blake2b-256.
pub fn blake2b_256(data: &[u8]) -> [u8; HASH_SIZE] {
    let hash = blake2b_simd::Params::new().hash_length(HASH_SIZE).hash(data);
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(hash.as_bytes());
    out
}

/// Plutus language version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    PlutusV1,
    PlutusV2,
    PlutusV3,
}

impl Language {
    /// Ledger language id.
    pub fn id(self) -> u64 {
        match self {
            Self::PlutusV1 => 0,
            Self::PlutusV2 => 1,
            Self::PlutusV3 => 2,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Protocol cost-model table, keyed by language.
///
/// JSON form: `{"PlutusV1": [..], "PlutusV2": [..], "PlutusV3": [..]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostModels(BTreeMap<Language, Vec<i64>>);

impl CostModels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, language: Language, costs: Vec<i64>) -> Self {
        self.0.insert(language, costs);
        self
    }

    pub fn insert(&mut self, language: Language, costs: Vec<i64>) {
        self.0.insert(language, costs);
    }

    pub fn get(&self, language: Language) -> Option<&[i64]> {
        self.0.get(&language).map(Vec::as_slice)
    }

    pub fn from_json(json: &str) -> Result<Self, TxError> {
        serde_json::from_str(json).map_err(|e| TxError::Other(format!("cost models: {}", e)))
    }
}

// ─── Language views ─────────────────────────────────────────────────────────

type ViewEncoder<'a> = Encoder<&'a mut Vec<u8>>;

fn cbor_err<E: fmt::Debug>(err: E) -> TxError {
    TxError::IntegrityHash(format!("language view encoding: {:?}", err))
}

fn encode_with<F>(f: F) -> Result<Vec<u8>, TxError>
where
    F: FnOnce(&mut ViewEncoder<'_>) -> Result<(), TxError>,
{
    let mut out = Vec::new();
    f(&mut Encoder::from(&mut out))?;
    Ok(out)
}

fn push_int(enc: &mut ViewEncoder<'_>, v: i64) -> Result<(), TxError> {
    let header = if v >= 0 {
        Header::Positive(v as u64)
    } else {
        Header::Negative((-1 - v) as u64)
    };
    enc.push(header).map_err(cbor_err)
}

/// Encode the language views of `languages` against `cost_models`.
pub fn encode_language_views(
    cost_models: &CostModels,
    languages: &[Language],
) -> Result<Vec<u8>, TxError> {
    let mut entries: Vec<(Vec<u8>, Vec<u8>)> = Vec::with_capacity(languages.len());

    for &language in languages {
        let costs = cost_models.get(language).ok_or_else(|| {
            TxError::IntegrityHash(format!("no cost model for {}", language))
        })?;

        let entry = match language {
            Language::PlutusV1 => {
                let encoded_id =
                    encode_with(|enc| enc.push(Header::Positive(language.id())).map_err(cbor_err))?;
                let list = encode_with(|enc| {
                    enc.push(Header::Array(None)).map_err(cbor_err)?;
                    for &c in costs {
                        push_int(enc, c)?;
                    }
                    enc.push(Header::Break).map_err(cbor_err)
                })?;
                (
                    encode_with(|enc| enc.bytes(&encoded_id, None).map_err(cbor_err))?,
                    encode_with(|enc| enc.bytes(&list, None).map_err(cbor_err))?,
                )
            }
            Language::PlutusV2 | Language::PlutusV3 => (
                encode_with(|enc| enc.push(Header::Positive(language.id())).map_err(cbor_err))?,
                encode_with(|enc| {
                    enc.push(Header::Array(Some(costs.len()))).map_err(cbor_err)?;
                    for &c in costs {
                        push_int(enc, c)?;
                    }
                    Ok(())
                })?,
            ),
        };
        entries.push(entry);
    }

    entries.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(&b.0)));
    entries.dedup_by(|a, b| a.0 == b.0);

    let mut out =
        encode_with(|enc| enc.push(Header::Map(Some(entries.len()))).map_err(cbor_err))?;
    for (key, value) in entries {
        out.extend_from_slice(&key);
        out.extend_from_slice(&value);
    }
    Ok(out)
}

/// Compute the script-data hash.
///
/// `redeemers` must be non-empty; an empty or missing datum list is
/// omitted from the preimage.
pub fn script_data_hash(
    redeemers: &Value,
    datums: Option<&Value>,
    cost_models: &CostModels,
    languages: &[Language],
) -> Result<[u8; HASH_SIZE], TxError> {
    if is_empty_collection(redeemers) {
        return Err(TxError::MissingRedeemers);
    }

    let mut preimage = encode_value(redeemers)
        .map_err(|e| TxError::IntegrityHash(format!("redeemers: {}", e)))?;
    if let Some(datums) = datums.filter(|d| !is_empty_collection(d)) {
        let encoded =
            encode_value(datums).map_err(|e| TxError::IntegrityHash(format!("datums: {}", e)))?;
        preimage.extend_from_slice(&encoded);
    }
    preimage.extend_from_slice(&encode_language_views(cost_models, languages)?);

    Ok(blake2b_256(&preimage))
}

/// Hash of encoded auxiliary data.
pub fn auxiliary_data_hash(auxiliary_data: &Value) -> Result<[u8; HASH_SIZE], TxError> {
    Ok(blake2b_256(&encode_value(auxiliary_data)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake2b_256_empty() {
        assert_eq!(
            hex::encode(blake2b_256(b"")),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn test_int_header_boundaries() {
        let out = encode_with(|enc| {
            for v in [23, 24, 256, 65_536] {
                push_int(enc, v)?;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(
            out,
            vec![0x17, 0x18, 0x18, 0x19, 0x01, 0x00, 0x1a, 0x00, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn test_negative_int() {
        let out = encode_with(|enc| {
            push_int(enc, -1)?;
            push_int(enc, -25)?;
            push_int(enc, i64::MIN)
        })
        .unwrap();
        assert_eq!(&out[..3], &[0x20, 0x38, 0x18]);
        assert_eq!(out[3], 0x3b);
        assert_eq!(&out[4..], &i64::MAX.to_be_bytes());
    }

    #[test]
    fn test_language_views_v2() {
        let models = CostModels::new().with(Language::PlutusV2, vec![1, 2, -3]);
        let views = encode_language_views(&models, &[Language::PlutusV2]).unwrap();
        // {1: [1, 2, -3]}
        assert_eq!(views, vec![0xa1, 0x01, 0x83, 0x01, 0x02, 0x22]);
    }

    #[test]
    fn test_language_views_v1_double_bagged() {
        let models = CostModels::new().with(Language::PlutusV1, vec![5]);
        let views = encode_language_views(&models, &[Language::PlutusV1]).unwrap();
        // {h'00': h'9f05ff'}
        assert_eq!(views, vec![0xa1, 0x41, 0x00, 0x43, 0x9f, 0x05, 0xff]);
    }

    #[test]
    fn test_language_views_canonical_order() {
        let models = CostModels::new()
            .with(Language::PlutusV1, vec![])
            .with(Language::PlutusV2, vec![])
            .with(Language::PlutusV3, vec![]);
        let views = encode_language_views(
            &models,
            &[Language::PlutusV1, Language::PlutusV3, Language::PlutusV2],
        )
        .unwrap();
        // V2 (key 0x01) and V3 (key 0x02) sort before V1 (two-byte key).
        assert_eq!(
            views,
            vec![0xa3, 0x01, 0x80, 0x02, 0x80, 0x41, 0x00, 0x42, 0x9f, 0xff]
        );
    }

    #[test]
    fn test_language_views_empty() {
        let views = encode_language_views(&CostModels::new(), &[]).unwrap();
        assert_eq!(views, vec![0xa0]);
    }

    #[test]
    fn test_missing_cost_model() {
        let err = encode_language_views(&CostModels::new(), &[Language::PlutusV3]).unwrap_err();
        assert!(matches!(err, TxError::IntegrityHash(_)));
    }

    #[test]
    fn test_script_data_hash_preimage() {
        let redeemers = Value::Array(vec![Value::Array(vec![
            Value::Integer(0u64.into()),
            Value::Integer(0u64.into()),
            Value::Tag(121, Box::new(Value::Array(vec![]))),
            Value::Array(vec![Value::Integer(1000u64.into()), Value::Integer(2000u64.into())]),
        ])]);
        let models = CostModels::new().with(Language::PlutusV2, vec![1]);
        let hash = script_data_hash(&redeemers, None, &models, &[Language::PlutusV2]).unwrap();

        let mut preimage = encode_value(&redeemers).unwrap();
        preimage.extend_from_slice(&[0xa1, 0x01, 0x81, 0x01]);
        assert_eq!(hash, blake2b_256(&preimage));

        // Empty datum list does not change the preimage.
        let empty = Value::Array(vec![]);
        let same =
            script_data_hash(&redeemers, Some(&empty), &models, &[Language::PlutusV2]).unwrap();
        assert_eq!(hash, same);

        let datums = Value::Array(vec![Value::Integer(42u64.into())]);
        let with_datums =
            script_data_hash(&redeemers, Some(&datums), &models, &[Language::PlutusV2]).unwrap();
        assert_ne!(hash, with_datums);
    }

    #[test]
    fn test_cost_models_json() {
        let models = CostModels::from_json(r#"{"PlutusV2": [1, -2], "PlutusV1": []}"#).unwrap();
        assert_eq!(models.get(Language::PlutusV2), Some(&[1i64, -2][..]));
        assert_eq!(models.get(Language::PlutusV1), Some(&[][..]));
        assert!(models.get(Language::PlutusV3).is_none());
    }
}

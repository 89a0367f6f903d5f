//! Asset units and asset bags.
//!
//! A native asset is identified by a 28-byte policy id followed by an
//! asset name of up to 32 bytes. Units are written as the concatenated hex
//! of both parts (`<policy><name>`); on the balancer wire the two parts are
//! joined by a `.` separator instead.

use crate::constants::{
    ASSET_ID_SEPARATOR, LOVELACE, MAX_ASSET_NAME_SIZE, POLICY_ID_HEX_LEN, POLICY_ID_SIZE,
};
use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of a native (non-lovelace) asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetUnit {
    pub policy_id: [u8; POLICY_ID_SIZE],
    pub name: Vec<u8>,
}

impl AssetUnit {
    pub fn new(policy_id: [u8; POLICY_ID_SIZE], name: Vec<u8>) -> Result<Self, TypesError> {
        if name.len() > MAX_ASSET_NAME_SIZE {
            return Err(TypesError::InvalidUnit(format!(
                "asset name is {} bytes, max {}",
                name.len(),
                MAX_ASSET_NAME_SIZE
            )));
        }
        Ok(Self { policy_id, name })
    }

    /// Parse a concatenated `<policy hex><name hex>` unit.
    pub fn from_unit(unit: &str) -> Result<Self, TypesError> {
        if unit == LOVELACE {
            return Err(TypesError::InvalidUnit("lovelace is not a native asset".into()));
        }
        if unit.len() < POLICY_ID_HEX_LEN || !unit.is_char_boundary(POLICY_ID_HEX_LEN) {
            return Err(TypesError::InvalidUnit(format!(
                "unit {:?} shorter than a {}-char policy id",
                unit, POLICY_ID_HEX_LEN
            )));
        }
        let (policy, name) = unit.split_at(POLICY_ID_HEX_LEN);
        Self::from_parts(policy, name)
    }

    /// Parse the wire form `<policy hex>.<name hex>`.
    pub fn from_wire(id: &str) -> Result<Self, TypesError> {
        let (policy, name) = id.split_once(ASSET_ID_SEPARATOR).ok_or_else(|| {
            TypesError::InvalidUnit(format!("missing '{}' in {:?}", ASSET_ID_SEPARATOR, id))
        })?;
        if policy.len() != POLICY_ID_HEX_LEN {
            return Err(TypesError::InvalidUnit(format!(
                "policy id must be {} hex chars, got {}",
                POLICY_ID_HEX_LEN,
                policy.len()
            )));
        }
        Self::from_parts(policy, name)
    }

    fn from_parts(policy: &str, name: &str) -> Result<Self, TypesError> {
        let mut policy_id = [0u8; POLICY_ID_SIZE];
        hex::decode_to_slice(policy, &mut policy_id)?;
        Self::new(policy_id, hex::decode(name)?)
    }

    pub fn policy_hex(&self) -> String {
        hex::encode(self.policy_id)
    }

    pub fn name_hex(&self) -> String {
        hex::encode(&self.name)
    }

    /// Concatenated `<policy><name>` hex.
    pub fn to_unit(&self) -> String {
        format!("{}{}", self.policy_hex(), self.name_hex())
    }

    /// `<policy>.<name>` as sent to the balancer.
    pub fn to_wire(&self) -> String {
        format!("{}{}{}", self.policy_hex(), ASSET_ID_SEPARATOR, self.name_hex())
    }
}

impl fmt::Display for AssetUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_unit())
    }
}

impl FromStr for AssetUnit {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(ASSET_ID_SEPARATOR) {
            Self::from_wire(s)
        } else {
            Self::from_unit(s)
        }
    }
}

impl TryFrom<String> for AssetUnit {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_unit(&s)
    }
}

impl From<AssetUnit> for String {
    fn from(u: AssetUnit) -> Self {
        u.to_unit()
    }
}

/// A bag of lovelace plus native assets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assets {
    pub lovelace: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tokens: BTreeMap<AssetUnit, u64>,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lovelace(lovelace: u64) -> Self {
        Self {
            lovelace,
            tokens: BTreeMap::new(),
        }
    }

    pub fn lovelace(&self) -> u64 {
        self.lovelace
    }

    pub fn with_token(mut self, unit: AssetUnit, quantity: u64) -> Self {
        self.add_token(unit, quantity);
        self
    }

    /// Add `quantity` of `unit`. Zero quantities are not stored.
    pub fn add_token(&mut self, unit: AssetUnit, quantity: u64) {
        if quantity == 0 {
            return;
        }
        let entry = self.tokens.entry(unit).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    pub fn token(&self, unit: &AssetUnit) -> u64 {
        self.tokens.get(unit).copied().unwrap_or(0)
    }

    /// Iterate the non-lovelace part of the bag.
    pub fn tokens(&self) -> impl Iterator<Item = (&AssetUnit, u64)> {
        self.tokens.iter().map(|(u, q)| (u, *q))
    }

    pub fn merge(&mut self, other: &Assets) {
        self.lovelace = self.lovelace.saturating_add(other.lovelace);
        for (unit, quantity) in other.tokens() {
            self.add_token(unit.clone(), quantity);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lovelace == 0 && self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = "c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00";

    #[test]
    fn test_unit_parse_and_wire_form() {
        let unit = AssetUnit::from_unit(&format!("{}{}", POLICY, "4d494e")).unwrap();
        assert_eq!(unit.policy_hex(), POLICY);
        assert_eq!(unit.name, b"MIN".to_vec());
        assert_eq!(unit.to_wire(), format!("{}.4d494e", POLICY));
        assert_eq!(AssetUnit::from_wire(&unit.to_wire()).unwrap(), unit);
    }

    #[test]
    fn test_unit_with_empty_name() {
        let unit = AssetUnit::from_unit(POLICY).unwrap();
        assert!(unit.name.is_empty());
        assert_eq!(unit.to_wire(), format!("{}.", POLICY));
    }

    #[test]
    fn test_unit_rejects_bad_input() {
        assert!(AssetUnit::from_unit("lovelace").is_err());
        assert!(AssetUnit::from_unit("abcd").is_err());
        assert!(AssetUnit::from_unit(&format!("{}zz", POLICY)).is_err());
        assert!(AssetUnit::from_unit(&format!("{}{}", POLICY, "00".repeat(33))).is_err());
        assert!(AssetUnit::from_wire(&format!("{}00.4d", POLICY)).is_err());
    }

    #[test]
    fn test_unit_from_str_accepts_both_forms() {
        let a: AssetUnit = format!("{}4d", POLICY).parse().unwrap();
        let b: AssetUnit = format!("{}.4d", POLICY).parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_assets_merge() {
        let unit = AssetUnit::from_unit(POLICY).unwrap();
        let mut a = Assets::from_lovelace(1_000_000).with_token(unit.clone(), 5);
        let b = Assets::from_lovelace(2_000_000).with_token(unit.clone(), 7);
        a.merge(&b);
        assert_eq!(a.lovelace(), 3_000_000);
        assert_eq!(a.token(&unit), 12);
    }

    #[test]
    fn test_zero_tokens_not_stored() {
        let unit = AssetUnit::from_unit(POLICY).unwrap();
        let a = Assets::new().with_token(unit, 0);
        assert!(a.is_empty());
    }

    #[test]
    fn test_assets_json_shape() {
        let unit = AssetUnit::from_unit(&format!("{}01", POLICY)).unwrap();
        let a = Assets::from_lovelace(10).with_token(unit, 2);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["lovelace"], 10);
        assert_eq!(json["tokens"][format!("{}01", POLICY)], 2);
    }
}

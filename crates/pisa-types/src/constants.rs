//! Protocol constants for skeleton inputs and asset identifiers.

use serde::{Deserialize, Serialize};

/// Unit name of the native coin in an asset bag.
pub const LOVELACE: &str = "lovelace";

/// Policy id length in bytes.
pub const POLICY_ID_SIZE: usize = 28;

/// Policy id length in hex characters.
pub const POLICY_ID_HEX_LEN: usize = POLICY_ID_SIZE * 2;

/// Maximum asset name length in bytes.
pub const MAX_ASSET_NAME_SIZE: usize = 32;

/// Transaction hash length in bytes.
pub const TX_HASH_SIZE: usize = 32;

/// Separator between policy id and asset name on the wire.
pub const ASSET_ID_SEPARATOR: char = '.';

/// Separator between transaction hash and output index in a rendered `OutRef`.
pub const OUT_REF_SEPARATOR: char = '#';

/// Placeholder transaction hash of the skeleton input. The balancer
/// recognises it and replaces it with real wallet inputs.
pub const SKELETON_TX_HASH: [u8; TX_HASH_SIZE] = [0u8; TX_HASH_SIZE];

/// Output index of the skeleton input.
pub const SKELETON_OUTPUT_INDEX: u64 = 0;

/// Lovelace reserved for collateral while sizing the skeleton input.
pub const DEFAULT_COLLATERAL_RESERVE: u64 = 5_000_000;

/// Fee buffer of the compact profile.
pub const FEE_BUFFER_COMPACT: u64 = 2_000_000;

/// Fee buffer of the standard profile.
pub const FEE_BUFFER_STANDARD: u64 = 4_000_000;

/// How much lovelace the skeleton input carries on top of outputs and
/// collateral to cover the locally estimated fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeProfile {
    /// Small transactions without heavy script execution.
    Compact,
    /// Script-heavy transactions.
    #[default]
    Standard,
}

impl FeeProfile {
    pub fn fee_buffer(self) -> u64 {
        match self {
            Self::Compact => FEE_BUFFER_COMPACT,
            Self::Standard => FEE_BUFFER_STANDARD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_profiles() {
        assert_eq!(FeeProfile::Compact.fee_buffer(), 2_000_000);
        assert_eq!(FeeProfile::Standard.fee_buffer(), 4_000_000);
        assert_eq!(FeeProfile::default(), FeeProfile::Standard);
    }

    #[test]
    fn test_skeleton_hash_is_zero() {
        assert_eq!(hex::encode(SKELETON_TX_HASH), "0".repeat(64));
    }
}

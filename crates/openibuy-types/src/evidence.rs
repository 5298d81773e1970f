//! Validated on-chain value formats
//!
//! Transaction hashes bridge the off-chain service and the settlement
//! layer: an operator signs a transaction elsewhere and pastes the hash
//! back in. These newtypes guarantee a value that reaches the wire has
//! already passed the format check.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

fn is_0x_hex(raw: &str, hex_len: usize) -> bool {
    let Some(body) = raw.strip_prefix("0x") else {
        return false;
    };
    body.len() == hex_len && body.chars().all(|c| c.is_ascii_hexdigit())
}

/// A settlement transaction hash: `0x` followed by 64 hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    /// Validate and wrap a raw hash string.
    pub fn parse(raw: &str) -> Result<Self, FormatError> {
        let trimmed = raw.trim();
        if is_0x_hex(trimmed, 64) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(FormatError::InvalidTxHash {
                value: raw.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An EVM-style wallet address: `0x` followed by 40 hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Validate and wrap a raw address string.
    pub fn parse(raw: &str) -> Result<Self, FormatError> {
        let trimmed = raw.trim();
        if is_0x_hex(trimmed, 40) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(FormatError::InvalidWalletAddress {
                value: raw.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive address comparison.
    ///
    /// Checksummed and lowercased renderings of the same address compare
    /// equal.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three escrow settlement steps an operator can evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscrowAction {
    /// Escrow contract instantiation
    Create,
    /// Funding the escrow with the payment token
    Fund,
    /// Buyer-side receipt confirmation
    Confirm,
}

impl EscrowAction {
    /// Wire name used as the `action` argument of `submit_tx`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Fund => "fund",
            Self::Confirm => "confirm",
        }
    }
}

impl fmt::Display for EscrowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_HASH: &str =
        "0x9fe2c4e93f654cdd2ebf25a1aab5b0ba5be4dbd2c12cd3a862ee5b2b9e1a0f01";

    #[test]
    fn test_tx_hash_accepts_64_hex() {
        let hash = TxHash::parse(GOOD_HASH).unwrap();
        assert_eq!(hash.as_str(), GOOD_HASH);
    }

    #[test]
    fn test_tx_hash_rejects_short_input() {
        // 0xDEADBEEF is well-formed hex but far too short
        let err = TxHash::parse("0xDEADBEEF").unwrap_err();
        assert!(matches!(err, FormatError::InvalidTxHash { .. }));
    }

    #[test]
    fn test_tx_hash_rejects_missing_prefix_and_non_hex() {
        assert!(TxHash::parse(&GOOD_HASH[2..]).is_err());
        let non_hex = format!("0x{}", "g".repeat(64));
        assert!(TxHash::parse(&non_hex).is_err());
    }

    #[test]
    fn test_wallet_address_case_insensitive_match() {
        let addr = WalletAddress::parse("0xAbCd000000000000000000000000000000001234").unwrap();
        assert!(addr.matches("0xabcd000000000000000000000000000000001234"));
        assert!(!addr.matches("0xabcd000000000000000000000000000000009999"));
    }

    #[test]
    fn test_wallet_address_rejects_wrong_length() {
        assert!(WalletAddress::parse("0x1234").is_err());
    }

    #[test]
    fn test_escrow_action_wire_names() {
        assert_eq!(EscrowAction::Create.as_str(), "create");
        assert_eq!(EscrowAction::Fund.as_str(), "fund");
        assert_eq!(EscrowAction::Confirm.as_str(), "confirm");
    }
}

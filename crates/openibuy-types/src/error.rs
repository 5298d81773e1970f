//! Format errors for externally supplied values
//!
//! Evidence formats are validated at the edge, before the value is ever
//! sent onward (Invariant #3).

use thiserror::Error;

/// Errors raised while validating externally supplied value formats
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Transaction hash does not match `0x` + 64 hex characters
    #[error("invalid transaction hash {value:?}: expected 0x followed by 64 hex characters")]
    InvalidTxHash { value: String },

    /// Wallet address does not match `0x` + 40 hex characters
    #[error("invalid wallet address {value:?}: expected 0x followed by 40 hex characters")]
    InvalidWalletAddress { value: String },
}

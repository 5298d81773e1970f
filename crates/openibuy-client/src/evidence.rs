//! Transaction evidence sources
//!
//! When an escrow stage surfaces a pending transaction request, the
//! orchestrator asks an evidence source for the externally signed
//! transaction hash. Returning `None` is never an error - it records a
//! soft gap in the settlement, reported in the final summary.
//!
//! The interactive TTY prompt lives in the CLI; this crate ships the
//! non-interactive sources, which preserve identical soft-gap semantics.

use std::collections::HashMap;

use async_trait::async_trait;

use openibuy_types::{EscrowAction, TxHash};

/// Where externally signed transaction hashes come from.
#[async_trait]
pub trait TransactionEvidenceSource: Send + Sync {
    /// Ask for the hash evidencing the given settlement step.
    ///
    /// Implementations must only return validated hashes; format errors
    /// are surfaced where the raw string enters the system, never here.
    async fn request_hash(&self, action: EscrowAction) -> Option<TxHash>;
}

/// Non-interactive deployment: never supplies evidence.
pub struct NoEvidence;

#[async_trait]
impl TransactionEvidenceSource for NoEvidence {
    async fn request_hash(&self, _action: EscrowAction) -> Option<TxHash> {
        None
    }
}

/// Pre-supplied hashes, keyed by settlement step.
///
/// Backs the `--create-tx-hash`/`--fund-tx-hash`/`--confirm-tx-hash`
/// flags: the raw strings are validated at configuration time, so a
/// malformed hash fails the run before any network call.
#[derive(Default)]
pub struct StaticEvidence {
    hashes: HashMap<EscrowAction, TxHash>,
}

impl StaticEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, action: EscrowAction, hash: TxHash) -> Self {
        self.hashes.insert(action, hash);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

#[async_trait]
impl TransactionEvidenceSource for StaticEvidence {
    async fn request_hash(&self, action: EscrowAction) -> Option<TxHash> {
        self.hashes.get(&action).cloned()
    }
}

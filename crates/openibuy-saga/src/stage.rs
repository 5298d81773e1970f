//! Saga stages

use std::fmt;

use openibuy_types::EscrowAction;

/// The stages of a purchase saga, in execution order.
///
/// Each stage maps to at most one remote tool; `tool_name` is what the
/// availability gate checks against `tools/list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BootstrapUser,
    ResolveAddress,
    ResolveWallet,
    SelectProduct,
    EstimateShipping,
    CreateOrder,
    CreateEscrow,
    FundEscrow,
    ConfirmReceipt,
    FetchProof,
    /// Settlement bridge for one escrow action.
    SubmitTx(EscrowAction),
}

impl Stage {
    /// The remote tool this stage calls.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::BootstrapUser => "create_user",
            Self::ResolveAddress => "list_addresses",
            Self::ResolveWallet => "list_wallets",
            Self::SelectProduct => "search_products",
            Self::EstimateShipping => "estimate_shipping",
            Self::CreateOrder => "create_order",
            Self::CreateEscrow => "create_escrow",
            Self::FundEscrow => "fund_escrow",
            Self::ConfirmReceipt => "confirm_receipt",
            Self::FetchProof => "get_order_proof",
            Self::SubmitTx(_) => "submit_tx",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubmitTx(action) => write!(f, "submit_tx({action})"),
            other => f.write_str(other.tool_name()),
        }
    }
}

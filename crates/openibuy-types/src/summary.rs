//! End-of-saga summary record
//!
//! A saga run is stateless; the summary is the only artifact it leaves
//! behind. It names every identifier the run resolved and marks which
//! on-chain submissions were actually executed versus left pending.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::Product;
use crate::evidence::EscrowAction;

/// The product the saga settled on, with the shop id as finally resolved
/// (search result, detail fallback, or caller override).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedProduct {
    pub item_id: String,
    pub shop_id: String,
    pub sku_id: Option<String>,
    pub title: Option<String>,
    pub price: Option<String>,
    pub coupon_price: Option<String>,
    pub comparable_price: Option<f64>,
}

impl SelectedProduct {
    pub fn new(product: &Product, shop_id: String) -> Self {
        Self {
            item_id: product.item_id.clone(),
            shop_id,
            sku_id: product.sku_id.clone(),
            title: product.title.clone(),
            price: product.price.clone(),
            coupon_price: product.coupon_price.clone(),
            comparable_price: product.comparable_price(),
        }
    }
}

/// Structured record emitted at the end of a successful saga run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaSummary {
    pub order_no: String,
    pub shipping_quote_id: String,
    pub shipping_address_id: u64,
    pub buyer_wallet: Option<String>,
    pub selected_product: SelectedProduct,
    /// Opaque payment quote from `estimate_shipping`, when present.
    pub payment_quote: Option<Value>,
    pub create_escrow_state: Option<String>,
    pub state_before_confirm: Option<String>,
    pub state_after_confirm: Option<String>,
    pub create_submitted: bool,
    pub fund_submitted: bool,
    pub confirm_submitted: bool,
    /// Settlement steps that surfaced a transaction request but never
    /// received a hash. Not an error - the on-chain state simply has not
    /// advanced for these steps.
    pub pending_settlement: Vec<EscrowAction>,
}

impl SagaSummary {
    /// Whether every surfaced transaction request received a submission.
    pub fn settlement_complete(&self) -> bool {
        self.pending_settlement.is_empty()
    }

    pub fn submitted(&self, action: EscrowAction) -> bool {
        match action {
            EscrowAction::Create => self.create_submitted,
            EscrowAction::Fund => self.fund_submitted,
            EscrowAction::Confirm => self.confirm_submitted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> SagaSummary {
        let product = Product::from_value(&json!({
            "item_id": "B",
            "price": "5.00",
            "coupon_price": "4.50",
        }))
        .unwrap();
        SagaSummary {
            order_no: "ORD-1".into(),
            shipping_quote_id: "SQ-1".into(),
            shipping_address_id: 1,
            buyer_wallet: None,
            selected_product: SelectedProduct::new(&product, "shop-1".into()),
            payment_quote: None,
            create_escrow_state: None,
            state_before_confirm: None,
            state_after_confirm: None,
            create_submitted: true,
            fund_submitted: false,
            confirm_submitted: false,
            pending_settlement: vec![EscrowAction::Fund],
        }
    }

    #[test]
    fn test_selected_product_carries_comparable_price() {
        let summary = sample();
        assert_eq!(summary.selected_product.comparable_price, Some(4.5));
    }

    #[test]
    fn test_settlement_complete_tracks_pending_steps() {
        let mut summary = sample();
        assert!(!summary.settlement_complete());
        assert!(summary.submitted(EscrowAction::Create));
        assert!(!summary.submitted(EscrowAction::Fund));
        summary.pending_settlement.clear();
        assert!(summary.settlement_complete());
    }
}

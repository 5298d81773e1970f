//! Entity-kind specific extraction and ranking
//!
//! Classification finds the candidate list; ranking picks the single
//! entity a saga run is allowed to hold (one selected product, one
//! resolved address, one primary wallet).

use serde_json::Value;

use openibuy_types::{Product, ShippingAddress, Wallet};

use crate::scan::first_matching;

/// Typed products from the first matching array in the payload.
pub fn extract_products(payload: &Value) -> Vec<Product> {
    first_matching(payload, Product::from_value)
}

/// Typed addresses from the first matching array in the payload.
pub fn extract_addresses(payload: &Value) -> Vec<ShippingAddress> {
    first_matching(payload, ShippingAddress::from_value)
}

/// Typed wallets from the first matching array in the payload.
pub fn extract_wallets(payload: &Value) -> Vec<Wallet> {
    first_matching(payload, Wallet::from_value)
}

/// Pick the cheapest product by comparable price.
///
/// Products with no parseable price stay eligible but never beat a priced
/// one; ties and the all-unpriced case fall back to the first product
/// encountered.
pub fn select_product(products: &[Product]) -> Option<&Product> {
    let mut best: Option<(&Product, f64)> = None;
    for product in products {
        let Some(price) = product.comparable_price() else {
            continue;
        };
        let better = match best {
            Some((_, best_price)) => price < best_price,
            None => true,
        };
        if better {
            best = Some((product, price));
        }
    }
    best.map(|(product, _)| product).or_else(|| products.first())
}

/// Pick the shipping address for the run.
///
/// Only addresses with a positive numeric id are eligible. A caller
/// preference that matches an existing id wins over the default flag; a
/// preference that matches nothing is ignored rather than honored.
pub fn select_address(
    addresses: &[ShippingAddress],
    preferred_id: Option<u64>,
) -> Option<&ShippingAddress> {
    let eligible: Vec<&ShippingAddress> =
        addresses.iter().filter(|a| a.id.is_some()).collect();
    if eligible.is_empty() {
        return None;
    }
    if let Some(wanted) = preferred_id {
        if let Some(addr) = eligible.iter().find(|a| a.id == Some(wanted)).copied() {
            return Some(addr);
        }
    }
    eligible
        .iter()
        .find(|a| a.is_default)
        .or_else(|| eligible.first())
        .copied()
}

/// Pick the buyer wallet for the run.
///
/// When a chain is requested, only wallets on that exact chain compete;
/// among them the primary-flagged one wins, else the first. If no wallet
/// of the requested chain exists, falls back to the first wallet
/// irrespective of chain.
pub fn select_wallet(wallets: &[Wallet], chain_id: Option<u64>) -> Option<&Wallet> {
    let same_chain: Vec<&Wallet> = wallets
        .iter()
        .filter(|w| match chain_id {
            Some(wanted) => w.chain_id == Some(wanted),
            None => true,
        })
        .collect();
    same_chain
        .iter()
        .find(|w| w.is_primary)
        .or_else(|| same_chain.first())
        .copied()
        .or_else(|| wallets.first())
}

//! Domain entities recognized inside tool payloads
//!
//! The marketplace service never declares which part of a response holds
//! the products or the address book; entities are recognized by structural
//! signature. Each constructor here takes an arbitrary JSON value and
//! returns `Some` only when the value carries that entity's signature,
//! reading both camel- and snake-case field spellings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::{first_string, flag_is_set, parse_price_str, positive_id};
use crate::evidence::WalletAddress;

/// A marketplace product surfaced by `search_products`.
///
/// Price fields are kept as the raw strings the service sent; ranking
/// parses them on demand via [`Product::comparable_price`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub item_id: String,
    pub shop_id: Option<String>,
    pub sku_id: Option<String>,
    pub title: Option<String>,
    pub price: Option<String>,
    pub coupon_price: Option<String>,
}

impl Product {
    /// Recognize a product by structural signature.
    ///
    /// A product has a non-empty item identifier AND either at least one
    /// product hint field (title, shop name, price, image, coupon price,
    /// inventory) or a shop/seller identifier.
    pub fn from_value(item: &Value) -> Option<Self> {
        if !item.is_object() {
            return None;
        }
        let item_id = first_string(item, &["item_id", "itemId", "id"])?;

        let has_hint = ["title", "shop_name", "price", "main_image_url", "coupon_price", "inventory"]
            .iter()
            .any(|key| item.get(*key).is_some_and(|v| !v.is_null()));
        let shop_id = first_string(item, &["shop_id", "shopId", "seller_id", "sellerId"]);
        if !has_hint && shop_id.is_none() {
            return None;
        }

        Some(Self {
            item_id,
            shop_id,
            sku_id: first_string(
                item,
                &["sku_id", "skuId", "default_sku_id", "defaultSkuId", "sku"],
            ),
            title: first_string(item, &["title", "item_title", "name"]),
            price: first_string(item, &["price"]),
            coupon_price: first_string(item, &["coupon_price", "couponPrice"]),
        })
    }

    /// The price value used for ranking: the lesser of coupon price and
    /// list price when both parse, else whichever is present.
    pub fn comparable_price(&self) -> Option<f64> {
        let coupon = self.coupon_price.as_deref().and_then(parse_price_str);
        let price = self.price.as_deref().and_then(parse_price_str);
        match (coupon, price) {
            (Some(c), Some(p)) => Some(c.min(p)),
            (Some(c), None) => Some(c),
            (None, Some(p)) => Some(p),
            (None, None) => None,
        }
    }
}

/// A shipping address from the buyer's address book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub id: Option<u64>,
    pub recipient_name: Option<String>,
    pub street_line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub is_default: bool,
}

impl ShippingAddress {
    /// Recognize an address: a positive numeric id, or any of the
    /// street/recipient/city/state text fields.
    pub fn from_value(item: &Value) -> Option<Self> {
        if !item.is_object() {
            return None;
        }
        let id = item.get("id").and_then(positive_id);
        let recipient_name = first_string(item, &["recipient_name", "recipientName"]);
        let street_line1 = first_string(item, &["street_line1", "streetLine1"]);
        let city = first_string(item, &["city"]);
        let state = first_string(item, &["state"]);

        if id.is_none()
            && recipient_name.is_none()
            && street_line1.is_none()
            && city.is_none()
            && state.is_none()
        {
            return None;
        }

        Some(Self {
            id,
            recipient_name,
            street_line1,
            city,
            state,
            is_default: item.get("is_default").is_some_and(flag_is_set),
        })
    }
}

/// A buyer wallet bound to the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub address: WalletAddress,
    pub chain_id: Option<u64>,
    pub is_primary: bool,
}

impl Wallet {
    /// Recognize a wallet: an address field matching the hex-address
    /// pattern under any of its known names.
    pub fn from_value(item: &Value) -> Option<Self> {
        if !item.is_object() {
            return None;
        }
        let raw = first_string(item, &["address", "wallet", "buyer_wallet"])?;
        let address = WalletAddress::parse(&raw).ok()?;
        Some(Self {
            address,
            chain_id: item
                .get("chain_id")
                .or_else(|| item.get("chainId"))
                .and_then(positive_id),
            is_primary: item.get("is_primary").is_some_and(flag_is_set),
        })
    }
}

/// An unsigned on-chain call descriptor surfaced by an escrow stage.
///
/// The orchestrator never signs these; it hands them to the operator and
/// waits for a transaction hash as evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxRequest {
    pub to: Option<String>,
    pub data: Option<String>,
    /// The descriptor exactly as the service sent it, for display.
    pub raw: Value,
}

impl TxRequest {
    pub fn from_value(value: &Value) -> Self {
        Self {
            to: first_string(value, &["to"]),
            data: first_string(value, &["data"]),
            raw: value.clone(),
        }
    }

    /// First four call-data bytes (`0x` + 8 hex chars), for log lines.
    pub fn selector(&self) -> Option<&str> {
        let data = self.data.as_deref()?;
        if data.len() >= 10 {
            Some(&data[..10])
        } else {
            None
        }
    }
}

//! Saga run configuration

use openibuy_types::WalletAddress;

/// Payment methods settled through the on-chain escrow contract.
const CONTRACT_PAY_METHODS: [&str; 2] = ["bsc", "bsc_escrow"];

/// Defaults used when the saga has to create a shipping address itself.
#[derive(Debug, Clone)]
pub struct AddressDefaults {
    pub country_code: String,
    pub country_name: String,
    pub state: String,
    pub city: String,
    pub district: Option<String>,
    pub street_line1: String,
    pub street_line2: Option<String>,
    pub postcode: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
}

impl Default for AddressDefaults {
    fn default() -> Self {
        Self {
            country_code: "RU".to_string(),
            country_name: "Russia".to_string(),
            state: "Moscow".to_string(),
            city: "Moscow".to_string(),
            district: None,
            street_line1: "Tverskaya 1".to_string(),
            street_line2: None,
            postcode: None,
            recipient_name: None,
            recipient_phone: None,
        }
    }
}

/// Everything a single saga run needs to know up front.
#[derive(Debug, Clone)]
pub struct SagaConfig {
    /// Acting user id (from the token's `sub` claim or configuration).
    pub user_id: u64,
    /// Display name for user bootstrap; derived from `user_id` if unset.
    pub user_name: Option<String>,
    pub keyword: String,
    pub quantity: u32,
    pub page_size: u32,
    pub pay_method: String,
    pub token_symbol: String,
    pub buyer_wallet: Option<WalletAddress>,
    pub seller_wallet: Option<WalletAddress>,
    pub wallet_chain_id: u64,
    /// Caller-preferred shipping address id; wins when it matches a
    /// listed address, ignored when it does not.
    pub preferred_address_id: Option<u64>,
    pub auto_create_user: bool,
    pub auto_create_address: bool,
    pub auto_bind_wallet: bool,
    pub address: AddressDefaults,
    pub shop_id_override: Option<String>,
    pub item_id_override: Option<String>,
    pub sku_id_override: Option<String>,
    /// Upstream catalog the detail fallback queries.
    pub item_resource: String,
    pub detail_language: String,
}

impl SagaConfig {
    /// A config with the stock defaults for the given user and keyword.
    pub fn new(user_id: u64, keyword: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: None,
            keyword: keyword.into(),
            quantity: 1,
            page_size: 10,
            pay_method: "bsc".to_string(),
            token_symbol: "USDT".to_string(),
            buyer_wallet: None,
            seller_wallet: None,
            wallet_chain_id: 56,
            preferred_address_id: None,
            auto_create_user: true,
            auto_create_address: true,
            auto_bind_wallet: true,
            address: AddressDefaults::default(),
            shop_id_override: None,
            item_id_override: None,
            sku_id_override: None,
            item_resource: "taobao".to_string(),
            detail_language: "ru".to_string(),
        }
    }

    /// Whether this run settles through the on-chain escrow contract.
    pub fn is_contract_payment(&self) -> bool {
        let method = self.pay_method.to_lowercase();
        CONTRACT_PAY_METHODS.contains(&method.as_str())
    }

    /// Display name sent to `create_user`.
    pub fn effective_user_name(&self) -> String {
        self.user_name
            .clone()
            .unwrap_or_else(|| format!("openibuy_user_{}", self.user_id))
    }

    /// Recipient name used when creating an address.
    pub fn effective_recipient_name(&self) -> String {
        self.address
            .recipient_name
            .clone()
            .unwrap_or_else(|| format!("OpeniBuy User {}", self.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_payment_detection() {
        let mut config = SagaConfig::new(1, "cup");
        assert!(config.is_contract_payment());
        config.pay_method = "BSC_ESCROW".to_string();
        assert!(config.is_contract_payment());
        config.pay_method = "balance".to_string();
        assert!(!config.is_contract_payment());
    }

    #[test]
    fn test_derived_names() {
        let config = SagaConfig::new(42, "cup");
        assert_eq!(config.effective_user_name(), "openibuy_user_42");
        assert_eq!(config.effective_recipient_name(), "OpeniBuy User 42");
    }
}

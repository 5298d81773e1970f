//! End-to-end saga runs against a scripted mock service.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use openibuy_client::{
    NoEvidence, ShopDetailResolver, StaticEvidence, ToolInvoker, TransactionEvidenceSource,
};
use openibuy_saga::{PurchaseSaga, SagaConfig, SagaError, Stage};
use openibuy_types::{EscrowAction, TxHash, WalletAddress};

const HASH_A: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";
const HASH_B: &str = "0x2222222222222222222222222222222222222222222222222222222222222222";
const HASH_C: &str = "0x3333333333333333333333333333333333333333333333333333333333333333";

/// Scripted tool service: canned responses per tool, consumed in order,
/// with the final response repeating for any further calls.
struct MockService {
    tools: Vec<String>,
    responses: Mutex<HashMap<String, VecDeque<Value>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockService {
    fn new(tools: &[&str]) -> Self {
        Self {
            tools: tools.iter().map(|t| t.to_string()).collect(),
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn on(self, tool: &str, response: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(tool.to_string())
            .or_default()
            .push_back(response);
        self
    }

    fn called(&self, tool: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == tool)
            .count()
    }

    fn last_args(&self, tool: &str) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _)| name == tool)
            .map(|(_, args)| args.clone())
    }
}

#[async_trait]
impl ToolInvoker for MockService {
    async fn list_tools(&self) -> openibuy_client::Result<Vec<String>> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> openibuy_client::Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(name)
            .unwrap_or_else(|| panic!("unexpected tool call: {name}"));
        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap())
        } else {
            Ok(queue.front().cloned().unwrap_or_else(|| panic!("no response scripted for {name}")))
        }
    }
}

struct FixedShop(&'static str);

#[async_trait]
impl ShopDetailResolver for FixedShop {
    async fn resolve(
        &self,
        _item_id: &str,
        _item_resource: &str,
        _language: &str,
    ) -> openibuy_client::Result<Option<String>> {
        Ok(Some(self.0.to_string()))
    }
}

const FULL_TOOLSET: [&str; 8] = [
    "search_products",
    "estimate_shipping",
    "create_order",
    "create_escrow",
    "fund_escrow",
    "confirm_receipt",
    "get_order_proof",
    "submit_tx",
];

fn full_service() -> MockService {
    MockService::new(&FULL_TOOLSET)
        .on(
            "search_products",
            json!({"data": {"items": [
                {"item_id": "A", "price": "10.00"},
                {"item_id": "B", "price": "5.00", "coupon_price": "4.50"},
            ]}}),
        )
        .on(
            "estimate_shipping",
            json!({"shipping_quote_id": "SQ-1", "payment_quote": {"total": "4.50"}}),
        )
        .on("create_order", json!({"data": {"order_no": "ORD-1"}}))
        .on(
            "create_escrow",
            json!({
                "escrow_state": "CREATED",
                "tx_request": {"to": "0xescrow", "data": "0x0102030405"},
            }),
        )
        .on(
            "fund_escrow",
            json!({"data": {"tx_request": {"to": "0xescrow", "data": "0xa1a2a3a4a5"}}}),
        )
        .on(
            "confirm_receipt",
            json!({"tx_request": {"to": "0xescrow", "data": "0xc1c2c3c4c5"}}),
        )
        .on("get_order_proof", json!({"data": {"escrow_state": "FUNDED"}}))
        .on("get_order_proof", json!({"escrow_state": "RELEASED"}))
        .on("submit_tx", json!({"success": true}))
}

fn all_hashes() -> StaticEvidence {
    StaticEvidence::new()
        .with(EscrowAction::Create, TxHash::parse(HASH_A).unwrap())
        .with(EscrowAction::Fund, TxHash::parse(HASH_B).unwrap())
        .with(EscrowAction::Confirm, TxHash::parse(HASH_C).unwrap())
}

fn base_config() -> SagaConfig {
    let mut config = SagaConfig::new(7, "watercup");
    // off-chain pay method: the wallet stage is not exercised here
    config.pay_method = "balance".to_string();
    config.preferred_address_id = Some(1);
    config
}

#[tokio::test]
async fn full_flow_selects_cheapest_and_submits_all_settlements() {
    let service = full_service();
    let evidence = all_hashes();
    let shop = FixedShop("shop-9");

    let saga = PurchaseSaga::new(&service, &evidence, Some(&shop), base_config());
    let summary = saga.run().await.unwrap();

    assert_eq!(summary.selected_product.item_id, "B");
    assert_eq!(summary.selected_product.comparable_price, Some(4.5));
    assert_eq!(summary.selected_product.shop_id, "shop-9");
    assert_eq!(summary.order_no, "ORD-1");
    assert_eq!(summary.shipping_quote_id, "SQ-1");
    assert_eq!(summary.shipping_address_id, 1);
    assert_eq!(summary.create_escrow_state.as_deref(), Some("CREATED"));
    assert_eq!(summary.state_before_confirm.as_deref(), Some("FUNDED"));
    assert_eq!(summary.state_after_confirm.as_deref(), Some("RELEASED"));
    assert!(summary.create_submitted);
    assert!(summary.fund_submitted);
    assert!(summary.confirm_submitted);
    assert!(summary.settlement_complete());

    assert_eq!(service.called("submit_tx"), 3);
    let submit_args = service.last_args("submit_tx").unwrap();
    assert_eq!(submit_args["order_no"], "ORD-1");
    assert_eq!(submit_args["action"], "confirm");
    assert_eq!(submit_args["tx_hash"], HASH_C);

    let order_args = service.last_args("create_order").unwrap();
    assert_eq!(order_args["shop_id"], "shop-9");
    assert_eq!(order_args["shipping_quote_id"], "SQ-1");
    assert_eq!(order_args["pay_method"], "balance");
}

#[tokio::test]
async fn missing_evidence_is_a_soft_gap_not_a_failure() {
    // only the fund step surfaces a transaction request
    let service = MockService::new(&FULL_TOOLSET)
        .on(
            "search_products",
            json!({"data": {"items": [{"item_id": "B", "price": "5.00", "shop_id": "s1"}]}}),
        )
        .on("estimate_shipping", json!({"shipping_quote_id": "SQ-1"}))
        .on("create_order", json!({"order_no": "ORD-2"}))
        .on("create_escrow", json!({"escrow_state": "CREATED"}))
        .on(
            "fund_escrow",
            json!({"tx_request": {"to": "0xescrow", "data": "0xa1a2a3a4a5"}}),
        )
        .on("confirm_receipt", json!({"success": true}))
        .on("get_order_proof", json!({"escrow_state": "CREATED"}));

    let saga = PurchaseSaga::new(&service, &NoEvidence, None, base_config());
    let summary = saga.run().await.unwrap();

    assert!(!summary.fund_submitted);
    assert!(!summary.settlement_complete());
    assert_eq!(summary.pending_settlement, vec![EscrowAction::Fund]);
    assert_eq!(service.called("submit_tx"), 0);
}

#[tokio::test]
async fn empty_address_book_without_creation_fails_naming_the_address() {
    let service = MockService::new(&["list_addresses", "search_products"])
        .on("list_addresses", json!({"data": {"addresses": []}}));

    let mut config = base_config();
    config.preferred_address_id = None;
    config.auto_create_address = false;

    let saga = PurchaseSaga::new(&service, &NoEvidence, None, config);
    let err = saga.run().await.unwrap_err();
    match err {
        SagaError::Resolution { stage, what } => {
            assert_eq!(stage, Stage::ResolveAddress);
            assert_eq!(what, "shipping_address_id");
        }
        other => panic!("expected resolution failure, got {other:?}"),
    }
}

#[tokio::test]
async fn business_failure_aborts_before_later_stages() {
    let service = MockService::new(&FULL_TOOLSET)
        .on(
            "search_products",
            json!({"data": {"items": [{"item_id": "B", "price": "5.00", "shop_id": "s1"}]}}),
        )
        .on("estimate_shipping", json!({"shipping_quote_id": "SQ-1"}))
        .on(
            "create_order",
            json!({"success": false, "error": "out_of_stock"}),
        );

    let saga = PurchaseSaga::new(&service, &NoEvidence, None, base_config());
    let err = saga.run().await.unwrap_err();
    match err {
        SagaError::Business { stage, message } => {
            assert_eq!(stage, Stage::CreateOrder);
            assert_eq!(message, "out_of_stock");
        }
        other => panic!("expected business failure, got {other:?}"),
    }
    assert_eq!(service.called("create_escrow"), 0);
    assert_eq!(service.called("fund_escrow"), 0);
}

#[tokio::test]
async fn wrong_primary_wallet_triggers_rebind() {
    let desired = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    let mut tools: Vec<&str> = FULL_TOOLSET.to_vec();
    tools.push("list_wallets");
    tools.push("set_buyer_wallet");

    let service = MockService::new(&tools)
        .on(
            "list_wallets",
            json!({"data": {"wallets": [
                {"address": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "chain_id": 56, "is_primary": true},
            ]}}),
        )
        .on(
            "list_wallets",
            json!({"data": {"wallets": [
                {"address": desired, "chain_id": 56, "is_primary": true},
            ]}}),
        )
        .on("set_buyer_wallet", json!({"success": true}))
        .on(
            "search_products",
            json!({"data": {"items": [{"item_id": "B", "price": "5.00", "shop_id": "s1"}]}}),
        )
        .on("estimate_shipping", json!({"shipping_quote_id": "SQ-1"}))
        .on("create_order", json!({"order_no": "ORD-3"}))
        .on("create_escrow", json!({"escrow_state": "CREATED"}))
        .on("fund_escrow", json!({"success": true}))
        .on("confirm_receipt", json!({"success": true}))
        .on("get_order_proof", json!({"escrow_state": "CREATED"}));

    let mut config = base_config();
    config.pay_method = "bsc".to_string();
    config.buyer_wallet = Some(WalletAddress::parse(desired).unwrap());

    let saga = PurchaseSaga::new(&service, &NoEvidence, None, config);
    let summary = saga.run().await.unwrap();

    assert_eq!(service.called("set_buyer_wallet"), 1);
    let bind_args = service.last_args("set_buyer_wallet").unwrap();
    assert_eq!(bind_args["address"], desired);
    assert_eq!(bind_args["chain_id"], 56);
    assert_eq!(bind_args["is_primary"], true);
    assert_eq!(summary.buyer_wallet.as_deref(), Some(desired));

    let escrow_args = service.last_args("create_escrow").unwrap();
    assert_eq!(escrow_args["buyer_wallet"], desired);
}

#[tokio::test]
async fn matching_primary_wallet_is_not_rebound() {
    let desired = "0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";
    let mut tools: Vec<&str> = FULL_TOOLSET.to_vec();
    tools.push("list_wallets");
    tools.push("set_buyer_wallet");

    // bound wallet differs only in case
    let service = MockService::new(&tools)
        .on(
            "list_wallets",
            json!({"data": {"wallets": [
                {"address": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", "chain_id": 56, "is_primary": true},
            ]}}),
        )
        .on(
            "search_products",
            json!({"data": {"items": [{"item_id": "B", "price": "5.00", "shop_id": "s1"}]}}),
        )
        .on("estimate_shipping", json!({"shipping_quote_id": "SQ-1"}))
        .on("create_order", json!({"order_no": "ORD-4"}))
        .on("create_escrow", json!({"escrow_state": "CREATED"}))
        .on("fund_escrow", json!({"success": true}))
        .on("confirm_receipt", json!({"success": true}))
        .on("get_order_proof", json!({"escrow_state": "CREATED"}));

    let mut config = base_config();
    config.pay_method = "bsc".to_string();
    config.buyer_wallet = Some(WalletAddress::parse(desired).unwrap());

    let saga = PurchaseSaga::new(&service, &NoEvidence, None, config);
    saga.run().await.unwrap();

    assert_eq!(service.called("set_buyer_wallet"), 0);
    assert_eq!(service.called("list_wallets"), 2);
}

#[tokio::test]
async fn empty_address_book_with_creation_enabled_creates_and_reresolves() {
    let mut tools: Vec<&str> = FULL_TOOLSET.to_vec();
    tools.push("list_addresses");
    tools.push("create_address");

    let service = MockService::new(&tools)
        .on("list_addresses", json!({"data": {"addresses": []}}))
        .on(
            "list_addresses",
            json!({"data": {"addresses": [
                {"id": 5, "city": "Moscow", "is_default": true},
            ]}}),
        )
        .on("create_address", json!({"shipping_address_id": 5}))
        .on(
            "search_products",
            json!({"data": {"items": [{"item_id": "B", "price": "5.00", "shop_id": "s1"}]}}),
        )
        .on("estimate_shipping", json!({"shipping_quote_id": "SQ-1"}))
        .on("create_order", json!({"order_no": "ORD-5"}))
        .on("create_escrow", json!({"escrow_state": "CREATED"}))
        .on("fund_escrow", json!({"success": true}))
        .on("confirm_receipt", json!({"success": true}))
        .on("get_order_proof", json!({"escrow_state": "CREATED"}));

    let mut config = base_config();
    config.preferred_address_id = None;

    let saga = PurchaseSaga::new(&service, &NoEvidence, None, config);
    let summary = saga.run().await.unwrap();

    assert_eq!(service.called("create_address"), 1);
    assert_eq!(summary.shipping_address_id, 5);
    let create_args = service.last_args("create_address").unwrap();
    assert_eq!(create_args["is_default"], true);
    assert_eq!(create_args["country_code"], "RU");
}

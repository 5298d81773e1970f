//! The purchase saga runner
//!
//! Strictly sequential: each stage's tool call settles before the next
//! stage begins, because each stage's output is a required input to a
//! later one. The runner holds no locks and shares nothing - the only
//! mutable state is the remote service's own order and escrow records,
//! which it treats as append-only.

use std::collections::HashSet;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use openibuy_client::{
    failure_message, ShopDetailResolver, ToolInvoker, TransactionEvidenceSource,
};
use openibuy_extract as extract;
use openibuy_types::{
    positive_id, EscrowAction, SagaSummary, SelectedProduct, WalletAddress,
};

use crate::config::SagaConfig;
use crate::error::{Result, SagaError};
use crate::stage::Stage;

/// Bookkeeping for the three on-chain settlement steps.
#[derive(Debug, Default)]
struct Settlement {
    create_submitted: bool,
    fund_submitted: bool,
    confirm_submitted: bool,
    pending: Vec<EscrowAction>,
}

impl Settlement {
    fn mark_submitted(&mut self, action: EscrowAction) {
        match action {
            EscrowAction::Create => self.create_submitted = true,
            EscrowAction::Fund => self.fund_submitted = true,
            EscrowAction::Confirm => self.confirm_submitted = true,
        }
    }
}

/// One best-effort pass through the purchase workflow.
pub struct PurchaseSaga<'a> {
    invoker: &'a dyn ToolInvoker,
    evidence: &'a dyn TransactionEvidenceSource,
    detail: Option<&'a dyn ShopDetailResolver>,
    config: SagaConfig,
    tools: HashSet<String>,
}

impl<'a> PurchaseSaga<'a> {
    pub fn new(
        invoker: &'a dyn ToolInvoker,
        evidence: &'a dyn TransactionEvidenceSource,
        detail: Option<&'a dyn ShopDetailResolver>,
        config: SagaConfig,
    ) -> Self {
        Self {
            invoker,
            evidence,
            detail,
            config,
            tools: HashSet::new(),
        }
    }

    /// Drive the saga to completion and emit the summary.
    ///
    /// The first fatal condition aborts the whole run; soft settlement
    /// gaps do not.
    pub async fn run(mut self) -> Result<SagaSummary> {
        self.tools = self.invoker.list_tools().await?.into_iter().collect();
        info!(advertised = self.tools.len(), "saga started");

        self.bootstrap_user().await?;
        let shipping_address_id = self.resolve_address().await?;
        let buyer_wallet = self.resolve_wallet().await?;
        let selected = self.select_product().await?;
        let (shipping_quote_id, payment_quote) =
            self.estimate_shipping(shipping_address_id, &selected).await?;
        let order_no = self
            .create_order(shipping_address_id, &selected, &shipping_quote_id)
            .await?;

        let mut settlement = Settlement::default();
        let create_escrow_state = self
            .create_escrow(&order_no, buyer_wallet.as_ref(), &mut settlement)
            .await?;
        self.fund_escrow(&order_no, &mut settlement).await?;
        let state_before_confirm = self.fetch_proof(&order_no).await?;
        self.confirm_receipt(&order_no, &mut settlement).await?;
        let state_after_confirm = self.fetch_proof(&order_no).await?;

        info!(order_no = %order_no, pending = settlement.pending.len(), "saga finished");
        Ok(SagaSummary {
            order_no,
            shipping_quote_id,
            shipping_address_id,
            buyer_wallet: buyer_wallet.map(|w| w.to_string()),
            selected_product: selected,
            payment_quote,
            create_escrow_state,
            state_before_confirm,
            state_after_confirm,
            create_submitted: settlement.create_submitted,
            fund_submitted: settlement.fund_submitted,
            confirm_submitted: settlement.confirm_submitted,
            pending_settlement: settlement.pending,
        })
    }

    fn has(&self, tool: &str) -> bool {
        self.tools.contains(tool)
    }

    /// Invoke a tool and surface explicit failure signals.
    async fn call(&self, stage: Stage, tool: &str, args: Value) -> Result<Value> {
        debug!(%stage, tool, "tool call");
        let payload = self.invoker.call_tool(tool, args).await?;
        if let Some(message) = failure_message(&payload) {
            return Err(SagaError::Business { stage, message });
        }
        Ok(payload)
    }

    async fn bootstrap_user(&self) -> Result<()> {
        if !self.config.auto_create_user {
            debug!("user bootstrap disabled");
            return Ok(());
        }
        if !self.has("create_user") {
            debug!("create_user not advertised, skipping bootstrap");
            return Ok(());
        }
        self.call(
            Stage::BootstrapUser,
            "create_user",
            json!({
                "user_id": self.config.user_id,
                "user_name": self.config.effective_user_name(),
            }),
        )
        .await?;
        Ok(())
    }

    async fn resolve_address(&self) -> Result<u64> {
        let stage = Stage::ResolveAddress;
        let mut resolved = self.config.preferred_address_id;

        if self.has("list_addresses") {
            let payload = self.call(stage, "list_addresses", json!({})).await?;
            let addresses = extract::extract_addresses(&payload);
            resolved = extract::select_address(&addresses, resolved).and_then(|a| a.id);
        }

        if resolved.is_none() && self.config.auto_create_address && self.has("create_address") {
            resolved = self.create_address().await?;
            if self.has("list_addresses") {
                let payload = self.call(stage, "list_addresses", json!({})).await?;
                let addresses = extract::extract_addresses(&payload);
                resolved = extract::select_address(&addresses, resolved)
                    .and_then(|a| a.id)
                    .or(resolved);
            }
        }

        let id = resolved.ok_or(SagaError::Resolution {
            stage,
            what: "shipping_address_id",
        })?;
        info!(shipping_address_id = id, "shipping address resolved");
        Ok(id)
    }

    async fn create_address(&self) -> Result<Option<u64>> {
        let defaults = &self.config.address;
        let mut args = json!({
            "country_code": defaults.country_code,
            "country_name": defaults.country_name,
            "state": defaults.state,
            "city": defaults.city,
            "street_line1": defaults.street_line1,
            "recipient_name": self.config.effective_recipient_name(),
            "recipient_phone": defaults
                .recipient_phone
                .clone()
                .unwrap_or_else(|| "+79990000000".to_string()),
            "is_default": true,
        });
        if let Some(district) = &defaults.district {
            args["district"] = json!(district);
        }
        if let Some(street2) = &defaults.street_line2 {
            args["street_line2"] = json!(street2);
        }
        if let Some(postcode) = &defaults.postcode {
            args["postcode"] = json!(postcode);
        }

        let payload = self
            .call(Stage::ResolveAddress, "create_address", args)
            .await?;
        Ok(payload
            .get("shipping_address_id")
            .and_then(positive_id)
            .or_else(|| {
                payload
                    .get("data")
                    .and_then(|data| data.get("id"))
                    .and_then(positive_id)
            }))
    }

    async fn resolve_wallet(&self) -> Result<Option<WalletAddress>> {
        if !self.config.is_contract_payment() {
            return Ok(None);
        }
        let stage = Stage::ResolveWallet;
        let chain = self.config.wallet_chain_id;
        let can_list = self.has("list_wallets");
        let can_bind = self.has("set_buyer_wallet");

        let mut wallets = Vec::new();
        if can_list {
            let payload = self
                .call(stage, "list_wallets", json!({ "chain_id": chain }))
                .await?;
            wallets = extract::extract_wallets(&payload);
        }

        let desired = self.config.buyer_wallet.clone();
        let current = extract::select_wallet(&wallets, Some(chain));
        let needs_bind = match (&current, &desired) {
            (None, _) => true,
            (Some(bound), Some(want)) => !bound.address.matches(want.as_str()),
            (Some(_), None) => false,
        };

        if needs_bind && self.config.auto_bind_wallet && can_bind {
            if let Some(want) = &desired {
                self.call(
                    stage,
                    "set_buyer_wallet",
                    json!({
                        "address": want.as_str(),
                        "chain_id": chain,
                        "is_primary": true,
                        "bind_method": "injected",
                    }),
                )
                .await?;
                info!(wallet = %want, chain_id = chain, "buyer wallet bound");
            } else {
                warn!("no buyer wallet configured to bind");
            }
        }

        if can_list {
            let payload = self
                .call(stage, "list_wallets", json!({ "chain_id": chain }))
                .await?;
            let wallets = extract::extract_wallets(&payload);
            return match extract::select_wallet(&wallets, Some(chain)) {
                Some(wallet) => Ok(Some(wallet.address.clone())),
                None => Err(SagaError::Resolution {
                    stage,
                    what: "buyer_wallet",
                }),
            };
        }
        if can_bind {
            // bound blind: no way to re-list, trust the configured wallet
            return Ok(desired);
        }
        Err(SagaError::Resolution {
            stage,
            what: "buyer_wallet",
        })
    }

    async fn select_product(&self) -> Result<SelectedProduct> {
        let stage = Stage::SelectProduct;
        if !self.has("search_products") {
            return Err(SagaError::Resolution {
                stage,
                what: "product",
            });
        }
        let payload = self
            .call(
                stage,
                "search_products",
                json!({
                    "keyword": self.config.keyword,
                    "page_no": 1,
                    "page_size": self.config.page_size,
                }),
            )
            .await?;
        let products = extract::extract_products(&payload);
        let picked = extract::select_product(&products);

        let item_id = self
            .config
            .item_id_override
            .clone()
            .or_else(|| picked.map(|p| p.item_id.clone()))
            .ok_or(SagaError::Resolution {
                stage,
                what: "item_id",
            })?;
        let sku_id = self
            .config
            .sku_id_override
            .clone()
            .or_else(|| picked.and_then(|p| p.sku_id.clone()));
        let mut shop_id = self
            .config
            .shop_id_override
            .clone()
            .or_else(|| picked.and_then(|p| p.shop_id.clone()));

        if shop_id.is_none() {
            if let Some(resolver) = self.detail {
                info!(item_id = %item_id, "shop id missing in search result, trying detail lookup");
                match resolver
                    .resolve(
                        &item_id,
                        &self.config.item_resource,
                        &self.config.detail_language,
                    )
                    .await
                {
                    Ok(found) => shop_id = found,
                    Err(err) => warn!(error = %err, "detail lookup failed"),
                }
            }
        }
        let shop_id = shop_id.ok_or(SagaError::Resolution {
            stage,
            what: "shop_id",
        })?;

        let mut selected = match picked {
            Some(product) => SelectedProduct::new(product, shop_id),
            None => SelectedProduct {
                item_id: item_id.clone(),
                shop_id,
                sku_id: None,
                title: None,
                price: None,
                coupon_price: None,
                comparable_price: None,
            },
        };
        selected.item_id = item_id;
        selected.sku_id = sku_id;
        info!(
            item_id = %selected.item_id,
            shop_id = %selected.shop_id,
            comparable_price = ?selected.comparable_price,
            "product selected"
        );
        Ok(selected)
    }

    async fn estimate_shipping(
        &self,
        shipping_address_id: u64,
        selected: &SelectedProduct,
    ) -> Result<(String, Option<Value>)> {
        let stage = Stage::EstimateShipping;
        if !self.has("estimate_shipping") {
            return Err(SagaError::Resolution {
                stage,
                what: "shipping_quote_id",
            });
        }
        let mut args = json!({
            "shipping_address_id": shipping_address_id,
            "shop_id": selected.shop_id,
            "item_id": selected.item_id,
            "quantity": self.config.quantity,
        });
        if let Some(sku_id) = &selected.sku_id {
            args["sku_id"] = json!(sku_id);
        }
        let payload = self.call(stage, "estimate_shipping", args).await?;
        let quote_id =
            extract::shipping_quote_id(&payload).ok_or(SagaError::Resolution {
                stage,
                what: "shipping_quote_id",
            })?;
        info!(shipping_quote_id = %quote_id, "shipping estimated");
        Ok((quote_id, extract::payment_quote(&payload)))
    }

    async fn create_order(
        &self,
        shipping_address_id: u64,
        selected: &SelectedProduct,
        shipping_quote_id: &str,
    ) -> Result<String> {
        let stage = Stage::CreateOrder;
        if !self.has("create_order") {
            return Err(SagaError::Resolution {
                stage,
                what: "order_no",
            });
        }
        let mut args = json!({
            "shipping_address_id": shipping_address_id,
            "shop_id": selected.shop_id,
            "item_id": selected.item_id,
            "quantity": self.config.quantity,
            "shipping_quote_id": shipping_quote_id,
            "pay_method": self.config.pay_method,
        });
        if let Some(sku_id) = &selected.sku_id {
            args["sku_id"] = json!(sku_id);
        }
        let payload = self.call(stage, "create_order", args).await?;
        let order_no = extract::order_no(&payload).ok_or(SagaError::Resolution {
            stage,
            what: "order_no",
        })?;
        info!(order_no = %order_no, "order created");
        Ok(order_no)
    }

    async fn create_escrow(
        &self,
        order_no: &str,
        buyer_wallet: Option<&WalletAddress>,
        settlement: &mut Settlement,
    ) -> Result<Option<String>> {
        let stage = Stage::CreateEscrow;
        if !self.has("create_escrow") {
            debug!("create_escrow not advertised, skipping");
            return Ok(None);
        }
        let mut args = json!({
            "order_no": order_no,
            "token_symbol": self.config.token_symbol,
        });
        if let Some(wallet) = buyer_wallet.or(self.config.buyer_wallet.as_ref()) {
            args["buyer_wallet"] = json!(wallet.as_str());
        }
        if let Some(wallet) = &self.config.seller_wallet {
            args["seller_wallet"] = json!(wallet.as_str());
        }
        let payload = self.call(stage, "create_escrow", args).await?;
        let state = extract::escrow_state(&payload);
        self.bridge_settlement(EscrowAction::Create, &payload, order_no, settlement)
            .await?;
        Ok(state)
    }

    async fn fund_escrow(&self, order_no: &str, settlement: &mut Settlement) -> Result<()> {
        if !self.has("fund_escrow") {
            debug!("fund_escrow not advertised, skipping");
            return Ok(());
        }
        let payload = self
            .call(
                Stage::FundEscrow,
                "fund_escrow",
                json!({
                    "order_no": order_no,
                    "token_symbol": self.config.token_symbol,
                }),
            )
            .await?;
        if extract::needs_approval(&payload) {
            if let Some(approve) = extract::approve_tx_request(&payload) {
                info!(
                    to = ?approve.to,
                    selector = ?approve.selector(),
                    request = %approve.raw,
                    "token approval required before funding"
                );
            }
        }
        self.bridge_settlement(EscrowAction::Fund, &payload, order_no, settlement)
            .await
    }

    async fn confirm_receipt(&self, order_no: &str, settlement: &mut Settlement) -> Result<()> {
        if !self.has("confirm_receipt") {
            debug!("confirm_receipt not advertised, skipping");
            return Ok(());
        }
        let payload = self
            .call(
                Stage::ConfirmReceipt,
                "confirm_receipt",
                json!({ "order_no": order_no }),
            )
            .await?;
        self.bridge_settlement(EscrowAction::Confirm, &payload, order_no, settlement)
            .await
    }

    async fn fetch_proof(&self, order_no: &str) -> Result<Option<String>> {
        if !self.has("get_order_proof") {
            return Ok(None);
        }
        let payload = self
            .call(
                Stage::FetchProof,
                "get_order_proof",
                json!({ "order_no": order_no }),
            )
            .await?;
        Ok(extract::escrow_state(&payload))
    }

    /// Bridge one settlement step across the trust boundary.
    ///
    /// Only runs when the stage surfaced a pending transaction request.
    /// Absence of evidence is a soft gap; the saga proceeds either way.
    async fn bridge_settlement(
        &self,
        action: EscrowAction,
        payload: &Value,
        order_no: &str,
        settlement: &mut Settlement,
    ) -> Result<()> {
        let Some(tx) = extract::tx_request(payload) else {
            return Ok(());
        };
        info!(
            step = %action,
            to = ?tx.to,
            selector = ?tx.selector(),
            next_action = ?extract::next_action(payload),
            request = %tx.raw,
            "pending transaction request"
        );

        let Some(hash) = self.evidence.request_hash(action).await else {
            warn!(step = %action, "no transaction hash supplied; settlement step left pending");
            settlement.pending.push(action);
            return Ok(());
        };
        if !self.has("submit_tx") {
            warn!(step = %action, "submit_tx not advertised; settlement step left pending");
            settlement.pending.push(action);
            return Ok(());
        }

        self.call(
            Stage::SubmitTx(action),
            "submit_tx",
            json!({
                "order_no": order_no,
                "action": action.as_str(),
                "tx_hash": hash.as_str(),
            }),
        )
        .await?;
        settlement.mark_submitted(action);
        info!(step = %action, "settlement submitted");
        Ok(())
    }
}

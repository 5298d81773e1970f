//! OpeniBuy CLI - drive a marketplace purchase-and-escrow saga
//!
//! One invocation is one stateless, best-effort pass through the whole
//! workflow: authenticate, resolve address and wallet, pick the cheapest
//! matching product, order it, and walk the escrow lifecycle, prompting
//! for externally signed transaction hashes along the way.
//!
//! # Quick Start
//!
//! ```bash
//! # token in hand
//! openibuy --token eyJ... --keyword earphones
//!
//! # emailed bootstrap token
//! openibuy --bootstrap-email buyer@example.com --keyword earphones
//!
//! # pre-signed settlement, no prompting
//! openibuy --token eyJ... --interactive false --create-tx-hash 0x...
//! ```
//!
//! Every flag falls back to an `OPENIBUY_*` environment variable; a
//! `.env` file is honored.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use openibuy_client::{
    decode_sub_unsafe, derive_api_base_url, register_client, request_bootstrap_email,
    resolve_rpc_endpoint, AuthStrategy, BearerToken, BootstrapExchange, ClientCredentials,
    HttpShopDetailResolver, McpToolClient, ProvidedToken, RegisterRequest,
};
use openibuy_saga::{PurchaseSaga, SagaConfig};
use openibuy_types::{EscrowAction, TxHash, WalletAddress};

mod display;
mod prompt;

/// OpeniBuy - marketplace purchases settled through on-chain escrow
#[derive(Parser)]
#[command(name = "openibuy")]
#[command(author = "OpeniBank Contributors")]
#[command(version)]
#[command(about = "Drive an end-to-end purchase-and-escrow flow against a tool-calling marketplace service", long_about = None)]
struct Cli {
    /// Service base URL; may already include the /api/mcp mount
    #[arg(long)]
    base_url: Option<String>,

    /// Explicit RPC endpoint (absolute URL or path under the REST base)
    #[arg(long)]
    endpoint: Option<String>,

    /// Bearer token; when set, no auth endpoint is contacted
    #[arg(long)]
    token: Option<String>,

    /// Emailed bootstrap token (mbt_...) to exchange for an access token
    #[arg(long)]
    bootstrap_token: Option<String>,

    /// Email address to request a bootstrap token for (prompts for the
    /// pasted token afterwards)
    #[arg(long)]
    bootstrap_email: Option<String>,

    /// OAuth client id for the token endpoint
    #[arg(long)]
    client_id: Option<String>,

    /// OAuth client secret for the token endpoint
    #[arg(long)]
    client_secret: Option<String>,

    /// Logged-in user bearer for client self-registration
    #[arg(long)]
    user_bearer: Option<String>,

    /// Self-register a client when credentials are missing
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    auto_register_client: bool,

    /// Custom client id to request at self-registration
    #[arg(long)]
    register_client_id: Option<String>,

    /// Display name for the self-registered client
    #[arg(long)]
    register_display_name: Option<String>,

    /// Scope for the self-registered client
    #[arg(long)]
    register_scope: Option<String>,

    /// Token endpoint override
    #[arg(long)]
    token_url: Option<String>,

    /// Client register endpoint override
    #[arg(long)]
    register_url: Option<String>,

    /// Bootstrap email request endpoint override
    #[arg(long)]
    bootstrap_request_url: Option<String>,

    /// Bootstrap token exchange endpoint override
    #[arg(long)]
    bootstrap_exchange_url: Option<String>,

    /// Access token TTL in seconds (0 = server default)
    #[arg(long, default_value_t = 0)]
    token_ttl_sec: u64,

    /// Refresh token TTL in seconds (0 = server default)
    #[arg(long, default_value_t = 0)]
    refresh_ttl_sec: u64,

    /// Acting user id; defaults to the token's sub claim
    #[arg(long)]
    user_id: Option<u64>,

    /// Display name for user bootstrap
    #[arg(long)]
    user_name: Option<String>,

    /// Generate a fresh user id when neither --token nor --user-id is set
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    new_user: bool,

    /// Search keyword
    #[arg(long)]
    keyword: Option<String>,

    /// Search page size
    #[arg(long, default_value_t = 10)]
    page_size: u32,

    /// Order quantity
    #[arg(long, default_value_t = 1)]
    quantity: u32,

    /// Payment method (bsc settles through the escrow contract)
    #[arg(long)]
    pay_method: Option<String>,

    /// Payment token symbol for escrow
    #[arg(long)]
    token_symbol: Option<String>,

    /// Preferred shipping address id; wins when it exists server-side
    #[arg(long)]
    shipping_address_id: Option<u64>,

    /// Call create_user when the service advertises it
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    auto_create_user: bool,

    /// Create a shipping address when none resolves
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    auto_create_address: bool,

    /// Bind the buyer wallet when the primary does not match
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    auto_bind_wallet: bool,

    /// Chain id for wallet listing and binding
    #[arg(long, default_value_t = 56)]
    wallet_chain_id: u64,

    /// Buyer wallet address (required for on-chain pay methods)
    #[arg(long)]
    buyer_wallet: Option<String>,

    /// Optional seller wallet address for create_escrow
    #[arg(long)]
    seller_wallet: Option<String>,

    /// Override the shop id instead of taking it from the search result
    #[arg(long)]
    shop_id: Option<String>,

    /// Override the item id instead of taking it from the search result
    #[arg(long)]
    item_id: Option<String>,

    /// Override the sku id instead of taking it from the search result
    #[arg(long)]
    sku_id: Option<String>,

    /// Upstream catalog for the detail fallback
    #[arg(long)]
    item_resource: Option<String>,

    /// Language for the detail fallback
    #[arg(long)]
    detail_language: Option<String>,

    /// Pre-signed hash for submit_tx(create)
    #[arg(long)]
    create_tx_hash: Option<String>,

    /// Pre-signed hash for submit_tx(fund)
    #[arg(long)]
    fund_tx_hash: Option<String>,

    /// Pre-signed hash for submit_tx(confirm)
    #[arg(long)]
    confirm_tx_hash: Option<String>,

    /// Prompt for missing tx hashes on a TTY
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    interactive: bool,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// State used when auto-creating an address
    #[arg(long)]
    address_state: Option<String>,

    /// City used when auto-creating an address
    #[arg(long)]
    address_city: Option<String>,

    /// Street line 1 used when auto-creating an address
    #[arg(long)]
    address_street1: Option<String>,

    /// Street line 2 used when auto-creating an address
    #[arg(long)]
    address_street2: Option<String>,

    /// District used when auto-creating an address
    #[arg(long)]
    address_district: Option<String>,

    /// Postcode used when auto-creating an address
    #[arg(long)]
    address_postcode: Option<String>,

    /// Country code used when auto-creating an address
    #[arg(long)]
    address_country_code: Option<String>,

    /// Country name used when auto-creating an address
    #[arg(long)]
    address_country_name: Option<String>,

    /// Recipient name used when auto-creating an address
    #[arg(long)]
    recipient_name: Option<String>,

    /// Recipient phone used when auto-creating an address
    #[arg(long)]
    recipient_phone: Option<String>,
}

fn from_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Flag value if set, else the environment fallback.
fn resolve(flag: &Option<String>, key: &str) -> Option<String> {
    flag.clone()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| from_env(key))
}

fn resolve_u64(flag: Option<u64>, key: &str) -> Option<u64> {
    flag.or_else(|| from_env(key).and_then(|v| v.parse().ok()))
}

fn generate_user_id() -> u64 {
    use rand::Rng;
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    now * 1000 + rand::thread_rng().gen_range(0..1000)
}

fn ttl(value: u64) -> Option<u64> {
    if value > 0 {
        Some(value)
    } else {
        None
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{} {err:#}", "[ERROR]".bright_red().bold());
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Evidence hashes are validated before anything touches the network.
    let mut provided = HashMap::new();
    for (flag, key, action) in [
        (&cli.create_tx_hash, "OPENIBUY_CREATE_TX_HASH", EscrowAction::Create),
        (&cli.fund_tx_hash, "OPENIBUY_FUND_TX_HASH", EscrowAction::Fund),
        (&cli.confirm_tx_hash, "OPENIBUY_CONFIRM_TX_HASH", EscrowAction::Confirm),
    ] {
        if let Some(raw) = resolve(flag, key) {
            provided.insert(action, TxHash::parse(&raw)?);
        }
    }

    let base_url = resolve(&cli.base_url, "OPENIBUY_BASE_URL")
        .unwrap_or_else(|| "http://localhost:8080/api/mcp".to_string());
    let endpoint = resolve_rpc_endpoint(
        &base_url,
        resolve(&cli.endpoint, "OPENIBUY_ENDPOINT").as_deref(),
    );
    let rest_base = derive_api_base_url(&base_url);
    let token_url = resolve(&cli.token_url, "OPENIBUY_TOKEN_URL")
        .unwrap_or_else(|| format!("{rest_base}/api/mcp/token"));
    let register_url = resolve(&cli.register_url, "OPENIBUY_REGISTER_URL")
        .unwrap_or_else(|| format!("{rest_base}/api/mcp/clients/register"));
    let bootstrap_request_url = resolve(&cli.bootstrap_request_url, "OPENIBUY_BOOTSTRAP_REQUEST_URL")
        .unwrap_or_else(|| format!("{rest_base}/api/mcp/bootstrap/email/request"));
    let bootstrap_exchange_url =
        resolve(&cli.bootstrap_exchange_url, "OPENIBUY_BOOTSTRAP_EXCHANGE_URL")
            .unwrap_or_else(|| format!("{rest_base}/api/mcp/bootstrap/email/exchange"));

    let timeout = Duration::from_secs(cli.timeout_secs);
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")?;

    let provided_token = resolve(&cli.token, "OPENIBUY_TOKEN");
    let bootstrap_token = resolve(&cli.bootstrap_token, "OPENIBUY_BOOTSTRAP_TOKEN");
    let bootstrap_email =
        resolve(&cli.bootstrap_email, "OPENIBUY_BOOTSTRAP_EMAIL").map(|e| e.to_lowercase());
    let client_id = resolve(&cli.client_id, "OPENIBUY_CLIENT_ID");
    let client_secret = resolve(&cli.client_secret, "OPENIBUY_CLIENT_SECRET");
    let user_bearer = resolve(&cli.user_bearer, "OPENIBUY_USER_BEARER");

    let explicit_user_id = resolve_u64(cli.user_id, "OPENIBUY_USER_ID");
    let mut user_id = explicit_user_id
        .or_else(|| provided_token.as_deref().and_then(decode_sub_unsafe))
        .or_else(|| user_bearer.as_deref().and_then(decode_sub_unsafe))
        .unwrap_or_else(|| if cli.new_user { generate_user_id() } else { 1 });

    let token = acquire_token(
        &cli,
        &http,
        AuthEndpoints {
            token_url: &token_url,
            register_url: &register_url,
            bootstrap_request_url: &bootstrap_request_url,
            bootstrap_exchange_url: &bootstrap_exchange_url,
        },
        provided_token,
        bootstrap_token,
        bootstrap_email,
        client_id,
        client_secret,
        user_bearer,
        user_id,
    )
    .await?;

    // The token's subject is authoritative for which user the calls act as.
    if let Some(sub) = decode_sub_unsafe(token.as_str()) {
        user_id = sub;
    }
    info!(user_id, endpoint = %endpoint, "connecting");

    let invoker = McpToolClient::connect(&endpoint, token.clone(), timeout)
        .await
        .context("failed to connect to the tool service")?;

    let keyword = resolve(&cli.keyword, "OPENIBUY_KEYWORD").unwrap_or_else(|| "earphones".to_string());
    let mut config = SagaConfig::new(user_id, keyword);
    config.user_name = resolve(&cli.user_name, "OPENIBUY_USER_NAME");
    config.quantity = cli.quantity;
    config.page_size = cli.page_size;
    if let Some(pay_method) = resolve(&cli.pay_method, "OPENIBUY_PAY_METHOD") {
        config.pay_method = pay_method;
    }
    if let Some(symbol) = resolve(&cli.token_symbol, "OPENIBUY_TOKEN_SYMBOL") {
        config.token_symbol = symbol.to_uppercase();
    }
    config.buyer_wallet = resolve(&cli.buyer_wallet, "OPENIBUY_BUYER_WALLET")
        .map(|raw| WalletAddress::parse(&raw))
        .transpose()?;
    config.seller_wallet = resolve(&cli.seller_wallet, "OPENIBUY_SELLER_WALLET")
        .map(|raw| WalletAddress::parse(&raw))
        .transpose()?;
    config.wallet_chain_id = cli.wallet_chain_id;
    config.preferred_address_id =
        resolve_u64(cli.shipping_address_id, "OPENIBUY_SHIPPING_ADDRESS_ID");
    config.auto_create_user = cli.auto_create_user;
    config.auto_create_address = cli.auto_create_address;
    config.auto_bind_wallet = cli.auto_bind_wallet;
    config.shop_id_override = resolve(&cli.shop_id, "OPENIBUY_SHOP_ID");
    config.item_id_override = resolve(&cli.item_id, "OPENIBUY_ITEM_ID");
    config.sku_id_override = resolve(&cli.sku_id, "OPENIBUY_SKU_ID");
    if let Some(resource) = resolve(&cli.item_resource, "OPENIBUY_ITEM_RESOURCE") {
        config.item_resource = resource;
    }
    if let Some(language) = resolve(&cli.detail_language, "OPENIBUY_DETAIL_LANGUAGE") {
        config.detail_language = language;
    }
    apply_address_flags(&cli, &mut config);

    if config.is_contract_payment() && config.buyer_wallet.is_none() {
        bail!(
            "--buyer-wallet is required for the {} flow",
            config.pay_method
        );
    }

    let detail = HttpShopDetailResolver::new(&rest_base, token.clone(), http.clone());
    let evidence = prompt::PromptEvidence::new(provided, cli.interactive);

    let saga = PurchaseSaga::new(&invoker, &evidence, Some(&detail), config);
    let summary = saga.run().await?;
    display::render_summary(&summary);
    Ok(())
}

struct AuthEndpoints<'a> {
    token_url: &'a str,
    register_url: &'a str,
    bootstrap_request_url: &'a str,
    bootstrap_exchange_url: &'a str,
}

#[allow(clippy::too_many_arguments)]
async fn acquire_token(
    cli: &Cli,
    http: &reqwest::Client,
    endpoints: AuthEndpoints<'_>,
    provided_token: Option<String>,
    bootstrap_token: Option<String>,
    bootstrap_email: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    user_bearer: Option<String>,
    user_id: u64,
) -> Result<BearerToken> {
    if let Some(token) = provided_token {
        return Ok(ProvidedToken::new(token).acquire(http).await?);
    }

    if let Some(bootstrap_token) = bootstrap_token {
        let strategy = BootstrapExchange {
            exchange_url: endpoints.bootstrap_exchange_url.to_string(),
            bootstrap_token,
            access_ttl_sec: ttl(cli.token_ttl_sec),
        };
        return Ok(strategy.acquire(http).await?);
    }

    if let Some(email) = bootstrap_email {
        request_bootstrap_email(http, endpoints.bootstrap_request_url, &email)
            .await
            .context("bootstrap email request failed")?;
        println!(
            "{} bootstrap token requested for {email}; check the inbox.",
            "[auth]".bright_cyan()
        );
        let Some(pasted) = prompt::ask_bootstrap_token().await else {
            bail!("bootstrap token required; set OPENIBUY_BOOTSTRAP_TOKEN or paste the emailed token");
        };
        let strategy = BootstrapExchange {
            exchange_url: endpoints.bootstrap_exchange_url.to_string(),
            bootstrap_token: pasted,
            access_ttl_sec: ttl(cli.token_ttl_sec),
        };
        return Ok(strategy.acquire(http).await?);
    }

    if let (Some(client_id), Some(client_secret)) = (client_id, client_secret) {
        let strategy = ClientCredentials {
            token_url: endpoints.token_url.to_string(),
            client_id,
            client_secret,
            user_id: Some(user_id),
            ttl_sec: ttl(cli.token_ttl_sec),
            refresh_ttl_sec: ttl(cli.refresh_ttl_sec),
        };
        return Ok(strategy.acquire(http).await?);
    }

    if let Some(bearer) = user_bearer {
        if !cli.auto_register_client {
            bail!("client credentials missing and self-registration is disabled");
        }
        let request = RegisterRequest {
            client_id: cli.register_client_id.clone(),
            display_name: Some(
                cli.register_display_name
                    .clone()
                    .unwrap_or_else(|| format!("openibuy_{user_id}")),
            ),
            scope: cli.register_scope.clone().or_else(|| Some("mcp:tools".to_string())),
            fixed_sub: Some(user_id),
            ttl_sec: ttl(cli.token_ttl_sec),
            refresh_ttl_sec: ttl(cli.refresh_ttl_sec),
        };
        let registered = register_client(http, endpoints.register_url, &bearer, &request).await?;
        if let Some(token) = registered.access_token {
            return Ok(token);
        }
        let strategy = ClientCredentials {
            token_url: endpoints.token_url.to_string(),
            client_id: registered.client_id,
            client_secret: registered.client_secret,
            user_id: Some(user_id),
            ttl_sec: ttl(cli.token_ttl_sec),
            refresh_ttl_sec: ttl(cli.refresh_ttl_sec),
        };
        return Ok(strategy.acquire(http).await?);
    }

    bail!(
        "no credentials configured: set OPENIBUY_TOKEN, OPENIBUY_BOOTSTRAP_TOKEN, \
         OPENIBUY_BOOTSTRAP_EMAIL, OPENIBUY_CLIENT_ID/OPENIBUY_CLIENT_SECRET, \
         or OPENIBUY_USER_BEARER"
    );
}

fn apply_address_flags(cli: &Cli, config: &mut SagaConfig) {
    let address = &mut config.address;
    if let Some(state) = resolve(&cli.address_state, "OPENIBUY_ADDRESS_STATE") {
        address.state = state;
    }
    if let Some(city) = resolve(&cli.address_city, "OPENIBUY_ADDRESS_CITY") {
        address.city = city;
    }
    if let Some(street1) = resolve(&cli.address_street1, "OPENIBUY_ADDRESS_STREET1") {
        address.street_line1 = street1;
    }
    address.street_line2 = resolve(&cli.address_street2, "OPENIBUY_ADDRESS_STREET2");
    address.district = resolve(&cli.address_district, "OPENIBUY_ADDRESS_DISTRICT");
    address.postcode = resolve(&cli.address_postcode, "OPENIBUY_ADDRESS_POSTCODE");
    if let Some(code) = resolve(&cli.address_country_code, "OPENIBUY_ADDRESS_COUNTRY_CODE") {
        address.country_code = code;
    }
    if let Some(name) = resolve(&cli.address_country_name, "OPENIBUY_ADDRESS_COUNTRY_NAME") {
        address.country_name = name;
    }
    address.recipient_name = resolve(&cli.recipient_name, "OPENIBUY_RECIPIENT_NAME");
    address.recipient_phone = resolve(&cli.recipient_phone, "OPENIBUY_RECIPIENT_PHONE");
}
